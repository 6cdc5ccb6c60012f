//! Bearer-token extraction (§6 "Authentication is Bearer token in the
//! `Authorization` header"). The token is handed to `engine-core` as
//! an opaque string — this layer never parses or hashes it (§9 design
//! note: "the edge collaborator owns user identity").

use axum::http::HeaderMap;

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
