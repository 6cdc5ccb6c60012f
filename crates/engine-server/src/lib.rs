//! Library half of the `engine-server` binary, split out so
//! integration tests can drive the axum router directly (mirrors the
//! teacher's `runtime/tests/integration_test.rs` driving its crate's
//! public surface rather than `main`).

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
