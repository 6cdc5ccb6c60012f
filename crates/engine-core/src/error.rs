//! Common error infrastructure shared across `engine-core`.
//!
//! Domain-specific errors (config validation, transaction rejection,
//! migration) live in their own modules; this module only provides the
//! shared classification scheme used to reason about them uniformly.

/// Severity level of an error, used for logging and recovery strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// Expected rejection in normal operation (bad input, missing entity).
    Validation,
    /// Indicates a configuration or caller mistake that should not recur.
    Precondition,
    /// Unexpected state inconsistency; should be investigated.
    Internal,
    /// Unrecoverable; the instance should not continue serving.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Precondition => "precondition",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }
}

/// Common trait implemented by every error enum in this crate.
///
/// Gives callers (the processor, the HTTP layer, logging) a uniform way
/// to classify and name an error without matching on every variant.
pub trait GameError {
    fn severity(&self) -> ErrorSeverity;
    fn error_code(&self) -> &'static str;
}
