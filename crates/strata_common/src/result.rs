//! Common result and error types for the Strata engine.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value (which may be partial or degraded after
/// error recovery). `Err` indicates an unrecoverable internal error (a bug
/// in Strata or its caller's import step), not a user-facing error.
/// Recoverable problems are reported through
/// [`DiagnosticSink`](../strata_diagnostics) and the operation still
/// returns `Ok`.
pub type StrataResult<T> = Result<T, InternalError>;

/// An internal engine error indicating a bug, not a bad design instance.
///
/// Raised for structural inconsistencies such as an entity id that no
/// longer equals its storage index. These should never occur during normal
/// operation; if one does, the import/build step that produced the data is
/// at fault and the run must abort.
#[derive(Debug, thiserror::Error)]
#[error("internal placer error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
