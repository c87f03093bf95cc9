//! Errors raised before anything reaches the backend.

/// Local rejection of a request or an operation needing a session.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input the backend would refuse (blank title, short password, bad code).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
