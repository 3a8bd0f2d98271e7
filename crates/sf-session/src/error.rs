use sf_backend_client::BackendError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Client-side precondition failed; no request was issued.
    #[error("{0}")]
    Validation(&'static str),
    #[error("session has no identity yet")]
    NotInitialized,
    /// The backend answered but declined the action.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("identity storage failed: {0}")]
    Storage(String),
}
