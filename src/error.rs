use thiserror::Error;

/// Failure to obtain a file from a content source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{path} does not exist at {revision}")]
    NotFound { path: String, revision: String },

    #[error("{path} at {revision} is not valid UTF-8")]
    InvalidUtf8 { path: String, revision: String },

    #[error("git {args} failed: {stderr}")]
    Git { args: String, stderr: String },

    #[error("failed to spawn git command: {0}")]
    Spawn(#[from] std::io::Error),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
