use crate::{index::IndexError, llm::LlmError};

/// Failures of the hosted services on paths that do not catch them.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Failed to delete item")]
    Deletion(#[source] IndexError),

    #[error("Failed to update item")]
    Update(#[source] IndexError),

    #[error("Failed to fetch items")]
    Fetch(#[source] IndexError),

    #[error("upstream service error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("reqwest error: {0:?}")]
    Remote(#[from] reqwest::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Upstream(err.into())
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        AppError::Upstream(err.into())
    }
}
