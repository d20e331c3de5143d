use thiserror::Error;

/// Failure taxonomy shared by every service operation.
///
/// `Validation` carries a message that is safe to show to the caller.
/// `Upstream` wraps anything that went wrong in a third-party service or the
/// favorites store; its detail is meant for logs only.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
