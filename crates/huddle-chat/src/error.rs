//! Error taxonomy for the chat core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// A referenced channel, conversation or user does not exist.
    #[error("{resource} not found with id: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Duplicate channel name, or a membership that already exists or does
    /// not exist.
    #[error("{0}")]
    Conflict(String),

    /// The caller is not a member or participant. Kept apart from
    /// `NotFound` so clients can tell the two cases apart.
    #[error("{0}")]
    Unauthorized(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ChatError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
