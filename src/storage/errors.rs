use thiserror::Error;

use crate::common::CommentId;

/// Failures reported by a comment service.
///
/// Permission and lookup failures map onto the matching `ThreadError`;
/// everything else reaches the user wrapped in `ThreadError::LoadFailed` or
/// `ThreadError::WriteFailed`.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{user} is not allowed to modify comment {comment_id}")]
    Forbidden { user: String, comment_id: CommentId },

    #[error("Comment not found: {comment_id}")]
    CommentNotFound { comment_id: CommentId },

    #[error("Parent comment not found: {parent_id}")]
    ParentNotFound { parent_id: CommentId },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn forbidden(user: impl AsRef<str>, comment_id: CommentId) -> Self {
        ServiceError::Forbidden {
            user: user.as_ref().to_string(),
            comment_id,
        }
    }

    pub fn comment_not_found(comment_id: CommentId) -> Self {
        ServiceError::CommentNotFound { comment_id }
    }

    pub fn parent_not_found(parent_id: CommentId) -> Self {
        ServiceError::ParentNotFound { parent_id }
    }

    pub fn invalid_request(message: impl AsRef<str>) -> Self {
        ServiceError::InvalidRequest {
            message: message.as_ref().to_string(),
        }
    }

    pub fn transport(message: impl AsRef<str>) -> Self {
        ServiceError::Transport {
            message: message.as_ref().to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
