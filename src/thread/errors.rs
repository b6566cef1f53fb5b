use thiserror::Error;

use crate::common::{CommentId, PostId};
use crate::storage::ServiceError;

/// Everything a comment thread operation can fail with.
///
/// All variants are recoverable: the tree is left as it was and the user can
/// retry the intent.
#[derive(Error, Debug)]
pub enum ThreadError {
    #[error("You need to sign in to comment")]
    Unauthenticated,

    #[error("{user} is not the author of comment {comment_id}")]
    Unauthorized { user: String, comment_id: CommentId },

    #[error("Parent comment not found: {parent_id}")]
    ParentNotFound { parent_id: CommentId },

    #[error("Comment not found: {comment_id}")]
    CommentNotFound { comment_id: CommentId },

    #[error("Malformed comment data: {message}")]
    MalformedCommentData { message: String },

    #[error("Comment cannot be empty")]
    EmptyBody,

    #[error("Failed to load comments for post {post_id}: {source}")]
    LoadFailed {
        post_id: PostId,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to save comment: {source}")]
    WriteFailed {
        #[source]
        source: ServiceError,
    },
}

impl ThreadError {
    pub fn unauthorized(user: impl AsRef<str>, comment_id: CommentId) -> Self {
        ThreadError::Unauthorized {
            user: user.as_ref().to_string(),
            comment_id,
        }
    }

    pub fn parent_not_found(parent_id: CommentId) -> Self {
        ThreadError::ParentNotFound { parent_id }
    }

    pub fn comment_not_found(comment_id: CommentId) -> Self {
        ThreadError::CommentNotFound { comment_id }
    }

    pub fn malformed(message: impl AsRef<str>) -> Self {
        ThreadError::MalformedCommentData {
            message: message.as_ref().to_string(),
        }
    }
}

pub type ThreadResult<T> = Result<T, ThreadError>;
