use std::future::Future;

use super::errors::ServiceResult;
use crate::common::{CommentId, CommentRecord, PostId};

/// The backend the comment controller talks to.
///
/// Implementations attach whatever credentials they hold to every call; the
/// controller only does local permission checks and never passes identity
/// through this interface. Listings may be flat or nested.
pub trait CommentService {
    fn list_by_post(
        &self,
        post_id: PostId,
    ) -> impl Future<Output = ServiceResult<Vec<CommentRecord>>>;

    fn create(
        &self,
        post_id: PostId,
        body: String,
        parent_id: Option<CommentId>,
    ) -> impl Future<Output = ServiceResult<CommentRecord>>;

    fn update(
        &self,
        comment_id: CommentId,
        body: String,
    ) -> impl Future<Output = ServiceResult<CommentRecord>>;

    fn delete(&self, comment_id: CommentId) -> impl Future<Output = ServiceResult<()>>;
}
