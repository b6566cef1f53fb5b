use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::errors::{ServiceError, ServiceResult};
use crate::common::{CommentId, CommentRecord, Identity, PostId};

/// Backend-side state of every comment, across all posts.
///
/// Comments are kept flat in creation order with sequential ids starting at 1,
/// so a reply always comes after its parent. Writes check the acting
/// principal the way the blog backend does: creating needs a signed-in user,
/// editing and deleting need the comment's author. Deleting a comment deletes
/// every reply below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLedger {
    last_id: CommentId,
    comments: Vec<CommentRecord>,
}

impl CommentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, comment_id: CommentId) -> Option<&CommentRecord> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Flat listing for one post, oldest first
    pub fn list_by_post(&self, post_id: PostId) -> Vec<CommentRecord> {
        self.comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect()
    }

    pub fn create(
        &mut self,
        principal: Option<&Identity>,
        post_id: PostId,
        body: &str,
        parent_id: Option<CommentId>,
    ) -> ServiceResult<CommentRecord> {
        let author = principal.ok_or(ServiceError::Unauthenticated)?;
        let body = non_blank(body)?;

        if let Some(parent_id) = parent_id {
            let parent = self
                .get(parent_id)
                .ok_or_else(|| ServiceError::parent_not_found(parent_id))?;
            if parent.post_id != post_id {
                return Err(ServiceError::invalid_request(format!(
                    "comment {} belongs to post {}, not post {}",
                    parent_id, parent.post_id, post_id
                )));
            }
        }

        self.last_id += 1;
        let record = CommentRecord::new(
            self.last_id,
            post_id,
            author.name.clone(),
            body.to_string(),
            parent_id,
        );
        self.comments.push(record.clone());
        Ok(record)
    }

    pub fn update(
        &mut self,
        principal: Option<&Identity>,
        comment_id: CommentId,
        body: &str,
    ) -> ServiceResult<CommentRecord> {
        let author = principal.ok_or(ServiceError::Unauthenticated)?;
        let body = non_blank(body)?;

        let comment = self
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| ServiceError::comment_not_found(comment_id))?;
        if comment.author_name != author.name {
            return Err(ServiceError::forbidden(&author.name, comment_id));
        }

        comment.body = body.to_string();
        Ok(comment.clone())
    }

    /// Remove a comment and all of its replies, returning how many were removed
    pub fn delete(
        &mut self,
        principal: Option<&Identity>,
        comment_id: CommentId,
    ) -> ServiceResult<usize> {
        let author = principal.ok_or(ServiceError::Unauthenticated)?;
        let comment = self
            .get(comment_id)
            .ok_or_else(|| ServiceError::comment_not_found(comment_id))?;
        if comment.author_name != author.name {
            return Err(ServiceError::forbidden(&author.name, comment_id));
        }

        // Replies always follow their parent, so one pass collects the thread.
        let mut doomed = HashSet::from([comment_id]);
        for c in &self.comments {
            if c.parent_id.is_some_and(|parent| doomed.contains(&parent)) {
                doomed.insert(c.id);
            }
        }

        let before = self.comments.len();
        self.comments.retain(|c| !doomed.contains(&c.id));
        Ok(before - self.comments.len())
    }
}

fn non_blank(body: &str) -> ServiceResult<&str> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid_request("comment body is empty"));
    }
    Ok(trimmed)
}
