use std::cell::RefCell;

use super::errors::ServiceResult;
use super::ledger::CommentLedger;
use super::service::CommentService;
use crate::common::{CommentId, CommentRecord, Identity, PostId};

/// Comment service kept entirely in memory.
///
/// Behaves like the real backend (see [`CommentLedger`]) and lets callers
/// switch the signed-in principal between calls.
#[derive(Debug, Default)]
pub struct MemoryCommentService {
    ledger: RefCell<CommentLedger>,
    principal: RefCell<Option<Identity>>,
}

impl MemoryCommentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(identity: Identity) -> Self {
        let service = Self::new();
        service.sign_in(identity);
        service
    }

    pub fn sign_in(&self, identity: Identity) {
        *self.principal.borrow_mut() = Some(identity);
    }

    pub fn sign_out(&self) {
        *self.principal.borrow_mut() = None;
    }

    pub fn ledger(&self) -> CommentLedger {
        self.ledger.borrow().clone()
    }
}

impl CommentService for MemoryCommentService {
    async fn list_by_post(&self, post_id: PostId) -> ServiceResult<Vec<CommentRecord>> {
        Ok(self.ledger.borrow().list_by_post(post_id))
    }

    async fn create(
        &self,
        post_id: PostId,
        body: String,
        parent_id: Option<CommentId>,
    ) -> ServiceResult<CommentRecord> {
        let principal = self.principal.borrow();
        self.ledger
            .borrow_mut()
            .create(principal.as_ref(), post_id, &body, parent_id)
    }

    async fn update(&self, comment_id: CommentId, body: String) -> ServiceResult<CommentRecord> {
        let principal = self.principal.borrow();
        self.ledger
            .borrow_mut()
            .update(principal.as_ref(), comment_id, &body)
    }

    async fn delete(&self, comment_id: CommentId) -> ServiceResult<()> {
        let principal = self.principal.borrow();
        self.ledger
            .borrow_mut()
            .delete(principal.as_ref(), comment_id)
            .map(|_| ())
    }
}
