use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::errors::{ThreadError, ThreadResult};
use super::tree::CommentTree;
use super::visibility::{VisibilityState, VisibleComment};
use crate::common::{CommentId, CommentNode, CommentRecord, Identity, IdentityProvider, PostId};
use crate::storage::{CommentService, ServiceError, ServiceResult};

static NEXT_VIEW: AtomicU64 = AtomicU64::new(1);

/// The one comment currently being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub comment_id: CommentId,
    pub draft_body: String,
}

/// The one comment currently being replied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySession {
    pub parent_id: CommentId,
    pub draft_body: String,
}

/// A service call in flight. Await it, then hand the result to
/// [`CommentTreeController::apply`].
pub type PendingRequest = Pin<Box<dyn Future<Output = Completion>>>;

/// The answer to a [`PendingRequest`], tagged with the view that issued it
#[derive(Debug)]
pub struct Completion {
    view: u64,
    outcome: Outcome,
}

#[derive(Debug)]
enum Outcome {
    Loaded(ServiceResult<Vec<CommentRecord>>),
    Created {
        parent_id: Option<CommentId>,
        result: ServiceResult<CommentRecord>,
    },
    Updated {
        comment_id: CommentId,
        result: ServiceResult<CommentRecord>,
    },
    Deleted {
        comment_id: CommentId,
        result: ServiceResult<()>,
    },
}

/// What applying a completion did to the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The tree was replaced; `dropped` lists comments that could not be linked
    Loaded {
        count: usize,
        dropped: Vec<CommentId>,
    },
    Inserted(CommentId),
    Updated(CommentId),
    /// `removed` counts the comment and all of its replies
    Removed {
        comment_id: CommentId,
        removed: usize,
    },
    /// The completion belonged to another view and was ignored
    Discarded,
}

impl Applied {
    /// The comment an insert, update or delete was about
    pub fn comment_id(&self) -> Option<CommentId> {
        match self {
            Applied::Inserted(id) | Applied::Updated(id) => Some(*id),
            Applied::Removed { comment_id, .. } => Some(*comment_id),
            Applied::Loaded { .. } | Applied::Discarded => None,
        }
    }
}

/// Comment thread of one post view.
///
/// Owns the tree, the expansion state and the edit/reply sessions, and pairs
/// every write with the tree change that mirrors it. The tree is only touched
/// once the service has answered, and only if it answered with success, so
/// what is shown never runs ahead of the backend.
///
/// Each write is a request/apply pair. `request_*` checks what can be checked
/// locally and returns the call as a [`PendingRequest`]; [`apply`](Self::apply)
/// takes its [`Completion`] and mutates the tree. Several requests can be in
/// flight at once; their effects land in the order their completions are
/// applied. The `add_comment`, `add_reply`, `save_edit`, `delete_comment` and
/// `load_comments` intents do both steps in one call.
///
/// A controller is bound to one post. Create a new one for every post view:
/// completions issued by another instance are discarded by `apply`.
pub struct CommentTreeController<S, I> {
    post_id: PostId,
    view: u64,
    service: Rc<S>,
    identity: I,
    tree: CommentTree,
    visibility: VisibilityState,
    edit: Option<EditSession>,
    reply: Option<ReplySession>,
}

impl<S, I> CommentTreeController<S, I>
where
    S: CommentService + 'static,
    I: IdentityProvider,
{
    /// A controller for `post_id` with an empty tree; call
    /// [`load_comments`](Self::load_comments) to fill it
    pub fn new(post_id: PostId, service: Rc<S>, identity: I) -> Self {
        Self {
            post_id,
            view: NEXT_VIEW.fetch_add(1, Ordering::Relaxed),
            service,
            identity,
            tree: CommentTree::new(),
            visibility: VisibilityState::new(),
            edit: None,
            reply: None,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    /// The active edit session, as long as the signed-in user wrote the
    /// comment it edits
    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit
            .as_ref()
            .filter(|session| self.require_author(session.comment_id).is_ok())
    }

    pub fn reply_session(&self) -> Option<&ReplySession> {
        self.reply.as_ref()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.identity.current_user()
    }

    /// Rows to render, given the current expansion state
    pub fn visible(&self) -> Vec<VisibleComment<'_>> {
        self.tree.visible(&self.visibility)
    }

    pub async fn load_comments(&mut self) -> ThreadResult<Applied> {
        let completion = self.request_load().await;
        self.apply(completion)
    }

    pub async fn add_comment(&mut self, body: &str) -> ThreadResult<Applied> {
        let completion = self.request_comment(body)?.await;
        self.apply(completion)
    }

    pub async fn add_reply(&mut self, parent_id: CommentId, body: &str) -> ThreadResult<Applied> {
        let completion = self.request_reply(parent_id, body)?.await;
        self.apply(completion)
    }

    pub async fn save_edit(
        &mut self,
        comment_id: CommentId,
        new_body: &str,
    ) -> ThreadResult<Applied> {
        let completion = self.request_update(comment_id, new_body)?.await;
        self.apply(completion)
    }

    pub async fn delete_comment(&mut self, comment_id: CommentId) -> ThreadResult<Applied> {
        let completion = self.request_delete(comment_id)?.await;
        self.apply(completion)
    }

    pub fn request_load(&self) -> PendingRequest {
        let service = Rc::clone(&self.service);
        let post_id = self.post_id;
        self.pending(async move { Outcome::Loaded(service.list_by_post(post_id).await) })
    }

    pub fn request_comment(&self, body: &str) -> ThreadResult<PendingRequest> {
        self.require_user()?;
        let body = non_blank(body)?;

        let service = Rc::clone(&self.service);
        let post_id = self.post_id;
        Ok(self.pending(async move {
            Outcome::Created {
                parent_id: None,
                result: service.create(post_id, body, None).await,
            }
        }))
    }

    pub fn request_reply(&self, parent_id: CommentId, body: &str) -> ThreadResult<PendingRequest> {
        self.require_user()?;
        let body = non_blank(body)?;
        if !self.tree.contains(parent_id) {
            return Err(ThreadError::parent_not_found(parent_id));
        }

        let service = Rc::clone(&self.service);
        let post_id = self.post_id;
        Ok(self.pending(async move {
            Outcome::Created {
                parent_id: Some(parent_id),
                result: service.create(post_id, body, Some(parent_id)).await,
            }
        }))
    }

    pub fn request_update(
        &self,
        comment_id: CommentId,
        new_body: &str,
    ) -> ThreadResult<PendingRequest> {
        self.require_author(comment_id)?;
        let body = non_blank(new_body)?;

        let service = Rc::clone(&self.service);
        Ok(self.pending(async move {
            Outcome::Updated {
                comment_id,
                result: service.update(comment_id, body).await,
            }
        }))
    }

    pub fn request_delete(&self, comment_id: CommentId) -> ThreadResult<PendingRequest> {
        self.require_author(comment_id)?;

        let service = Rc::clone(&self.service);
        Ok(self.pending(async move {
            Outcome::Deleted {
                comment_id,
                result: service.delete(comment_id).await,
            }
        }))
    }

    /// Mirror a finished service call in the tree.
    ///
    /// A failed call leaves the tree, the expansion state and the sessions
    /// exactly as they were.
    pub fn apply(&mut self, completion: Completion) -> ThreadResult<Applied> {
        if completion.view != self.view {
            log::debug!(
                "discarding completion from view {} in view {} of post {}",
                completion.view,
                self.view,
                self.post_id
            );
            return Ok(Applied::Discarded);
        }

        match completion.outcome {
            Outcome::Loaded(result) => self.apply_loaded(result),
            Outcome::Created { parent_id, result } => {
                let record = result.map_err(|source| self.write_failed(source))?;
                self.apply_created(parent_id, record)
            }
            Outcome::Updated { comment_id, result } => {
                let record = result.map_err(|source| self.write_failed(source))?;
                self.tree.update(comment_id, record.body)?;
                if self.edit.as_ref().is_some_and(|s| s.comment_id == comment_id) {
                    self.edit = None;
                }
                log::info!("updated comment {} on post {}", comment_id, self.post_id);
                Ok(Applied::Updated(comment_id))
            }
            Outcome::Deleted { comment_id, result } => {
                result.map_err(|source| self.write_failed(source))?;
                let removed = self.tree.remove(comment_id)?;
                let removed = count_thread(&removed);
                self.forget_missing();
                log::info!(
                    "deleted comment {} and {} replies on post {}",
                    comment_id,
                    removed - 1,
                    self.post_id
                );
                Ok(Applied::Removed {
                    comment_id,
                    removed,
                })
            }
        }
    }

    fn apply_loaded(&mut self, result: ServiceResult<Vec<CommentRecord>>) -> ThreadResult<Applied> {
        let records = result.map_err(|source| {
            log::warn!("failed to load comments for post {}: {}", self.post_id, source);
            ThreadError::LoadFailed {
                post_id: self.post_id,
                source,
            }
        })?;

        if let Some(other) = records.first().map(|r| r.post_id)
            && records.iter().all(|r| r.post_id != self.post_id)
        {
            return Err(ThreadError::malformed(format!(
                "listing for post {} returned comments of post {}",
                self.post_id, other
            )));
        }

        let (tree, dropped) = CommentTree::build_lossy(self.post_id, records);
        if !dropped.is_empty() {
            log::warn!(
                "dropped {} unlinkable comments on post {}: {:?}",
                dropped.len(),
                self.post_id,
                dropped
            );
        }
        self.tree = tree;
        self.forget_missing();
        log::info!("loaded {} comments for post {}", self.tree.len(), self.post_id);
        Ok(Applied::Loaded {
            count: self.tree.len(),
            dropped,
        })
    }

    fn apply_created(
        &mut self,
        parent_id: Option<CommentId>,
        record: CommentRecord,
    ) -> ThreadResult<Applied> {
        if record.post_id != self.post_id {
            return Err(ThreadError::malformed(format!(
                "comment {} was created on post {}, not post {}",
                record.id, record.post_id, self.post_id
            )));
        }
        let comment_id = record.id;
        self.tree.insert(CommentNode::from(record), parent_id)?;

        match parent_id {
            Some(parent_id) => {
                self.visibility.expand(parent_id);
                if self.reply.as_ref().is_some_and(|s| s.parent_id == parent_id) {
                    self.reply = None;
                }
                log::info!(
                    "added reply {} to comment {} on post {}",
                    comment_id,
                    parent_id,
                    self.post_id
                );
            }
            None => log::info!("added comment {} on post {}", comment_id, self.post_id),
        }
        Ok(Applied::Inserted(comment_id))
    }

    /// Open an edit session on one of the current user's comments, seeded
    /// with its body. Any other edit in progress is dropped.
    pub fn start_edit(&mut self, comment_id: CommentId) -> ThreadResult<&EditSession> {
        let node = self.require_author(comment_id)?;
        let session = EditSession {
            comment_id,
            draft_body: node.body().to_string(),
        };

        if let Some(previous) = self.edit.take()
            && previous.comment_id != comment_id
        {
            log::debug!("cancelled edit of comment {}", previous.comment_id);
        }
        Ok(&*self.edit.insert(session))
    }

    /// Replace the draft of the active edit session; false if there is none
    pub fn set_draft(&mut self, body: impl Into<String>) -> bool {
        self.drop_foreign_edit();
        match self.edit.as_mut() {
            Some(session) => {
                session.draft_body = body.into();
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) -> Option<EditSession> {
        self.drop_foreign_edit();
        self.edit.take()
    }

    /// Open a reply session under `parent_id`, addressed to its author
    pub fn start_reply(&mut self, parent_id: CommentId) -> ThreadResult<&ReplySession> {
        self.require_user()?;
        let parent = self
            .tree
            .find(parent_id)
            .ok_or_else(|| ThreadError::parent_not_found(parent_id))?;
        let session = ReplySession {
            parent_id,
            draft_body: format!("@{} ", parent.author_name()),
        };
        Ok(&*self.reply.insert(session))
    }

    /// Replace the draft of the active reply session; false if there is none
    pub fn set_reply_draft(&mut self, body: impl Into<String>) -> bool {
        match self.reply.as_mut() {
            Some(session) => {
                session.draft_body = body.into();
                true
            }
            None => false,
        }
    }

    pub fn cancel_reply(&mut self) -> Option<ReplySession> {
        self.reply.take()
    }

    /// Expand or collapse the replies of a comment, returning the new state
    pub fn toggle_visibility(&mut self, comment_id: CommentId) -> ThreadResult<bool> {
        if !self.tree.contains(comment_id) {
            return Err(ThreadError::comment_not_found(comment_id));
        }
        Ok(self.visibility.toggle(comment_id))
    }

    /// Show the replies of a comment
    pub fn expand(&mut self, comment_id: CommentId) -> ThreadResult<()> {
        if !self.tree.contains(comment_id) {
            return Err(ThreadError::comment_not_found(comment_id));
        }
        self.visibility.expand(comment_id);
        Ok(())
    }

    pub fn expand_all(&mut self) {
        self.visibility.expand_all(&self.tree);
    }

    fn pending(&self, call: impl Future<Output = Outcome> + 'static) -> PendingRequest {
        let view = self.view;
        Box::pin(async move {
            Completion {
                view,
                outcome: call.await,
            }
        })
    }

    fn require_user(&self) -> ThreadResult<Identity> {
        self.identity
            .current_user()
            .ok_or(ThreadError::Unauthenticated)
    }

    fn require_author(&self, comment_id: CommentId) -> ThreadResult<&CommentNode> {
        let user = self.require_user()?;
        let node = self
            .tree
            .find(comment_id)
            .ok_or_else(|| ThreadError::comment_not_found(comment_id))?;
        if !node.is_authored_by(&user.name) {
            return Err(ThreadError::unauthorized(&user.name, comment_id));
        }
        Ok(node)
    }

    /// Close the edit session once the signed-in user no longer wrote its comment
    fn drop_foreign_edit(&mut self) {
        if let Some(session) = &self.edit
            && self.require_author(session.comment_id).is_err()
        {
            log::debug!(
                "closed edit of comment {}: not written by the signed-in user",
                session.comment_id
            );
            self.edit = None;
        }
    }

    /// Drop expansion flags and sessions for comments that left the tree
    fn forget_missing(&mut self) {
        self.visibility.retain_existing(&self.tree);
        if let Some(comment_id) = self.edit.as_ref().map(|s| s.comment_id)
            && !self.tree.contains(comment_id)
        {
            log::debug!("cancelled edit of removed comment {}", comment_id);
            self.edit = None;
        }
        if self
            .reply
            .as_ref()
            .is_some_and(|s| !self.tree.contains(s.parent_id))
        {
            self.reply = None;
        }
    }

    /// Translate a rejected write. Permission and lookup failures keep their
    /// meaning; everything else is a failed write.
    fn write_failed(&self, source: ServiceError) -> ThreadError {
        log::warn!("comment write on post {} failed: {}", self.post_id, source);
        match source {
            ServiceError::Unauthenticated => ThreadError::Unauthenticated,
            ServiceError::Forbidden { user, comment_id } => {
                ThreadError::Unauthorized { user, comment_id }
            }
            ServiceError::CommentNotFound { comment_id } => {
                ThreadError::CommentNotFound { comment_id }
            }
            ServiceError::ParentNotFound { parent_id } => ThreadError::ParentNotFound { parent_id },
            source => ThreadError::WriteFailed { source },
        }
    }
}

fn non_blank(body: &str) -> ThreadResult<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ThreadError::EmptyBody);
    }
    Ok(body.to_string())
}

fn count_thread(node: &CommentNode) -> usize {
    1 + node.children().iter().map(count_thread).sum::<usize>()
}
