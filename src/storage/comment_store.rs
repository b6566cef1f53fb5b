use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::errors::ServiceResult;
use super::ledger::CommentLedger;
use super::service::CommentService;
use crate::common::{CommentId, CommentRecord, Identity, PostId};

/// Directory, relative to the repository root, holding the comment store
pub const STORE_DIR: &str = ".blogx";

/// File name of the comment store inside [`STORE_DIR`]
pub const STORE_FILE: &str = "comments.json";

/// Comment service persisted as a JSON file in the working tree
///
/// `FileCommentStore` keeps a [`CommentLedger`] in memory and writes it to
/// `<repo>/.blogx/comments.json` after every change. The principal given at
/// construction plays the role of the bearer credential a remote backend
/// would receive with each request.
///
/// ## Write Model
///
/// - **Copy on write**: a change is applied to a copy of the ledger
/// - **Atomic replace**: the copy is written to a temporary file and renamed
///   over the store file
/// - **Commit after persist**: the in-memory ledger is swapped only once the
///   rename succeeded, so a failed write leaves both file and memory untouched
/// - **Serialized writers**: an async lock keeps interleaved writes from
///   overwriting each other
///
/// ## Example Usage
///
/// ```rust,no_run
/// use blogx_comments::common::Identity;
/// use blogx_comments::storage::{CommentService, FileCommentStore};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileCommentStore::open(".")?.with_principal(Some(Identity::new("alice")));
/// let comment = store.create(1, "Nice post".to_string(), None).await?;
/// println!("Created comment #{}", comment.id);
/// # Ok(())
/// # }
/// ```
pub struct FileCommentStore {
    path: PathBuf,
    ledger: RefCell<CommentLedger>,
    principal: Option<Identity>,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileCommentStore {
    /// Open the store under `repo_path`, starting empty if it was never written
    pub fn open<P: AsRef<Path>>(repo_path: P) -> ServiceResult<Self> {
        let path = repo_path.as_ref().join(STORE_DIR).join(STORE_FILE);

        let ledger = if path.exists() {
            let contents = std::fs::read(&path)?;
            serde_json::from_slice(&contents)?
        } else {
            log::debug!("no comment store at {}, starting empty", path.display());
            CommentLedger::new()
        };

        Ok(Self {
            path,
            ledger: RefCell::new(ledger),
            principal: None,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Act as `principal` for every subsequent write
    pub fn with_principal(mut self, principal: Option<Identity>) -> Self {
        self.principal = principal;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the ledger, persist it, then adopt it
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut CommentLedger, Option<&Identity>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.ledger.borrow().clone();
        let output = change(&mut next, self.principal.as_ref())?;

        self.persist(&next).await?;
        *self.ledger.borrow_mut() = next;

        Ok(output)
    }

    async fn persist(&self, ledger: &CommentLedger) -> ServiceResult<()> {
        let json = serde_json::to_vec_pretty(ledger)?;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        log::debug!(
            "wrote {} comments to {}",
            ledger.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl CommentService for FileCommentStore {
    async fn list_by_post(&self, post_id: PostId) -> ServiceResult<Vec<CommentRecord>> {
        Ok(self.ledger.borrow().list_by_post(post_id))
    }

    async fn create(
        &self,
        post_id: PostId,
        body: String,
        parent_id: Option<CommentId>,
    ) -> ServiceResult<CommentRecord> {
        self.commit(|ledger, principal| ledger.create(principal, post_id, &body, parent_id))
            .await
    }

    async fn update(&self, comment_id: CommentId, body: String) -> ServiceResult<CommentRecord> {
        self.commit(|ledger, principal| ledger.update(principal, comment_id, &body))
            .await
    }

    async fn delete(&self, comment_id: CommentId) -> ServiceResult<()> {
        self.commit(|ledger, principal| ledger.delete(principal, comment_id))
            .await
            .map(|removed| {
                log::debug!("deleted comment {} and {} replies", comment_id, removed - 1);
            })
    }
}
