use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{CommentService, FileCommentStore};
use crate::common::Identity;

/// The author of the first seeded comment
pub fn create_test_identity() -> Identity {
    Identity::new("alice")
}

pub fn setup_temp_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let repo_path = temp_dir.path().to_path_buf();
    (temp_dir, repo_path)
}

/// Store under `repo_path` acting as `author`
pub fn open_store_as(repo_path: &Path, author: &str) -> FileCommentStore {
    FileCommentStore::open(repo_path)
        .expect("Failed to open comment store")
        .with_principal(Some(Identity::new(author)))
}

/// Post 1: "Nice post" by alice (#1), "Thanks!" by bob (#2) replying to it,
/// and "Me too" by carol (#3) replying to bob
pub async fn seed_conversation(repo_path: &Path) {
    let alice = open_store_as(repo_path, &create_test_identity().name);
    alice.create(1, "Nice post".to_string(), None).await.unwrap();

    let bob = open_store_as(repo_path, "bob");
    bob.create(1, "Thanks!".to_string(), Some(1)).await.unwrap();

    let carol = open_store_as(repo_path, "carol");
    carol.create(1, "Me too".to_string(), Some(2)).await.unwrap();
}
