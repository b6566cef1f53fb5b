use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::success_message;
use crate::common::{CommentId, EnvProvider, PostId, SystemEnvProvider};
use crate::storage::GitConfig;
use crate::thread::Applied;

use super::{get_author_identity, load_thread};

#[derive(Args)]
pub struct DeleteArgs {
    /// Post the comment belongs to
    pub post: PostId,

    /// Comment ID to delete, together with its replies
    pub comment: CommentId,

    /// Author name (defaults to BLOGX_USER, then git config)
    #[arg(short = 'n', long)]
    pub author_name: Option<String>,
}

pub async fn handle_delete(repo_path: PathBuf, args: DeleteArgs) -> Result<()> {
    let comment_id = args.comment;
    let removed = handle_delete_with_env(repo_path, args, SystemEnvProvider).await?;

    let replies = removed.saturating_sub(1);
    let message = if replies == 0 {
        format!("Deleted comment #{}", comment_id)
    } else {
        format!(
            "Deleted comment #{} and {} repl{}",
            comment_id,
            replies,
            if replies == 1 { "y" } else { "ies" }
        )
    };
    println!("{}", success_message(&message));
    Ok(())
}

/// Returns how many comments were removed, the deleted one included
pub async fn handle_delete_with_env(
    repo_path: PathBuf,
    args: DeleteArgs,
    env_provider: impl EnvProvider,
) -> Result<usize> {
    let git = GitConfig::discover(&repo_path);
    let identity = get_author_identity(args.author_name, &git, env_provider);
    let mut thread = load_thread(&repo_path, args.post, identity).await?;

    match thread.delete_comment(args.comment).await? {
        Applied::Removed { removed, .. } => Ok(removed),
        other => anyhow::bail!(
            "Unexpected result deleting comment #{}: {:?}",
            args.comment,
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MockEnvProvider;
    use crate::storage::CommentService;
    use crate::storage::test_helpers::*;
    use crate::thread::ThreadError;

    fn delete_args(comment: CommentId) -> DeleteArgs {
        DeleteArgs {
            post: 1,
            comment,
            author_name: None,
        }
    }

    #[tokio::test]
    async fn test_delete_requires_author() {
        let (_temp_dir, repo_path) = setup_temp_repo();
        seed_conversation(&repo_path).await;

        let bob = MockEnvProvider::with_user("bob");
        let err = handle_delete_with_env(repo_path.clone(), delete_args(1), bob)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ThreadError>(),
            Some(ThreadError::Unauthorized { comment_id: 1, .. })
        ));

        let alice = MockEnvProvider::with_user(create_test_identity().name);
        let removed = handle_delete_with_env(repo_path.clone(), delete_args(1), alice)
            .await
            .unwrap();
        assert_eq!(removed, 3);

        let listed = open_store_as(&repo_path, "alice").list_by_post(1).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_delete_reply_keeps_root() {
        let (_temp_dir, repo_path) = setup_temp_repo();
        seed_conversation(&repo_path).await;

        let bob = MockEnvProvider::with_user("bob");
        let removed = handle_delete_with_env(repo_path.clone(), delete_args(2), bob)
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let listed = open_store_as(&repo_path, "alice").list_by_post(1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 1);
    }
}
