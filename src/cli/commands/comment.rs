use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::success_message;
use crate::common::{CommentId, EnvProvider, PostId, SystemEnvProvider};
use crate::storage::GitConfig;
use crate::thread::ThreadError;

use super::{edit_body, get_author_identity, load_thread};

#[derive(Args)]
pub struct CommentArgs {
    /// Post to comment on
    pub post: PostId,

    /// Comment text (opens $EDITOR when omitted)
    pub body: Option<String>,

    /// Author name (defaults to BLOGX_USER, then git config)
    #[arg(short = 'n', long)]
    pub author_name: Option<String>,
}

pub async fn handle_comment(repo_path: PathBuf, args: CommentArgs) -> Result<()> {
    let post_id = args.post;
    let comment_id = handle_comment_with_env(repo_path, args, SystemEnvProvider).await?;

    println!(
        "{}",
        success_message(&format!("Added comment #{} to post #{}", comment_id, post_id))
    );
    Ok(())
}

pub async fn handle_comment_with_env(
    repo_path: PathBuf,
    args: CommentArgs,
    env_provider: impl EnvProvider,
) -> Result<CommentId> {
    let git = GitConfig::discover(&repo_path);
    let identity = get_author_identity(args.author_name, &git, env_provider);
    let mut thread = load_thread(&repo_path, args.post, identity).await?;

    // Fail before the editor opens, not after.
    if thread.current_user().is_none() {
        return Err(ThreadError::Unauthenticated.into());
    }

    let body = match args.body {
        Some(body) => body,
        None => edit_body(&format!("Commenting on post #{}", args.post), "")?,
    };

    let applied = thread.add_comment(&body).await?;
    applied
        .comment_id()
        .ok_or_else(|| anyhow::anyhow!("Comment on post #{} was not saved", args.post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MockEnvProvider;
    use crate::storage::CommentService;
    use crate::storage::test_helpers::*;

    #[tokio::test]
    async fn test_comment_command_basic() {
        let (_temp_dir, repo_path) = setup_temp_repo();
        let author = create_test_identity();

        let args = CommentArgs {
            post: 4,
            body: Some("  Great read  ".to_string()),
            author_name: Some(author.name.clone()),
        };
        let comment_id = handle_comment_with_env(repo_path.clone(), args, MockEnvProvider::new())
            .await
            .unwrap();
        assert_eq!(comment_id, 1);

        let store = open_store_as(&repo_path, "anyone");
        let listed = store.list_by_post(4).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].body, "Great read");
        assert_eq!(listed[0].author_name, author.name);
        assert!(listed[0].is_root());
    }

    #[tokio::test]
    async fn test_comment_command_author_from_env() {
        let (_temp_dir, repo_path) = setup_temp_repo();

        let args = CommentArgs {
            post: 1,
            body: Some("From the environment".to_string()),
            author_name: None,
        };
        handle_comment_with_env(repo_path.clone(), args, MockEnvProvider::with_user("dave"))
            .await
            .unwrap();

        let listed = open_store_as(&repo_path, "dave").list_by_post(1).await.unwrap();
        assert_eq!(listed[0].author_name, "dave");
    }

    #[tokio::test]
    async fn test_comment_command_rejects_blank_body() {
        let (_temp_dir, repo_path) = setup_temp_repo();

        let args = CommentArgs {
            post: 1,
            body: Some("   ".to_string()),
            author_name: Some("alice".to_string()),
        };
        let err = handle_comment_with_env(repo_path.clone(), args, MockEnvProvider::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ThreadError>(),
            Some(ThreadError::EmptyBody)
        ));
        assert!(!open_store_as(&repo_path, "alice").path().exists());
    }
}
