use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::output::{format_thread, warning_message};
use crate::common::{CommentId, PostId};

use super::load_thread;

#[derive(Args)]
pub struct ListArgs {
    /// Post whose comments to list
    pub post: PostId,

    /// Show the replies of a comment (repeatable)
    #[arg(short, long, value_name = "ID")]
    pub expand: Vec<CommentId>,

    /// Show every reply
    #[arg(short, long)]
    pub all: bool,

    /// One line per comment
    #[arg(short, long)]
    pub compact: bool,
}

pub async fn handle_list(repo_path: PathBuf, args: ListArgs) -> Result<()> {
    print!("{}", list_output(&repo_path, &args).await?);
    Ok(())
}

pub(crate) async fn list_output(repo_path: &Path, args: &ListArgs) -> Result<String> {
    let mut thread = load_thread(repo_path, args.post, None).await?;

    if args.all {
        thread.expand_all();
    }
    for comment_id in &args.expand {
        if let Err(err) = thread.expand(*comment_id) {
            eprintln!("{}", warning_message(&err.to_string()));
        }
    }

    Ok(format_thread(
        thread.post_id(),
        &thread.visible(),
        thread.tree().len(),
        args.compact,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::*;

    fn list_args(expand: Vec<CommentId>, all: bool) -> ListArgs {
        ListArgs {
            post: 1,
            expand,
            all,
            compact: true,
        }
    }

    #[tokio::test]
    async fn test_list_collapsed_by_default() {
        let (_temp_dir, repo_path) = setup_temp_repo();
        seed_conversation(&repo_path).await;

        let output = list_output(&repo_path, &list_args(vec![], false)).await.unwrap();

        assert!(output.contains("Post #1: 3 comments"));
        assert!(output.contains("#1 alice: Nice post [1 reply; --expand 1]"));
        assert!(!output.contains("Thanks!"));
    }

    #[tokio::test]
    async fn test_list_expand_one_level() {
        let (_temp_dir, repo_path) = setup_temp_repo();
        seed_conversation(&repo_path).await;

        let output = list_output(&repo_path, &list_args(vec![1, 42], false))
            .await
            .unwrap();

        assert!(output.contains("\n    #2 bob: Thanks! [1 reply; --expand 2]"));
        assert!(!output.contains("Me too"));
    }

    #[tokio::test]
    async fn test_list_all() {
        let (_temp_dir, repo_path) = setup_temp_repo();
        seed_conversation(&repo_path).await;

        let output = list_output(&repo_path, &list_args(vec![], true)).await.unwrap();

        assert!(output.contains("\n        #3 carol: Me too"));
        assert!(!output.contains("--expand"));
    }

    #[tokio::test]
    async fn test_list_empty_post() {
        let (_temp_dir, repo_path) = setup_temp_repo();

        let output = list_output(&repo_path, &list_args(vec![], false)).await.unwrap();
        assert!(output.contains("No comments yet"));
    }
}
