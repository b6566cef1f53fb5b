use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{info_message, success_message};
use crate::common::{CommentId, EnvProvider, PostId, SystemEnvProvider};
use crate::storage::GitConfig;

use super::{edit_body, get_author_identity, load_thread};

#[derive(Args)]
pub struct EditArgs {
    /// Post the comment belongs to
    pub post: PostId,

    /// Comment ID to edit
    pub comment: CommentId,

    /// Set the new text directly instead of opening $EDITOR
    #[arg(short, long)]
    pub body: Option<String>,

    /// Author name (defaults to BLOGX_USER, then git config)
    #[arg(short = 'n', long)]
    pub author_name: Option<String>,
}

pub async fn handle_edit(repo_path: PathBuf, args: EditArgs) -> Result<()> {
    let comment_id = args.comment;
    let changed = handle_edit_with_env(repo_path, args, SystemEnvProvider).await?;

    if changed {
        println!("{}", success_message(&format!("Updated comment #{}", comment_id)));
    } else {
        println!("{}", info_message("No changes made"));
    }
    Ok(())
}

/// Returns whether the comment changed
pub async fn handle_edit_with_env(
    repo_path: PathBuf,
    args: EditArgs,
    env_provider: impl EnvProvider,
) -> Result<bool> {
    let git = GitConfig::discover(&repo_path);
    let identity = get_author_identity(args.author_name, &git, env_provider);
    let mut thread = load_thread(&repo_path, args.post, identity).await?;

    let current = thread.start_edit(args.comment)?.draft_body.clone();
    let edited = match args.body {
        Some(body) => body,
        None => edit_body(
            &format!("Editing comment #{} on post #{}", args.comment, args.post),
            &current,
        )?,
    };

    if edited.trim() == current.trim() {
        thread.cancel_edit();
        return Ok(false);
    }

    thread.save_edit(args.comment, &edited).await?;
    Ok(true)
}
