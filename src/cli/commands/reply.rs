use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::success_message;
use crate::common::{CommentId, EnvProvider, PostId, SystemEnvProvider};
use crate::storage::GitConfig;

use super::{edit_body, get_author_identity, load_thread};

#[derive(Args)]
pub struct ReplyArgs {
    /// Post the conversation belongs to
    pub post: PostId,

    /// Comment to reply to
    pub parent: CommentId,

    /// Reply text (opens $EDITOR on an "@author" draft when omitted)
    pub body: Option<String>,

    /// Author name (defaults to BLOGX_USER, then git config)
    #[arg(short = 'n', long)]
    pub author_name: Option<String>,
}

pub async fn handle_reply(repo_path: PathBuf, args: ReplyArgs) -> Result<()> {
    let parent_id = args.parent;
    let comment_id = handle_reply_with_env(repo_path, args, SystemEnvProvider).await?;

    println!(
        "{}",
        success_message(&format!("Added reply #{} to comment #{}", comment_id, parent_id))
    );
    Ok(())
}

pub async fn handle_reply_with_env(
    repo_path: PathBuf,
    args: ReplyArgs,
    env_provider: impl EnvProvider,
) -> Result<CommentId> {
    let git = GitConfig::discover(&repo_path);
    let identity = get_author_identity(args.author_name, &git, env_provider);
    let mut thread = load_thread(&repo_path, args.post, identity).await?;

    let draft = thread.start_reply(args.parent)?.draft_body.clone();
    let body = match args.body {
        Some(body) => body,
        None => edit_body(
            &format!("Replying to comment #{} on post #{}", args.parent, args.post),
            &draft,
        )?,
    };

    let applied = thread.add_reply(args.parent, &body).await?;
    applied
        .comment_id()
        .ok_or_else(|| anyhow::anyhow!("Reply to comment #{} was not saved", args.parent))
}
