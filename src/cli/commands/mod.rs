use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

mod comment;
mod delete;
mod edit;
mod list;
mod reply;
mod show;

pub use comment::{CommentArgs, handle_comment};
pub use delete::{DeleteArgs, handle_delete};
pub use edit::{EditArgs, handle_edit};
pub use list::{ListArgs, handle_list};
pub use reply::{ReplyArgs, handle_reply};
pub use show::{ShowArgs, handle_show};

use crate::cli::output::warning_message;
use crate::common::{EnvProvider, Identity, PostId, USER_VAR};
use crate::storage::{FileCommentStore, GitConfig};
use crate::thread::{Applied, CommentTreeController};

#[derive(Parser)]
#[command(name = "blogx-comments")]
#[command(about = "Threaded comments for blog posts, stored next to the blog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository path (defaults to current directory)
    #[arg(short, long, global = true)]
    pub repo: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the comments of a post
    List(ListArgs),
    /// Show one comment with all of its replies
    Show(ShowArgs),
    /// Comment on a post
    Comment(CommentArgs),
    /// Reply to a comment
    Reply(ReplyArgs),
    /// Edit one of your comments
    Edit(EditArgs),
    /// Delete one of your comments and every reply to it
    Delete(DeleteArgs),
}

pub async fn run_command(cli: Cli) -> Result<()> {
    let repo_path = match cli.repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::List(args) => handle_list(repo_path, args).await,
        Commands::Show(args) => handle_show(repo_path, args).await,
        Commands::Comment(args) => handle_comment(repo_path, args).await,
        Commands::Reply(args) => handle_reply(repo_path, args).await,
        Commands::Edit(args) => handle_edit(repo_path, args).await,
        Commands::Delete(args) => handle_delete(repo_path, args).await,
    }
}

/// Comment thread of one post, backed by the repository's comment store
pub(crate) type PostThread = CommentTreeController<FileCommentStore, Option<Identity>>;

/// Open the comment store under `repo_path` and load one post's thread
pub(crate) async fn load_thread(
    repo_path: &Path,
    post_id: PostId,
    identity: Option<Identity>,
) -> Result<PostThread> {
    let store = FileCommentStore::open(repo_path)?.with_principal(identity.clone());
    let mut thread = CommentTreeController::new(post_id, Rc::new(store), identity);

    if let Applied::Loaded { dropped, .. } = thread.load_comments().await?
        && !dropped.is_empty()
    {
        eprintln!(
            "{}",
            warning_message(&format!(
                "Skipped {} comment(s) that could not be placed in the thread: {:?}",
                dropped.len(),
                dropped
            ))
        );
    }
    Ok(thread)
}

/// Resolve the commenting user: explicit name, then `BLOGX_USER`, then git
/// `user.name`. Blank values are skipped; `None` means anonymous.
pub(crate) fn get_author_identity(
    name: Option<String>,
    git: &GitConfig,
    env_provider: impl EnvProvider,
) -> Option<Identity> {
    let non_blank = |value: String| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    name.and_then(non_blank)
        .or_else(|| env_provider.get_var(USER_VAR).and_then(non_blank))
        .or_else(|| git.get("user.name").and_then(non_blank))
        .map(Identity::new)
}

/// Let the user write a comment body in `$EDITOR`, starting from `draft`
pub(crate) fn edit_body(instructions: &str, draft: &str) -> Result<String> {
    let mut temp_file = tempfile::Builder::new().suffix(".md").tempfile()?;

    for line in instructions.lines() {
        writeln!(temp_file, "# {}", line)?;
    }
    writeln!(temp_file, "# Lines starting with '#' are ignored.")?;
    writeln!(temp_file)?;
    write!(temp_file, "{}", draft)?;
    temp_file.flush()?;

    ::edit::edit_file(temp_file.path())?;

    let edited = std::fs::read_to_string(temp_file.path())?;
    Ok(strip_instructions(&edited))
}

fn strip_instructions(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
