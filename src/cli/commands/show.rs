use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::output::{format_comment_detailed, format_comment_header};
use crate::common::{CommentId, PostId};
use crate::thread::{ThreadError, VisibleComment};

use super::load_thread;

#[derive(Args)]
pub struct ShowArgs {
    /// Post the comment belongs to
    pub post: PostId,

    /// Comment ID to show
    pub comment: CommentId,
}

pub async fn handle_show(repo_path: PathBuf, args: ShowArgs) -> Result<()> {
    print!("{}", show_output(&repo_path, &args).await?);
    Ok(())
}

pub(crate) async fn show_output(repo_path: &Path, args: &ShowArgs) -> Result<String> {
    let mut thread = load_thread(repo_path, args.post, None).await?;
    thread.expand_all();

    let node = thread
        .tree()
        .find(args.comment)
        .ok_or_else(|| ThreadError::comment_not_found(args.comment))?;
    let mut output = format_comment_header(args.post, node);

    let rows = thread.visible();
    let Some(start) = rows.iter().position(|row| row.node.id() == args.comment) else {
        return Err(ThreadError::comment_not_found(args.comment).into());
    };
    let base_depth = rows[start].depth;

    output.push('\n');
    for row in rows[start..]
        .iter()
        .enumerate()
        .take_while(|(offset, row)| *offset == 0 || row.depth > base_depth)
        .map(|(_, row)| row)
    {
        let rebased = VisibleComment {
            depth: row.depth - base_depth,
            ..*row
        };
        output.push_str(&format_comment_detailed(&rebased));
    }

    Ok(output)
}
