use crate::common::{CommentNode, PostId};
use crate::thread::VisibleComment;
use chrono::Utc;
use console::style;
use std::time::Duration;

const INDENT: &str = "    ";

fn format_time_ago(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    if total_seconds < 60 {
        return format!(
            "{} second{}",
            total_seconds,
            if total_seconds == 1 { "" } else { "s" }
        );
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" });
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} hour{}", hours, if hours == 1 { "" } else { "s" });
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{} day{}", days, if days == 1 { "" } else { "s" });
    }

    let months = days / 30;
    if months < 12 {
        return format!("{} month{}", months, if months == 1 { "" } else { "s" });
    }

    let years = months / 12;
    format!("{} year{}", years, if years == 1 { "" } else { "s" })
}

/// First line of a body and the number of words left out
fn truncate_to_first_line(text: &str) -> (String, Option<usize>) {
    let mut lines = text.trim().lines();
    let first = lines.next().unwrap_or_default().trim().to_string();
    let remaining_words: usize = lines.map(|line| line.split_whitespace().count()).sum();

    if remaining_words > 0 {
        (first, Some(remaining_words))
    } else {
        (first, None)
    }
}

fn replies_hint(row: &VisibleComment<'_>) -> Option<String> {
    if row.expanded || row.reply_count == 0 {
        return None;
    }
    Some(
        style(format!(
            "[{} repl{}; --expand {}]",
            row.reply_count,
            if row.reply_count == 1 { "y" } else { "ies" },
            row.node.id()
        ))
        .dim()
        .to_string(),
    )
}

pub fn format_comment_compact(row: &VisibleComment<'_>) -> String {
    let indent = INDENT.repeat(row.depth);
    let (first_line, remaining_words) = truncate_to_first_line(row.node.body());

    let mut line = format!(
        "{}#{} {}: {}",
        indent,
        style(row.node.id()).bold(),
        style(row.node.author_name()).green(),
        first_line
    );
    if let Some(words) = remaining_words {
        line.push_str(&format!(" {}", style(format!("(+{} words)", words)).dim()));
    }
    if let Some(hint) = replies_hint(row) {
        line.push_str(&format!(" {}", hint));
    }
    line
}

pub fn format_comment_detailed(row: &VisibleComment<'_>) -> String {
    let indent = INDENT.repeat(row.depth);
    let node = row.node;
    let mut output = String::new();

    let time_since = Utc::now() - node.created_at();
    output.push_str(&format!(
        "{}{} by {}, {} ago ({}):\n",
        indent,
        style(format!("#{}", node.id())).bold().cyan(),
        style(node.author_name()).green(),
        format_time_ago(time_since.to_std().unwrap_or_default()),
        node.created_at().format("%Y-%m-%d %H:%M")
    ));
    for line in node.body().lines() {
        output.push_str(&format!("{}{}{}\n", indent, INDENT, line));
    }
    if let Some(hint) = replies_hint(row) {
        output.push_str(&format!("{}{}{}\n", indent, INDENT, hint));
    }

    output
}

/// Render the visible rows of a post's thread
pub fn format_thread(
    post_id: PostId,
    rows: &[VisibleComment<'_>],
    total: usize,
    compact: bool,
) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Post {}: {} comment{}\n",
        style(format!("#{}", post_id)).bold().cyan(),
        total,
        if total == 1 { "" } else { "s" }
    ));
    if rows.is_empty() {
        output.push_str(&format!("{}\n", style("No comments yet").dim()));
        return output;
    }

    for row in rows {
        if compact {
            output.push_str(&format!("{}\n", format_comment_compact(row)));
        } else {
            output.push('\n');
            output.push_str(&format_comment_detailed(row));
        }
    }

    output
}

/// Header line for a single comment shown on its own
pub fn format_comment_header(post_id: PostId, node: &CommentNode) -> String {
    let parent = match node.parent_id() {
        Some(parent_id) => format!(", in reply to #{}", parent_id),
        None => String::new(),
    };
    format!(
        "Comment {} on post #{}{}\n",
        style(format!("#{}", node.id())).bold().cyan(),
        post_id,
        parent
    )
}

pub fn success_message(message: &str) -> String {
    format!("{} {}", style("✓").green().bold(), message)
}

pub fn error_message(message: &str) -> String {
    format!("{} {}", style("✗").red().bold(), message)
}

pub fn warning_message(message: &str) -> String {
    format!("{} {}", style("⚠").yellow().bold(), message)
}

pub fn info_message(message: &str) -> String {
    format!("{} {}", style("ℹ").blue().bold(), message)
}
