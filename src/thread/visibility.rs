use std::collections::HashSet;

use super::tree::CommentTree;
use crate::common::{CommentId, CommentNode};

/// Which comments have their replies expanded.
///
/// Comments are collapsed until toggled, so only expanded ids are stored.
/// The state is per view and never changes the tree itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityState {
    expanded: HashSet<CommentId>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, comment_id: CommentId) -> bool {
        self.expanded.contains(&comment_id)
    }

    /// Flip a comment between expanded and collapsed, returning the new state
    pub fn toggle(&mut self, comment_id: CommentId) -> bool {
        if self.expanded.remove(&comment_id) {
            false
        } else {
            self.expanded.insert(comment_id)
        }
    }

    pub fn expand(&mut self, comment_id: CommentId) {
        self.expanded.insert(comment_id);
    }

    pub fn collapse(&mut self, comment_id: CommentId) {
        self.expanded.remove(&comment_id);
    }

    /// Expand every comment that has replies
    pub fn expand_all(&mut self, tree: &CommentTree) {
        for node in tree.iter().filter(|n| n.has_replies()) {
            self.expanded.insert(node.id());
        }
    }

    /// Forget comments that are no longer in the tree
    pub fn retain_existing(&mut self, tree: &CommentTree) {
        self.expanded.retain(|id| tree.contains(*id));
    }

    /// Number of expanded comments
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// One row of a rendered thread
#[derive(Debug, Clone, Copy)]
pub struct VisibleComment<'a> {
    pub node: &'a CommentNode,
    pub depth: usize,
    /// Direct replies, shown or not
    pub reply_count: usize,
    pub expanded: bool,
}

impl CommentTree {
    /// The comments a reader currently sees, in display order.
    ///
    /// Roots are always shown. Replies are shown only while every ancestor
    /// is expanded.
    pub fn visible<'a>(&'a self, visibility: &VisibilityState) -> Vec<VisibleComment<'a>> {
        let mut rows = Vec::new();
        for root in self.roots() {
            push_visible(root, 0, visibility, &mut rows);
        }
        rows
    }
}

fn push_visible<'a>(
    node: &'a CommentNode,
    depth: usize,
    visibility: &VisibilityState,
    rows: &mut Vec<VisibleComment<'a>>,
) {
    let expanded = visibility.is_expanded(node.id());
    rows.push(VisibleComment {
        node,
        depth,
        reply_count: node.children().len(),
        expanded,
    });
    if expanded {
        for child in node.children() {
            push_visible(child, depth + 1, visibility, rows);
        }
    }
}
