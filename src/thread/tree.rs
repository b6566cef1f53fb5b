use std::collections::HashMap;

use super::errors::{ThreadError, ThreadResult};
use crate::common::{CommentId, CommentNode, CommentRecord, PostId};

/// All comments of one post, nested by reply.
///
/// Alongside the nested roots the tree keeps a `comment -> parent` index.
/// The index is what makes ids unique and lets every operation walk straight
/// down the ancestor path of its target instead of searching the whole tree.
/// Structural nesting and the index always agree: a node sits in the
/// `children` of the node its `parent_id` names, or in `roots` if it has none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentTree {
    roots: Vec<CommentNode>,
    parents: HashMap<CommentId, Option<CommentId>>,
}

/// A record `build` could not place, with the reason why
#[derive(Debug)]
struct Rejected {
    id: CommentId,
    reason: String,
}

impl CommentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a service listing, rejecting anything unlinkable.
    ///
    /// The listing may be flat (`parent_id` references), nested (`replies`),
    /// or a mix. A reply listed both nested and flat is the same comment as
    /// long as both copies agree on its parent and author. Fails with
    /// `MalformedCommentData` if a reply's parent is missing, an id repeats
    /// with a different parent or author, a nested reply names a different
    /// parent than the comment it is nested in, or the records span several
    /// posts.
    pub fn build(records: impl IntoIterator<Item = CommentRecord>) -> ThreadResult<Self> {
        let (tree, rejected) = Self::link(None, records);
        match rejected.into_iter().next() {
            Some(first) => Err(ThreadError::malformed(first.reason)),
            None => Ok(tree),
        }
    }

    /// Like [`build`](Self::build) for the comments of `post_id`, but drops
    /// unlinkable records instead of failing. Records of other posts are
    /// dropped too. Returns the ids left out of the tree, in ascending order.
    pub fn build_lossy(
        post_id: PostId,
        records: impl IntoIterator<Item = CommentRecord>,
    ) -> (Self, Vec<CommentId>) {
        let (tree, rejected) = Self::link(Some(post_id), records);
        for r in &rejected {
            log::debug!("dropping comment {}: {}", r.id, r.reason);
        }
        let mut dropped: Vec<CommentId> = rejected
            .into_iter()
            .map(|r| r.id)
            .filter(|id| !tree.contains(*id))
            .collect();
        dropped.sort_unstable();
        dropped.dedup();
        (tree, dropped)
    }

    /// Link records into a tree. Without an `anchor` the post of the first
    /// record is the expected one.
    fn link(
        anchor: Option<PostId>,
        records: impl IntoIterator<Item = CommentRecord>,
    ) -> (Self, Vec<Rejected>) {
        let mut flat = Vec::new();
        let mut rejected = Vec::new();
        flatten_nested(records, None, &mut flat, &mut rejected);

        let post_id = anchor.or_else(|| flat.first().map(|r| r.post_id));
        let mut seen: HashMap<CommentId, (Option<CommentId>, String)> = HashMap::new();
        let mut roots = Vec::new();
        let mut children_of: HashMap<CommentId, Vec<CommentRecord>> = HashMap::new();

        for record in flat {
            if Some(record.post_id) != post_id {
                rejected.push(Rejected {
                    id: record.id,
                    reason: format!(
                        "comment {} belongs to post {}, expected post {}",
                        record.id,
                        record.post_id,
                        post_id.unwrap_or_default()
                    ),
                });
                continue;
            }
            if let Some((parent_id, author)) = seen.get(&record.id) {
                // Nested listings repeat every reply at the top level.
                if *parent_id != record.parent_id || *author != record.author_name {
                    rejected.push(Rejected {
                        id: record.id,
                        reason: format!(
                            "comment id {} appears more than once with different data",
                            record.id
                        ),
                    });
                }
                continue;
            }
            seen.insert(record.id, (record.parent_id, record.author_name.clone()));
            match record.parent_id {
                None => roots.push(record),
                Some(parent_id) => children_of.entry(parent_id).or_default().push(record),
            }
        }

        let mut tree = Self::new();
        for record in roots {
            let node = attach(record, &mut children_of, &mut tree.parents);
            tree.roots.push(node);
        }

        // Whatever was not reached from a root has no path to one: its parent
        // is missing or it sits on a cycle.
        let mut leftovers: Vec<CommentRecord> = children_of.into_values().flatten().collect();
        leftovers.sort_by_key(|r| r.id);
        rejected.extend(leftovers.into_iter().map(|r| Rejected {
            id: r.id,
            reason: format!(
                "parent {} of comment {} is not part of the listing",
                r.parent_id.unwrap_or_default(),
                r.id
            ),
        }));

        (tree, rejected)
    }

    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    /// The post every comment belongs to, if there are any comments
    pub fn post_id(&self) -> Option<PostId> {
        self.roots.first().map(CommentNode::post_id)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn contains(&self, comment_id: CommentId) -> bool {
        self.parents.contains_key(&comment_id)
    }

    /// Number of ancestors above a comment; roots are at depth 0
    pub fn depth_of(&self, comment_id: CommentId) -> Option<usize> {
        self.ancestors(comment_id).map(|path| path.len())
    }

    pub fn find(&self, comment_id: CommentId) -> Option<&CommentNode> {
        self.find_with_depth(comment_id).map(|(node, _)| node)
    }

    /// Find a comment and report how many levels were descended to reach it
    pub fn find_with_depth(&self, comment_id: CommentId) -> Option<(&CommentNode, usize)> {
        let path = self.ancestors(comment_id)?;
        let siblings = descend(&self.roots, &path)?;
        let node = siblings.iter().find(|n| n.id() == comment_id)?;
        Some((node, path.len()))
    }

    /// Size of the thread rooted at a comment, the comment included
    pub fn subtree_size(&self, comment_id: CommentId) -> Option<usize> {
        self.find(comment_id).map(count_nodes)
    }

    /// Depth-first, pre-order walk over every comment
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![self.roots.iter()],
        }
    }

    /// Depth-first records, each keeping its `parent_id`; `build` inverts this
    pub fn flatten(&self) -> Vec<CommentRecord> {
        self.iter().map(CommentNode::to_record).collect()
    }

    /// Append `node` under `parent_id`, or as a new root when there is none
    pub fn insert(&mut self, node: CommentNode, parent_id: Option<CommentId>) -> ThreadResult<()> {
        if node.parent_id() != parent_id {
            return Err(ThreadError::malformed(format!(
                "comment {} replies to {:?} but was inserted under {:?}",
                node.id(),
                node.parent_id(),
                parent_id
            )));
        }
        if let Some(post_id) = self.post_id()
            && node.post_id() != post_id
        {
            return Err(ThreadError::malformed(format!(
                "comment {} belongs to post {}, not post {}",
                node.id(),
                node.post_id(),
                post_id
            )));
        }
        let mut entries = Vec::new();
        collect_entries(&node, parent_id, &mut entries);
        if let Some((duplicate, _)) = entries.iter().find(|(id, _)| self.contains(*id)) {
            return Err(ThreadError::malformed(format!(
                "comment id {} is already in the thread",
                duplicate
            )));
        }

        match parent_id {
            None => self.roots.push(node),
            Some(parent_id) => {
                if !self.contains(parent_id) {
                    return Err(ThreadError::parent_not_found(parent_id));
                }
                self.modify(parent_id, move |siblings, index| {
                    siblings[index].children.push(node)
                })?;
            }
        }

        self.parents.extend(entries);
        Ok(())
    }

    /// Replace the body of a comment
    pub fn update(&mut self, comment_id: CommentId, new_body: String) -> ThreadResult<()> {
        self.modify(comment_id, move |siblings, index| {
            siblings[index].body = new_body
        })
    }

    /// Remove a comment together with every reply below it, returning the
    /// detached thread
    pub fn remove(&mut self, comment_id: CommentId) -> ThreadResult<CommentNode> {
        let removed = self.modify(comment_id, |siblings, index| siblings.remove(index))?;

        let mut ids = Vec::new();
        collect_ids(&removed, &mut ids);
        for id in ids {
            self.parents.remove(&id);
        }
        Ok(removed)
    }

    /// Hand the sibling list holding `target`, and its position there, to `f`.
    ///
    /// This is the single place that walks the tree mutably. It follows the
    /// ancestor path from the index, so the cost is proportional to the
    /// target's depth, and it stops at the target.
    fn modify<T>(
        &mut self,
        target: CommentId,
        f: impl FnOnce(&mut Vec<CommentNode>, usize) -> T,
    ) -> ThreadResult<T> {
        let path = self
            .ancestors(target)
            .ok_or_else(|| ThreadError::comment_not_found(target))?;
        let siblings = descend_mut(&mut self.roots, &path)
            .ok_or_else(|| ThreadError::malformed(format!("no path to comment {}", target)))?;
        let index = siblings
            .iter()
            .position(|n| n.id() == target)
            .ok_or_else(|| ThreadError::malformed(format!("no path to comment {}", target)))?;
        Ok(f(siblings, index))
    }

    /// Ancestor ids of a comment, outermost first
    fn ancestors(&self, comment_id: CommentId) -> Option<Vec<CommentId>> {
        let mut path = Vec::new();
        let mut current = *self.parents.get(&comment_id)?;
        while let Some(parent_id) = current {
            path.push(parent_id);
            current = *self.parents.get(&parent_id)?;
        }
        path.reverse();
        Some(path)
    }
}

/// Depth-first, pre-order iterator over a [`CommentTree`]
pub struct Iter<'a> {
    stack: Vec<std::slice::Iter<'a, CommentNode>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CommentNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(node) => {
                    self.stack.push(node.children.iter());
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a CommentTree {
    type Item = &'a CommentNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Unnest `replies` into one flat list, filling in or checking `parent_id`
fn flatten_nested(
    records: impl IntoIterator<Item = CommentRecord>,
    enclosing: Option<CommentId>,
    out: &mut Vec<CommentRecord>,
    rejected: &mut Vec<Rejected>,
) {
    for mut record in records {
        let replies = std::mem::take(&mut record.replies);
        let id = record.id;

        match (enclosing, record.parent_id) {
            (Some(parent_id), None) => {
                record.parent_id = Some(parent_id);
                out.push(record);
            }
            (Some(parent_id), Some(declared)) if declared != parent_id => {
                rejected.push(Rejected {
                    id,
                    reason: format!(
                        "comment {} is nested under {} but replies to {}",
                        id, parent_id, declared
                    ),
                });
            }
            _ => out.push(record),
        }

        flatten_nested(replies, Some(id), out, rejected);
    }
}

fn attach(
    record: CommentRecord,
    children_of: &mut HashMap<CommentId, Vec<CommentRecord>>,
    parents: &mut HashMap<CommentId, Option<CommentId>>,
) -> CommentNode {
    let mut node = CommentNode::from(record);
    parents.insert(node.id(), node.parent_id());
    if let Some(children) = children_of.remove(&node.id()) {
        node.children = children
            .into_iter()
            .map(|child| attach(child, children_of, parents))
            .collect();
    }
    node
}

fn descend<'a>(nodes: &'a [CommentNode], path: &[CommentId]) -> Option<&'a [CommentNode]> {
    match path.split_first() {
        None => Some(nodes),
        Some((next, rest)) => {
            let node = nodes.iter().find(|n| n.id() == *next)?;
            descend(&node.children, rest)
        }
    }
}

fn descend_mut<'a>(
    nodes: &'a mut Vec<CommentNode>,
    path: &[CommentId],
) -> Option<&'a mut Vec<CommentNode>> {
    match path.split_first() {
        None => Some(nodes),
        Some((next, rest)) => {
            let node = nodes.iter_mut().find(|n| n.id() == *next)?;
            descend_mut(&mut node.children, rest)
        }
    }
}

fn collect_ids(node: &CommentNode, out: &mut Vec<CommentId>) {
    out.push(node.id());
    for child in &node.children {
        collect_ids(child, out);
    }
}

/// `(comment, parent)` index entries for a thread about to be attached
fn collect_entries(
    node: &CommentNode,
    parent_id: Option<CommentId>,
    out: &mut Vec<(CommentId, Option<CommentId>)>,
) {
    out.push((node.id(), parent_id));
    for child in &node.children {
        collect_entries(child, Some(node.id()), out);
    }
}

fn count_nodes(node: &CommentNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: CommentId, parent_id: Option<CommentId>) -> CommentRecord {
        CommentRecord::new(
            id,
            1,
            "alice".to_string(),
            format!("comment {}", id),
            parent_id,
        )
    }

    fn node(id: CommentId, parent_id: Option<CommentId>) -> CommentNode {
        CommentNode::from(record(id, parent_id))
    }

    fn child_ids(node: &CommentNode) -> Vec<CommentId> {
        node.children().iter().map(CommentNode::id).collect()
    }

    /// 1 -> (2 -> 4, 3), 5
    fn sample_tree() -> CommentTree {
        CommentTree::build(vec![
            record(1, None),
            record(2, Some(1)),
            record(3, Some(1)),
            record(4, Some(2)),
            record(5, None),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_from_flat_listing() {
        let tree = sample_tree();

        let roots: Vec<_> = tree.roots().iter().map(CommentNode::id).collect();
        assert_eq!(roots, vec![1, 5]);
        assert_eq!(child_ids(&tree.roots()[0]), vec![2, 3]);
        assert_eq!(child_ids(tree.find(2).unwrap()), vec![4]);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.post_id(), Some(1));
    }

    #[test]
    fn test_build_links_replies_listed_before_parent() {
        let tree = CommentTree::build(vec![record(3, Some(2)), record(2, Some(1)), record(1, None)])
            .unwrap();

        assert_eq!(tree.depth_of(3), Some(2));
        assert_eq!(tree.find(3).unwrap().parent_id(), Some(2));
    }

    #[test]
    fn test_build_from_nested_listing() {
        let mut root = record(1, None);
        let mut reply = record(2, Some(1));
        let mut nested = record(3, None); // parent implied by nesting
        nested.replies.push(record(4, Some(3)));
        reply.replies.push(nested);
        root.replies.push(reply);

        let tree = CommentTree::build(vec![root, record(5, None)]).unwrap();

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.find(3).unwrap().parent_id(), Some(2));
        assert_eq!(tree.depth_of(4), Some(3));
    }

    #[test]
    fn test_build_rejects_nested_reply_with_other_parent() {
        let mut root = record(1, None);
        root.replies.push(record(2, Some(7)));

        let result = CommentTree::build(vec![root]);
        assert!(matches!(
            result,
            Err(ThreadError::MalformedCommentData { .. })
        ));
    }

    #[test]
    fn test_build_rejects_orphan() {
        let result = CommentTree::build(vec![record(1, None), record(2, Some(99))]);

        match result {
            Err(ThreadError::MalformedCommentData { message }) => {
                assert!(message.contains("99"), "unexpected message: {}", message);
            }
            other => panic!("expected MalformedCommentData, got {:?}", other),
        }
    }

    #[test]
    fn test_build_accepts_replies_repeated_at_top_level() {
        // Every reply is listed nested under its parent and again on its own.
        let mut reply = record(2, Some(1));
        reply.replies.push(record(3, Some(2)));
        let mut root = record(1, None);
        root.replies.push(reply.clone());
        let listing = vec![root, reply, record(3, Some(2))];

        let tree = CommentTree::build(listing.clone()).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(child_ids(&tree.roots()[0]), vec![2]);
        assert_eq!(child_ids(tree.find(2).unwrap()), vec![3]);

        let (lossy, dropped) = CommentTree::build_lossy(1, listing);
        assert_eq!(lossy, tree);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_build_rejects_duplicates_and_foreign_posts() {
        let duplicate =
            CommentTree::build(vec![record(1, None), record(2, None), record(2, Some(1))]);
        assert!(matches!(
            duplicate,
            Err(ThreadError::MalformedCommentData { .. })
        ));

        let mut other_author = record(1, None);
        other_author.author_name = "mallory".to_string();
        let duplicate = CommentTree::build(vec![record(1, None), other_author]);
        assert!(matches!(
            duplicate,
            Err(ThreadError::MalformedCommentData { .. })
        ));

        let mut foreign = record(2, None);
        foreign.post_id = 2;
        let mixed = CommentTree::build(vec![record(1, None), foreign]);
        assert!(matches!(mixed, Err(ThreadError::MalformedCommentData { .. })));
    }

    #[test]
    fn test_build_lossy_drops_orphans_and_their_replies() {
        let (tree, dropped) = CommentTree::build_lossy(1, vec![
            record(1, None),
            record(2, Some(99)),
            record(3, Some(2)),
            record(4, Some(1)),
        ]);

        assert_eq!(dropped, vec![2, 3]);
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(4));
        assert!(!tree.contains(3));
    }

    #[test]
    fn test_build_lossy_drops_cycles() {
        let (tree, dropped) = CommentTree::build_lossy(
            1,
            vec![record(1, Some(2)), record(2, Some(1)), record(3, None)],
        );

        assert_eq!(dropped, vec![1, 2]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_build_lossy_keeps_the_requested_post() {
        let mut stray = record(9, Some(77));
        stray.post_id = 2;

        let (tree, dropped) =
            CommentTree::build_lossy(1, vec![stray, record(1, None), record(2, Some(1))]);

        assert_eq!(dropped, vec![9]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.post_id(), Some(1));
        assert_eq!(child_ids(&tree.roots()[0]), vec![2]);
    }

    #[test]
    fn test_build_lossy_never_reports_kept_comments() {
        let mut conflicting = record(2, None);
        conflicting.author_name = "mallory".to_string();

        let (tree, dropped) =
            CommentTree::build_lossy(1, vec![record(1, None), record(2, Some(1)), conflicting]);

        assert!(tree.contains(2));
        assert!(dropped.is_empty());
        assert_eq!(tree.find(2).unwrap().author_name(), "alice");
    }

    #[test]
    fn test_build_empty() {
        let tree = CommentTree::build(Vec::new()).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.post_id(), None);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_insert_appends_in_arrival_order() {
        let mut tree = sample_tree();

        tree.insert(node(6, Some(1)), Some(1)).unwrap();
        tree.insert(node(7, None), None).unwrap();

        assert_eq!(child_ids(&tree.roots()[0]), vec![2, 3, 6]);
        assert_eq!(tree.roots().last().unwrap().id(), 7);
        assert_eq!(tree.depth_of(6), Some(1));
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_insert_under_missing_parent_leaves_tree_unchanged() {
        let mut tree = sample_tree();
        let before = tree.clone();

        let result = tree.insert(node(6, Some(42)), Some(42));

        assert!(matches!(
            result,
            Err(ThreadError::ParentNotFound { parent_id: 42 })
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_insert_rejects_duplicate_and_mismatched_parent() {
        let mut tree = sample_tree();
        let before = tree.clone();

        let duplicate = tree.insert(node(4, Some(3)), Some(3));
        assert!(matches!(
            duplicate,
            Err(ThreadError::MalformedCommentData { .. })
        ));

        let mismatched = tree.insert(node(8, Some(2)), Some(3));
        assert!(matches!(
            mismatched,
            Err(ThreadError::MalformedCommentData { .. })
        ));

        assert_eq!(tree, before);
    }

    #[test]
    fn test_update_changes_only_the_body() {
        let mut tree = sample_tree();

        tree.update(4, "edited".to_string()).unwrap();

        let updated = tree.find(4).unwrap();
        assert_eq!(updated.body(), "edited");
        assert_eq!(updated.parent_id(), Some(2));
        assert_eq!(tree.find(2).unwrap().body(), "comment 2");
    }

    #[test]
    fn test_update_missing_comment() {
        let mut tree = sample_tree();
        let result = tree.update(42, "nope".to_string());
        assert!(matches!(
            result,
            Err(ThreadError::CommentNotFound { comment_id: 42 })
        ));
    }

    #[test]
    fn test_remove_deletes_nested_replies() {
        // A -> B -> C
        let mut tree =
            CommentTree::build(vec![record(1, None), record(2, Some(1)), record(3, Some(2))])
                .unwrap();

        let removed = tree.remove(2).unwrap();

        assert_eq!(removed.id(), 2);
        assert_eq!(tree.len(), 1);
        assert!(tree.roots()[0].children().is_empty());
        assert!(tree.find(3).is_none());
        assert!(!tree.contains(3));
        let walked: Vec<_> = tree.iter().map(CommentNode::id).collect();
        assert_eq!(walked, vec![1]);
    }

    #[test]
    fn test_remove_root() {
        let mut tree = sample_tree();
        tree.remove(1).unwrap();

        let roots: Vec<_> = tree.roots().iter().map(CommentNode::id).collect();
        assert_eq!(roots, vec![5]);
        assert_eq!(tree.len(), 1);

        let result = tree.remove(1);
        assert!(matches!(
            result,
            Err(ThreadError::CommentNotFound { comment_id: 1 })
        ));
    }

    #[test]
    fn test_remove_eliminates_exactly_the_subtree() {
        let mut tree = sample_tree();
        for target in [2, 1, 5] {
            let before = tree.iter().count();
            let size = tree.subtree_size(target).unwrap();

            tree.remove(target).unwrap();

            assert_eq!(tree.iter().count(), before - size);
            assert_eq!(tree.len(), before - size);
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_find_descends_at_most_depth_levels() {
        let depth = 40;
        let mut tree = CommentTree::new();
        tree.insert(node(1, None), None).unwrap();
        for id in 2..=depth {
            tree.insert(node(id, Some(id - 1)), Some(id - 1)).unwrap();
        }
        // A sibling branch that a whole-tree search would have to visit
        tree.insert(node(1000, None), None).unwrap();

        for id in 1..=depth {
            let (found, steps) = tree.find_with_depth(id).unwrap();
            assert_eq!(found.id(), id);
            assert!(steps < depth as usize);
            assert_eq!(steps, (id - 1) as usize);
        }
    }

    #[test]
    fn test_arbitrarily_deep_chain() {
        let depth: CommentId = 500;
        let records: Vec<_> = (1..=depth)
            .map(|id| record(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();
        let mut tree = CommentTree::build(records).unwrap();

        assert_eq!(tree.depth_of(depth), Some(depth as usize - 1));
        tree.update(depth, "deep edit".to_string()).unwrap();
        assert_eq!(tree.find(depth).unwrap().body(), "deep edit");

        tree.remove(250).unwrap();
        assert_eq!(tree.len(), 249);
    }

    #[test]
    fn test_flatten_then_build_round_trips() {
        let mut tree = sample_tree();
        tree.insert(node(6, Some(4)), Some(4)).unwrap();
        tree.insert(node(7, Some(5)), Some(5)).unwrap();

        let flat = tree.flatten();
        let ids: Vec<_> = flat.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 6, 3, 5, 7]);

        let rebuilt = CommentTree::build(flat).unwrap();
        assert_eq!(rebuilt, tree);
    }
}
