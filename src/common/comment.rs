use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PostId = u64;
pub type CommentId = u64;

/// A comment as the comment service sends and receives it.
///
/// Listings may come back flat (every reply carries `parent_id`) or nested
/// (replies inlined under `replies`). Both shapes are accepted by
/// [`CommentTree::build`](crate::thread::CommentTree::build).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: CommentId,
    pub post_id: PostId,
    #[serde(alias = "username")]
    pub author_name: String,
    #[serde(alias = "content")]
    pub body: String,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentRecord>,
}

impl CommentRecord {
    pub fn new(
        id: CommentId,
        post_id: PostId,
        author_name: String,
        body: String,
        parent_id: Option<CommentId>,
    ) -> Self {
        Self {
            id,
            post_id,
            author_name,
            body,
            parent_id,
            created_at: Utc::now(),
            replies: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// One comment inside a [`CommentTree`](crate::thread::CommentTree).
///
/// Everything except the body is fixed once the service has assigned an id.
/// The body changes only through `CommentTree::update`, and children only
/// through the tree's insert/remove operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    id: CommentId,
    post_id: PostId,
    author_name: String,
    pub(crate) body: String,
    parent_id: Option<CommentId>,
    pub(crate) children: Vec<CommentNode>,
    created_at: DateTime<Utc>,
}

impl CommentNode {
    pub fn id(&self) -> CommentId {
        self.id
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn parent_id(&self) -> Option<CommentId> {
        self.parent_id
    }

    pub fn children(&self) -> &[CommentNode] {
        &self.children
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn has_replies(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_authored_by(&self, name: &str) -> bool {
        self.author_name == name
    }

    /// The record for this node alone; `replies` is left empty.
    pub fn to_record(&self) -> CommentRecord {
        CommentRecord {
            id: self.id,
            post_id: self.post_id,
            author_name: self.author_name.clone(),
            body: self.body.clone(),
            parent_id: self.parent_id,
            created_at: self.created_at,
            replies: Vec::new(),
        }
    }
}

/// Builds a childless node. Nested `replies` are not carried over; linking
/// them is the tree builder's job.
impl From<CommentRecord> for CommentNode {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            author_name: record.author_name,
            body: record.body,
            parent_id: record.parent_id,
            children: Vec::new(),
            created_at: record.created_at,
        }
    }
}
