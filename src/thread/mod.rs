pub mod controller;
pub mod errors;
pub mod tree;
pub mod visibility;

pub use controller::{
    Applied, CommentTreeController, Completion, EditSession, PendingRequest, ReplySession,
};
pub use errors::{ThreadError, ThreadResult};
pub use tree::CommentTree;
pub use visibility::{VisibilityState, VisibleComment};
