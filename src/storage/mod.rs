pub mod comment_store;
pub mod errors;
pub mod ledger;
pub mod memory;
pub mod repo;
pub mod service;

#[cfg(test)]
pub mod test_helpers;

pub use comment_store::FileCommentStore;
pub use errors::{ServiceError, ServiceResult};
pub use ledger::CommentLedger;
pub use memory::MemoryCommentService;
pub use repo::GitConfig;
pub use service::CommentService;
