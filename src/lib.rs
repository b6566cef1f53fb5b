pub mod cli;
pub mod common;
pub mod storage;
pub mod thread;
