pub mod comment;
pub mod env;
pub mod identity;

pub use comment::*;
pub use env::{EnvProvider, SystemEnvProvider, USER_VAR};
pub use identity::*;

#[cfg(test)]
pub use env::MockEnvProvider;
