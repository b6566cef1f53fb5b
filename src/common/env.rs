//! Trait for accessing environment variables in a testable way
//!
//! Identity resolution reads `BLOGX_USER` through this trait so tests can
//! inject values without touching the process environment.

#[cfg(test)]
use std::collections::HashMap;

/// Environment variable naming the signed-in comment author
pub const USER_VAR: &str = "BLOGX_USER";

pub trait EnvProvider {
    /// Get the value of an environment variable
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation that uses the system environment
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Test-only mock implementation for environment variables
#[cfg(test)]
pub struct MockEnvProvider {
    vars: HashMap<String, String>,
}

#[cfg(test)]
impl MockEnvProvider {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn remove_var(&mut self, key: &str) -> &mut Self {
        self.vars.remove(key);
        self
    }

    /// Create a mock with `BLOGX_USER` set
    pub fn with_user(name: impl Into<String>) -> Self {
        let mut mock = Self::new();
        mock.set_var(USER_VAR, name);
        mock
    }
}

#[cfg(test)]
impl EnvProvider for MockEnvProvider {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_env_provider() {
        let mut mock = MockEnvProvider::new();
        assert_eq!(mock.get_var(USER_VAR), None);

        mock.set_var(USER_VAR, "alice");
        assert_eq!(mock.get_var(USER_VAR), Some("alice".to_string()));

        mock.remove_var(USER_VAR);
        assert_eq!(mock.get_var(USER_VAR), None);
    }

    #[test]
    fn test_with_user() {
        let mock = MockEnvProvider::with_user("bob");
        assert_eq!(mock.get_var(USER_VAR), Some("bob".to_string()));
        assert_eq!(mock.get_var("OTHER_VAR"), None);
    }
}
