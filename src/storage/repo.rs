use std::path::Path;

/// Read-only view of the git configuration that applies at a path
///
/// Used to fall back on `user.name` when no author was given explicitly.
/// A path outside any repository yields an empty configuration rather than
/// an error, since git is optional for commenting.
pub struct GitConfig {
    repo: Option<gix::Repository>,
}

impl GitConfig {
    /// Discover the repository containing `path`
    pub fn discover<P: AsRef<Path>>(path: P) -> Self {
        match gix::discover(path.as_ref()) {
            Ok(repo) => Self { repo: Some(repo) },
            Err(err) => {
                log::debug!(
                    "no git repository at {}: {}",
                    path.as_ref().display(),
                    err
                );
                Self { repo: None }
            }
        }
    }

    /// A configuration with no values
    pub fn empty() -> Self {
        Self { repo: None }
    }

    /// Look up a dotted key such as `user.name`
    pub fn get(&self, key: &str) -> Option<String> {
        let repo = self.repo.as_ref()?;
        let snapshot = repo.config_snapshot();
        let value = snapshot.string(key)?;
        Some(value.to_string())
    }
}
