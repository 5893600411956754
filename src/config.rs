//! Repository construction parameters.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::git::{Executor, GitExecutable};

/// How to build a [`Repository`](crate::git::Repository).
///
/// Only `url` is required. The serializable part (`url`, `temp_dir`, `git`)
/// can live in a caller's config file; a pre-built executor can only be
/// supplied in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Remote URL, anything `git remote add` accepts.
    pub url: String,
    /// Parent directory for the transient store (system temp root if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// Path to the git binary (`GITSHADOW_GIT` or `git` on PATH if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<PathBuf>,
    /// Pre-built executor; wins over `git` when set.
    #[serde(skip)]
    pub executor: Option<Arc<dyn Executor>>,
}

impl RepositoryConfig {
    /// Create a new configuration for the given remote.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            temp_dir: None,
            git: None,
            executor: None,
        }
    }

    /// Set the parent directory for the transient store.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Set the git binary.
    pub fn executable(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = Some(git.into());
        self
    }

    /// Use a pre-built executor instead of spawning a binary directly.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// the executor the repository will use
    pub(crate) fn resolve_executor(&self) -> Arc<dyn Executor> {
        if let Some(executor) = &self.executor {
            return Arc::clone(executor);
        }
        match &self.git {
            Some(path) => Arc::new(GitExecutable::new(path)),
            None => Arc::new(GitExecutable::from_env()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = RepositoryConfig::new("https://example.com/repo.git")
            .temp_dir("/var/tmp")
            .executable("/usr/local/bin/git");

        assert_eq!(config.url, "https://example.com/repo.git");
        assert_eq!(config.temp_dir, Some(PathBuf::from("/var/tmp")));
        assert_eq!(config.git, Some(PathBuf::from("/usr/local/bin/git")));
        assert!(config.executor.is_none());
    }

    #[test]
    fn test_explicit_executor_wins() {
        let custom: Arc<dyn Executor> = Arc::new(GitExecutable::new("/opt/git/bin/git"));
        let config = RepositoryConfig::new("file:///srv/repo.git")
            .executable("/usr/bin/git")
            .executor(Arc::clone(&custom));

        assert!(Arc::ptr_eq(&config.resolve_executor(), &custom));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: RepositoryConfig =
            serde_json::from_str(r#"{"url": "git@example.com:team/repo.git"}"#).unwrap();
        assert_eq!(config.url, "git@example.com:team/repo.git");
        assert!(config.temp_dir.is_none());
        assert!(config.git.is_none());
    }

    #[test]
    fn test_serialize_skips_unset() {
        let config = RepositoryConfig::new("file:///srv/repo.git").temp_dir("/tmp/shadow");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"url": "file:///srv/repo.git", "temp_dir": "/tmp/shadow"})
        );
    }
}
