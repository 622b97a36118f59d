//! Build configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default cap on simultaneously in-flight directory reads.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 200;

/// Default stack size for walker threads. Expansion recurses once per
/// directory level, so this bounds the deepest tree that can be walked.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Configuration for building a tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct BuildConfig {
    /// Root path to build from.
    pub root: PathBuf,

    /// Maximum number of directory expansions running at once, the
    /// calling thread included.
    #[builder(default = "DEFAULT_CONCURRENCY_LIMIT")]
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Number of worker threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Stack size in bytes for each walker thread.
    #[builder(default = "DEFAULT_STACK_SIZE")]
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,

    /// Include hidden entries (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

fn default_true() -> bool {
    true
}

fn default_concurrency_limit() -> usize {
    DEFAULT_CONCURRENCY_LIMIT
}

fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

impl BuildConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.concurrency_limit == Some(0) {
            return Err("Concurrency limit must be at least 1".to_string());
        }
        if self.stack_size == Some(0) {
            return Err("Stack size must be non-zero".to_string());
        }
        Ok(())
    }
}

impl BuildConfig {
    /// Create a new build config builder.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::default()
    }

    /// Create a simple config for building from a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            threads: 0,
            stack_size: DEFAULT_STACK_SIZE,
            include_hidden: true,
        }
    }

    /// Same as [`BuildConfig::new`] with an explicit concurrency limit.
    pub fn with_limit(root: impl Into<PathBuf>, concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit,
            ..Self::new(root)
        }
    }

    /// Check the invariants the builder enforces, for configs constructed
    /// directly or deserialized.
    pub fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("Root path cannot be empty".to_string());
        }
        if self.concurrency_limit == 0 {
            return Err("Concurrency limit must be at least 1".to_string());
        }
        if self.stack_size == 0 {
            return Err("Stack size must be non-zero".to_string());
        }
        Ok(())
    }

    /// Check if a directory entry should be left out of the tree.
    pub fn should_skip(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BuildConfig::builder()
            .root("/home/user")
            .concurrency_limit(4usize)
            .threads(2usize)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.concurrency_limit, 4);
        assert_eq!(config.threads, 2);
        assert_eq!(config.stack_size, DEFAULT_STACK_SIZE);
        assert!(config.include_hidden);
    }

    #[test]
    fn test_config_builder_rejects_zero_limit() {
        let result = BuildConfig::builder()
            .root("/home/user")
            .concurrency_limit(0usize)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder_requires_root() {
        assert!(BuildConfig::builder().build().is_err());
        assert!(BuildConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_config_simple() {
        let config = BuildConfig::new("/home/user");
        assert_eq!(config.concurrency_limit, DEFAULT_CONCURRENCY_LIMIT);
        assert_eq!(config.threads, 0);
        assert!(config.validate().is_ok());
        assert!(BuildConfig::with_limit("/x", 0).validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_stack() {
        let result = BuildConfig::builder()
            .root("/home/user")
            .stack_size(0usize)
            .build();
        assert!(result.is_err());

        let mut config = BuildConfig::new("/home/user");
        config.stack_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_skip() {
        let mut config = BuildConfig::new("/test");

        // By default, hidden entries are included
        assert!(!config.should_skip(".git"));

        config.include_hidden = false;
        assert!(config.should_skip(".git"));
        assert!(!config.should_skip("src"));
    }
}
