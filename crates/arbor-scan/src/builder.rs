//! Bounded concurrent tree builder.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use tracing::{debug, info, trace, warn};

use arbor_core::{BuildConfig, BuildError, BuiltTree, Node, ReadError};

use crate::lister::{DirLister, FsLister, ListedEntry};
use crate::tokens::TokenPool;

/// Builds a [`Node`] tree from disk, expanding subdirectories in parallel
/// while concurrency tokens are available and inline otherwise.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    config: BuildConfig,
    lister: Arc<dyn DirLister>,
}

impl TreeBuilder {
    /// Create a builder for the given configuration.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            lister: Arc::new(FsLister),
        }
    }

    /// Read directories through `lister` instead of the filesystem.
    pub fn with_lister(mut self, lister: impl DirLister + 'static) -> Self {
        self.lister = Arc::new(lister);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the whole tree under the configured root.
    ///
    /// Returns once every reachable directory has been expanded or has
    /// recorded its read error. Read errors never fail the build.
    pub fn build(&self) -> Result<BuiltTree, BuildError> {
        self.config
            .validate()
            .map_err(|message| BuildError::InvalidConfig { message })?;

        let start = Instant::now();
        let workers = ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .stack_size(self.config.stack_size)
            .thread_name(|i| format!("arbor-walk-{i}"))
            .build()
            .map_err(|e| BuildError::ThreadPool {
                message: e.to_string(),
            })?;

        let tokens = TokenPool::new(self.config.concurrency_limit);
        let root = Node::root_at(&self.config.root);

        // The calling thread counts against the limit for the whole build.
        let caller = tokens.try_acquire();
        // Stats are collected recursively too, so they run on a walker stack.
        let mut tree = workers.install(|| {
            self.expand(&root, &self.config.root, &tokens)?;
            Ok::<_, BuildError>(BuiltTree::new(root, self.config.clone(), start.elapsed()))
        })?;
        drop(caller);
        tree.peak_concurrency = tokens.peak_in_use();

        info!(
            root = %tree.root_path.display(),
            dirs = tree.stats.total_dirs,
            files = tree.stats.total_files,
            unreadable = tree.stats.unreadable_dirs,
            elapsed_ms = tree.build_duration.as_millis() as u64,
            "tree built"
        );

        Ok(tree)
    }

    /// Populate `dir`, found on disk at `path`, recursing into subdirectories.
    fn expand(&self, dir: &Arc<Node>, path: &Path, tokens: &TokenPool) -> Result<(), BuildError> {
        let entries = match self.read_entries(path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read directory");
                dir.set_error(err)?;
                return Ok(());
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "expanding directory");

        if !entries.iter().any(|e| e.is_dir) {
            for entry in entries {
                dir.add_child(Node::from_os_name(entry.name, false, Some(dir)))?;
            }
            return Ok(());
        }

        // Once a subdirectory is handed to a worker, later siblings wait in
        // `deferred` so children end up in listing order.
        let mut deferred: Vec<Option<Arc<Node>>> = Vec::new();
        let (tx, rx) = crossbeam_channel::unbounded::<(usize, Result<Arc<Node>, BuildError>)>();

        rayon::scope(|s| -> Result<(), BuildError> {
            for entry in entries {
                let child = Node::from_os_name(&entry.name, entry.is_dir, Some(dir));
                if entry.is_dir {
                    let child_path = path.join(&entry.name);
                    if let Some(token) = tokens.try_acquire() {
                        trace!(path = %child_path.display(), "spawning subdirectory");
                        let index = deferred.len();
                        deferred.push(None);
                        let tx = tx.clone();
                        s.spawn(move |_| {
                            let result = self.expand(&child, &child_path, tokens).map(|()| child);
                            drop(token);
                            // `rx` is only dropped after the scope has joined this task.
                            let _ = tx.send((index, result));
                        });
                        continue;
                    }
                    trace!(path = %child_path.display(), "no token free, expanding inline");
                    self.expand(&child, &child_path, tokens)?;
                }

                if deferred.is_empty() {
                    dir.add_child(child)?;
                } else {
                    deferred.push(Some(child));
                }
            }
            Ok(())
        })?;
        drop(tx);

        // The scope has joined every spawned task, and each sent exactly once.
        for (index, result) in rx.try_iter() {
            deferred[index] = Some(result?);
        }
        for child in deferred.into_iter().flatten() {
            dir.add_child(child)?;
        }

        Ok(())
    }

    /// List a directory, filtered and sorted by name.
    fn read_entries(&self, path: &Path) -> Result<Vec<ListedEntry>, ReadError> {
        let mut entries = self.lister.list(path).map_err(|e| ReadError::io(path, e))?;
        entries.retain(|entry| !self.config.should_skip(&entry.name.to_string_lossy()));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

/// Build the tree under `root`, allowing at most `concurrency_limit`
/// directory expansions at once.
pub fn build(root: impl Into<PathBuf>, concurrency_limit: usize) -> Result<Arc<Node>, BuildError> {
    let config = BuildConfig::with_limit(root, concurrency_limit);
    TreeBuilder::new(config).build().map(|tree| tree.root)
}

/// [`build`] with the default concurrency limit.
pub fn build_default(root: impl Into<PathBuf>) -> Result<Arc<Node>, BuildError> {
    build(root, arbor_core::DEFAULT_CONCURRENCY_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("dir1/subdir")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();

        temp
    }

    #[test]
    fn test_basic_build() {
        let temp = create_test_tree();
        let tree = TreeBuilder::new(BuildConfig::new(temp.path())).build().unwrap();

        assert_eq!(tree.stats.total_files, 5);
        assert_eq!(tree.stats.total_dirs, 4);
        assert_eq!(tree.stats.max_depth, 3);
        assert!(!tree.has_errors());
    }

    #[test]
    fn test_children_sorted_by_name() {
        let temp = create_test_tree();
        let root = build(temp.path(), 4).unwrap();

        let names: Vec<String> = root
            .children()
            .iter()
            .map(|c| c.filename().to_string())
            .collect();
        assert_eq!(names, [".hidden", "dir1", "dir2", "file1.txt"]);
    }

    #[test]
    fn test_skip_hidden() {
        let temp = create_test_tree();
        let config = BuildConfig::builder()
            .root(temp.path())
            .include_hidden(false)
            .build()
            .unwrap();
        let tree = TreeBuilder::new(config).build().unwrap();

        assert!(tree.root.child(".hidden").is_none());
        assert_eq!(tree.root.len(), 3);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let temp = create_test_tree();
        let err = build(temp.path(), 0).unwrap_err();
        assert!(matches!(err, BuildError::InvalidConfig { .. }));
    }

    #[test]
    fn test_limit_one_never_runs_in_parallel() {
        let temp = create_test_tree();
        let tree = TreeBuilder::new(BuildConfig::with_limit(temp.path(), 1))
            .build()
            .unwrap();

        assert_eq!(tree.peak_concurrency, 1);
        assert_eq!(tree.stats.total_nodes(), 9);
    }

    #[test]
    fn test_missing_root_records_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let root = build(&missing, 4).unwrap();

        assert!(root.is_directory());
        assert!(root.is_empty());
        assert!(matches!(root.error(), Some(ReadError::NotFound { .. })));
    }

    #[test]
    fn test_file_root_records_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let root = build(&file, 4).unwrap();

        assert!(root.is_empty());
        assert!(root.error().is_some());
    }
}
