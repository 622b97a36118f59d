//! Built tree container and statistics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::BuildConfig;
use crate::node::Node;

/// Summary statistics for a built tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Total number of directories, the root included.
    pub total_dirs: u64,
    /// Total number of files.
    pub total_files: u64,
    /// Directories whose listing failed.
    pub unreadable_dirs: u64,
    /// Maximum depth reached (root = 0).
    pub max_depth: u32,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute stats for the subtree under `root`.
    pub fn collect(root: &Arc<Node>) -> Self {
        let mut stats = Self::new();
        root.walk(&mut |node, depth| stats.record(node, depth as u32));
        stats
    }

    /// Update stats with one node.
    pub fn record(&mut self, node: &Node, depth: u32) {
        self.max_depth = self.max_depth.max(depth);
        if node.is_directory() {
            self.total_dirs += 1;
            if node.error().is_some() {
                self.unreadable_dirs += 1;
            }
        } else {
            self.total_files += 1;
        }
    }

    /// Total number of nodes.
    pub fn total_nodes(&self) -> u64 {
        self.total_dirs + self.total_files
    }
}

/// Complete built tree with metadata.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    /// Root node of the tree.
    pub root: Arc<Node>,

    /// Root path that was built.
    pub root_path: PathBuf,

    /// Duration of the build.
    pub build_duration: Duration,

    /// Configuration used.
    pub config: BuildConfig,

    /// Summary statistics.
    pub stats: TreeStats,

    /// Most directory expansions observed running at once.
    pub peak_concurrency: usize,
}

impl BuiltTree {
    /// Wrap a finished root, computing its statistics.
    pub fn new(root: Arc<Node>, config: BuildConfig, build_duration: Duration) -> Self {
        let stats = TreeStats::collect(&root);
        Self {
            root_path: config.root.clone(),
            root,
            build_duration,
            config,
            stats,
            peak_concurrency: 0,
        }
    }

    /// Check if any directory could not be read.
    pub fn has_errors(&self) -> bool {
        self.stats.unreadable_dirs > 0
    }
}
