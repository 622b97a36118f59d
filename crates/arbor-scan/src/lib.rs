//! Directory tree construction for arbor.
//!
//! This crate walks a directory recursively and assembles a [`Node`] tree,
//! bounding how many directory reads are in flight at once.
//!
//! # Overview
//!
//! - **Bounded fan-out**: a subdirectory is handed to a worker thread only
//!   if a token can be taken from the shared [`TokenPool`]; otherwise it is
//!   expanded inline, so a busy pool never stalls the walk.
//! - **Deterministic order**: children always appear in listing order,
//!   whatever the concurrency limit or scheduling.
//! - **Local failures**: a directory that cannot be listed keeps its error
//!   and no children; the rest of the walk carries on.
//! - **Pluggable listing**: directories are read through a [`DirLister`],
//!   [`FsLister`] by default.
//!
//! # Example
//!
//! ```rust,no_run
//! use arbor_scan::{BuildConfig, TreeBuilder};
//!
//! let config = BuildConfig::with_limit("/path/to/walk", 16);
//! let tree = TreeBuilder::new(config).build().unwrap();
//!
//! println!("{} directories, {} files", tree.stats.total_dirs, tree.stats.total_files);
//! for child in tree.root.children() {
//!     println!("{}", child.full_filename());
//! }
//! ```

mod builder;
mod lister;
mod tokens;

pub use builder::{TreeBuilder, build, build_default};
pub use lister::{DirLister, FsLister, ListedEntry};
pub use tokens::{Token, TokenPool};

// Re-export core types for convenience
pub use arbor_core::{
    BuildConfig, BuildError, BuiltTree, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_STACK_SIZE, Node,
    ReadError, TreeError, TreeStats,
};
