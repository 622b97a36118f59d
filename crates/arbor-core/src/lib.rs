//! Core types for arbor.
//!
//! This crate provides the in-memory directory tree used throughout arbor:
//! the shared [`Node`] type with its parent back-references, the error
//! taxonomy, and build configuration.

mod config;
mod error;
mod node;
mod tree;

pub use config::{BuildConfig, BuildConfigBuilder, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_STACK_SIZE};
pub use error::{BuildError, ReadError, TreeError};
pub use node::Node;
pub use tree::{BuiltTree, TreeStats};
