//! Error types for tree construction.

use std::path::PathBuf;

use compact_str::CompactString;
use thiserror::Error;

/// Failure to list a directory's entries.
///
/// Recorded on the node that could not be read. It never aborts a build.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Path exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReadError {
    /// Create a read error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path of the directory that failed to list.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. } => path,
        }
    }
}

/// Violation of a tree structure invariant.
///
/// These indicate a defect in the caller or the builder, not a runtime
/// condition worth retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A child operation was attempted on a file node.
    #[error("'{name}' is a file and cannot hold children")]
    NotADirectory { name: CompactString },

    /// The addressed node is not among the parent's children.
    #[error("'{child}' is not a child of '{parent}'")]
    NotAChild {
        parent: CompactString,
        child: CompactString,
    },

    /// The node is already attached to another directory.
    #[error("'{name}' is already attached to '{parent}'")]
    AlreadyAttached {
        name: CompactString,
        parent: CompactString,
    },

    /// A sibling with the same name already exists.
    #[error("'{parent}' already contains an entry named '{name}'")]
    DuplicateName {
        parent: CompactString,
        name: CompactString,
    },

    /// Attaching the node would make it its own ancestor.
    #[error("'{name}' cannot be attached beneath itself")]
    Cycle { name: CompactString },

    /// A read error was recorded twice on the same node.
    #[error("a read error is already recorded on '{name}'")]
    ErrorAlreadySet { name: CompactString },

    /// A lock guarding node state was poisoned by a panicking thread.
    #[error("lock on '{name}' was poisoned")]
    Poisoned { name: CompactString },
}

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The worker thread pool could not be created.
    #[error("Failed to start worker pool: {message}")]
    ThreadPool { message: String },

    /// Tree invariant violated while assembling nodes.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
