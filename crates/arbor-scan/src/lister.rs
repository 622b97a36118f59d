//! Directory listing source.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    /// Entry name exactly as the filesystem reports it.
    pub name: OsString,
    /// Whether the entry is a directory. Symlinks are not followed.
    pub is_dir: bool,
}

impl ListedEntry {
    pub fn new(name: impl Into<OsString>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
        }
    }
}

/// Reads the entries of one directory.
///
/// The builder calls this once per directory, from several threads at once.
/// Order of the returned entries does not matter; the builder sorts them.
pub trait DirLister: Send + Sync + fmt::Debug {
    /// List `path`. Any error fails the listing of that directory only.
    fn list(&self, path: &Path) -> io::Result<Vec<ListedEntry>>;
}

/// Lists directories through [`std::fs::read_dir`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirLister for FsLister {
    fn list(&self, path: &Path) -> io::Result<Vec<ListedEntry>> {
        fs::read_dir(path)?
            .map(|entry| {
                let entry = entry?;
                // `DirEntry::file_type` does not traverse symlinks.
                let file_type = entry.file_type()?;
                Ok(ListedEntry::new(entry.file_name(), file_type.is_dir()))
            })
            .collect()
    }
}
