//! File and directory node types.
//!
//! Nodes are shared as `Arc<Node>`. A directory owns its children; a child
//! only holds a `Weak` back-reference to its parent, used to rebuild the
//! full path.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use compact_str::CompactString;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{ReadError, TreeError};

/// A single file or directory in the tree.
pub struct Node {
    /// File/directory name (not full path). For a root, the path it was built from.
    name: CompactString,

    /// Name as found on disk. Differs from `name` only when it is not valid UTF-8.
    os_name: OsString,

    /// Owning directory, empty for a root or a detached node.
    parent: RwLock<Weak<Node>>,

    /// Set while the node sits in some directory's children.
    attached: AtomicBool,

    /// `Some` for directories (even when empty), `None` for files.
    children: Option<RwLock<Vec<Arc<Node>>>>,

    /// Failure recorded while listing this node as a directory.
    error: OnceLock<ReadError>,
}

impl Node {
    fn new(
        name: CompactString,
        os_name: OsString,
        parent: Option<&Arc<Node>>,
        is_dir: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            os_name,
            parent: RwLock::new(parent.map(Arc::downgrade).unwrap_or_default()),
            attached: AtomicBool::new(false),
            children: is_dir.then(|| RwLock::new(Vec::new())),
            error: OnceLock::new(),
        })
    }

    /// Create a new directory node.
    ///
    /// `parent` only sets the back-reference so the full path can be
    /// resolved; the node is not attached until the parent's
    /// [`Node::add_child`] is called.
    pub fn new_directory(name: impl Into<CompactString>, parent: Option<&Arc<Node>>) -> Arc<Self> {
        let name = name.into();
        let os_name = OsString::from(name.as_str());
        Self::new(name, os_name, parent, true)
    }

    /// Create a new file node. See [`Node::new_directory`] for `parent`.
    pub fn new_file(name: impl Into<CompactString>, parent: Option<&Arc<Node>>) -> Arc<Self> {
        let name = name.into();
        let os_name = OsString::from(name.as_str());
        Self::new(name, os_name, parent, false)
    }

    /// Create a node from a name read off disk, which need not be UTF-8.
    ///
    /// [`Node::filename`] shows the name lossily; [`Node::full_path`] keeps
    /// the exact bytes.
    pub fn from_os_name(
        os_name: impl Into<OsString>,
        is_dir: bool,
        parent: Option<&Arc<Node>>,
    ) -> Arc<Self> {
        let os_name = os_name.into();
        let name = CompactString::new(os_name.to_string_lossy());
        Self::new(name, os_name, parent, is_dir)
    }

    /// Create a parentless directory node for the given path.
    pub fn root(path: impl Into<CompactString>) -> Arc<Self> {
        Self::new_directory(path, None)
    }

    /// Create a parentless directory node for a filesystem path.
    pub fn root_at(path: impl AsRef<Path>) -> Arc<Self> {
        Self::from_os_name(path.as_ref().as_os_str(), true, None)
    }

    /// Get the node name.
    pub fn filename(&self) -> &str {
        &self.name
    }

    /// Get the node name exactly as it appears on disk.
    pub fn os_name(&self) -> &OsStr {
        &self.os_name
    }

    /// Get the owning directory, if the node is attached and the parent is alive.
    pub fn parent(&self) -> Option<Arc<Node>> {
        self.parent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    /// Check if this node is a directory.
    pub fn is_directory(&self) -> bool {
        self.children.is_some()
    }

    /// Get the number of direct children, 0 for files.
    pub fn len(&self) -> usize {
        self.children
            .as_ref()
            .map_or(0, |c| c.read().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Check if the node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the children in order. Empty for files.
    ///
    /// Later insertions or removals are not reflected in the returned vector.
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.children.as_ref().map_or_else(Vec::new, |c| {
            c.read().unwrap_or_else(PoisonError::into_inner).clone()
        })
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<Arc<Node>> {
        let children = self.children.as_ref()?;
        children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Read error recorded on this node, if any.
    pub fn error(&self) -> Option<&ReadError> {
        self.error.get()
    }

    /// Record the failure to list this node. Only one error can be stored.
    pub fn set_error(&self, error: ReadError) -> Result<(), TreeError> {
        self.error.set(error).map_err(|_| TreeError::ErrorAlreadySet {
            name: self.name.clone(),
        })
    }

    /// Path from the root to this node.
    pub fn full_path(&self) -> PathBuf {
        let mut names = vec![self.os_name.clone()];
        let mut current = self.parent();
        while let Some(node) = current {
            names.push(node.os_name.clone());
            current = node.parent();
        }
        names.iter().rev().collect()
    }

    /// Path from the root to this node, as a string.
    pub fn full_filename(&self) -> String {
        self.full_path().to_string_lossy().into_owned()
    }

    /// Attach `child` at the end of this directory's children.
    ///
    /// The child's back-reference is pointed at `self`. Concurrent calls on
    /// the same directory are serialized, and of several concurrent calls
    /// attaching the same child at most one succeeds.
    ///
    /// The ancestor check walks parent links without a tree-wide lock, so it
    /// does not guard against two threads attaching two detached subtrees
    /// beneath each other at the same moment.
    pub fn add_child(self: &Arc<Self>, child: Arc<Node>) -> Result<(), TreeError> {
        let children = self.children.as_ref().ok_or_else(|| TreeError::NotADirectory {
            name: self.name.clone(),
        })?;

        if Arc::ptr_eq(self, &child) || self.has_ancestor(&child) {
            return Err(TreeError::Cycle {
                name: child.name.clone(),
            });
        }

        // Claiming the child first makes attachment exclusive across parents.
        if child
            .attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TreeError::AlreadyAttached {
                name: child.name.clone(),
                parent: child.parent().map(|p| p.name.clone()).unwrap_or_default(),
            });
        }

        let result = self.push_claimed(children, &child);
        if result.is_err() {
            child.attached.store(false, Ordering::Release);
        }
        result
    }

    fn push_claimed(
        self: &Arc<Self>,
        children: &RwLock<Vec<Arc<Node>>>,
        child: &Arc<Node>,
    ) -> Result<(), TreeError> {
        let mut children = children.write().map_err(|_| self.poisoned())?;
        if children.iter().any(|c| c.os_name == child.os_name) {
            return Err(TreeError::DuplicateName {
                parent: self.name.clone(),
                name: child.name.clone(),
            });
        }

        *child.parent.write().map_err(|_| child.poisoned())? = Arc::downgrade(self);
        children.push(child.clone());
        Ok(())
    }

    /// Detach `child` from this directory and return it.
    ///
    /// The child's back-reference is cleared; its own subtree is untouched.
    pub fn remove_child(&self, child: &Arc<Node>) -> Result<Arc<Node>, TreeError> {
        self.remove_where(|c| Arc::ptr_eq(c, child), &child.name)
    }

    /// Detach the child with the given name and return it.
    pub fn remove_child_named(&self, name: &str) -> Result<Arc<Node>, TreeError> {
        self.remove_where(|c| c.name == name, name)
    }

    fn remove_where(
        &self,
        matches: impl Fn(&Arc<Node>) -> bool,
        name: &str,
    ) -> Result<Arc<Node>, TreeError> {
        let children = self.children.as_ref().ok_or_else(|| TreeError::NotADirectory {
            name: self.name.clone(),
        })?;
        let mut children = children.write().map_err(|_| self.poisoned())?;

        let index = children
            .iter()
            .position(matches)
            .ok_or_else(|| TreeError::NotAChild {
                parent: self.name.clone(),
                child: name.into(),
            })?;

        let removed = children.remove(index);
        *removed.parent.write().map_err(|_| removed.poisoned())? = Weak::new();
        removed.attached.store(false, Ordering::Release);
        Ok(removed)
    }

    /// Count nodes in this subtree, including this node.
    pub fn count_nodes(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|c| c.count_nodes())
            .sum::<usize>()
    }

    /// Visit this subtree depth-first in child order. The root has depth 0.
    pub fn walk(self: &Arc<Self>, visit: &mut impl FnMut(&Arc<Node>, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at(self: &Arc<Self>, depth: usize, visit: &mut impl FnMut(&Arc<Node>, usize)) {
        visit(self, depth);
        for child in self.children() {
            child.walk_at(depth + 1, visit);
        }
    }

    fn has_ancestor(&self, node: &Arc<Node>) -> bool {
        let mut current = self.parent();
        while let Some(ancestor) = current {
            if Arc::ptr_eq(&ancestor, node) {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }

    fn poisoned(&self) -> TreeError {
        TreeError::Poisoned {
            name: self.name.clone(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("is_directory", &self.is_directory())
            .field("len", &self.len())
            .field("error", &self.error())
            .finish()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("name", self.name.as_str())?;
        state.serialize_field(
            "kind",
            if self.is_directory() { "directory" } else { "file" },
        )?;
        match self.error() {
            Some(err) => state.serialize_field("error", &err.to_string())?,
            None => state.skip_field("error")?,
        }
        if self.is_directory() {
            let children = self.children();
            let children: Vec<&Node> = children.iter().map(Arc::as_ref).collect();
            state.serialize_field("children", &children)?;
        } else {
            state.skip_field("children")?;
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_node_creation() {
        let node = Node::new_file("test.txt", None);
        assert!(!node.is_directory());
        assert_eq!(node.len(), 0);
        assert!(node.children().is_empty());
        assert!(node.parent().is_none());
    }

    #[test]
    fn test_directory_node_creation() {
        let node = Node::root("test_dir");
        assert!(node.is_directory());
        assert!(node.is_empty());
        assert_eq!(node.filename(), "test_dir");
    }

    #[test]
    fn test_parent_hint_is_not_attachment() {
        let root = Node::root("root");
        let child = Node::new_file("a", Some(&root));

        assert_eq!(child.full_filename(), "root/a");
        assert_eq!(root.len(), 0);

        root.add_child(child).unwrap();
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn test_add_child_to_file_fails() {
        let file = Node::new_file("f", None);
        let err = file.add_child(Node::new_file("g", None)).unwrap_err();
        assert!(matches!(err, TreeError::NotADirectory { .. }));
    }

    #[test]
    fn test_set_error_once() {
        let node = Node::root("d");
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        node.set_error(ReadError::io("d", err)).unwrap();
        assert!(matches!(node.error(), Some(ReadError::NotFound { .. })));

        let again = std::io::Error::other("again");
        assert!(matches!(
            node.set_error(ReadError::io("d", again)),
            Err(TreeError::ErrorAlreadySet { .. })
        ));
    }

    #[test]
    fn test_cannot_attach_self() {
        let root = Node::root("r");
        assert!(matches!(
            root.add_child(root.clone()),
            Err(TreeError::Cycle { .. })
        ));
    }

    #[test]
    fn test_rejected_duplicate_can_attach_elsewhere() {
        let first = Node::root("first");
        let second = Node::root("second");
        first.add_child(Node::new_file("x", None)).unwrap();

        let x = Node::new_file("x", None);
        assert!(matches!(
            first.add_child(x.clone()),
            Err(TreeError::DuplicateName { .. })
        ));
        second.add_child(x.clone()).unwrap();
        assert!(Arc::ptr_eq(&x.parent().unwrap(), &second));
    }

    #[test]
    fn test_removed_child_can_be_reattached() {
        let a = Node::root("a");
        let b = Node::root("b");
        let child = Node::new_file("c", None);

        a.add_child(child.clone()).unwrap();
        assert!(matches!(
            b.add_child(child.clone()),
            Err(TreeError::AlreadyAttached { .. })
        ));

        a.remove_child(&child).unwrap();
        b.add_child(child.clone()).unwrap();
        assert_eq!(child.full_filename(), "b/c");
    }

    #[cfg(unix)]
    #[test]
    fn test_full_path_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"caf\xe9");
        let root = Node::root_at("/tmp/base");
        let dir = Node::from_os_name(raw, true, None);
        root.add_child(dir.clone()).unwrap();

        assert_eq!(dir.os_name(), raw);
        assert_eq!(dir.filename(), "caf\u{FFFD}");
        assert_eq!(dir.full_path(), Path::new("/tmp/base").join(raw));
    }

    #[cfg(unix)]
    #[test]
    fn test_names_unique_by_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        // Both decode to the same lossy display name.
        let root = Node::root("r");
        root.add_child(Node::from_os_name(OsStr::from_bytes(b"a\xff"), false, None))
            .unwrap();
        root.add_child(Node::from_os_name(OsStr::from_bytes(b"a\xfe"), false, None))
            .unwrap();
        assert_eq!(root.len(), 2);
    }
}
