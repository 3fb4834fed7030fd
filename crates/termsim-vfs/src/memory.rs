//! In-memory VFS implementation.
//!
//! The entire file tree lives in a `BTreeMap<String, Node>` keyed by
//! normalized absolute path. Directory nodes additionally carry their child
//! names in creation order; the two views are kept consistent by every
//! mutating operation and can be audited with [`MemoryVfs::check_invariants`].

use std::collections::BTreeMap;

use termsim_types::error::{Result, SimError};
use termsim_types::node::Node;

use crate::EntryKind;
use crate::path::{file_name, join, normalize, parent};

/// A fully in-memory virtual file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryVfs {
    nodes: BTreeMap<String, Node>,
}

impl MemoryVfs {
    /// Create a new in-memory VFS with only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::empty_dir());
        Self { nodes }
    }

    /// Build a VFS from a lesson snapshot.
    ///
    /// Keys are normalized, missing ancestor directories are created, and
    /// nodes their parent does not list are appended to it (in key order).
    /// A child list naming a node that does not exist is rejected.
    pub fn from_snapshot(snapshot: &BTreeMap<String, Node>) -> Result<Self> {
        let mut vfs = Self::new();
        for (raw, node) in snapshot {
            let key = normalize(raw).into_owned();
            match (vfs.nodes.get_mut(&key), node) {
                // Created earlier as an implicit ancestor; merge listed children.
                (Some(Node::Dir { children }), Node::Dir { children: listed }) => {
                    for name in listed {
                        if !children.contains(name) {
                            children.push(name.clone());
                        }
                    }
                },
                (Some(_), _) => {
                    return Err(SimError::Invariant(format!(
                        "snapshot defines {key} twice or as both file and directory"
                    )));
                },
                (None, _) => {
                    vfs.nodes.insert(key.clone(), node.clone());
                },
            }
            vfs.link_ancestors(&key)?;
        }
        vfs.check_invariants()?;
        log::debug!("loaded VFS snapshot with {} nodes", vfs.nodes.len());
        Ok(vfs)
    }

    /// Ensure every ancestor of `path` exists and lists the next segment.
    fn link_ancestors(&mut self, path: &str) -> Result<()> {
        let mut child = path.to_string();
        while child != "/" {
            let par = parent(&child).to_string();
            let name = file_name(&child).to_string();
            match self
                .nodes
                .entry(par.clone())
                .or_insert_with(Node::empty_dir)
            {
                Node::Dir { children } => {
                    if !children.contains(&name) {
                        children.push(name);
                    }
                },
                Node::File { .. } => {
                    return Err(SimError::Invariant(format!(
                        "{par} is a file but has child {name}"
                    )));
                },
            }
            child = par;
        }
        Ok(())
    }

    /// Look up a node.
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.nodes.get(normalize(path).as_ref())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn kind(&self, path: &str) -> Option<EntryKind> {
        self.get(path).map(|n| match n {
            Node::Dir { .. } => EntryKind::Directory,
            Node::File { .. } => EntryKind::File,
        })
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.kind(path) == Some(EntryKind::Directory)
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.kind(path) == Some(EntryKind::File)
    }

    /// Child names of a directory, in creation order.
    pub fn children(&self, path: &str) -> Result<&[String]> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir { children }) => Ok(children),
            Some(Node::File { .. }) => Err(SimError::Vfs(format!("not a directory: {path}"))),
            None => Err(SimError::Vfs(format!("no such directory: {path}"))),
        }
    }

    /// Contents of a file.
    pub fn read(&self, path: &str) -> Result<&str> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File { content }) => Ok(content),
            Some(Node::Dir { .. }) => Err(SimError::Vfs(format!("is a directory: {path}"))),
            None => Err(SimError::Vfs(format!("no such file: {path}"))),
        }
    }

    /// Parent directory's child list, for mutation.
    fn parent_children(&mut self, path: &str) -> Result<&mut Vec<String>> {
        let par = parent(path);
        match self.nodes.get_mut(par) {
            Some(Node::Dir { children }) => Ok(children),
            Some(Node::File { .. }) => Err(SimError::Vfs(format!("not a directory: {par}"))),
            None => Err(SimError::Vfs(format!(
                "parent directory does not exist: {par}"
            ))),
        }
    }

    /// Insert a brand-new node and append it to its parent's child list.
    fn insert_new(&mut self, path: &str, node: Node) -> Result<()> {
        let name = file_name(path).to_string();
        let siblings = self.parent_children(path)?;
        if !siblings.contains(&name) {
            siblings.push(name);
        }
        self.nodes.insert(path.to_string(), node);
        Ok(())
    }

    /// Create a directory. The parent must exist; the path must not.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if self.nodes.contains_key(path.as_ref()) {
            return Err(SimError::Vfs(format!("file exists: {path}")));
        }
        self.insert_new(&path, Node::empty_dir())
    }

    /// Create a directory unless one already exists. Returns whether it was
    /// created.
    pub fn ensure_dir(&mut self, path: &str) -> Result<bool> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir { .. }) => Ok(false),
            Some(Node::File { .. }) => Err(SimError::Vfs(format!("not a directory: {path}"))),
            None => {
                self.insert_new(&path, Node::empty_dir())?;
                Ok(true)
            },
        }
    }

    /// Create or overwrite a file. Returns whether it was created.
    pub fn write(&mut self, path: &str, content: &str) -> Result<bool> {
        let path = normalize(path);
        match self.nodes.get_mut(path.as_ref()) {
            Some(Node::File { content: existing }) => {
                content.clone_into(existing);
                Ok(false)
            },
            Some(Node::Dir { .. }) => Err(SimError::Vfs(format!("is a directory: {path}"))),
            None => {
                self.insert_new(&path, Node::file(content))?;
                Ok(true)
            },
        }
    }

    /// Create an empty file if nothing exists at `path`. Returns whether it
    /// was created.
    pub fn touch(&mut self, path: &str) -> Result<bool> {
        let path = normalize(path);
        if self.nodes.contains_key(path.as_ref()) {
            return Ok(false);
        }
        self.insert_new(&path, Node::file(""))?;
        Ok(true)
    }

    /// Move a node (and, for directories, everything beneath it) to a new
    /// path. Within one directory the child-list entry is replaced in place;
    /// across directories it is removed from the old parent and appended to
    /// the new one.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let from = normalize(from).into_owned();
        let to = normalize(to).into_owned();
        if from == "/" {
            return Err(SimError::Vfs("cannot move root".to_string()));
        }
        if !self.nodes.contains_key(&from) {
            return Err(SimError::Vfs(format!("no such path: {from}")));
        }
        if from == to {
            return Ok(());
        }
        if self.nodes.contains_key(&to) {
            return Err(SimError::Vfs(format!("file exists: {to}")));
        }
        let prefix = format!("{from}/");
        if to.starts_with(&prefix) {
            return Err(SimError::Vfs(format!(
                "cannot move {from} into itself"
            )));
        }
        // Validate the destination parent before touching anything.
        self.parent_children(&to)?;

        let moved: Vec<String> = std::iter::once(from.clone())
            .chain(
                self.nodes
                    .range(prefix.clone()..)
                    .take_while(|(k, _)| k.starts_with(&prefix))
                    .map(|(k, _)| k.clone()),
            )
            .collect();
        for old in moved {
            if let Some(node) = self.nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                self.nodes.insert(new, node);
            }
        }

        let old_name = file_name(&from).to_string();
        let new_name = file_name(&to).to_string();
        if parent(&from) == parent(&to) {
            let siblings = self.parent_children(&to)?;
            if let Some(slot) = siblings.iter_mut().find(|c| **c == old_name) {
                *slot = new_name;
            }
        } else {
            self.parent_children(&from)?.retain(|c| *c != old_name);
            self.parent_children(&to)?.push(new_name);
        }
        Ok(())
    }

    /// Audit the path map against the child lists.
    ///
    /// Every non-root path must be listed exactly once by its parent, and
    /// every listed child must exist. A failure here is a defect in the
    /// engine or the snapshot, never a user error.
    pub fn check_invariants(&self) -> Result<()> {
        if !matches!(self.nodes.get("/"), Some(Node::Dir { .. })) {
            return Err(SimError::Invariant("root is not a directory".into()));
        }
        for (path, node) in &self.nodes {
            if normalize(path) != path.as_str() {
                return Err(SimError::Invariant(format!("unnormalized key {path}")));
            }
            if let Node::Dir { children } = node {
                for (i, name) in children.iter().enumerate() {
                    if name.is_empty() || name.contains('/') {
                        return Err(SimError::Invariant(format!(
                            "{path} lists invalid child name {name:?}"
                        )));
                    }
                    if children[..i].contains(name) {
                        return Err(SimError::Invariant(format!(
                            "{path} lists {name} twice"
                        )));
                    }
                    if !self.nodes.contains_key(&join(path, name)) {
                        return Err(SimError::Invariant(format!(
                            "{path} lists missing child {name}"
                        )));
                    }
                }
            }
            if path != "/" {
                let listed = match self.nodes.get(parent(path)) {
                    Some(Node::Dir { children }) => {
                        children.iter().any(|c| c == file_name(path))
                    },
                    _ => false,
                };
                if !listed {
                    return Err(SimError::Invariant(format!(
                        "{path} is not listed by its parent"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}
