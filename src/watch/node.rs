//! Snapshot tree arena.
//!
//! Nodes are addressed by `NodeId`; a directory maps child names to ids.
//! Freed slots are recycled so a long-running observer over a churning tree
//! does not grow without bound.

use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Index of a node inside its `Tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What the last completed pass saw at a node's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Not on disk (or never observed).
    Unknown,
    File,
    Directory,
}

impl NodeKind {
    pub fn of(meta: &Metadata) -> Self {
        if meta.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }
}

/// Modification marker: mtime plus length.
///
/// Length catches same-second rewrites on filesystems with coarse mtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl Stamp {
    pub fn of(meta: &Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
            len: if meta.is_dir() { 0 } else { meta.len() },
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub path: PathBuf,
    /// `None` means "never seen".
    pub stamp: Option<Stamp>,
    pub kind: NodeKind,
    pub children: BTreeMap<String, NodeId>,
}

impl Node {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            stamp: None,
            kind: NodeKind::Unknown,
            children: BTreeMap::new(),
        }
    }
}

/// Arena holding one observer's snapshot.
#[derive(Debug)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Tree {
    pub fn new(root: &Path) -> Self {
        Self {
            slots: vec![Some(Node::new(root.to_path_buf()))],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate an unseen node for `path`.
    pub fn alloc(&mut self, path: PathBuf) -> NodeId {
        let node = Some(Node::new(path));
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = node;
                NodeId(index)
            }
            None => {
                self.slots.push(node);
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Release a node and its whole subtree. The root is never released.
    pub fn release(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.slots[id.0].take() {
                pending.extend(node.children.into_values());
                self.free.push(id.0);
            }
        }
    }

    pub fn get(&self, id: NodeId) -> &Node {
        match &self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("dangling node id {}", id.0),
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("dangling node id {}", id.0),
        }
    }

    /// Number of live nodes, root included.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
