//! Polling snapshot/diff of one directory tree.
//!
//! `check()` walks the snapshot depth first and reconciles it with the disk:
//!
//! ```text
//! gone from disk      → delete children bottom-up, then the node
//! never seen          → create the node, then its children top-down
//! file ↔ directory    → delete the old subtree, then create
//! stamp differs       → change
//! directory           → diff the listing against the known children
//! ```
//!
//! A path that vanishes between listing and stat is simply not created (or is
//! deleted), never an error.
//!
//! The snapshot lock covers the diff only. Listeners run with no lock held, so
//! a callback may trigger another pass; one that overlaps a running pass on
//! the same observer is skipped.

use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::event::{ChangeEvent, ChangeKind, EntryKind, Listener};
use super::node::{NodeId, NodeKind, Stamp, Tree};
use crate::utils::path::normalize_path;
use crate::{debug, log};

/// Watches one root directory by polling.
pub struct Observer {
    root: PathBuf,
    tree: Mutex<Tree>,
    in_pass: AtomicBool,
    listeners: ArcSwap<Vec<Arc<dyn Listener>>>,
}

impl Observer {
    /// Watch `root`, keyed by its normalized form so event paths agree with
    /// every other component that normalizes the same root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = normalize_path(&root.into());
        Self {
            tree: Mutex::new(Tree::new(&root)),
            in_pass: AtomicBool::new(false),
            root,
            listeners: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        self.listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&listener));
            next
        });
    }

    /// Remove a listener by identity. Returns whether it was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn Listener>) -> bool {
        let mut removed = false;
        self.listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.retain(|l| !std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
            removed = next.len() != current.len();
            next
        });
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.load().len()
    }

    /// Run one pass and deliver its events. Returns the number of events.
    ///
    /// Without listeners this returns immediately and leaves the snapshot
    /// untouched. While another pass on this observer is running (on another
    /// thread, or further up this thread's stack) the call is skipped and
    /// returns 0.
    pub fn check(&self) -> usize {
        let listeners = self.listeners.load_full();
        if listeners.is_empty() {
            return 0;
        }

        let Some(_pass) = PassGuard::acquire(&self.in_pass) else {
            debug!("watch"; "pass already running for {}", self.root.display());
            return 0;
        };

        for listener in listeners.iter() {
            self.guard("on_start", || listener.on_start(&self.root));
        }

        let mut events = Vec::new();
        {
            let mut tree = self.tree.lock();
            let root = tree.root();
            refresh(&mut tree, root, &mut events);
        }

        for event in &events {
            debug!("watch"; "{}", event);
            for listener in listeners.iter() {
                self.guard("on_event", || listener.on_event(event));
            }
        }

        for listener in listeners.iter() {
            self.guard("on_stop", || listener.on_stop(&self.root));
        }

        events.len()
    }

    /// Contain a listener panic so the rest of the pass still runs.
    fn guard(&self, phase: &str, f: impl FnOnce()) {
        if catch_unwind(AssertUnwindSafe(f)).is_err() {
            log!("watch"; "listener panicked in {} for {}", phase, self.root.display());
        }
    }

    /// Live snapshot nodes, root included.
    #[cfg(test)]
    pub(super) fn node_count(&self) -> usize {
        self.tree.lock().len()
    }
}

/// Marks a pass as running until dropped.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// diff
// ============================================================================

fn refresh(tree: &mut Tree, id: NodeId, events: &mut Vec<ChangeEvent>) {
    let meta = match fs::metadata(&tree.get(id).path) {
        Ok(meta) => meta,
        Err(_) => {
            if tree.get(id).kind != NodeKind::Unknown {
                delete(tree, id, events);
            }
            return;
        }
    };

    let kind = NodeKind::of(&meta);
    let stamp = Stamp::of(&meta);
    let (known, last_stamp) = {
        let node = tree.get(id);
        (node.kind, node.stamp)
    };

    match known {
        NodeKind::Unknown => create(tree, id, kind, stamp, events),
        known if known != kind => {
            delete(tree, id, events);
            create(tree, id, kind, stamp, events);
        }
        _ => {
            if last_stamp != Some(stamp) {
                let node = tree.get_mut(id);
                node.stamp = Some(stamp);
                events.push(ChangeEvent::new(
                    ChangeKind::Changed,
                    entry_kind(kind),
                    node.path.clone(),
                ));
            }
            if kind == NodeKind::Directory {
                sync_children(tree, id, events);
            }
        }
    }
}

fn create(tree: &mut Tree, id: NodeId, kind: NodeKind, stamp: Stamp, events: &mut Vec<ChangeEvent>) {
    let node = tree.get_mut(id);
    node.kind = kind;
    node.stamp = Some(stamp);
    events.push(ChangeEvent::new(
        ChangeKind::Created,
        entry_kind(kind),
        node.path.clone(),
    ));

    if kind == NodeKind::Directory {
        sync_children(tree, id, events);
    }
}

/// Delete a node's subtree bottom-up, then the node itself.
fn delete(tree: &mut Tree, id: NodeId, events: &mut Vec<ChangeEvent>) {
    let children = std::mem::take(&mut tree.get_mut(id).children);
    for child in children.into_values() {
        if tree.get(child).kind != NodeKind::Unknown {
            delete(tree, child, events);
        }
        tree.release(child);
    }

    let node = tree.get_mut(id);
    events.push(ChangeEvent::new(
        ChangeKind::Deleted,
        entry_kind(node.kind),
        node.path.clone(),
    ));
    node.kind = NodeKind::Unknown;
    node.stamp = None;
}

/// Reconcile a directory's children with its current listing.
fn sync_children(tree: &mut Tree, id: NodeId, events: &mut Vec<ChangeEvent>) {
    let listing = list_dir(&tree.get(id).path);

    let gone: Vec<(String, NodeId)> = tree
        .get(id)
        .children
        .iter()
        .filter(|(name, _)| {
            listing
                .binary_search_by(|(n, _)| n.as_str().cmp(name.as_str()))
                .is_err()
        })
        .map(|(name, &child)| (name.clone(), child))
        .collect();
    for (name, child) in gone {
        if tree.get(child).kind != NodeKind::Unknown {
            delete(tree, child, events);
        }
        tree.get_mut(id).children.remove(&name);
        tree.release(child);
    }

    for (name, path) in listing {
        let child = match tree.get(id).children.get(&name) {
            Some(&child) => child,
            None => {
                let child = tree.alloc(path);
                tree.get_mut(id).children.insert(name.clone(), child);
                child
            }
        };

        refresh(tree, child, events);

        // Vanished between listing and stat.
        if tree.get(child).kind == NodeKind::Unknown {
            tree.get_mut(id).children.remove(&name);
            tree.release(child);
        }
    }
}

/// Directory entries sorted by name. Symlinked directories are skipped so a
/// link cycle cannot recurse forever.
fn list_dir(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut listing: Vec<_> = entries
        .flatten()
        .filter(|entry| {
            let linked_dir = entry.file_type().is_ok_and(|t| t.is_symlink()) && entry.path().is_dir();
            if linked_dir {
                debug!("watch"; "skipping symlinked directory {}", entry.path().display());
            }
            !linked_dir
        })
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect();
    listing.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    listing
}

fn entry_kind(kind: NodeKind) -> EntryKind {
    match kind {
        NodeKind::Directory => EntryKind::Directory,
        NodeKind::File | NodeKind::Unknown => EntryKind::File,
    }
}
