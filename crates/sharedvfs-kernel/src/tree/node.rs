//! Node model and arena storage.
//!
//! Nodes live in a slot arena. A parent owns its children through the
//! `children` map of ids; a child refers back to its parent by id only, so
//! upward walks (depth, ancestor checks) never hold a borrow on the parent.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use strum::Display;

/// Index of a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The four kinds of node. Declaration order is the print order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Root,
    Volume,
    Directory,
    File,
}

impl NodeKind {
    /// Volumes and directories accept new directories and files.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Volume | Self::Directory)
    }
}

/// Case-folded sibling key.
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Child ids keyed by folded name; iteration is case-insensitive name order.
pub(crate) type Children = BTreeMap<String, NodeId>;

/// Kind-specific payload.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Root { children: Children },
    Volume { children: Children },
    Directory { children: Children },
    File { lock_holders: BTreeSet<String> },
}

impl Entry {
    pub(crate) fn directory() -> Self {
        Entry::Directory {
            children: Children::new(),
        }
    }

    pub(crate) fn file() -> Self {
        Entry::File {
            lock_holders: BTreeSet::new(),
        }
    }

    /// A fresh entry of the same kind, without children or locks.
    pub(crate) fn empty_like(&self) -> Self {
        match self {
            Entry::Root { .. } => Entry::Root {
                children: Children::new(),
            },
            Entry::Volume { .. } => Entry::Volume {
                children: Children::new(),
            },
            Entry::Directory { .. } => Entry::directory(),
            Entry::File { .. } => Entry::file(),
        }
    }
}

/// A node in the namespace tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) entry: Entry,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, entry: Entry) -> Self {
        Self {
            name: name.into(),
            parent: None,
            entry,
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self.entry {
            Entry::Root { .. } => NodeKind::Root,
            Entry::Volume { .. } => NodeKind::Volume,
            Entry::Directory { .. } => NodeKind::Directory,
            Entry::File { .. } => NodeKind::File,
        }
    }

    pub(crate) fn children(&self) -> Option<&Children> {
        match &self.entry {
            Entry::Root { children }
            | Entry::Volume { children }
            | Entry::Directory { children } => Some(children),
            Entry::File { .. } => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        match &mut self.entry {
            Entry::Root { children }
            | Entry::Volume { children }
            | Entry::Directory { children } => Some(children),
            Entry::File { .. } => None,
        }
    }

    /// Child ids in case-insensitive name order (files have none).
    pub(crate) fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children().into_iter().flat_map(|c| c.values().copied())
    }

    pub(crate) fn lock_holders(&self) -> Option<&BTreeSet<String>> {
        match &self.entry {
            Entry::File { lock_holders } => Some(lock_holders),
            _ => None,
        }
    }

    pub(crate) fn lock_holders_mut(&mut self) -> Option<&mut BTreeSet<String>> {
        match &mut self.entry {
            Entry::File { lock_holders } => Some(lock_holders),
            _ => None,
        }
    }

    /// A file with at least one lock holder.
    pub(crate) fn is_locked(&self) -> bool {
        self.lock_holders().is_some_and(|holders| !holders.is_empty())
    }
}

/// Slot arena owning every node of one tree.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
}

impl NodeArena {
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Release a slot. Children are not touched.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id.0)?.take();
        if node.is_some() {
            self.free.push(id.0);
        }
        node
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.slots[id.0].as_ref().expect("dangling node id")
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots[id.0].as_mut().expect("dangling node id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order_puts_directories_first() {
        assert!(NodeKind::Directory < NodeKind::File);
        assert!(NodeKind::Volume < NodeKind::Directory);
    }

    #[test]
    fn test_arena_reuses_slots() {
        let mut arena = NodeArena::default();
        let a = arena.insert(Node::new("a", Entry::file()));
        let _b = arena.insert(Node::new("b", Entry::file()));
        assert_eq!(arena.len(), 2);

        assert!(arena.remove(a).is_some());
        assert_eq!(arena.len(), 1);

        let c = arena.insert(Node::new("c", Entry::directory()));
        assert_eq!(c, a);
        assert_eq!(arena[c].name, "c");
    }

    #[test]
    fn test_remove_twice_is_harmless() {
        let mut arena = NodeArena::default();
        let a = arena.insert(Node::new("a", Entry::file()));
        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_file_has_no_children() {
        let node = Node::new("f", Entry::file());
        assert!(node.children().is_none());
        assert_eq!(node.child_ids().count(), 0);
        assert!(!node.is_locked());
    }

    #[test]
    fn test_empty_like_drops_locks() {
        let mut node = Node::new("f", Entry::file());
        node.lock_holders_mut().unwrap().insert("alice".into());
        assert!(node.is_locked());
        let copy = Node::new("f", node.entry.empty_like());
        assert!(!copy.is_locked());
    }
}
