//! The namespace tree engine.
//!
//! A [`NamespaceTree`] owns a synthetic root, the configured volumes under
//! it, and every directory and file below those. All path-taking
//! operations share one resolution algorithm:
//!
//! 1. An empty current directory means the default volume.
//! 2. A relative target is combined with the current directory.
//! 3. The result is split into segments and walked from the root, matching
//!    sibling names case-insensitively. Creating operations stop one
//!    segment short and treat the last segment as the new name.
//! 4. The kind of the node reached is checked against the operation.
//!
//! Every operation validates fully before it mutates anything, so a
//! returned error means the tree is unchanged.
//!
//! The tree itself is not synchronized. [`crate::service::VfsService`]
//! keeps it behind a single reader/writer lock: mutating calls hold the
//! write side across resolution *and* mutation.

mod node;
mod print;

use serde::Serialize;

use crate::config::VfsConfig;
use crate::error::{VfsError, VfsResult};
use crate::path::PathResolver;

pub use node::{NodeId, NodeKind};
use node::{Entry, Node, NodeArena, name_key};

/// Read-only view of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub name: String,
    pub kind: NodeKind,
    /// Normalized absolute path.
    pub path: String,
    /// Users holding a lock (files only), in name order.
    pub lock_holders: Vec<String>,
    pub child_count: usize,
}

/// Result of a copy or move: where the subtree came from and where it is now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelocateMode {
    Copy,
    Move,
}

impl RelocateMode {
    fn verb(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Self::Copy => "copied",
            Self::Move => "moved",
        }
    }
}

/// In-memory hierarchy of volumes, directories, and files.
#[derive(Debug)]
pub struct NamespaceTree {
    arena: NodeArena,
    root: NodeId,
    resolver: PathResolver,
    default_volume: String,
    show_root: bool,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new(&VfsConfig::default())
    }
}

impl NamespaceTree {
    /// Create a tree with a root and one volume per configured volume name.
    pub fn new(config: &VfsConfig) -> Self {
        let mut arena = NodeArena::default();
        let root = arena.insert(Node::new(
            config.root_name.clone(),
            Entry::Root {
                children: Default::default(),
            },
        ));

        let mut tree = Self {
            arena,
            root,
            resolver: PathResolver::new(config),
            default_volume: config.default_volume().to_string(),
            show_root: config.show_root,
        };

        for volume in config.effective_volumes() {
            if tree.find_child(root, &volume).is_some() {
                tracing::warn!(volume = %volume, "Duplicate volume name ignored");
                continue;
            }
            let id = tree.arena.insert(Node::new(
                volume,
                Entry::Volume {
                    children: Default::default(),
                },
            ));
            // Freshly created volume under the root: cannot collide or be the root.
            let _ = tree.attach(root, id);
        }

        tree
    }

    /// The path helper this tree resolves with.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// The default volume path used for an empty current directory.
    pub fn default_volume(&self) -> &str {
        &self.default_volume
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    // ========================================================================
    // Directories
    // ========================================================================

    /// Create a directory. Every segment but the last must already exist.
    pub fn make_directory(&mut self, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.create(cwd, path, Entry::directory())?;
        Ok(self.path_of(id))
    }

    /// Resolve a volume or directory without changing the tree.
    pub fn change_directory(&self, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.resolve(cwd, path)?;
        if !self.arena[id].kind().is_container() {
            return Err(VfsError::not_a_directory(format!(
                "'{}' is not a directory.",
                self.path_of(id)
            )));
        }
        Ok(self.path_of(id))
    }

    /// Remove an empty directory.
    pub fn remove_directory(&mut self, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.resolve_directory(cwd, path)?;
        let full_path = self.path_of(id);
        if self.arena[id].child_ids().next().is_some() {
            return Err(VfsError::invalid_operation(format!(
                "Directory '{full_path}' is not empty; use deltree to remove it with its contents."
            )));
        }
        self.detach(id);
        self.free_subtree(id);
        Ok(full_path)
    }

    /// Remove a directory with everything below it, unless anything is locked.
    pub fn delete_tree(&mut self, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.resolve_directory(cwd, path)?;
        let full_path = self.path_of(id);
        if self.has_locks(id) {
            return Err(VfsError::locked_content(format!(
                "Directory '{full_path}' or its subdirectories contain one or more locked files."
            )));
        }
        self.detach(id);
        self.free_subtree(id);
        Ok(full_path)
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Create an empty file. Every segment but the last must already exist.
    pub fn make_file(&mut self, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.create(cwd, path, Entry::file())?;
        Ok(self.path_of(id))
    }

    /// Delete a file. Lock holders do not prevent this.
    pub fn delete_file(&mut self, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.resolve_file(cwd, path)?;
        let full_path = self.path_of(id);
        self.detach(id);
        self.free_subtree(id);
        Ok(full_path)
    }

    /// Add `user_name` to the file's lock holders. Locks are shared.
    pub fn lock_file(&mut self, user_name: &str, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.resolve_file(cwd, path)?;
        if let Some(holders) = self.arena[id].lock_holders_mut() {
            holders.insert(user_name.to_string());
        }
        Ok(self.path_of(id))
    }

    /// Remove only `user_name`'s hold on the file.
    pub fn unlock_file(&mut self, user_name: &str, cwd: &str, path: &str) -> VfsResult<String> {
        let id = self.resolve_file(cwd, path)?;
        if let Some(holders) = self.arena[id].lock_holders_mut() {
            holders.remove(user_name);
        }
        Ok(self.path_of(id))
    }

    // ========================================================================
    // Copy / move
    // ========================================================================

    /// Copy a directory or file (with its subtree) into `dest`.
    ///
    /// Copies are fresh nodes: lock holders are not carried over.
    pub fn copy(&mut self, cwd: &str, source: &str, dest: &str) -> VfsResult<Relocation> {
        self.relocate(cwd, source, dest, RelocateMode::Copy)
    }

    /// Move a directory or file (with its subtree) into `dest`.
    pub fn move_node(&mut self, cwd: &str, source: &str, dest: &str) -> VfsResult<Relocation> {
        self.relocate(cwd, source, dest, RelocateMode::Move)
    }

    fn relocate(
        &mut self,
        cwd: &str,
        source: &str,
        dest: &str,
        mode: RelocateMode,
    ) -> VfsResult<Relocation> {
        let src = self.resolve(cwd, source)?;
        let src_kind = self.arena[src].kind();
        if !matches!(src_kind, NodeKind::Directory | NodeKind::File) {
            return Err(VfsError::invalid_operation(format!(
                "'{}' is not a directory or a file.",
                self.path_of(src)
            )));
        }

        let dst = self.resolve(cwd, dest)?;
        if !self.arena[dst].kind().is_container() {
            return Err(VfsError::not_a_directory(format!(
                "'{}' is not a volume or a directory.",
                self.path_of(dst)
            )));
        }

        let src_path = self.path_of(src);
        let dst_path = self.path_of(dst);

        if src == dst {
            return Err(VfsError::invalid_operation(
                "Source path and destination path must differ.",
            ));
        }
        if self.arena[src].parent == Some(dst) {
            return Err(VfsError::invalid_operation(format!(
                "'{src_path}' is already in '{dst_path}'."
            )));
        }
        if src_kind == NodeKind::Directory && self.is_ancestor(src, dst) {
            return Err(VfsError::invalid_operation(format!(
                "Cannot {} '{src_path}' into its own subdirectory '{dst_path}'.",
                mode.verb()
            )));
        }
        if self.has_locks(src) {
            return Err(VfsError::locked_content(format!(
                "'{src_path}' contains one or more locked files and cannot be {}.",
                mode.past()
            )));
        }
        let name = self.arena[src].name.clone();
        if self.find_child(dst, &name).is_some() {
            return Err(VfsError::duplicate_name(format!(
                "'{dst_path}' already contains an item named '{name}'."
            )));
        }

        let placed = match mode {
            RelocateMode::Copy => {
                let copy = self.clone_subtree(src);
                if let Err(e) = self.attach(dst, copy) {
                    self.free_subtree(copy);
                    return Err(e);
                }
                copy
            }
            RelocateMode::Move => {
                let old_parent = self.arena[src].parent;
                self.detach(src);
                if let Err(e) = self.attach(dst, src) {
                    if let Some(parent) = old_parent {
                        let _ = self.attach(parent, src);
                    }
                    return Err(e);
                }
                src
            }
        };

        Ok(Relocation {
            source: src_path,
            destination: self.path_of(placed),
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Describe the node at `path`.
    pub fn stat(&self, cwd: &str, path: &str) -> VfsResult<NodeInfo> {
        let id = self.resolve(cwd, path)?;
        let node = &self.arena[id];
        Ok(NodeInfo {
            name: node.name.clone(),
            kind: node.kind(),
            path: self.path_of(id),
            lock_holders: node
                .lock_holders()
                .map(|holders| holders.iter().cloned().collect())
                .unwrap_or_default(),
            child_count: node.child_ids().count(),
        })
    }

    /// True when `path` resolves to any node.
    pub fn exists(&self, cwd: &str, path: &str) -> bool {
        self.resolve(cwd, path).is_ok()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn segments(&self, cwd: &str, path: &str) -> Vec<String> {
        let cwd = if cwd.trim().is_empty() {
            self.default_volume.as_str()
        } else {
            cwd.trim()
        };
        let full = if self.resolver.is_absolute(path) {
            path.to_string()
        } else {
            self.resolver.combine(cwd, path)
        };
        self.resolver
            .split(&full)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.arena[parent]
            .children()?
            .get(&name_key(name))
            .copied()
    }

    fn walk(&self, segments: &[String]) -> VfsResult<NodeId> {
        let mut current = self.root;
        for (i, segment) in segments.iter().enumerate() {
            current = self.find_child(current, segment).ok_or_else(|| {
                VfsError::path_not_found(format!(
                    "Path '{}' does not exist.",
                    self.resolver.join(&segments[..=i])
                ))
            })?;
        }
        Ok(current)
    }

    fn resolve(&self, cwd: &str, path: &str) -> VfsResult<NodeId> {
        self.walk(&self.segments(cwd, path))
    }

    fn resolve_directory(&self, cwd: &str, path: &str) -> VfsResult<NodeId> {
        let id = self.resolve(cwd, path)?;
        if self.arena[id].kind() != NodeKind::Directory {
            return Err(VfsError::not_a_directory(format!(
                "'{}' is not a directory.",
                self.path_of(id)
            )));
        }
        Ok(id)
    }

    fn resolve_file(&self, cwd: &str, path: &str) -> VfsResult<NodeId> {
        let id = self.resolve(cwd, path)?;
        if self.arena[id].kind() != NodeKind::File {
            return Err(VfsError::not_a_file(format!(
                "'{}' is not a file.",
                self.path_of(id)
            )));
        }
        Ok(id)
    }

    fn create(&mut self, cwd: &str, path: &str, entry: Entry) -> VfsResult<NodeId> {
        let segments = self.segments(cwd, path);
        let Some((name, parents)) = segments.split_last() else {
            return Err(VfsError::path_not_found("Path not specified."));
        };

        let parent = self.walk(parents)?;
        if !self.arena[parent].kind().is_container() {
            return Err(VfsError::not_a_directory(format!(
                "Destination '{}' is not a directory.",
                self.path_of(parent)
            )));
        }
        self.resolver.validate_name(name)?;
        if let Some(existing) = self.find_child(parent, name) {
            return Err(VfsError::duplicate_name(format!(
                "'{}' already exists.",
                self.path_of(existing)
            )));
        }

        let id = self.arena.insert(Node::new(name.as_str(), entry));
        if let Err(e) = self.attach(parent, id) {
            self.arena.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Link `child` under `parent`. The root can never be given a parent.
    fn attach(&mut self, parent: NodeId, child: NodeId) -> VfsResult<()> {
        if child == self.root {
            return Err(VfsError::invalid_operation("The root cannot have a parent."));
        }
        let name = self.arena[child].name.clone();
        let parent_path = self.path_of(parent);
        let children = self.arena[parent].children_mut().ok_or_else(|| {
            VfsError::not_a_directory(format!("'{parent_path}' is not a directory."))
        })?;
        let key = name_key(&name);
        if children.contains_key(&key) {
            return Err(VfsError::duplicate_name(format!(
                "'{parent_path}' already contains an item named '{name}'."
            )));
        }
        children.insert(key, child);
        self.arena[child].parent = Some(parent);
        Ok(())
    }

    /// Unlink `child` from its parent, leaving its subtree intact.
    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.arena[child].parent.take() else {
            return;
        };
        let key = name_key(&self.arena[child].name);
        if let Some(children) = self.arena[parent].children_mut() {
            children.remove(&key);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.child_ids());
            }
        }
    }

    fn clone_subtree(&mut self, src: NodeId) -> NodeId {
        let source = &self.arena[src];
        let copy = Node::new(source.name.clone(), source.entry.empty_like());
        let child_ids: Vec<NodeId> = source.child_ids().collect();

        let copy_id = self.arena.insert(copy);
        for child in child_ids {
            let child_copy = self.clone_subtree(child);
            let key = name_key(&self.arena[child_copy].name);
            self.arena[child_copy].parent = Some(copy_id);
            if let Some(children) = self.arena[copy_id].children_mut() {
                children.insert(key, child_copy);
            }
        }
        copy_id
    }

    /// Any locked file at or below `id`.
    fn has_locks(&self, id: NodeId) -> bool {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.arena[current];
            if node.is_locked() {
                return true;
            }
            stack.extend(node.child_ids());
        }
        false
    }

    /// True when `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.arena[id].parent;
        }
        false
    }

    /// Number of ancestors; the root is at depth 0.
    fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.arena[id].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.arena[parent].parent;
        }
        depth
    }

    /// Normalized absolute path built from node names (root excluded).
    fn path_of(&self, id: NodeId) -> String {
        if id == self.root {
            return self.arena[id].name.clone();
        }
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                break;
            }
            let node = &self.arena[node_id];
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        self.resolver.join(&names)
    }
}
