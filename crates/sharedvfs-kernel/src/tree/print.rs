//! Text rendering of the whole tree.

use super::{NamespaceTree, NodeId, NodeKind};

impl NamespaceTree {
    /// Render the tree depth-first.
    ///
    /// Siblings are grouped by kind (directories before files) and ordered
    /// by case-insensitive name inside each group. A node at depth `d` is
    /// indented with `d` copies of `"| "`, the last space turned into `_`;
    /// the first visible level is not indented. The root line only appears
    /// when the tree was configured with `show_root`.
    ///
    /// ```text
    /// C:
    /// | |_docs [DIR]
    /// | | |_notes.txt [FILE][LOCKED BY: alice, bob]
    /// | |_readme.txt [FILE]
    /// ```
    pub fn print_tree(&self) -> String {
        let mut lines = Vec::new();
        self.print_node(self.root, &mut lines);
        lines.join("\n")
    }

    fn print_node(&self, id: NodeId, lines: &mut Vec<String>) {
        let node = &self.arena[id];
        let kind = node.kind();

        if kind != NodeKind::Root || self.show_root {
            let depth = self.depth(id);
            let first_level = if self.show_root { 0 } else { 1 };

            let mut line = String::new();
            if depth > first_level {
                let mut indent = "| ".repeat(depth);
                indent.pop();
                indent.push('_');
                line.push_str(&indent);
            }
            line.push_str(&node.name);

            match kind {
                NodeKind::Directory => line.push_str(" [DIR]"),
                NodeKind::File => {
                    line.push_str(" [FILE]");
                    if let Some(holders) = node.lock_holders().filter(|h| !h.is_empty()) {
                        let mut holders: Vec<&str> = holders.iter().map(String::as_str).collect();
                        holders.sort_by_key(|h| h.to_lowercase());
                        line.push_str(&format!("[LOCKED BY: {}]", holders.join(", ")));
                    }
                }
                NodeKind::Root | NodeKind::Volume => {}
            }
            lines.push(line);
        }

        // Children come in folded-name order; a stable sort by kind keeps it.
        let mut children: Vec<NodeId> = node.child_ids().collect();
        children.sort_by_key(|child| self.arena[*child].kind());
        for child in children {
            self.print_node(child, lines);
        }
    }
}
