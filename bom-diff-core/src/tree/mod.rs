//! Assembly trees keyed by dotted positions.
//!
//! Nodes live in an [`indextree`] arena under a hidden root. Each node stores
//! its full dotted position and an optional value; intermediate nodes created
//! on the way to a deeper position hold no value until one is set.

mod counter;
mod position;

use std::collections::HashMap;

use indextree::{Arena, NodeId};

use crate::error::TreeError;

pub use counter::TreeCounter;
pub use position::{prefixes, TreePosition};

#[derive(Debug, Clone)]
struct Slot<T> {
    position: String,
    value: Option<T>,
}

/// Ordered tree of optional values addressed by dotted position strings.
#[derive(Debug, Clone)]
pub struct AssemblyTree<T> {
    arena: Arena<Slot<T>>,
    root: NodeId,
    index: HashMap<String, NodeId>,
}

impl<T> Default for AssemblyTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AssemblyTree<T> {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(Slot {
            position: String::new(),
            value: None,
        });
        Self {
            arena,
            root,
            index: HashMap::new(),
        }
    }

    /// No nodes at all, not even empty intermediates.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of nodes, including intermediates without a value.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Place `value` at `position`, creating empty intermediate nodes.
    ///
    /// Fails without touching the tree if the slot already holds a value.
    pub fn set_branch(&mut self, position: &str, value: T) -> Result<(), TreeError> {
        if let Some(existing) = self.index.get(position) {
            if self.arena[*existing].get().value.is_some() {
                return Err(TreeError::DuplicatePosition {
                    position: position.to_string(),
                });
            }
        }

        let mut parent = self.root;
        for prefix in prefixes(position) {
            parent = match self.index.get(&prefix) {
                Some(node) => *node,
                None => {
                    let node = self.arena.new_node(Slot {
                        position: prefix.clone(),
                        value: None,
                    });
                    parent.append(node, &mut self.arena);
                    self.index.insert(prefix, node);
                    node
                }
            };
        }
        if let Some(slot) = self.arena.get_mut(parent) {
            slot.get_mut().value = Some(value);
        }
        Ok(())
    }

    /// Resolve a position segment by segment.
    pub fn branch(&self, position: &str) -> Result<Branch<'_, T>, TreeError> {
        let mut node = self.root;
        for prefix in prefixes(position) {
            node = match self.index.get(&prefix) {
                Some(found) => *found,
                None => {
                    return Err(TreeError::PositionNotFound {
                        requested: position.to_string(),
                        missing: prefix,
                    })
                }
            };
        }
        Ok(Branch { tree: self, node })
    }

    /// Value stored at `position`, if any.
    pub fn get(&self, position: &str) -> Option<&T> {
        self.index
            .get(position)
            .and_then(|node| self.arena[*node].get().value.as_ref())
    }

    /// Top-level branches in insertion order.
    pub fn top_level(&self) -> impl Iterator<Item = Branch<'_, T>> {
        self.root
            .children(&self.arena)
            .map(move |node| Branch { tree: self, node })
    }

    /// Pre-order walk yielding each branch with its depth (top level is 0).
    pub fn iter(&self) -> impl Iterator<Item = (usize, Branch<'_, T>)> {
        self.root.descendants(&self.arena).skip(1).map(move |node| {
            let depth = node.ancestors(&self.arena).count() - 2;
            (depth, Branch { tree: self, node })
        })
    }

    /// Pre-order walk of the stored values only.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().filter_map(|(_, branch)| branch.value())
    }

    /// Same shape with every value mapped through `f`.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> AssemblyTree<U> {
        let mut out = AssemblyTree::new();
        for (_, branch) in self.iter() {
            let node = out.arena.new_node(Slot {
                position: branch.position().to_string(),
                value: branch.value().map(&mut f),
            });
            let parent = match self.arena[branch.node].parent() {
                Some(p) if p != self.root => out
                    .index
                    .get(&self.arena[p].get().position)
                    .copied()
                    .unwrap_or(out.root),
                _ => out.root,
            };
            parent.append(node, &mut out.arena);
            out.index.insert(branch.position().to_string(), node);
        }
        out
    }
}

/// Borrowed view of one node of an [`AssemblyTree`].
#[derive(Debug)]
pub struct Branch<'a, T> {
    tree: &'a AssemblyTree<T>,
    node: NodeId,
}

impl<T> Clone for Branch<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Branch<'_, T> {}

impl<'a, T> Branch<'a, T> {
    pub fn position(&self) -> &'a str {
        &self.tree.arena[self.node].get().position
    }

    pub fn value(&self) -> Option<&'a T> {
        self.tree.arena[self.node].get().value.as_ref()
    }

    pub fn children(&self) -> impl Iterator<Item = Branch<'a, T>> + 'a {
        let tree = self.tree;
        self.node
            .children(&tree.arena)
            .map(move |node| Branch { tree, node })
    }

    pub fn has_children(&self) -> bool {
        self.node.children(&self.tree.arena).next().is_some()
    }

    /// Values of the direct children, skipping empty intermediates.
    pub fn child_values(&self) -> Vec<&'a T> {
        self.children().filter_map(|child| child.value()).collect()
    }
}
