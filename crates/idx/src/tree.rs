//! Generic tree stored in a slot-map arena.
//!
//! Nodes refer to their children by [`NodeId`]; navigation runs from parent
//! to child only.

use slotmap::{SlotMap, new_key_type};

use crate::error::{IndexError, Result};

new_key_type! {
    pub struct NodeId;
}

/// A node owning one object and an ordered list of children.
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    object: T,
    children: Vec<NodeId>,
}

impl<T> TreeNode<T> {
    pub fn object(&self) -> &T {
        &self.object
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: SlotMap<NodeId, TreeNode<T>>,
    root: NodeId,
}

impl<T> Tree<T> {
    pub fn new(root_object: T) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(TreeNode {
            object: root_object,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode<T>> {
        self.nodes.get(id).ok_or(IndexError::UnknownNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode<T>> {
        self.nodes.get_mut(id).ok_or(IndexError::UnknownNode)
    }

    pub fn object(&self, id: NodeId) -> Result<&T> {
        Ok(&self.node(id)?.object)
    }

    pub fn object_mut(&mut self, id: NodeId) -> Result<&mut T> {
        Ok(&mut self.node_mut(id)?.object)
    }

    pub fn set_object(&mut self, id: NodeId, object: T) -> Result<()> {
        self.node_mut(id)?.object = object;
        Ok(())
    }

    /// Append a child holding `object` to `parent`.
    pub fn add_child(&mut self, parent: NodeId, object: T) -> Result<NodeId> {
        self.node(parent)?;
        let child = self.nodes.insert(TreeNode {
            object,
            children: Vec::new(),
        });
        self.node_mut(parent)?.children.push(child);
        Ok(child)
    }

    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId> {
        let node = self.node(id)?;
        node.children
            .get(index)
            .copied()
            .ok_or(IndexError::ChildOutOfRange {
                index,
                count: node.children.len(),
            })
    }

    pub fn child_count(&self, id: NodeId) -> Result<usize> {
        Ok(self.node(id)?.child_count())
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn has_children(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.has_children())
    }

    /// Detach and drop every descendant of `id`; returns the objects of its
    /// direct children in order.
    pub fn remove_children(&mut self, id: NodeId) -> Result<Vec<T>> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        let mut objects = Vec::with_capacity(children.len());
        for child in children {
            let mut pending = Vec::new();
            if let Some(node) = self.nodes.remove(child) {
                pending.extend(node.children);
                objects.push(node.object);
            }
            while let Some(descendant) = pending.pop() {
                if let Some(node) = self.nodes.remove(descendant) {
                    pending.extend(node.children);
                }
            }
        }
        Ok(objects)
    }

    /// Pre-order traversal yielding `(depth, id)`, the root at depth 0.
    pub fn depth_first(&self) -> DepthFirst<'_, T> {
        DepthFirst {
            tree: self,
            stack: vec![(0, self.root)],
        }
    }
}

pub struct DepthFirst<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<(usize, NodeId)>,
}

impl<T> Iterator for DepthFirst<'_, T> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        if let Some(node) = self.tree.nodes.get(id) {
            self.stack
                .extend(node.children.iter().rev().map(|&child| (depth + 1, child)));
        }
        Some((depth, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree<&'static str>, [NodeId; 4]) {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let a = tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        let a1 = tree.add_child(a, "a1").unwrap();
        (tree, [root, a, b, a1])
    }

    #[test]
    fn test_children_in_order() {
        let (tree, [root, a, b, _]) = sample();
        assert_eq!(tree.children(root).unwrap(), &[a, b]);
        assert_eq!(tree.child(root, 1).unwrap(), b);
        assert_eq!(tree.child_count(a).unwrap(), 1);
        assert!(!tree.has_children(b).unwrap());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_child_out_of_range() {
        let (tree, [root, ..]) = sample();
        assert_eq!(
            tree.child(root, 2),
            Err(IndexError::ChildOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_objects() {
        let (mut tree, [_, a, _, a1]) = sample();
        assert_eq!(*tree.object(a1).unwrap(), "a1");
        tree.set_object(a, "renamed").unwrap();
        *tree.object_mut(a1).unwrap() = "leaf";
        assert_eq!(*tree.object(a).unwrap(), "renamed");
        assert_eq!(*tree.node(a1).unwrap().object(), "leaf");
    }

    #[test]
    fn test_depth_first_pre_order() {
        let (tree, [root, a, b, a1]) = sample();
        let order: Vec<_> = tree.depth_first().collect();
        assert_eq!(order, vec![(0, root), (1, a), (2, a1), (1, b)]);
    }

    #[test]
    fn test_remove_children() {
        let (mut tree, [root, a, _, a1]) = sample();
        let removed = tree.remove_children(root).unwrap();
        assert_eq!(removed, vec!["a", "b"]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.object(a1), Err(IndexError::UnknownNode));
        assert_eq!(tree.add_child(a, "x"), Err(IndexError::UnknownNode));
    }
}
