//! Tree-walker interface for recursive traversal demos
//!
//! Real document trees belong to the host; the simulator only needs a tag
//! name and the children of each node.

use serde::{Deserialize, Serialize};

/// A node the traversal scenario can walk
pub trait TreeNode {
    fn tag_name(&self) -> &str;
    fn children(&self) -> impl Iterator<Item = &Self>;
}

/// Minimal owned element tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// A single chain of `depth` nested `DIV` elements
    ///
    /// Built iteratively so that very deep chains never touch the host stack.
    pub fn nested(depth: usize) -> Self {
        let mut node = ElementNode::new("DIV");
        for _ in 1..depth.max(1) {
            node = ElementNode::new("DIV").with_child(node);
        }
        node
    }

    /// Total node count, without recursion
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }
}

impl TreeNode for ElementNode {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn children(&self) -> impl Iterator<Item = &Self> {
        self.children.iter()
    }
}

impl Drop for ElementNode {
    // Flatten before dropping so deep chains do not recurse in the destructor.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_depth() {
        let tree = ElementNode::nested(4);
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.children().count(), 1);
    }

    #[test]
    fn test_builder() {
        let tree = ElementNode::new("BODY")
            .with_child(ElementNode::new("HEADER"))
            .with_child(ElementNode::new("MAIN").with_child(ElementNode::new("P")));
        assert_eq!(tree.tag_name(), "BODY");
        assert_eq!(tree.node_count(), 4);
        assert_eq!(
            tree.children().map(|child| child.tag_name()).collect::<Vec<_>>(),
            vec!["HEADER", "MAIN"]
        );
    }

    #[test]
    fn test_deep_chain_drops_without_recursion() {
        let tree = ElementNode::nested(200_000);
        drop(tree);
    }
}
