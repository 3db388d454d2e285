//! In-memory fault tree
//!
//! A [`FaultTree`] is a strictly owned hierarchy: each [`FaultTreeNode`] owns
//! its children, so there is no sharing and no way to form a cycle. Trees are
//! built once from a root label and an ordered list of parent→child edges and
//! are read-only afterwards.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// A single event in the fault tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultTreeNode {
    label: String,
    children: Vec<FaultTreeNode>,
}

impl FaultTreeNode {
    /// Creates a node with no children.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// The node's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The node's children, in authoring order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Whether the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn find_mut(&mut self, label: &str) -> Option<&mut Self> {
        if self.label == label {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(label))
    }
}

/// A parent→child link, identified by labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Edge {
    /// Label of an existing node.
    pub parent: String,
    /// Label of the new child node.
    pub child: String,
}

impl Edge {
    /// Creates an edge.
    #[must_use]
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// Errors that can occur when building a tree from edges.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The edge names a parent that has not been added yet.
    #[error("edge {parent} → {child}: parent not found (parents must be added before children)")]
    UnknownParent {
        /// Label of the missing parent.
        parent: String,
        /// Label of the child that could not be attached.
        child: String,
    },
    /// More than one existing node carries the parent label.
    #[error("edge {parent} → {child}: parent label matches {matches} nodes")]
    AmbiguousParent {
        /// The ambiguous parent label.
        parent: String,
        /// Label of the child that could not be attached.
        child: String,
        /// How many nodes carry the label.
        matches: usize,
    },
}

/// A fault tree with a single top event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultTree {
    root: FaultTreeNode,
}

impl FaultTree {
    /// Builds a tree from its top event and an ordered list of edges.
    ///
    /// Children are attached in the order their edges appear. Leaf labels may
    /// repeat, but a label used as a parent must identify exactly one node at
    /// the point its edge is applied.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if an edge's parent is missing or ambiguous.
    #[instrument(level = "debug", skip(edges))]
    pub fn from_edges<'a, I>(root: &str, edges: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        let mut tree = Self {
            root: FaultTreeNode::new(root),
        };

        for edge in edges {
            let matches = tree
                .iter()
                .filter(|(_, node)| node.label == edge.parent)
                .count();
            match matches {
                0 => {
                    return Err(TopologyError::UnknownParent {
                        parent: edge.parent.clone(),
                        child: edge.child.clone(),
                    });
                }
                1 => {}
                matches => {
                    return Err(TopologyError::AmbiguousParent {
                        parent: edge.parent.clone(),
                        child: edge.child.clone(),
                        matches,
                    });
                }
            }

            if let Some(parent) = tree.root.find_mut(&edge.parent) {
                parent.children.push(FaultTreeNode::new(edge.child.clone()));
            }
        }

        tracing::debug!(nodes = tree.len(), "built fault tree");
        Ok(tree)
    }

    /// The top event.
    #[must_use]
    pub const fn root(&self) -> &FaultTreeNode {
        &self.root
    }

    /// Depth-first pre-order traversal, yielding `(depth, node)`.
    ///
    /// The root has depth 0.
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![(0, &self.root)],
        }
    }

    /// Total number of nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always `false`: a tree has at least its root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Leaf nodes in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &FaultTreeNode> {
        self.iter()
            .map(|(_, node)| node)
            .filter(|node| node.is_leaf())
    }

    /// All parent→child edges, in pre-order of the child.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        fn walk(node: &FaultTreeNode, out: &mut Vec<Edge>) {
            for child in &node.children {
                out.push(Edge::new(&node.label, &child.label));
                walk(child, out);
            }
        }

        let mut edges = Vec::new();
        walk(&self.root, &mut edges);
        edges
    }

    /// Labels on the path from the root to the first node (in pre-order)
    /// labelled `label`, inclusive of both ends.
    #[must_use]
    pub fn ancestors_of(&self, label: &str) -> Option<Vec<&str>> {
        fn walk<'a>(node: &'a FaultTreeNode, label: &str, path: &mut Vec<&'a str>) -> bool {
            path.push(&node.label);
            if node.label == label {
                return true;
            }
            if node.children.iter().any(|child| walk(child, label, path)) {
                return true;
            }
            path.pop();
            false
        }

        let mut path = Vec::new();
        walk(&self.root, label, &mut path).then_some(path)
    }

    /// Converts the tree to a directed graph with edges pointing parent→child.
    ///
    /// Node indices follow pre-order, so the root is index 0.
    #[must_use]
    pub fn to_graph(&self) -> DiGraph<&str, ()> {
        fn add<'a>(graph: &mut DiGraph<&'a str, ()>, node: &'a FaultTreeNode) -> NodeIndex {
            let index = graph.add_node(&node.label);
            for child in &node.children {
                let child_index = add(graph, child);
                graph.add_edge(index, child_index, ());
            }
            index
        }

        let nodes = self.len();
        let mut graph = DiGraph::with_capacity(nodes, nodes.saturating_sub(1));
        add(&mut graph, &self.root);
        graph
    }
}

/// Pre-order iterator over a [`FaultTree`].
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<(usize, &'a FaultTreeNode)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (usize, &'a FaultTreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

impl<'a> IntoIterator for &'a FaultTree {
    type Item = (usize, &'a FaultTreeNode);
    type IntoIter = PreOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
