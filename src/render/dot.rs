//! Graphviz DOT description of a fault tree

use std::fmt::Write as _;

use petgraph::visit::EdgeRef;

use crate::domain::FaultTree;

/// Graph attributes that only affect presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotOptions {
    /// Font for node and edge labels.
    pub font: Option<String>,
}

/// Builds the DOT description of the tree.
///
/// Each node gets a unique identifier derived from its pre-order position
/// (`n0` is the root), so repeated labels remain distinct nodes. Edges point
/// from parent to child.
#[must_use]
pub fn to_dot(tree: &FaultTree, options: &DotOptions) -> String {
    let graph = tree.to_graph();
    let mut dot = String::from("digraph fault_tree {\n");
    dot.push_str("    graph [rankdir=TB, charset=\"UTF-8\"];\n");
    if let Some(font) = &options.font {
        let font = escape(font);
        let _ = writeln!(dot, "    node [fontname=\"{font}\"];");
        let _ = writeln!(dot, "    edge [fontname=\"{font}\"];");
    }

    for index in graph.node_indices() {
        let _ = writeln!(
            dot,
            "    n{} [label=\"{}\"];",
            index.index(),
            escape(graph[index])
        );
    }
    for edge in graph.edge_references() {
        let _ = writeln!(
            dot,
            "    n{} -> n{};",
            edge.source().index(),
            edge.target().index()
        );
    }

    dot.push_str("}\n");
    dot
}

/// Basic sanity check of a DOT description: it must open a directed graph
/// and close its body.
#[must_use]
pub fn looks_like_digraph(dot: &str) -> bool {
    dot.trim_start().starts_with("digraph") && dot.trim_end().ends_with('}')
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Edge;

    #[test]
    fn reference_tree_has_a_node_per_tree_node_and_an_edge_per_link() {
        let tree = FaultTree::reference();
        let dot = to_dot(&tree, &DotOptions::default());

        assert!(looks_like_digraph(&dot));
        assert_eq!(dot.matches("[label=").count(), tree.len());
        assert_eq!(dot.matches(" -> ").count(), tree.edges().len());
        assert!(dot.contains("n0 [label=\"Cooling system failure\"];"));
        assert!(!dot.contains("fontname"));
    }

    #[test]
    fn repeated_labels_are_distinct_nodes() {
        let tree = FaultTree::reference();
        let dot = to_dot(&tree, &DotOptions::default());
        assert_eq!(dot.matches("[label=\"Bearing wear\"]").count(), 2);
    }

    #[test]
    fn edges_follow_parent_to_child() {
        let tree =
            FaultTree::from_edges("top", &[Edge::new("top", "a"), Edge::new("a", "b")]).unwrap();
        let dot = to_dot(&tree, &DotOptions::default());

        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("n1 -> n2;"));
    }

    #[test]
    fn labels_and_font_are_escaped() {
        let no_edges: [Edge; 0] = [];
        let tree = FaultTree::from_edges("say \"hi\"", &no_edges).unwrap();
        let options = DotOptions {
            font: Some("Noto Sans".to_string()),
        };
        let dot = to_dot(&tree, &options);

        assert!(dot.contains(r#"n0 [label="say \"hi\""];"#));
        assert!(dot.contains(r#"node [fontname="Noto Sans"];"#));
    }

    #[test]
    fn sanity_check_rejects_other_content() {
        assert!(!looks_like_digraph("graph g { a -- b }"));
        assert!(!looks_like_digraph("digraph g {"));
        assert!(!looks_like_digraph(""));
    }
}
