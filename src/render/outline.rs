//! Text outline of a fault tree

use crate::domain::{FaultTree, FaultTreeNode, OutlineStyle};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Renders the tree as one line per node, in depth-first pre-order.
#[must_use]
pub fn outline(tree: &FaultTree, style: OutlineStyle) -> Vec<String> {
    match style {
        OutlineStyle::Connectors => {
            let mut lines = vec![tree.root().label().to_string()];
            connectors(tree.root(), "", &mut lines);
            lines
        }
        OutlineStyle::Indent => tree
            .iter()
            .map(|(depth, node)| format!("{}{}", "  ".repeat(depth), node.label()))
            .collect(),
    }
}

/// Renders the outline as a document: lines joined with newlines, with a
/// trailing newline.
#[must_use]
pub fn outline_text(tree: &FaultTree, style: OutlineStyle) -> String {
    let mut text = outline(tree, style).join("\n");
    text.push('\n');
    text
}

fn connectors(node: &FaultTreeNode, prefix: &str, lines: &mut Vec<String>) {
    let count = node.children().len();
    for (idx, child) in node.children().iter().enumerate() {
        let last = idx + 1 == count;
        let branch = if last { LAST_BRANCH } else { BRANCH };
        lines.push(format!("{prefix}{branch}{}", child.label()));

        let continuation = if last { SPACE } else { PIPE };
        connectors(child, &format!("{prefix}{continuation}"), lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Edge;

    fn tree() -> FaultTree {
        FaultTree::from_edges(
            "top",
            &[
                Edge::new("top", "a"),
                Edge::new("a", "a1"),
                Edge::new("a", "a2"),
                Edge::new("top", "b"),
                Edge::new("b", "b1"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn connector_style() {
        assert_eq!(
            outline(&tree(), OutlineStyle::Connectors),
            [
                "top",
                "├── a",
                "│   ├── a1",
                "│   └── a2",
                "└── b",
                "    └── b1",
            ]
        );
    }

    #[test]
    fn indent_style() {
        assert_eq!(
            outline(&tree(), OutlineStyle::Indent),
            ["top", "  a", "    a1", "    a2", "  b", "    b1"]
        );
    }

    #[test]
    fn reference_outline_has_one_line_per_node() {
        let tree = FaultTree::reference();
        for style in [OutlineStyle::Connectors, OutlineStyle::Indent] {
            let lines = outline(&tree, style);
            assert_eq!(lines.len(), 16);
            assert_eq!(lines[0], "Cooling system failure");
        }

        let text = outline_text(&tree, OutlineStyle::Connectors);
        assert!(text.ends_with("    └── Seal ageing\n"));
        assert_eq!(text.lines().count(), 16);
    }

    #[test]
    fn rendering_is_deterministic() {
        let tree = FaultTree::reference();
        assert_eq!(
            outline_text(&tree, OutlineStyle::Connectors),
            outline_text(&tree, OutlineStyle::Connectors)
        );
    }
}
