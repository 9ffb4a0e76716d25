//! Plain-text rendering of file trees with optional relevance annotations

use std::cmp::Ordering;

use super::models::{FileTokenScores, FileTree, NodeKind};

/// Render a tree to indented text
///
/// Directories are suffixed with `/`; nesting is two spaces per level. With
/// `scores`, each file line is annotated with its relevance tokens in
/// descending score order (ties broken by token name). Never drops nodes; an
/// empty tree renders to an empty string.
pub fn render_file_tree(tree: &FileTree, scores: Option<&FileTokenScores>) -> String {
    let mut out = String::new();
    for &root in tree.roots() {
        render_node(tree, root, scores, &mut out);
    }
    out
}

fn render_node(tree: &FileTree, idx: usize, scores: Option<&FileTokenScores>, out: &mut String) {
    let node = tree.node(idx);
    for _ in 0..node.depth {
        out.push_str("  ");
    }
    match node.kind {
        NodeKind::Directory => {
            out.push_str(&node.name);
            out.push('/');
            out.push('\n');
            for &child in &node.children {
                render_node(tree, child, scores, out);
            }
        }
        NodeKind::File => {
            out.push_str(&node.name);
            if let Some(tokens) = scores.and_then(|s| s.get(&node.path)) {
                if !tokens.is_empty() {
                    let mut ranked: Vec<(&str, f64)> =
                        tokens.iter().map(|(t, &s)| (t.as_str(), s)).collect();
                    ranked.sort_by(|a, b| {
                        b.1.partial_cmp(&a.1)
                            .unwrap_or(Ordering::Equal)
                            .then_with(|| a.0.cmp(b.0))
                    });
                    out.push(' ');
                    let names: Vec<&str> = ranked.iter().map(|(t, _)| *t).collect();
                    out.push_str(&names.join(" "));
                }
            }
            out.push('\n');
        }
    }
}
