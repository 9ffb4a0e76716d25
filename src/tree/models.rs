//! File-tree data model: nested exchange form and flat arena
//!
//! Trees arrive from the project indexer in the nested [`FileTreeNode`]
//! form. Internally the truncator works on [`FileTree`], a flat arena of
//! nodes with parent/child indices, which keeps the repeated
//! filter-and-reindex passes cheap and free of pointer juggling.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ContextError, Result};

/// File path -> token name -> relevance score (higher = more relevant)
pub type FileTokenScores = IndexMap<String, IndexMap<String, f64>>;

/// A node of the nested file-tree exchange format
///
/// `file_path` is root-relative and `/`-separated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileTreeNode {
    #[serde(rename_all = "camelCase")]
    File { name: String, file_path: String },
    #[serde(rename_all = "camelCase")]
    Directory {
        name: String,
        file_path: String,
        children: Vec<FileTreeNode>,
    },
}

impl FileTreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Directory { name, .. } => name,
        }
    }

    pub fn file_path(&self) -> &str {
        match self {
            Self::File { file_path, .. } | Self::Directory { file_path, .. } => file_path,
        }
    }
}

/// File tree plus relevance scores, as supplied by the project indexer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFileContext {
    pub file_tree: Vec<FileTreeNode>,
    pub file_token_scores: FileTokenScores,
}

impl ProjectFileContext {
    pub fn new(file_tree: Vec<FileTreeNode>, file_token_scores: FileTokenScores) -> Self {
        Self {
            file_tree,
            file_token_scores,
        }
    }

    /// Extract the subtree rooted at a directory, remapping score keys to the
    /// subtree's relative paths
    ///
    /// Returns `None` if no directory with that path exists. Used by
    /// subtree-reading tool handlers so scores line up before truncation.
    pub fn subtree(&self, dir_path: &str) -> Option<ProjectFileContext> {
        let dir = find_directory(&self.file_tree, dir_path)?;
        let children = match dir {
            FileTreeNode::Directory { children, .. } => children,
            FileTreeNode::File { .. } => return None,
        };

        let prefix = format!("{dir_path}/");
        let file_tree = children.iter().map(|c| reroot(c, &prefix)).collect();
        let file_token_scores = self
            .file_token_scores
            .iter()
            .filter_map(|(path, tokens)| {
                path.strip_prefix(&prefix)
                    .map(|rel| (rel.to_string(), tokens.clone()))
            })
            .collect();

        Some(ProjectFileContext {
            file_tree,
            file_token_scores,
        })
    }
}

fn find_directory<'a>(nodes: &'a [FileTreeNode], path: &str) -> Option<&'a FileTreeNode> {
    for node in nodes {
        if let FileTreeNode::Directory { file_path, children, .. } = node {
            if file_path == path {
                return Some(node);
            }
            if let Some(found) = find_directory(children, path) {
                return Some(found);
            }
        }
    }
    None
}

/// Clone a node with the subtree prefix stripped from every path
fn reroot(node: &FileTreeNode, prefix: &str) -> FileTreeNode {
    let strip = |path: &str| {
        path.strip_prefix(prefix)
            .unwrap_or(path)
            .to_string()
    };
    match node {
        FileTreeNode::File { name, file_path } => FileTreeNode::File {
            name: name.clone(),
            file_path: strip(file_path),
        },
        FileTreeNode::Directory {
            name,
            file_path,
            children,
        } => FileTreeNode::Directory {
            name: name.clone(),
            file_path: strip(file_path),
            children: children.iter().map(|c| reroot(c, prefix)).collect(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<usize>,
    pub(crate) depth: usize,
}

/// A file within an arena tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct FileRef<'a> {
    pub(crate) name: &'a str,
    pub(crate) path: &'a str,
    pub(crate) depth: usize,
}

/// Flat arena representation of a file tree
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

impl FileTree {
    /// Build an arena from the nested form
    ///
    /// Rejects trees where the same path is reachable from more than one
    /// parent.
    pub fn from_nodes(nodes: &[FileTreeNode]) -> Result<Self> {
        let mut tree = FileTree::default();
        let mut seen = HashSet::new();
        for node in nodes {
            tree.insert(node, None, &mut seen)?;
        }
        Ok(tree)
    }

    fn insert(
        &mut self,
        node: &FileTreeNode,
        parent: Option<usize>,
        seen: &mut HashSet<String>,
    ) -> Result<()> {
        if !seen.insert(node.file_path().to_string()) {
            return Err(ContextError::InvalidTree(format!(
                "duplicate path: {}",
                node.file_path()
            )));
        }
        match node {
            FileTreeNode::File { name, file_path } => {
                self.push_node(name.clone(), file_path.clone(), NodeKind::File, parent);
            }
            FileTreeNode::Directory {
                name,
                file_path,
                children,
            } => {
                let idx =
                    self.push_node(name.clone(), file_path.clone(), NodeKind::Directory, parent);
                for child in children {
                    self.insert(child, Some(idx), seen)?;
                }
            }
        }
        Ok(())
    }

    fn push_node(
        &mut self,
        name: String,
        path: String,
        kind: NodeKind,
        parent: Option<usize>,
    ) -> usize {
        let depth = parent.map_or(0, |p| self.nodes[p].depth + 1);
        let idx = self.nodes.len();
        self.nodes.push(Node {
            name,
            path,
            kind,
            children: Vec::new(),
            depth,
        });
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    /// Convert back to the nested exchange form
    pub fn to_nodes(&self) -> Vec<FileTreeNode> {
        self.roots.iter().map(|&r| self.to_nested(r)).collect()
    }

    fn to_nested(&self, idx: usize) -> FileTreeNode {
        let node = &self.nodes[idx];
        match node.kind {
            NodeKind::File => FileTreeNode::File {
                name: node.name.clone(),
                file_path: node.path.clone(),
            },
            NodeKind::Directory => FileTreeNode::Directory {
                name: node.name.clone(),
                file_path: node.path.clone(),
                children: node.children.iter().map(|&c| self.to_nested(c)).collect(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of files in the tree
    pub fn file_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::File)
            .count()
    }

    /// All files in depth-first (render) order
    pub(crate) fn files(&self) -> Vec<FileRef<'_>> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.collect_files(root, &mut out);
        }
        out
    }

    fn collect_files<'a>(&'a self, idx: usize, out: &mut Vec<FileRef<'a>>) {
        let node = &self.nodes[idx];
        match node.kind {
            NodeKind::File => out.push(FileRef {
                name: &node.name,
                path: &node.path,
                depth: node.depth,
            }),
            NodeKind::Directory => {
                for &child in &node.children {
                    self.collect_files(child, out);
                }
            }
        }
    }

    /// Copy of the tree keeping only files/directories the predicates accept
    ///
    /// A rejected directory drops its whole subtree; directories left without
    /// any descendant files are removed entirely.
    pub(crate) fn filtered(
        &self,
        keep_file: &dyn Fn(&str, &str) -> bool,
        keep_dir: &dyn Fn(&str) -> bool,
    ) -> FileTree {
        let mut kept = vec![false; self.nodes.len()];
        for &root in &self.roots {
            self.mark_kept(root, keep_file, keep_dir, &mut kept);
        }

        let mut out = FileTree::default();
        for &root in &self.roots {
            self.copy_kept(root, None, &kept, &mut out);
        }
        out
    }

    fn mark_kept(
        &self,
        idx: usize,
        keep_file: &dyn Fn(&str, &str) -> bool,
        keep_dir: &dyn Fn(&str) -> bool,
        kept: &mut [bool],
    ) -> bool {
        let node = &self.nodes[idx];
        let keep = match node.kind {
            NodeKind::File => keep_file(&node.name, &node.path),
            NodeKind::Directory => {
                if keep_dir(&node.name) {
                    let mut any_child = false;
                    for &child in &node.children {
                        if self.mark_kept(child, keep_file, keep_dir, kept) {
                            any_child = true;
                        }
                    }
                    any_child
                } else {
                    false
                }
            }
        };
        kept[idx] = keep;
        keep
    }

    fn copy_kept(&self, idx: usize, parent: Option<usize>, kept: &[bool], out: &mut FileTree) {
        if !kept[idx] {
            return;
        }
        let node = &self.nodes[idx];
        let new_idx = out.push_node(node.name.clone(), node.path.clone(), node.kind, parent);
        for &child in &node.children {
            self.copy_kept(child, Some(new_idx), kept, out);
        }
    }

    pub(crate) fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub(crate) fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, path: &str) -> FileTreeNode {
        FileTreeNode::File {
            name: name.to_string(),
            file_path: path.to_string(),
        }
    }

    fn dir(name: &str, path: &str, children: Vec<FileTreeNode>) -> FileTreeNode {
        FileTreeNode::Directory {
            name: name.to_string(),
            file_path: path.to_string(),
            children,
        }
    }

    fn sample_tree() -> Vec<FileTreeNode> {
        vec![
            dir(
                "src",
                "src",
                vec![file("main.rs", "src/main.rs"), file("lib.rs", "src/lib.rs")],
            ),
            file("README.md", "README.md"),
        ]
    }

    #[test]
    fn test_arena_roundtrip_preserves_structure() {
        let nodes = sample_tree();
        let tree = FileTree::from_nodes(&nodes).unwrap();
        assert_eq!(tree.to_nodes(), nodes);
        assert_eq!(tree.file_count(), 3);
    }

    #[test]
    fn test_duplicate_path_is_rejected() {
        let nodes = vec![file("a.rs", "a.rs"), file("a.rs", "a.rs")];
        assert!(FileTree::from_nodes(&nodes).is_err());
    }

    #[test]
    fn test_filtered_drops_empty_directories() {
        let tree = FileTree::from_nodes(&sample_tree()).unwrap();
        let filtered = tree.filtered(&|_, path| path == "README.md", &|_| true);
        let nodes = filtered.to_nodes();
        assert_eq!(nodes, vec![file("README.md", "README.md")]);
    }

    #[test]
    fn test_filtered_drops_denied_directory_subtree() {
        let tree = FileTree::from_nodes(&sample_tree()).unwrap();
        let filtered = tree.filtered(&|_, _| true, &|name| name != "src");
        assert_eq!(filtered.file_count(), 1);
    }

    #[test]
    fn test_files_carry_depth() {
        let tree = FileTree::from_nodes(&sample_tree()).unwrap();
        let files = tree.files();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].depth, 1);
        assert_eq!(files[2].depth, 0);
    }

    #[test]
    fn test_subtree_remaps_score_keys() {
        let mut scores = FileTokenScores::default();
        let mut tokens = IndexMap::new();
        tokens.insert("main".to_string(), 2.0);
        scores.insert("src/main.rs".to_string(), tokens);
        scores.insert("README.md".to_string(), IndexMap::new());

        let context = ProjectFileContext::new(sample_tree(), scores);
        let subtree = context.subtree("src").unwrap();

        assert_eq!(subtree.file_tree.len(), 2);
        assert_eq!(subtree.file_tree[0].file_path(), "main.rs");
        assert!(subtree.file_token_scores.contains_key("main.rs"));
        assert!(!subtree.file_token_scores.contains_key("README.md"));
    }

    #[test]
    fn test_subtree_of_missing_directory_is_none() {
        let context = ProjectFileContext::new(sample_tree(), FileTokenScores::default());
        assert!(context.subtree("nope").is_none());
    }

    #[test]
    fn test_node_serde_shape() {
        let node = file("main.rs", "src/main.rs");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["filePath"], "src/main.rs");
    }
}
