//! Token tree representation and rendering.
//!
//! Provides the [`TreeNode`] type produced by the builder, aggregate
//! [`TokenStats`], and a box-drawing renderer.

use std::cmp::Ordering;
use std::path::PathBuf;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::config::SortKey;

/// The type of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// A node in the token tree.
///
/// A directory's `token_count` covers every scanned file below it, including
/// files that are hidden from `children` by display filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// File or directory name (not full path).
    pub name: String,
    /// Absolute path.
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(rename = "tokens")]
    pub token_count: usize,
    /// Size in bytes; absent for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Present (possibly empty) for directories only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// Create a new directory node with no children.
    pub fn directory(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        token_count: usize,
        size: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            token_count,
            size,
            children: Some(Vec::new()),
        }
    }

    /// Create a new file node.
    pub fn file(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        token_count: usize,
        size: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            token_count,
            size,
            children: None,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Add a child node. Ignored for files.
    pub fn add_child(&mut self, child: TreeNode) {
        if let Some(children) = &mut self.children {
            children.push(child);
        }
    }

    /// Get child nodes (empty for files).
    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub(crate) fn children_mut(&mut self) -> &mut [TreeNode] {
        self.children.as_deref_mut().unwrap_or_default()
    }

    /// Sort direct children: directories first, then by `key`.
    pub fn sort_children(&mut self, key: SortKey) {
        if let Some(children) = &mut self.children {
            children.sort_by(|a, b| compare_nodes(a, b, key));
        }
    }

    /// Count visible files in this tree.
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children().iter().map(|c| c.file_count()).sum(),
        }
    }

    /// Count visible directories in this tree, including this one.
    pub fn directory_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 0,
            NodeKind::Directory => {
                1 + self
                    .children()
                    .iter()
                    .map(|c| c.directory_count())
                    .sum::<usize>()
            }
        }
    }
}

/// Sibling order: directories first, then `key`.
///
/// `name` is case-insensitive (see [`compare_names`]); `size` and `tokens`
/// are descending. A missing size sorts as 0.
pub fn compare_nodes(a: &TreeNode, b: &TreeNode, key: SortKey) -> Ordering {
    match (a.kind, b.kind) {
        (NodeKind::Directory, NodeKind::File) => return Ordering::Less,
        (NodeKind::File, NodeKind::Directory) => return Ordering::Greater,
        _ => {}
    }

    match key {
        SortKey::Name => compare_names(&a.name, &b.name),
        SortKey::Size => b.size.unwrap_or(0).cmp(&a.size.unwrap_or(0)),
        SortKey::Tokens => b.token_count.cmp(&a.token_count),
    }
}

/// Case-insensitive name order; names equal ignoring case fall back to
/// byte order so the result is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Aggregate statistics over a finished tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
    /// Files visible in the tree.
    pub total_files: usize,
    /// Directories visible in the tree, root included.
    pub total_directories: usize,
    /// Grand total: the root's aggregated token count.
    pub total_tokens: usize,
}

impl TokenStats {
    /// Collect statistics with a full traversal of `root`.
    pub fn from_tree(root: &TreeNode) -> Self {
        TokenStats {
            total_files: root.file_count(),
            total_directories: root.directory_count(),
            total_tokens: root.token_count,
        }
    }
}

/// Options for rendering the tree.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Emit ANSI colors.
    pub color: bool,
}

impl RenderOptions {
    pub fn plain() -> Self {
        Self { color: false }
    }
}

/// Box-drawing characters for tree rendering.
const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const SPACE: &str = "    ";

/// Render a token tree to a string with box-drawing characters.
///
/// # Examples
///
/// ```
/// use ttree::tree::{RenderOptions, TreeNode, render_tree};
///
/// let mut root = TreeNode::directory("project", "/project", 42, None);
/// root.add_child(TreeNode::file("main.rs", "/project/main.rs", 42, Some(120)));
///
/// let output = render_tree(&root, &RenderOptions::plain());
/// assert_eq!(output, "project/ (42 tokens)\n└── main.rs (42 tokens)\n");
/// ```
pub fn render_tree(root: &TreeNode, options: &RenderOptions) -> String {
    let mut output = String::with_capacity(4096);
    render_node(&mut output, root, "", true, true, options);
    output
}

fn render_node(
    output: &mut String,
    node: &TreeNode,
    prefix: &str,
    is_last: bool,
    is_root: bool,
    options: &RenderOptions,
) {
    let branch = if is_root {
        ""
    } else if is_last {
        LAST_BRANCH
    } else {
        BRANCH
    };

    if options.color {
        output.push_str(&format!("{}", format!("{prefix}{branch}").bright_black()));
    } else {
        output.push_str(prefix);
        output.push_str(branch);
    }

    output.push_str(&render_label(node, options));
    output.push('\n');

    let children = node.children();
    for (i, child) in children.iter().enumerate() {
        let is_last_child = i == children.len() - 1;

        let new_prefix = if is_root {
            String::new()
        } else {
            let continuation = if is_last { SPACE } else { VERTICAL };
            format!("{}{}", prefix, continuation)
        };

        render_node(output, child, &new_prefix, is_last_child, false, options);
    }
}

/// `name/ (N tokens)` for directories, `name (N tokens)` for files.
fn render_label(node: &TreeNode, options: &RenderOptions) -> String {
    let tokens = format!("({} tokens)", format_tokens(node.token_count));

    if !options.color {
        return match node.kind {
            NodeKind::Directory => format!("{}/ {}", node.name, tokens),
            NodeKind::File => format!("{} {}", node.name, tokens),
        };
    }

    let tokens = match node.token_count {
        0 => tokens.bright_black(),
        1..=99 => tokens.green(),
        100..=999 => tokens.yellow(),
        _ => tokens.red(),
    };

    match node.kind {
        NodeKind::Directory => format!("{} {}", format!("{}/", node.name).blue(), tokens),
        NodeKind::File => format!("{} {}", node.name, tokens),
    }
}

/// Compact token count: `999`, `1.2k`, `3.4M`.
pub fn format_tokens(tokens: usize) -> String {
    if tokens < 1_000 {
        tokens.to_string()
    } else if tokens < 1_000_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    }
}

/// Format number with thousands separators.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
