//! Tree aggregation and the fluent pipeline API.
//!
//! [`TreeBuilder`] turns the scanner's flat entry list into a rooted
//! [`TreeNode`] tree:
//!
//! 1. entries are sorted once (directories first, then name or size),
//! 2. every file is tokenized exactly once,
//! 3. each file's count is added to all of its ancestor directories,
//! 4. entries are grouped by parent path and the tree is assembled top-down,
//!    hiding filtered nodes and sorting each level.
//!
//! Display filters only decide which nodes appear in `children`; directory
//! totals always include every scanned file below them.
//!
//! [`Ttree`] wires scanner, tokenizer and builder together.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::{Config, SortKey};
use crate::errors::TtreeError;
use crate::tokens::{count_file_tokens, TokenCounter, TokenError, Tokenizer, DEFAULT_ENCODING};
use crate::tree::{compare_names, TokenStats, TreeNode};
use crate::walker::{display_name, resolve_root, walk_with_options, Entry, WalkOptions};

/// Display and ordering options for tree building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub sort: SortKey,
    /// Hide file nodes, showing directories only.
    pub no_files: bool,
    /// Hide nodes with fewer tokens than this.
    pub threshold: Option<usize>,
}

impl BuildOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sort: config.sort,
            no_files: config.no_files,
            threshold: config.threshold,
        }
    }
}

/// Builds a token tree from scanned entries.
pub struct TreeBuilder<'a> {
    counter: &'a dyn TokenCounter,
    options: BuildOptions,
}

/// Per-build lookup tables.
struct Index<'e> {
    /// Direct children of each directory, in flat-sort order.
    children: HashMap<&'e Path, Vec<&'e Entry>>,
    /// Token count of each file.
    file_tokens: HashMap<&'e Path, usize>,
    /// Aggregated token count of each directory below the root.
    dir_tokens: HashMap<&'e Path, usize>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(counter: &'a dyn TokenCounter, options: BuildOptions) -> Self {
        Self { counter, options }
    }

    /// Build the tree rooted at `root` from `entries`.
    ///
    /// Every entry must lie strictly inside `root` (or be `root` itself for
    /// a single-file scan) and paths must be unique; anything else is an
    /// aggregation error and no tree is returned.
    pub fn build(&self, entries: &[Entry], root: &Path) -> Result<TreeNode, TtreeError> {
        let root = resolve_root(root)
            .map_err(|e| TtreeError::Aggregation(format!("cannot resolve {}: {e}", root.display())))?;

        let mut sorted: Vec<&Entry> = entries.iter().collect();
        sorted.sort_by(|a, b| flat_order(a, b, self.options.sort));

        check_entries(&sorted, &root)?;

        let mut index = Index {
            children: HashMap::new(),
            file_tokens: HashMap::new(),
            dir_tokens: HashMap::new(),
        };
        let mut root_tokens = 0usize;

        for &entry in &sorted {
            if entry.is_directory {
                index.dir_tokens.entry(entry.path.as_path()).or_insert(0);
            } else {
                let tokens = self.file_tokens(entry);
                index.file_tokens.insert(entry.path.as_path(), tokens);

                if entry.path == root {
                    root_tokens += tokens;
                    continue;
                }

                for ancestor in entry.path.ancestors().skip(1) {
                    if ancestor == root {
                        root_tokens += tokens;
                        break;
                    }
                    *index.dir_tokens.entry(ancestor).or_insert(0) += tokens;
                }
            }

            if let Some(parent) = entry.path.parent() {
                index.children.entry(parent).or_default().push(entry);
            }
        }

        let single_file = sorted.len() == 1 && sorted[0].path == root && !sorted[0].is_directory;
        let mut root_node = if single_file {
            TreeNode::file(display_name(&root), &root, root_tokens, None)
        } else {
            TreeNode::directory(display_name(&root), &root, root_tokens, None)
        };

        if root_node.is_directory() {
            self.attach_children(&mut root_node, &index);
        }

        log::debug!(
            "built tree for {} ({} tokens)",
            root.display(),
            root_node.token_count
        );
        Ok(root_node)
    }

    fn file_tokens(&self, entry: &Entry) -> usize {
        match count_file_tokens(self.counter, &entry.path, entry.size) {
            Ok(tokens) => tokens,
            Err(e @ TokenError::OversizedFile { .. }) => {
                log::warn!("{e}; counting as 0 tokens");
                0
            }
            Err(e) => {
                log::debug!("{e}; counting as 0 tokens");
                0
            }
        }
    }

    fn attach_children(&self, parent: &mut TreeNode, index: &Index<'_>) {
        let Some(entries) = index.children.get(parent.path.as_path()) else {
            return;
        };

        for entry in entries {
            let child = if entry.is_directory {
                let tokens = index
                    .dir_tokens
                    .get(entry.path.as_path())
                    .copied()
                    .unwrap_or(0);
                TreeNode::directory(&entry.name, &entry.path, tokens, Some(entry.size))
            } else {
                let tokens = index
                    .file_tokens
                    .get(entry.path.as_path())
                    .copied()
                    .unwrap_or(0);
                TreeNode::file(&entry.name, &entry.path, tokens, Some(entry.size))
            };

            if self.is_visible(&child) {
                parent.add_child(child);
            }
        }

        parent.sort_children(self.options.sort);

        for child in parent.children_mut() {
            if child.is_directory() {
                self.attach_children(child, index);
            }
        }
    }

    fn is_visible(&self, node: &TreeNode) -> bool {
        if self.options.no_files && node.is_file() {
            return false;
        }
        match self.options.threshold {
            Some(threshold) => node.token_count >= threshold,
            None => true,
        }
    }
}

/// Flat pre-sort: directories first, then name (or size descending).
fn flat_order(a: &Entry, b: &Entry, key: SortKey) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| match key {
            SortKey::Size => b.size.cmp(&a.size),
            SortKey::Name | SortKey::Tokens => compare_names(&a.name, &b.name),
        })
}

fn check_entries(entries: &[&Entry], root: &Path) -> Result<(), TtreeError> {
    let mut seen: HashSet<&Path> = HashSet::with_capacity(entries.len());

    for entry in entries {
        let inside = entry.path != root && entry.path.starts_with(root);
        let is_root_file = entry.path == root && !entry.is_directory && entries.len() == 1;
        if !inside && !is_root_file {
            return Err(TtreeError::Aggregation(format!(
                "entry {} is outside root {}",
                entry.path.display(),
                root.display()
            )));
        }
        if !seen.insert(entry.path.as_path()) {
            return Err(TtreeError::Aggregation(format!(
                "duplicate entry {}",
                entry.path.display()
            )));
        }
    }

    Ok(())
}

/// Builder for a complete scan-and-count run.
///
/// # Examples
///
/// ```no_run
/// use ttree::builder::Ttree;
/// use ttree::config::SortKey;
///
/// let result = Ttree::new("./project")
///     .max_depth(3)
///     .sort(SortKey::Tokens)
///     .threshold(100)
///     .build()
///     .unwrap();
///
/// println!("Total tokens: {}", result.stats.total_tokens);
/// ```
pub struct Ttree {
    root: PathBuf,
    encoding: String,
    walk_options: WalkOptions,
    build_options: BuildOptions,
}

impl Ttree {
    /// Create a new builder for the given root path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encoding: DEFAULT_ENCODING.to_string(),
            walk_options: WalkOptions::default(),
            build_options: BuildOptions::default(),
        }
    }

    /// Create a builder from a validated configuration.
    pub fn from_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root: root.into(),
            encoding: config.encoding.clone(),
            walk_options: WalkOptions::from_config(config),
            build_options: BuildOptions::from_config(config),
        }
    }

    /// Token encoding or model name.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Set maximum directory depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.walk_options.max_depth = depth;
        self
    }

    /// Add an ignore pattern on top of the defaults.
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.walk_options = self.walk_options.ignore(pattern);
        self
    }

    /// Add an include pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.walk_options = self.walk_options.include(pattern);
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.build_options.sort = key;
        self
    }

    /// Show directories only.
    pub fn no_files(mut self, no_files: bool) -> Self {
        self.build_options.no_files = no_files;
        self
    }

    /// Hide nodes below this many tokens.
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.build_options.threshold = Some(threshold);
        self
    }

    /// Load the tokenizer, scan, and build the tree.
    ///
    /// The tokenizer is loaded before scanning starts and released when
    /// this returns, on success or error.
    pub fn build(self) -> Result<TtreeResult, TtreeError> {
        let tokenizer = Tokenizer::new(&self.encoding)?;
        self.build_with_counter(&tokenizer)
    }

    /// Scan and build using a caller-provided token counter.
    pub fn build_with_counter(self, counter: &dyn TokenCounter) -> Result<TtreeResult, TtreeError> {
        let root = resolve_root(&self.root).map_err(|source| TtreeError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;

        log::info!("Analyzing directory: {}", root.display());
        let entries = walk_with_options(&root, &self.walk_options)?;
        log::info!("Found {} items, building token tree...", entries.len());

        let tree = TreeBuilder::new(counter, self.build_options).build(&entries, &root)?;
        let stats = TokenStats::from_tree(&tree);

        Ok(TtreeResult { tree, stats })
    }
}

/// Result of a ttree run.
#[derive(Debug, Clone)]
pub struct TtreeResult {
    pub tree: TreeNode,
    pub stats: TokenStats,
}

/// Build a token tree for a path with default options.
pub fn tree_from_path(root: impl AsRef<Path>) -> Result<TreeNode, TtreeError> {
    Ttree::new(root.as_ref()).build().map(|r| r.tree)
}
