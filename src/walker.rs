//! Directory traversal with ignore-rule and include filtering.
//!
//! The walk is depth-first and pre-order. Every child of a listed directory
//! is checked against the ignore patterns (defaults plus user patterns),
//! the scan root's `.gitignore`, and the optional include patterns before
//! it is stat'ed and emitted. Rejected directories are not descended into.
//!
//! Only a failure to read the root is fatal. Unreadable subdirectories and
//! entries that cannot be stat'ed are logged and skipped.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::config::{Config, DEFAULT_IGNORE_PATTERNS, DEFAULT_MAX_DEPTH};
use crate::ignore_rules::{IgnoreRuleSet, IGNORE_FILE_NAME};
use crate::pattern::{to_slash_path, PatternSet};

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot read root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}")]
    EntryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Ignore patterns, defaults included.
    pub ignore_patterns: Vec<String>,
    /// When non-empty, only matching paths are kept.
    pub include_patterns: Vec<String>,
    /// Recursion limit; 0 lists only the root's direct children.
    pub max_depth: usize,
    /// Load `.gitignore` from the scan root.
    pub respect_gitignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            ignore_patterns: DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            include_patterns: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            respect_gitignore: true,
        }
    }
}

impl WalkOptions {
    /// Options derived from a validated run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            ignore_patterns: config.ignore.clone(),
            include_patterns: config.include.clone(),
            max_depth: config.max_depth,
            respect_gitignore: true,
        }
    }

    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Add an ignore pattern.
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_patterns.push(pattern.into());
        self
    }

    /// Add an include pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }
}

/// A filesystem object that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute path.
    pub path: PathBuf,
    /// Final path component.
    pub name: String,
    /// Size in bytes as reported by stat.
    pub size: u64,
    pub is_directory: bool,
}

/// Accept/reject logic for a single walk.
struct EntryFilter {
    ignore: PatternSet,
    include: PatternSet,
    rules: IgnoreRuleSet,
    root: PathBuf,
    cwd: Option<PathBuf>,
}

impl EntryFilter {
    /// Path used for ignore/include matching.
    ///
    /// Relative to the working directory; paths outside the working
    /// directory fall back to being relative to the scan root.
    fn match_path(&self, path: &Path) -> String {
        let from_cwd = self
            .cwd
            .as_deref()
            .and_then(|cwd| pathdiff::diff_paths(path, cwd))
            .filter(|rel| !rel.starts_with(".."));

        let relative = match from_cwd {
            Some(rel) => rel,
            None => path.strip_prefix(&self.root).unwrap_or(path).to_path_buf(),
        };
        to_slash_path(&relative)
    }

    fn accepts(&self, path: &Path) -> bool {
        let relative = self.match_path(path);

        if self.ignore.matches(&relative) || self.rules.is_ignored(path, &self.root) {
            log::trace!("ignored {relative}");
            return false;
        }

        if !self.include.is_empty() && !self.include.matches(&relative) {
            log::trace!("not included {relative}");
            return false;
        }

        true
    }
}

/// Walk a directory tree with default options.
///
/// # Examples
///
/// ```no_run
/// use ttree::walker::walk;
/// use std::path::Path;
///
/// for entry in walk(Path::new(".")).unwrap() {
///     println!("{}", entry.path.display());
/// }
/// ```
pub fn walk(root: &Path) -> Result<Vec<Entry>, WalkError> {
    walk_with_options(root, &WalkOptions::default())
}

/// Walk a directory tree with custom options, returning a flat, pre-order
/// list of entries. The root itself is not included.
pub fn walk_with_options(root: &Path, options: &WalkOptions) -> Result<Vec<Entry>, WalkError> {
    let root = resolve_root(root).map_err(|source| WalkError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let metadata = fs::metadata(&root).map_err(|source| WalkError::RootUnreadable {
        path: root.clone(),
        source,
    })?;

    if !metadata.is_dir() {
        return Ok(vec![Entry {
            name: display_name(&root),
            path: root,
            size: metadata.len(),
            is_directory: false,
        }]);
    }

    // Root listing failure is the one fatal I/O error.
    fs::read_dir(&root).map_err(|source| WalkError::RootUnreadable {
        path: root.clone(),
        source,
    })?;

    let mut rules = IgnoreRuleSet::new();
    if options.respect_gitignore {
        let ignore_file = root.join(IGNORE_FILE_NAME);
        if let Err(e) = rules.load(&ignore_file) {
            log::warn!("cannot read {}: {e}", ignore_file.display());
        }
    }

    let filter = EntryFilter {
        ignore: PatternSet::new(&options.ignore_patterns),
        include: PatternSet::new(&options.include_patterns),
        rules,
        cwd: std::env::current_dir().ok(),
        root: root.clone(),
    };

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(options.max_depth.saturating_add(1))
        .follow_links(true)
        .sort_by_file_name();

    let mut iter = walker.into_iter().filter_entry(|e| filter.accepts(e.path()));
    let mut entries = Vec::new();

    while let Some(result) = iter.next() {
        let dent = match result {
            Ok(dent) => dent,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                log::debug!("skipping: {}", WalkError::EntryUnreadable { path, source });
                continue;
            }
        };

        let metadata = match dent.metadata() {
            Ok(m) => m,
            Err(e) => {
                log::debug!("skipping {}: {e}", dent.path().display());
                if dent.file_type().is_dir() {
                    iter.skip_current_dir();
                }
                continue;
            }
        };

        entries.push(Entry {
            path: dent.path().to_path_buf(),
            name: dent.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            is_directory: metadata.is_dir(),
        });
    }

    log::debug!("scanned {} entries under {}", entries.len(), root.display());
    Ok(entries)
}

/// Absolute form of `path` with `.` and `..` removed lexically.
///
/// Symlinks are not resolved, so `link/..` is the directory holding `link`.
pub fn resolve_root(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

/// Final path segment, or the whole path when there is none (e.g. `/`).
pub fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |n| n.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub fn hello() {}").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();

        dir
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_walk_basic() {
        let dir = create_test_dir();

        let entries = walk(dir.path()).unwrap();

        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.path.is_absolute()));
        assert!(entries.iter().any(|e| e.name == "src" && e.is_directory));
        assert!(entries.iter().any(|e| e.path.ends_with("src/main.rs")));
        let toml = entries.iter().find(|e| e.name == "Cargo.toml").unwrap();
        assert_eq!(toml.size, 9);
        assert!(!toml.is_directory);
    }

    #[test]
    fn test_walk_is_preorder() {
        let dir = create_test_dir();

        let entries = walk(dir.path()).unwrap();

        assert_eq!(names(&entries), vec!["Cargo.toml", "src", "lib.rs", "main.rs"]);
    }

    #[test]
    fn test_walk_nonexistent_root_is_fatal() {
        let result = walk(Path::new("/nonexistent/path/for/ttree"));
        assert!(matches!(result, Err(WalkError::RootUnreadable { .. })));
    }

    #[test]
    fn test_resolve_root_drops_dot_components() {
        assert_eq!(
            resolve_root(Path::new("/a/b/../c/./d")).unwrap(),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(resolve_root(Path::new("/..")).unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn test_walk_parent_component_root() {
        let dir = create_test_dir();

        let entries = walk(&dir.path().join("src").join("..")).unwrap();

        let toml = entries.iter().find(|e| e.name == "Cargo.toml").unwrap();
        assert_eq!(toml.path, dir.path().join("Cargo.toml"));
    }

    #[test]
    fn test_walk_file_root() {
        let dir = create_test_dir();
        let entries = walk(&dir.path().join("Cargo.toml")).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Cargo.toml");
        assert!(!entries[0].is_directory);
    }

    #[test]
    fn test_walk_respects_gitignore() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "world").unwrap();
        fs::write(dir.path().join(".gitignore"), "sub\n").unwrap();

        let entries = walk(dir.path()).unwrap();

        assert_eq!(names(&entries), vec![".gitignore", "a.txt"]);
    }

    #[test]
    fn test_gitignore_negation() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("a.tmp"), "").unwrap();
        fs::write(dir.path().join("keep.tmp"), "").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.tmp\n!keep.tmp\n").unwrap();

        let entries = walk(dir.path()).unwrap();

        assert!(entries.iter().any(|e| e.name == "keep.tmp"));
        assert!(!entries.iter().any(|e| e.name == "a.tmp"));
    }

    #[test]
    fn test_gitignore_negation_cannot_override_defaults() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("server.log"), "").unwrap();
        fs::write(dir.path().join(".gitignore"), "!server.log\n").unwrap();

        let entries = walk(dir.path()).unwrap();

        assert!(!entries.iter().any(|e| e.name == "server.log"));
    }

    #[test]
    fn test_default_ignores() {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("node_modules/react")).unwrap();
        fs::write(dir.path().join("node_modules/react/index.js"), "x").unwrap();
        fs::create_dir_all(dir.path().join("pkg/.git")).unwrap();
        fs::write(dir.path().join("pkg/.git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join("pkg/lib.rs"), "").unwrap();

        let entries = walk(dir.path()).unwrap();

        assert_eq!(names(&entries), vec!["pkg", "lib.rs"]);
    }

    #[test]
    fn test_user_ignore_patterns() {
        let dir = create_test_dir();

        let options = WalkOptions::default().ignore("*.toml");
        let entries = walk_with_options(dir.path(), &options).unwrap();

        assert!(!entries.iter().any(|e| e.name == "Cargo.toml"));
        assert!(entries.iter().any(|e| e.name == "main.rs"));
    }

    #[test]
    fn test_include_patterns() {
        let dir = create_test_dir();

        let options = WalkOptions::default().include("src");
        let entries = walk_with_options(dir.path(), &options).unwrap();

        assert_eq!(names(&entries), vec!["src", "lib.rs", "main.rs"]);
    }

    #[test]
    fn test_include_rejects_non_matching_directories() {
        let dir = create_test_dir();

        let options = WalkOptions::default().include("*.toml");
        let entries = walk_with_options(dir.path(), &options).unwrap();

        assert_eq!(names(&entries), vec!["Cargo.toml"]);
    }

    #[test]
    fn test_max_depth_zero_lists_direct_children_only() {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/inner.txt"), "").unwrap();
        fs::write(dir.path().join("top.txt"), "").unwrap();

        let options = WalkOptions::default().max_depth(0);
        let entries = walk_with_options(dir.path(), &options).unwrap();

        assert_eq!(names(&entries), vec!["a", "top.txt"]);
    }

    #[test]
    fn test_max_depth_one() {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/b/c/deep.rs"), "").unwrap();
        fs::write(dir.path().join("a/shallow.rs"), "").unwrap();

        let options = WalkOptions::default().max_depth(1);
        let entries = walk_with_options(dir.path(), &options).unwrap();

        assert_eq!(names(&entries), vec!["a", "b", "shallow.rs"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "s").unwrap();
        fs::write(dir.path().join("open.txt"), "o").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = walk(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let entries = result.unwrap();
        assert!(entries.iter().any(|e| e.name == "open.txt"));
        assert!(entries.iter().any(|e| e.name == "locked"));
    }
}
