//! `.gitignore` loading and evaluation.
//!
//! An ignore file contributes two ordered pattern lists: positive rules
//! that exclude paths and `!`-prefixed negative rules that re-include them.
//! Negation only applies within the file's own rules; it never overrides
//! the default or command-line ignore lists.

use std::io;
use std::path::Path;

use crate::pattern::{to_slash_path, PatternSet};

/// Name of the ignore file looked up directly under the scan root.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Rules parsed from a single ignore file.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRuleSet {
    positive: PatternSet,
    negative: PatternSet,
}

impl IgnoreRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from `path`, replacing any previously loaded rules.
    ///
    /// A missing file leaves the rule set empty and is not an error.
    pub fn load(&mut self, path: &Path) -> io::Result<()> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                self.parse(&content);
                log::debug!(
                    "loaded {} ignore rules ({} negated) from {}",
                    self.positive.len() + self.negative.len(),
                    self.negative.len(),
                    path.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.positive.clear();
                self.negative.clear();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Parse ignore-file content, replacing any previously loaded rules.
    pub fn parse(&mut self, content: &str) {
        self.positive.clear();
        self.negative.clear();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.strip_prefix('!') {
                Some(negated) => self.negative.push(negated),
                None => self.positive.push(line),
            }
        }
    }

    /// Build a rule set directly from ignore-file content.
    pub fn from_content(content: &str) -> Self {
        let mut rules = Self::new();
        rules.parse(content);
        rules
    }

    /// Check whether `path` is ignored, evaluated relative to `scan_root`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use ttree::ignore_rules::IgnoreRuleSet;
    ///
    /// let rules = IgnoreRuleSet::from_content("*.log\n!keep.log\n");
    /// let root = Path::new("/project");
    /// assert!(rules.is_ignored(Path::new("/project/debug.log"), root));
    /// assert!(!rules.is_ignored(Path::new("/project/keep.log"), root));
    /// ```
    pub fn is_ignored(&self, path: &Path, scan_root: &Path) -> bool {
        if self.positive.is_empty() {
            return false;
        }

        let relative = path.strip_prefix(scan_root).unwrap_or(path);
        let relative = to_slash_path(relative);

        self.positive.matches(&relative) && !self.negative.matches(&relative)
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    /// Positive (excluding) patterns, in file order.
    pub fn patterns(&self) -> Vec<&str> {
        self.positive.iter().map(|p| p.as_str()).collect()
    }

    /// Negative (re-including) patterns, in file order.
    pub fn negative_patterns(&self) -> Vec<&str> {
        self.negative.iter().map(|p| p.as_str()).collect()
    }
}
