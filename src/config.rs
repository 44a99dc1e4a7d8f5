//! Run configuration and validation.
//!
//! [`Options`] holds raw, user-facing values (as parsed from the command
//! line). [`Options::validate`] checks them once, before any filesystem
//! work, and produces a typed [`Config`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TtreeError;
use crate::tokens::DEFAULT_ENCODING;

/// Default recursion limit for the scanner.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default output/input token ratio for cost estimates.
pub const DEFAULT_OUTPUT_RATIO: f64 = 0.5;

/// Names that are always skipped, at any depth.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    ".vscode",
    ".idea",
    "*.log",
    ".DS_Store",
    "Thumbs.db",
];

/// Key used to order siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Lexicographic by name.
    #[default]
    Name,
    /// Descending by size in bytes.
    Size,
    /// Descending by token count.
    Tokens,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Size => write!(f, "size"),
            SortKey::Tokens => write!(f, "tokens"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            "tokens" => Ok(SortKey::Tokens),
            _ => Err(format!("unknown sort key: {s} (expected name, size or tokens)")),
        }
    }
}

/// Raw options, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub max_depth: Option<i64>,
    pub ignore: Vec<String>,
    pub include: Vec<String>,
    pub encoding: Option<String>,
    pub json: bool,
    pub no_files: bool,
    pub sort: Option<String>,
    pub threshold: Option<i64>,
    pub cost: bool,
    pub models: Vec<String>,
    pub output_ratio: Option<f64>,
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_depth: usize,
    /// Default patterns followed by user patterns.
    pub ignore: Vec<String>,
    pub include: Vec<String>,
    pub encoding: String,
    pub json: bool,
    pub no_files: bool,
    pub sort: SortKey,
    pub threshold: Option<usize>,
    pub cost: bool,
    pub models: Vec<String>,
    pub output_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            ignore: default_ignore_patterns(),
            include: Vec::new(),
            encoding: DEFAULT_ENCODING.to_string(),
            json: false,
            no_files: false,
            sort: SortKey::Name,
            threshold: None,
            cost: false,
            models: Vec::new(),
            output_ratio: DEFAULT_OUTPUT_RATIO,
        }
    }
}

fn default_ignore_patterns() -> Vec<String> {
    DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect()
}

/// Split comma-separated list items and drop empty ones.
fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl Options {
    /// Validate raw options, naming the first offending field on error.
    pub fn validate(&self) -> Result<Config, TtreeError> {
        let max_depth = match self.max_depth {
            None => DEFAULT_MAX_DEPTH,
            Some(depth) if depth > 0 => usize::try_from(depth)
                .map_err(|_| TtreeError::config("max_depth", format!("{depth} is too large")))?,
            Some(depth) => {
                return Err(TtreeError::config(
                    "max_depth",
                    format!("must be a positive integer, got {depth}"),
                ))
            }
        };

        let threshold = match self.threshold {
            None => None,
            Some(t) if t >= 0 => Some(
                usize::try_from(t)
                    .map_err(|_| TtreeError::config("threshold", format!("{t} is too large")))?,
            ),
            Some(t) => {
                return Err(TtreeError::config(
                    "threshold",
                    format!("must be non-negative, got {t}"),
                ))
            }
        };

        let sort = match &self.sort {
            None => SortKey::default(),
            Some(s) => s.parse().map_err(|e: String| TtreeError::config("sort", e))?,
        };

        let encoding = match &self.encoding {
            Some(e) if e.trim().is_empty() => {
                return Err(TtreeError::config("encoding", "must not be empty"))
            }
            Some(e) => e.trim().to_string(),
            None => DEFAULT_ENCODING.to_string(),
        };

        let output_ratio = match self.output_ratio {
            None => DEFAULT_OUTPUT_RATIO,
            Some(r) if r.is_finite() && r >= 0.0 => r,
            Some(r) => {
                return Err(TtreeError::config(
                    "output_ratio",
                    format!("must be a non-negative number, got {r}"),
                ))
            }
        };

        let mut ignore = default_ignore_patterns();
        ignore.extend(split_list(&self.ignore));

        Ok(Config {
            max_depth,
            ignore,
            include: split_list(&self.include),
            encoding,
            json: self.json,
            no_files: self.no_files,
            sort,
            threshold,
            cost: self.cost,
            models: split_list(&self.models),
            output_ratio,
        })
    }
}
