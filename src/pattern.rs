//! Glob-style pattern matching for ignore and include rules.
//!
//! Patterns use a small gitignore-flavored glob dialect that is compiled
//! to a regular expression once and then tested against `/`-separated
//! relative paths.
//!
//! - `*` matches within a single path segment
//! - `?` matches exactly one non-separator character
//! - `**` matches any number of path segments (including none)
//! - a pattern without `/` matches a basename at any depth
//! - a pattern with `/` is anchored at the root of the relative path
//!
//! Either form also matches everything nested below a matching path, so
//! `build` covers both the `build` directory and `build/out/app.js`.

use std::path::Path;

use regex::Regex;

/// A compiled ignore/include pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Option<Regex>,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// Never fails: a pattern that cannot be compiled yields a matcher that
    /// matches nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use ttree::pattern::Pattern;
    ///
    /// let pattern = Pattern::compile("*.log");
    /// assert!(pattern.matches("debug.log"));
    /// assert!(pattern.matches("logs/nested/debug.log"));
    /// assert!(!pattern.matches("debug.txt"));
    /// ```
    pub fn compile(pattern: &str) -> Self {
        let source = normalize(pattern);
        let regex = if source.is_empty() {
            None
        } else {
            let body = glob_to_regex(&source);
            let anchored = if source.contains('/') {
                format!("^{body}(/.*)?$")
            } else {
                format!("(^|.*/){body}(/.*)?$")
            };
            match Regex::new(&anchored) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    log::debug!("pattern {pattern:?} never matches: {e}");
                    None
                }
            }
        };

        Self { source, regex }
    }

    /// The normalized pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test a `/`-separated relative path against this pattern.
    pub fn matches(&self, relative_path: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(relative_path))
    }
}

/// Strip surrounding whitespace, one leading `/` and one trailing `/`.
///
/// Root-relative anchoring is implicit and directory patterns match both
/// the directory and its contents, so neither slash carries meaning.
pub fn normalize(pattern: &str) -> String {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Translate glob syntax into a regex body (no anchors).
fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // "dir/**" at the end: the directory itself or anything below it
            '/' if chars[i + 1..] == ['*', '*'] => {
                out.push_str("(?:/.*)?");
                break;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                let segment_start = i == 0 || chars[i - 1] == '/';
                if segment_start && chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '.' | '+' | '(' | ')' | '{' | '}' | '|' | '^' | '$' => {
                out.push('\\');
                out.push(chars[i]);
            }
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// An ordered list of patterns; matches if any member matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile every pattern in `patterns`, dropping blank ones.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter(|p| !p.as_ref().trim().is_empty())
            .map(|p| Pattern::compile(p.as_ref()))
            .collect();
        Self { patterns }
    }

    /// Append a single pattern.
    pub fn push(&mut self, pattern: &str) {
        self.patterns.push(Pattern::compile(pattern));
    }

    /// True when any pattern matches `relative_path`.
    pub fn matches(&self, relative_path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(relative_path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }
}

/// Render a relative path with `/` separators for matching.
pub fn to_slash_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
