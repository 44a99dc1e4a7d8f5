//! ttree - Show a directory tree annotated with LLM token counts.
//!
//! ttree walks a directory (honoring default ignores, user patterns and the
//! root `.gitignore`), tokenizes every text file once, and sums counts up
//! the tree so each directory shows the total of everything below it.
//!
//! # Quick Start
//!
//! ```no_run
//! use ttree::builder::Ttree;
//! use ttree::config::SortKey;
//! use ttree::tree::{render_tree, RenderOptions};
//!
//! let result = Ttree::new("./my-project")
//!     .ignore("*.lock")
//!     .sort(SortKey::Tokens)
//!     .build()
//!     .unwrap();
//!
//! print!("{}", render_tree(&result.tree, &RenderOptions::plain()));
//! println!("Total tokens: {}", result.stats.total_tokens);
//! ```
//!
//! # Modules
//!
//! - [`pattern`] - Glob-style pattern compilation and matching
//! - [`ignore_rules`] - `.gitignore` loading with negation
//! - [`filter`] - Text/binary classification by extension
//! - [`walker`] - Filtered, depth-limited directory scan
//! - [`tokens`] - Tokenizer handle and per-file counting
//! - [`tree`] - Token tree, stats and rendering
//! - [`builder`] - Tree aggregation and the fluent pipeline API
//! - [`cost`] - Model price table and cost estimates
//! - [`output`] - Text and JSON reports
//! - [`config`] - Option validation

pub mod pattern;
pub mod ignore_rules;
pub mod filter;
pub mod config;
pub mod errors;
pub mod walker;
pub mod tokens;
pub mod tree;
pub mod builder;
pub mod cost;
pub mod output;

// Re-export key types at crate root for convenience
pub use builder::{Ttree, TtreeResult};
pub use config::{Config, Options, SortKey};
pub use errors::TtreeError;
pub use tree::{TokenStats, TreeNode};
