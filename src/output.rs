//! Output formatting for ttree.
//!
//! A [`Report`] is the finished tree plus its stats (and optional cost
//! estimates). It renders as tree art with trailing stats, or as a JSON
//! document that parses back into the same report.

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cost::{render_cost_table, CostEstimate};
use crate::tree::{format_number, render_tree, RenderOptions, TokenStats, TreeNode};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Tree art with stats (default).
    #[default]
    Text,
    /// JSON for programmatic access.
    Json,
}

/// Options for text output.
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    pub color: bool,
    /// Ratio shown in the cost table header.
    pub output_ratio: f64,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub tree: TreeNode,
    pub stats: TokenStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costs: Option<Vec<CostEstimate>>,
}

impl Report {
    /// Report for a tree, with stats collected from it.
    pub fn new(tree: TreeNode) -> Self {
        let stats = TokenStats::from_tree(&tree);
        Self {
            tree,
            stats,
            costs: None,
        }
    }

    pub fn with_costs(mut self, costs: Vec<CostEstimate>) -> Self {
        self.costs = Some(costs);
        self
    }
}

/// Render the report as text.
pub fn format_text(report: &Report, options: &TextOptions) -> String {
    let render = RenderOptions {
        color: options.color,
    };

    let mut output = render_tree(&report.tree, &render);
    output.push('\n');
    output.push_str(&format_stats(&report.stats));

    if let Some(costs) = &report.costs {
        let table = render_cost_table(costs, options.output_ratio, options.color);
        if !table.is_empty() {
            output.push('\n');
            output.push_str(&table);
            output.push('\n');
        }
    }

    output
}

/// `Total: N tokens` and `Files: F, Directories: D` lines.
pub fn format_stats(stats: &TokenStats) -> String {
    format!(
        "Total: {} tokens\nFiles: {}, Directories: {}\n",
        format_number(stats.total_tokens),
        format_number(stats.total_files),
        format_number(stats.total_directories)
    )
}

/// Serialize the report as pretty-printed JSON.
pub fn format_json(report: &Report) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Parse a JSON report produced by [`format_json`].
pub fn parse_report(json: &str) -> Result<Report, OutputError> {
    Ok(serde_json::from_str(json)?)
}

/// Write the report in the chosen format.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &Report,
    format: OutputFormat,
    options: &TextOptions,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Text => writer.write_all(format_text(report, options).as_bytes())?,
        OutputFormat::Json => {
            writer.write_all(format_json(report)?.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}
