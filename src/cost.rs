//! API cost estimates for a token total.
//!
//! Prices are USD per million tokens. Output tokens are estimated as a
//! fixed ratio of the input.

use std::fmt;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_OUTPUT_RATIO;

/// Model vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    Anthropic,
    OpenAI,
    Google,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => write!(f, "Anthropic"),
            Provider::OpenAI => write!(f, "OpenAI"),
            Provider::Google => write!(f, "Google"),
        }
    }
}

/// Price sheet entry for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: Provider,
    pub input_per_million: f64,
    pub output_per_million: f64,
    /// Shown when no models are selected.
    pub is_default: bool,
}

pub const MODEL_PRICING: &[ModelPricing] = &[
    ModelPricing {
        id: "claude-haiku-3.5",
        name: "Claude Haiku 3.5",
        provider: Provider::Anthropic,
        input_per_million: 0.80,
        output_per_million: 4.00,
        is_default: false,
    },
    ModelPricing {
        id: "claude-sonnet-4",
        name: "Claude Sonnet 4",
        provider: Provider::Anthropic,
        input_per_million: 3.00,
        output_per_million: 15.00,
        is_default: true,
    },
    ModelPricing {
        id: "claude-opus-4.1",
        name: "Claude Opus 4.1",
        provider: Provider::Anthropic,
        input_per_million: 15.00,
        output_per_million: 75.00,
        is_default: true,
    },
    ModelPricing {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: Provider::OpenAI,
        input_per_million: 2.50,
        output_per_million: 10.00,
        is_default: false,
    },
    ModelPricing {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        provider: Provider::OpenAI,
        input_per_million: 0.15,
        output_per_million: 0.60,
        is_default: false,
    },
    ModelPricing {
        id: "gpt-4-turbo",
        name: "GPT-4 Turbo",
        provider: Provider::OpenAI,
        input_per_million: 10.00,
        output_per_million: 30.00,
        is_default: false,
    },
    ModelPricing {
        id: "gemini-1.5-pro",
        name: "Gemini 1.5 Pro",
        provider: Provider::Google,
        input_per_million: 1.25,
        output_per_million: 5.00,
        is_default: false,
    },
];

/// Look up a model by id.
pub fn find_model(id: &str) -> Option<&'static ModelPricing> {
    MODEL_PRICING.iter().find(|m| m.id == id)
}

pub fn default_models() -> impl Iterator<Item = &'static ModelPricing> {
    MODEL_PRICING.iter().filter(|m| m.is_default)
}

/// Estimated cost of sending a token total to one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub model_id: String,
    pub model_name: String,
    pub provider: Provider,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
    pub total_cost_usd: f64,
}

impl CostEstimate {
    fn for_model(model: &ModelPricing, input_tokens: usize, output_ratio: f64) -> Self {
        let output_tokens = (input_tokens as f64 * output_ratio).round() as usize;
        let input_cost_usd = input_tokens as f64 / 1_000_000.0 * model.input_per_million;
        let output_cost_usd = output_tokens as f64 / 1_000_000.0 * model.output_per_million;

        Self {
            model_id: model.id.to_string(),
            model_name: model.name.to_string(),
            provider: model.provider,
            input_tokens,
            output_tokens,
            input_cost_usd,
            output_cost_usd,
            total_cost_usd: input_cost_usd + output_cost_usd,
        }
    }
}

/// Estimate costs for the selected model ids, or the default models when
/// `models` is empty. Unknown ids are skipped.
pub fn estimate_costs(input_tokens: usize, models: &[String], output_ratio: f64) -> Vec<CostEstimate> {
    if models.is_empty() {
        return default_models()
            .map(|m| CostEstimate::for_model(m, input_tokens, output_ratio))
            .collect();
    }

    models
        .iter()
        .filter_map(|id| {
            let model = find_model(id);
            if model.is_none() {
                log::warn!("unknown model `{id}`, skipping");
            }
            model
        })
        .map(|m| CostEstimate::for_model(m, input_tokens, output_ratio))
        .collect()
}

/// Format a USD amount: `$0.25‰` below a tenth of a cent, then
/// three decimals below a dollar, two above.
pub fn format_cost(cost: f64) -> String {
    if cost < 0.001 {
        format!("${:.2}‰", cost * 1000.0)
    } else if cost < 1.0 {
        format!("${cost:.3}")
    } else {
        format!("${cost:.2}")
    }
}

fn cost_color(cost: f64) -> Color {
    if cost < 0.01 {
        Color::Green
    } else if cost < 0.1 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Render estimates as a table, cheapest first. Empty input renders nothing.
pub fn render_cost_table(estimates: &[CostEstimate], output_ratio: f64, color: bool) -> String {
    if estimates.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&CostEstimate> = estimates.iter().collect();
    sorted.sort_by(|a, b| a.total_cost_usd.total_cmp(&b.total_cost_usd));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !color {
        table.force_no_tty();
    }
    table.set_header(vec![
        Cell::new("Model"),
        Cell::new("Input"),
        Cell::new("Output"),
        Cell::new("Total"),
    ]);

    for estimate in sorted {
        table.add_row(vec![
            Cell::new(&estimate.model_name),
            Cell::new(format_cost(estimate.input_cost_usd)).set_alignment(CellAlignment::Right),
            Cell::new(format_cost(estimate.output_cost_usd)).set_alignment(CellAlignment::Right),
            Cell::new(format_cost(estimate.total_cost_usd))
                .set_alignment(CellAlignment::Right)
                .fg(cost_color(estimate.total_cost_usd)),
        ]);
    }

    format!("Cost Estimates (Input + Output @ {output_ratio}x ratio):\n{table}")
}

/// Estimates for the default models at the default ratio.
pub fn default_estimates(input_tokens: usize) -> Vec<CostEstimate> {
    estimate_costs(input_tokens, &[], DEFAULT_OUTPUT_RATIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_default_models() {
        let ids: Vec<_> = default_models().map(|m| m.id).collect();
        assert_eq!(ids, vec!["claude-sonnet-4", "claude-opus-4.1"]);
    }

    #[test]
    fn test_estimate_for_million_tokens() {
        let estimates = estimate_costs(1_000_000, &["gpt-4o".to_string()], 0.5);
        assert_eq!(estimates.len(), 1);

        let e = &estimates[0];
        assert_eq!(e.output_tokens, 500_000);
        assert!(approx(e.input_cost_usd, 2.5));
        assert!(approx(e.output_cost_usd, 5.0));
        assert!(approx(e.total_cost_usd, 7.5));
        assert_eq!(e.provider, Provider::OpenAI);
    }

    #[test]
    fn test_output_tokens_round() {
        let estimates = estimate_costs(3, &["gpt-4o-mini".to_string()], 0.5);
        assert_eq!(estimates[0].output_tokens, 2);
    }

    #[test]
    fn test_unknown_models_are_skipped() {
        let models = vec!["nope".to_string(), "gemini-1.5-pro".to_string()];
        let estimates = estimate_costs(1000, &models, 0.5);
        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].model_name, "Gemini 1.5 Pro");
    }

    #[test]
    fn test_empty_selection_uses_defaults() {
        let estimates = default_estimates(10);
        assert_eq!(estimates.len(), 2);
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(0.0), "$0.00‰");
        assert_eq!(format_cost(0.00025), "$0.25‰");
        assert_eq!(format_cost(0.0126), "$0.013");
        assert_eq!(format_cost(0.5), "$0.500");
        assert_eq!(format_cost(12.345), "$12.35");
    }

    #[test]
    fn test_render_cost_table_sorted() {
        let models = vec!["claude-opus-4.1".to_string(), "gpt-4o-mini".to_string()];
        let estimates = estimate_costs(10_000, &models, 0.5);
        let table = render_cost_table(&estimates, 0.5, false);

        assert!(table.starts_with("Cost Estimates (Input + Output @ 0.5x ratio):\n"));
        let mini = table.find("GPT-4o Mini").unwrap();
        let opus = table.find("Claude Opus 4.1").unwrap();
        assert!(mini < opus);
        assert!(!table.contains('\u{1b}'));
    }

    #[test]
    fn test_render_cost_table_empty() {
        assert_eq!(render_cost_table(&[], 0.5, false), "");
    }

    #[test]
    fn test_estimate_json_keys() {
        let estimates = default_estimates(100);
        let value = serde_json::to_value(&estimates[0]).unwrap();
        assert_eq!(value["modelId"], "claude-sonnet-4");
        assert_eq!(value["provider"], "Anthropic");
        assert!(value.get("totalCostUsd").is_some());
    }
}
