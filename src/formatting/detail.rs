//! Text for the "cost calculation" detail shown next to a usage event.

use super::{cost_source_label, format_number_with_commas, format_usd_per_1m};
use crate::types::{AdjustedCost, Money, Reconciliation, format_micro};

fn component_line(label: &str, tokens: i64, rate: Money, cost: Money) -> String {
    format!(
        "{label}: {} × {} = {}",
        format_number_with_commas(tokens),
        format_usd_per_1m(rate),
        format_micro(cost, true)
    )
}

fn diff_line(diff: Money) -> String {
    format!("Difference (event - formula): {}", format_micro(diff, true))
}

/// One line per tiered component, the total against the event's cost, and
/// the difference when it is non-zero and the event has a recorded cost
pub fn detail_lines(result: &Reconciliation) -> Vec<String> {
    let breakdown = match result {
        Reconciliation::Priced(breakdown) => breakdown,
        Reconciliation::Unpriced { model: Some(model), .. } => {
            return vec![format!(
                "No pricing found for model {model}; cost cannot be computed"
            )];
        }
        Reconciliation::Unpriced { model: None, .. } => {
            return vec!["No model recorded; cost cannot be computed".to_string()];
        }
    };

    let rate = &breakdown.rate;
    let mut lines = vec![
        component_line(
            "Input (non-cached)",
            breakdown.input.billable,
            rate.input_usd_per_1m,
            breakdown.input_cost,
        ),
        component_line(
            "Output (non-cached)",
            breakdown.output.billable,
            rate.output_usd_per_1m,
            breakdown.output_cost,
        ),
        component_line(
            "Cache input",
            breakdown.input.cached,
            rate.cache_input_usd_per_1m,
            breakdown.cache_input_cost,
        ),
        component_line(
            "Cache output",
            breakdown.output.cached,
            rate.cache_output_usd_per_1m,
            breakdown.cache_output_cost,
        ),
        format!(
            "Total: {} ({} cost: {})",
            format_micro(breakdown.reconstructed, true),
            cost_source_label(breakdown.cost_source),
            format_micro(breakdown.actual, true)
        ),
    ];
    if breakdown.is_comparable() && !breakdown.diff.is_zero() {
        lines.push(diff_line(breakdown.diff));
    }
    lines
}

/// Lines explaining how group multipliers turn the base cost into the final cost
pub fn adjusted_lines(adjusted: &AdjustedCost) -> Vec<String> {
    let factors = if adjusted.user_group_factors.is_empty() {
        "none".to_string()
    } else {
        adjusted
            .user_group_factors
            .iter()
            .map(|f| format!("{}×{}", f.group_name, f.multiplier))
            .collect::<Vec<_>>()
            .join(" × ")
    };

    let mut lines = vec![
        format!("Base cost: {}", format_micro(adjusted.base_cost, true)),
        format!("User group multipliers: {factors}"),
        format!("User multiplier: ×{}", adjusted.user_multiplier),
    ];
    if let Some(group) = &adjusted.subscription_group {
        lines.push(format!(
            "Subscription group: {group} (purchase eligibility only, not a price multiplier)"
        ));
    }
    lines.push(format!(
        "Effective multiplier: ×{}",
        adjusted.effective_multiplier
    ));
    lines.push(format!(
        "Final cost: {} × {} = {}",
        format_micro(adjusted.base_cost, true),
        adjusted.effective_multiplier,
        format_micro(adjusted.final_cost, true)
    ));
    if adjusted.is_comparable() && !adjusted.diff_from_source.is_zero() {
        lines.push(diff_line(adjusted.diff_from_source));
    }
    lines
}
