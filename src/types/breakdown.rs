use super::ids::ModelId;
use super::money::Money;
use super::multiplier::{GroupFactor, Multiplier, MultiplierPlan};
use super::pricing::PricingRate;
use super::tokens::TokenSplit;
use super::usage::{CostSource, UsageEvent};
use crate::pricing::cost_micro;
use serde::Serialize;

/// Auditable reconstruction of one event's cost from tokens and rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub input: TokenSplit,
    pub output: TokenSplit,
    pub rate: PricingRate,
    pub input_cost: Money,
    pub output_cost: Money,
    pub cache_input_cost: Money,
    pub cache_output_cost: Money,
    pub reconstructed: Money,
    pub cost_source: CostSource,
    pub actual: Money,
    /// `actual - reconstructed`
    pub diff: Money,
}

impl CostBreakdown {
    /// Reconstruct the cost of `event` at `rate`.
    ///
    /// Billable tokens are charged at the base rates and cached tokens at
    /// the cache rates, one direction at a time.
    pub fn compute(event: &UsageEvent, rate: &PricingRate) -> Self {
        let input = event.tokens.input_split();
        let output = event.tokens.output_split();

        let input_cost = cost_micro(input.billable, rate.input_usd_per_1m);
        let output_cost = cost_micro(output.billable, rate.output_usd_per_1m);
        let cache_input_cost = cost_micro(input.cached, rate.cache_input_usd_per_1m);
        let cache_output_cost = cost_micro(output.cached, rate.cache_output_usd_per_1m);
        let reconstructed = input_cost + output_cost + cache_input_cost + cache_output_cost;

        let actual = event.actual_cost();
        Self {
            input,
            output,
            rate: *rate,
            input_cost,
            output_cost,
            cache_input_cost,
            cache_output_cost,
            reconstructed,
            cost_source: event.cost_source(),
            actual,
            diff: actual - reconstructed,
        }
    }

    /// True when the server's amount matches the reconstruction exactly
    #[inline]
    pub fn matches_actual(&self) -> bool {
        self.diff.is_zero()
    }

    /// Void, expired and unknown events have no recorded cost to compare against
    #[inline]
    pub fn is_comparable(&self) -> bool {
        self.cost_source != CostSource::None
    }

    /// Apply user-group multipliers on top of the reconstructed base cost
    pub fn adjust(&self, plan: &MultiplierPlan) -> AdjustedCost {
        let final_cost = plan.effective_multiplier.apply(self.reconstructed);
        AdjustedCost {
            base_cost: self.reconstructed,
            user_group_factors: plan.user_group_factors.clone(),
            user_multiplier: plan.user_multiplier,
            subscription_group: plan.subscription_group.clone(),
            effective_multiplier: plan.effective_multiplier,
            final_cost,
            cost_source: self.cost_source,
            diff_from_source: self.actual - final_cost,
        }
    }
}

/// Base cost with user-group multipliers applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedCost {
    pub base_cost: Money,
    pub user_group_factors: Vec<GroupFactor>,
    pub user_multiplier: Multiplier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_group: Option<String>,
    pub effective_multiplier: Multiplier,
    pub final_cost: Money,
    pub cost_source: CostSource,
    pub diff_from_source: Money,
}

impl AdjustedCost {
    #[inline]
    pub fn is_comparable(&self) -> bool {
        self.cost_source != CostSource::None
    }
}

/// Outcome of reconciling one event against the pricing lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reconciliation {
    /// Rates were found and the cost was reconstructed
    Priced(CostBreakdown),
    /// No pricing for the event's model; the cost cannot be reconstructed
    Unpriced {
        model: Option<ModelId>,
        cost_source: CostSource,
        actual: Money,
    },
}

impl Reconciliation {
    /// Whether a breakdown could be computed
    pub fn is_available(&self) -> bool {
        matches!(self, Reconciliation::Priced(_))
    }

    pub fn breakdown(&self) -> Option<&CostBreakdown> {
        match self {
            Reconciliation::Priced(breakdown) => Some(breakdown),
            Reconciliation::Unpriced { .. } => None,
        }
    }

    pub fn actual(&self) -> Money {
        match self {
            Reconciliation::Priced(breakdown) => breakdown.actual,
            Reconciliation::Unpriced { actual, .. } => *actual,
        }
    }
}
