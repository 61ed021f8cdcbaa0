pub mod breakdown;
pub mod ids;
pub mod money;
pub mod multiplier;
pub mod pricing;
pub mod tokens;
pub mod usage;

pub use breakdown::{AdjustedCost, CostBreakdown, Reconciliation};
pub use ids::{ModelId, RequestId};
pub use money::{Money, format_micro, parse_decimal_to_micro};
pub use multiplier::{ChannelGroup, GroupFactor, GroupMultiplierTable, Multiplier, MultiplierPlan};
#[cfg(test)]
pub use pricing::MockPricingLookup;
pub use pricing::{ManagedModel, PricingLookup, PricingRate, PricingTable};
pub use tokens::{TokenSplit, TokenUsage, clamp_cached, split_tokens};
pub use usage::{CostSource, UsageEvent, UsageState};
