// Module declarations
pub mod config;
pub mod constants;
pub mod error;
pub mod formatting;
pub mod loader;
pub mod pricing;
pub mod report;
pub mod types;

// Re-export commonly used items
pub use error::{Result, UcrError};
pub use pricing::{CostCalculator, cost_micro};
pub use types::{
    CostBreakdown, CostSource, ManagedModel, ModelId, Money, PricingLookup, PricingRate,
    PricingTable, Reconciliation, TokenSplit, TokenUsage, UsageEvent, UsageState, clamp_cached,
    format_micro, parse_decimal_to_micro, split_tokens,
};
