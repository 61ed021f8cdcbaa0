/// Number of micro-units in one currency unit (1 micro-USD = 1e-6 USD)
pub const MICROS_PER_UNIT: i128 = 1_000_000;

/// Number of fractional digits kept when parsing decimal strings
pub const MICRO_SCALE: usize = 6;

/// Rates are quoted per this many tokens
pub const TOKENS_PER_RATE_UNIT: i128 = 1_000_000;

/// Group name used when a user or channel group is blank
pub const DEFAULT_GROUP_NAME: &str = "default";
