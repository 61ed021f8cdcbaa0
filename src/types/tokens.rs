use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clamp a cached token count so it never exceeds its total.
///
/// A non-positive total or cached count yields zero.
#[inline]
pub fn clamp_cached(total: i64, cached: i64) -> i64 {
    if total <= 0 || cached <= 0 {
        return 0;
    }
    total.min(cached)
}

/// Split one direction's tokens into billable and cached parts
pub fn split_tokens(total: i64, cached: i64) -> TokenSplit {
    let total = total.max(0);
    let cached = clamp_cached(total, cached);
    TokenSplit {
        total,
        billable: total - cached,
        cached,
    }
}

/// Tokens of one direction (input or output) after clamping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenSplit {
    pub total: i64,
    pub billable: i64,
    pub cached: i64,
}

/// Raw token counts of one usage event as reported by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenUsage {
    #[serde(default, deserialize_with = "deserialize_token_count")]
    pub input_tokens: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_token_count")]
    pub cached_input_tokens: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_token_count")]
    pub output_tokens: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_token_count")]
    pub cached_output_tokens: Option<i64>,
}

impl TokenUsage {
    pub fn new(input: i64, cached_input: i64, output: i64, cached_output: i64) -> Self {
        Self {
            input_tokens: Some(input),
            cached_input_tokens: Some(cached_input),
            output_tokens: Some(output),
            cached_output_tokens: Some(cached_output),
        }
    }

    pub fn input_split(&self) -> TokenSplit {
        split_tokens(
            self.input_tokens.unwrap_or(0),
            self.cached_input_tokens.unwrap_or(0),
        )
    }

    pub fn output_split(&self) -> TokenSplit {
        split_tokens(
            self.output_tokens.unwrap_or(0),
            self.cached_output_tokens.unwrap_or(0),
        )
    }

    /// Cached tokens across both directions, after clamping
    pub fn cached_total(&self) -> i64 {
        self.input_split()
            .cached
            .saturating_add(self.output_split().cached)
    }
}

/// Accept integers, floats (truncated) and null for a token count
fn deserialize_token_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(TokenCountVisitor)
}

struct TokenCountVisitor;

impl<'de> Visitor<'de> for TokenCountVisitor {
    type Value = Option<i64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a token count or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Ok(Some(0));
        }
        // `as` saturates at the i64 bounds
        Ok(Some(v.trunc() as i64))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(TokenCountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_cached() {
        assert_eq!(clamp_cached(100, 150), 100);
        assert_eq!(clamp_cached(0, 50), 0);
        assert_eq!(clamp_cached(100, -5), 0);
        assert_eq!(clamp_cached(100, 40), 40);
        assert_eq!(clamp_cached(-10, 5), 0);
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(
            split_tokens(1000, 250),
            TokenSplit {
                total: 1000,
                billable: 750,
                cached: 250
            }
        );
        // Stale cached count larger than the total
        assert_eq!(split_tokens(100, 150).billable, 0);
        assert_eq!(split_tokens(100, 150).cached, 100);
        // Negative total never yields negative billable tokens
        assert_eq!(split_tokens(-5, 0), TokenSplit::default());
    }

    #[test]
    fn test_directions_are_independent() {
        let usage = TokenUsage::new(1000, 1000, 500, 0);
        assert_eq!(usage.input_split().billable, 0);
        assert_eq!(usage.input_split().cached, 1000);
        assert_eq!(usage.output_split().billable, 500);
        assert_eq!(usage.output_split().cached, 0);
        assert_eq!(usage.cached_total(), 1000);
    }

    #[test]
    fn test_cached_total_saturates() {
        let usage = TokenUsage::new(i64::MAX, i64::MAX, i64::MAX, i64::MAX);
        assert_eq!(usage.cached_total(), i64::MAX);
        assert_eq!(TokenUsage::new(100, 40, 10, 5).cached_total(), 45);
    }

    #[test]
    fn test_missing_counts_are_zero() {
        let usage: TokenUsage =
            serde_json::from_str(r#"{"input_tokens": null, "output_tokens": 12}"#).unwrap();
        assert_eq!(usage.input_tokens, None);
        assert_eq!(usage.input_split(), TokenSplit::default());
        assert_eq!(usage.output_split().billable, 12);
    }

    #[test]
    fn test_float_counts_are_truncated() {
        let usage: TokenUsage =
            serde_json::from_str(r#"{"input_tokens": 10.9, "cached_input_tokens": 3.2}"#)
                .unwrap();
        assert_eq!(usage.input_tokens, Some(10));
        assert_eq!(usage.input_split().billable, 7);
    }
}
