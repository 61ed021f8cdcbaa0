use crate::constants::TOKENS_PER_RATE_UNIT;
use crate::types::{CostBreakdown, Money, PricingLookup, Reconciliation, UsageEvent};
use rayon::prelude::*;

/// Cost of `tokens` at a per-1M-token rate, truncated to micro-units
#[inline]
pub fn cost_micro(tokens: i64, rate_per_1m: Money) -> Money {
    if tokens <= 0 || !rate_per_1m.is_positive() {
        return Money::ZERO;
    }
    let product = i128::from(tokens).saturating_mul(rate_per_1m.micros());
    Money::from_micros(product / TOKENS_PER_RATE_UNIT)
}

/// Reconciles usage events against an injected pricing lookup
pub struct CostCalculator<L> {
    pricing: L,
}

impl<L: PricingLookup> CostCalculator<L> {
    pub fn new(pricing: L) -> Self {
        Self { pricing }
    }

    /// Reconstruct one event's cost, or report it as unpriced
    pub fn reconcile(&self, event: &UsageEvent) -> Reconciliation {
        let Some(rate) = event
            .model_id()
            .and_then(|model| self.pricing.rate_for(model))
        else {
            tracing::debug!(
                event_id = event.id,
                model = ?event.model,
                "No pricing found for event"
            );
            return Reconciliation::Unpriced {
                model: event.model_id().cloned(),
                cost_source: event.cost_source(),
                actual: event.actual_cost(),
            };
        };

        let breakdown = CostBreakdown::compute(event, &rate);
        tracing::debug!(
            event_id = event.id,
            reconstructed = %breakdown.reconstructed,
            actual = %breakdown.actual,
            diff = %breakdown.diff,
            "Reconstructed event cost"
        );
        Reconciliation::Priced(breakdown)
    }
}

impl<L: PricingLookup + Sync> CostCalculator<L> {
    /// Reconcile a batch in parallel, preserving input order
    pub fn reconcile_all(&self, events: &[UsageEvent]) -> Vec<Reconciliation> {
        events.par_iter().map(|event| self.reconcile(event)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MockPricingLookup, ModelId, PricingRate, PricingTable, TokenUsage};

    #[test]
    fn test_cost_micro() {
        assert_eq!(cost_micro(1000, Money::parse("10")), Money::parse("0.01"));
        assert_eq!(cost_micro(1000, Money::parse("2.5")), Money::parse("0.0025"));
        // 1 token at $0.5/1M is half a micro-unit; truncated away
        assert_eq!(cost_micro(1, Money::parse("0.5")), Money::ZERO);
        assert_eq!(cost_micro(3, Money::parse("0.5")), Money::from_micros(1));
    }

    #[test]
    fn test_cost_micro_guards() {
        assert_eq!(cost_micro(0, Money::parse("10")), Money::ZERO);
        assert_eq!(cost_micro(-100, Money::parse("10")), Money::ZERO);
        assert_eq!(cost_micro(100, Money::ZERO), Money::ZERO);
        assert_eq!(cost_micro(100, Money::parse("-10")), Money::ZERO);
    }

    #[test]
    fn test_cost_micro_large_volumes_do_not_overflow() {
        let cost = cost_micro(i64::MAX, Money::parse("1000000"));
        assert_eq!(cost, Money::from_units(i128::from(i64::MAX)));
    }

    #[test]
    fn test_reconcile_priced_event() {
        let mut table = PricingTable::new();
        table.insert("m1", PricingRate::from_decimals("10", "0", "2.5", "0"));
        let calculator = CostCalculator::new(table);

        let mut event = UsageEvent::new("committed", Some("m1"), TokenUsage::new(1000, 0, 0, 0));
        event.committed_usd = Money::parse("0.01");

        let result = calculator.reconcile(&event);
        assert!(result.is_available());
        let breakdown = result.breakdown().unwrap();
        assert_eq!(breakdown.reconstructed.to_string(), "0.01");
        assert!(breakdown.matches_actual());
    }

    #[test]
    fn test_unpriced_model_is_not_zero() {
        let calculator = CostCalculator::new(PricingTable::new());
        let mut event = UsageEvent::new("reserved", Some("retired"), TokenUsage::new(10, 0, 0, 0));
        event.reserved_usd = Money::parse("0.2");

        let result = calculator.reconcile(&event);
        assert!(!result.is_available());
        assert_eq!(
            result,
            Reconciliation::Unpriced {
                model: Some(ModelId::from("retired")),
                cost_source: crate::types::CostSource::Reserved,
                actual: Money::parse("0.2"),
            }
        );
    }

    #[test]
    fn test_missing_model_skips_lookup() {
        let mut pricing = MockPricingLookup::new();
        pricing.expect_rate_for().never();
        let calculator = CostCalculator::new(pricing);

        let event = UsageEvent::new("committed", None, TokenUsage::new(10, 0, 0, 0));
        assert!(!calculator.reconcile(&event).is_available());

        let blank = UsageEvent::new("committed", Some(" "), TokenUsage::new(10, 0, 0, 0));
        assert!(!calculator.reconcile(&blank).is_available());
    }

    #[test]
    fn test_lookup_receives_event_model() {
        let mut pricing = MockPricingLookup::new();
        pricing
            .expect_rate_for()
            .withf(|model| model.as_str() == "gpt-4o")
            .times(1)
            .returning(|_| Some(PricingRate::from_decimals("5", "15", "0", "0")));
        let calculator = CostCalculator::new(pricing);

        let event = UsageEvent::new("committed", Some("gpt-4o"), TokenUsage::new(0, 0, 2000, 0));
        let result = calculator.reconcile(&event);
        assert_eq!(
            result.breakdown().map(|b| b.output_cost),
            Some(Money::parse("0.03"))
        );
    }

    #[test]
    fn test_reconcile_all_preserves_order() {
        let mut table = PricingTable::new();
        table.insert("m1", PricingRate::from_decimals("1", "0", "0", "0"));
        let calculator = CostCalculator::new(table);

        let events: Vec<UsageEvent> = (1..=50)
            .map(|i| {
                let model = if i % 5 == 0 { "unknown" } else { "m1" };
                let mut event =
                    UsageEvent::new("committed", Some(model), TokenUsage::new(i * 1000, 0, 0, 0));
                event.id = i;
                event
            })
            .collect();

        let results = calculator.reconcile_all(&events);
        assert_eq!(results.len(), events.len());
        for (event, result) in events.iter().zip(&results) {
            assert_eq!(result.is_available(), event.id % 5 != 0);
            if let Some(breakdown) = result.breakdown() {
                assert_eq!(breakdown.input.total, event.id * 1000);
            }
        }
    }
}
