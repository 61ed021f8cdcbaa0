use crate::formatting::{
    adjusted_lines, cached_tokens_text, cost_label, detail_lines, diff_colored, format_utc_datetime,
    input_cache_hit_text, state_badge, token_text,
};
use crate::pricing::CostCalculator;
use crate::types::{
    AdjustedCost, GroupMultiplierTable, ModelId, MultiplierPlan, PricingLookup, Reconciliation,
    RequestId, UsageEvent, UsageState,
};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;

/// Groups used when an event does not carry its own
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_groups: Vec<String>,
    pub subscription_group: Option<String>,
}

/// Reconciliation of one event plus the fields needed to show it
#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub event_id: i64,
    pub request_id: RequestId,
    pub model: Option<ModelId>,
    pub state: UsageState,
    pub created_at: Option<String>,
    pub cost_label: String,
    pub cached_tokens: String,
    pub cache_hit_rate: String,
    pub input_tokens: String,
    pub output_tokens: String,
    pub reconciliation: Reconciliation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted: Option<AdjustedCost>,
}

impl EventReport {
    pub fn build<L: PricingLookup>(
        calculator: &CostCalculator<L>,
        event: &UsageEvent,
        groups: &GroupMultiplierTable,
        user: &UserContext,
    ) -> Self {
        let reconciliation = calculator.reconcile(event);

        let user_groups = if event.user_groups.is_empty() {
            &user.user_groups
        } else {
            &event.user_groups
        };
        let subscription_group = event
            .subscription_group
            .as_deref()
            .or(user.subscription_group.as_deref());
        let adjusted = match reconciliation.breakdown() {
            Some(breakdown) if !user_groups.is_empty() || subscription_group.is_some() => {
                let plan = MultiplierPlan::resolve(user_groups.as_slice(), subscription_group, groups);
                Some(breakdown.adjust(&plan))
            }
            _ => None,
        };

        Self {
            event_id: event.id,
            request_id: event.request_id.clone(),
            model: event.model_id().cloned(),
            state: event.state.clone(),
            created_at: event.created_at.clone(),
            cost_label: cost_label(event),
            cached_tokens: cached_tokens_text(event),
            cache_hit_rate: input_cache_hit_text(event),
            input_tokens: token_text(event.tokens.input_tokens),
            output_tokens: token_text(event.tokens.output_tokens),
            reconciliation,
            adjusted,
        }
    }

    /// Whether the server's amount differs from every reconstruction we have.
    ///
    /// Events without a recorded cost (void, expired, unknown) never do.
    pub fn has_unexplained_diff(&self) -> bool {
        if self
            .reconciliation
            .breakdown()
            .is_some_and(|breakdown| !breakdown.is_comparable())
        {
            return false;
        }
        match (&self.adjusted, self.reconciliation.breakdown()) {
            (Some(adjusted), _) => !adjusted.diff_from_source.is_zero(),
            (None, Some(breakdown)) => !breakdown.matches_actual(),
            (None, None) => false,
        }
    }

    /// Header line followed by indented detail lines
    pub fn to_text_lines(&self) -> Vec<String> {
        let when = self
            .created_at
            .as_deref()
            .map(format_utc_datetime)
            .unwrap_or_else(|| "-".to_string());
        let model = self
            .model
            .as_ref()
            .map(ModelId::as_str)
            .unwrap_or("-");

        let mut lines = vec![format!(
            "#{} {} {} {} {} (in {} / out {} / cache {}, hit {})",
            self.event_id,
            when.dimmed(),
            model.cyan(),
            state_badge(&self.state),
            self.cost_label.bold(),
            self.input_tokens,
            self.output_tokens,
            self.cached_tokens,
            self.cache_hit_rate,
        )];
        lines.extend(
            detail_lines(&self.reconciliation)
                .into_iter()
                .map(|line| format!("  {line}")),
        );
        if let Some(breakdown) = self.reconciliation.breakdown().filter(|b| b.is_comparable()) {
            lines.push(format!("  Check: {}", diff_colored(breakdown.diff)));
        }
        if let Some(adjusted) = &self.adjusted {
            lines.extend(adjusted_lines(adjusted).into_iter().map(|line| format!("  {line}")));
        }
        lines
    }
}

/// Build reports for a batch of events in parallel, preserving order
pub fn build_reports<L: PricingLookup + Sync>(
    calculator: &CostCalculator<L>,
    events: &[UsageEvent],
    groups: &GroupMultiplierTable,
    user: &UserContext,
) -> Vec<EventReport> {
    events
        .par_iter()
        .map(|event| EventReport::build(calculator, event, groups, user))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelGroup, Money, Multiplier, PricingRate, PricingTable, TokenUsage};

    fn calculator() -> CostCalculator<PricingTable> {
        let mut table = PricingTable::new();
        table.insert("m1", PricingRate::from_decimals("10", "0", "2.5", "0"));
        CostCalculator::new(table)
    }

    fn groups() -> GroupMultiplierTable {
        GroupMultiplierTable::from_groups(vec![ChannelGroup {
            name: "vip".into(),
            price_multiplier: Multiplier::parse("0.8"),
        }])
    }

    fn event(committed: &str) -> UsageEvent {
        let mut event = UsageEvent::new("committed", Some("m1"), TokenUsage::new(1000, 0, 0, 0));
        event.id = 7;
        event.committed_usd = Money::parse(committed);
        event
    }

    #[test]
    fn test_report_without_groups_has_no_adjustment() {
        let report = EventReport::build(&calculator(), &event("0.01"), &groups(), &UserContext::default());
        assert!(report.adjusted.is_none());
        assert!(!report.has_unexplained_diff());
        assert_eq!(report.cost_label, "$0.01");
        assert_eq!(report.cached_tokens, "-");
    }

    #[test]
    fn test_group_discount_explains_diff() {
        let user = UserContext {
            user_groups: vec!["vip".into()],
            subscription_group: None,
        };
        let report = EventReport::build(&calculator(), &event("0.008"), &groups(), &user);
        let breakdown = report.reconciliation.breakdown().unwrap();
        assert!(!breakdown.matches_actual());
        assert!(!report.has_unexplained_diff());
        assert_eq!(
            report.adjusted.as_ref().map(|a| a.final_cost),
            Some(Money::parse("0.008"))
        );
    }

    #[test]
    fn test_event_groups_take_precedence() {
        let user = UserContext {
            user_groups: vec!["vip".into()],
            subscription_group: None,
        };
        let mut ev = event("0.01");
        ev.user_groups = vec!["default".into()];
        let report = EventReport::build(&calculator(), &ev, &groups(), &user);
        assert_eq!(
            report.adjusted.as_ref().map(|a| a.effective_multiplier),
            Some(Multiplier::ONE)
        );
    }

    #[test]
    fn test_text_lines_contain_detail() {
        let report = EventReport::build(&calculator(), &event("0.01"), &groups(), &UserContext::default());
        let lines = report.to_text_lines();
        assert!(lines[0].contains("#7"));
        assert!(lines[0].contains("m1"));
        assert!(lines.iter().any(|l| l.contains("Input (non-cached): 1,000 × $10/1M = $0.01")));
        assert!(lines.iter().any(|l| l.contains("Check:")));
    }

    #[test]
    fn test_void_event_is_not_a_mismatch() {
        let mut ev = event("0");
        ev.state = UsageState::Void;
        let report = EventReport::build(&calculator(), &ev, &groups(), &UserContext::default());
        assert_eq!(
            report.reconciliation.breakdown().map(|b| b.diff.to_string()),
            Some("-0.01".to_string())
        );
        assert!(!report.has_unexplained_diff());
        let lines = report.to_text_lines();
        assert!(!lines.iter().any(|l| l.contains("Difference") || l.contains("Check:")));

        let user = UserContext {
            user_groups: vec!["vip".into()],
            subscription_group: None,
        };
        let report = EventReport::build(&calculator(), &ev, &groups(), &user);
        assert!(report.adjusted.is_some());
        assert!(!report.has_unexplained_diff());
    }

    #[test]
    fn test_report_shows_grouped_tokens_and_hit_rate() {
        let mut ev = UsageEvent::new("committed", Some("m1"), TokenUsage::new(12_000, 3_000, 0, 0));
        ev.committed_usd = Money::parse("0.0975");
        let report = EventReport::build(&calculator(), &ev, &groups(), &UserContext::default());
        assert_eq!(report.input_tokens, "12,000");
        assert_eq!(report.cached_tokens, "3,000");
        assert_eq!(report.cache_hit_rate, "25.0%");
        assert!(!report.has_unexplained_diff());
        assert!(report.to_text_lines()[0].contains("hit 25.0%"));
    }

    #[test]
    fn test_unpriced_report_serializes() {
        let mut ev = event("0.01");
        ev.model = Some(ModelId::from("retired"));
        let reports = build_reports(&calculator(), &[ev], &groups(), &UserContext::default());
        let json = serde_json::to_value(&reports).unwrap();
        assert_eq!(json[0]["reconciliation"]["status"], "unpriced");
        assert_eq!(json[0]["model"], "retired");
        assert!(json[0].get("adjusted").is_none());
    }
}
