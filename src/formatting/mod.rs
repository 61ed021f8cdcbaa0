pub mod detail;

use crate::types::{CostSource, Money, UsageEvent, UsageState, format_micro};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

pub use detail::{adjusted_lines, detail_lines};

/// Rate label such as `"$2.5/1M"`
pub fn format_usd_per_1m(rate: Money) -> String {
    format!("{}/1M", format_micro(rate, true))
}

/// Human label of a billing state
pub fn state_label(state: &UsageState) -> &str {
    match state {
        UsageState::Committed => "Settled",
        UsageState::Reserved => "Reserved",
        UsageState::Void => "Voided",
        UsageState::Expired => "Expired",
        UsageState::Unknown(raw) if raw.trim().is_empty() => "-",
        UsageState::Unknown(raw) => raw,
    }
}

/// State label colored like a status badge
pub fn state_badge(state: &UsageState) -> ColoredString {
    let label = state_label(state);
    match state {
        UsageState::Committed => label.green(),
        UsageState::Reserved => label.yellow(),
        _ => label.dimmed(),
    }
}

pub fn cost_source_label(source: CostSource) -> &'static str {
    match source {
        CostSource::Committed => "settled",
        CostSource::Reserved => "reserved",
        CostSource::None => "event",
    }
}

/// The event's actual cost with `$`, marked when only reserved
pub fn cost_label(event: &UsageEvent) -> String {
    let base = event.actual_cost().to_usd_string();
    if event.cost_source() == CostSource::Reserved {
        format!("{base} (reserved)")
    } else {
        base
    }
}

pub fn token_text(tokens: Option<i64>) -> String {
    match tokens {
        Some(n) => format_number_with_commas(n),
        None => "-".to_string(),
    }
}

/// Clamped cached tokens over both directions, or `-` when there are none
pub fn cached_tokens_text(event: &UsageEvent) -> String {
    let cached = event.tokens.cached_total();
    if cached <= 0 {
        "-".to_string()
    } else {
        format_number_with_commas(cached)
    }
}

/// Cache hit ratio (0..=1) as a percentage with one decimal
pub fn cache_hit_rate(ratio: f64) -> String {
    if !ratio.is_finite() {
        return "0.0%".to_string();
    }
    format!("{:.1}%", ratio * 100.0)
}

/// Share of input tokens served from cache, or `-` without input tokens
pub fn input_cache_hit_text(event: &UsageEvent) -> String {
    let input = event.tokens.input_split();
    if input.total <= 0 {
        return "-".to_string();
    }
    cache_hit_rate(input.cached as f64 / input.total as f64)
}

/// Render an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS` in UTC
pub fn format_utc_datetime(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso.trim()) {
        Ok(time) => time
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => iso.to_string(),
    }
}

/// Green when the reconstruction matches, yellow otherwise
pub fn diff_colored(diff: Money) -> ColoredString {
    let text = diff.to_usd_string();
    if diff.is_zero() {
        text.green()
    } else {
        text.yellow()
    }
}

// Format number with thousands separator
pub fn format_number_with_commas(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3 + 1);
    let mut count = 0;

    for c in s.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    if n < 0 {
        result.push('-');
    }

    result.chars().rev().collect()
}
