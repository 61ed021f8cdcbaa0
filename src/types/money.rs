use crate::constants::{MICRO_SCALE, MICROS_PER_UNIT};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

/// A monetary amount counted in micro-units (1 unit = 1e-6 USD)
///
/// All arithmetic is integer arithmetic and saturates at the `i128` range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i128);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create from a raw micro-unit count
    #[inline]
    pub const fn from_micros(micros: i128) -> Self {
        Money(micros)
    }

    /// Create from a whole number of currency units
    #[inline]
    pub fn from_units(units: i128) -> Self {
        Money(units.saturating_mul(MICROS_PER_UNIT))
    }

    /// Get the raw micro-unit count
    #[inline]
    pub const fn micros(&self) -> i128 {
        self.0
    }

    /// Parse a decimal string such as `"$1.50"`, `"-0.25"` or `"0.010000"`.
    ///
    /// Never fails: malformed input degrades to zero. Fractional digits past
    /// the sixth are truncated, not rounded.
    pub fn parse(raw: &str) -> Self {
        Money(parse_micros(raw))
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Format with a leading `$` (e.g. `"$0.01"`, `"-$0.25"`)
    pub fn to_usd_string(&self) -> String {
        format_micro(*self, true)
    }
}

/// Parse an optional decimal string into micro-units; `None` is zero.
pub fn parse_decimal_to_micro(raw: Option<&str>) -> Money {
    raw.map(Money::parse).unwrap_or_default()
}

fn parse_micros(raw: &str) -> i128 {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix('$') {
        s = rest.trim();
    }

    let negative = if let Some(rest) = s.strip_prefix('-') {
        s = rest.trim();
        true
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.trim();
        false
    } else {
        false
    };
    if s.is_empty() {
        return 0;
    }

    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));

    let units = int_part
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0i128, |acc, d| {
            acc.saturating_mul(10).saturating_add(i128::from(d))
        });

    // Right-pad to six digits, then drop everything past the sixth
    let mut frac = 0i128;
    let mut taken = 0;
    for d in frac_part.chars().filter_map(|c| c.to_digit(10)).take(MICRO_SCALE) {
        frac = frac * 10 + i128::from(d);
        taken += 1;
    }
    for _ in taken..MICRO_SCALE {
        frac *= 10;
    }

    let magnitude = units.saturating_mul(MICROS_PER_UNIT).saturating_add(frac);
    if negative { -magnitude } else { magnitude }
}

/// Render micro-units as a canonical decimal string.
///
/// Zero is `"0"`, a zero fraction has no decimal point and trailing
/// fractional zeros are stripped. The sign always precedes the `$`.
pub fn format_micro(value: Money, with_currency_symbol: bool) -> String {
    let symbol = if with_currency_symbol { "$" } else { "" };
    if value.0 == 0 {
        return format!("{symbol}0");
    }

    let sign = if value.0 < 0 { "-" } else { "" };
    let magnitude = value.0.unsigned_abs();
    let per_unit = MICROS_PER_UNIT.unsigned_abs();
    let units = magnitude / per_unit;
    let frac = magnitude % per_unit;
    if frac == 0 {
        return format!("{sign}{symbol}{units}");
    }

    let frac = format!("{:0width$}", frac, width = MICRO_SCALE);
    format!("{sign}{symbol}{units}.{}", frac.trim_end_matches('0'))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_micro(*self, false))
    }
}

impl FromStr for Money {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money::parse(s))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_micro(*self, false))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal string, a number or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Ok(Money::parse(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money::from_units(i128::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money::from_units(i128::from(v)))
    }

    // Goes through the shortest decimal rendering, never through float math
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Ok(Money::ZERO);
        }
        Ok(Money::parse(&v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Money, D::Error> {
        Money::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn micros(raw: &str) -> i128 {
        Money::parse(raw).micros()
    }

    #[test]
    fn test_parse_basic_values() {
        assert_eq!(micros("0.01"), 10_000);
        assert_eq!(micros("0.010000"), 10_000);
        assert_eq!(micros("1.5"), 1_500_000);
        assert_eq!(micros("10"), 10_000_000);
        assert_eq!(micros(".5"), 500_000);
        assert_eq!(micros("3."), 3_000_000);
    }

    #[test]
    fn test_parse_truncates_instead_of_rounding() {
        assert_eq!(micros("0.0000009"), 0);
        assert_eq!(micros("1.9999999"), 1_999_999);
        assert_eq!(micros("-0.0000019"), -1);
    }

    #[test]
    fn test_parse_sign_and_currency_prefix() {
        assert_eq!(micros("$1.50"), 1_500_000);
        assert_eq!(micros("-0.25"), -250_000);
        assert_eq!(micros("+0.25"), 250_000);
        assert_eq!(micros("$-0.5"), -500_000);
        assert_eq!(micros("-$0.5"), -500_000);
        assert_eq!(micros("  $ - 2 "), -2_000_000);
    }

    #[test]
    fn test_parse_malformed_degrades_to_zero() {
        assert_eq!(micros(""), 0);
        assert_eq!(micros("   "), 0);
        assert_eq!(micros("$"), 0);
        assert_eq!(micros("-"), 0);
        assert_eq!(micros("abc"), 0);
        assert_eq!(micros("."), 0);
        assert_eq!(parse_decimal_to_micro(None), Money::ZERO);
    }

    #[test]
    fn test_parse_discards_stray_characters() {
        assert_eq!(micros("1,000.5"), 1_000_500_000);
        assert_eq!(micros("0.1 2"), 120_000);
        // Only the first dot splits; later dots are stray characters
        assert_eq!(micros("1.2.3"), 1_230_000);
    }

    #[test]
    fn test_parse_saturates_on_huge_input() {
        let huge = "9".repeat(60);
        assert_eq!(micros(&huge), i128::MAX);
        assert_eq!(micros(&format!("-{huge}")), -i128::MAX);
    }

    #[test]
    fn test_format_micro() {
        assert_eq!(format_micro(Money::ZERO, false), "0");
        assert_eq!(format_micro(Money::ZERO, true), "$0");
        assert_eq!(format_micro(Money::from_micros(1_230_000), false), "1.23");
        assert_eq!(format_micro(Money::from_micros(2_000_000), false), "2");
        assert_eq!(format_micro(Money::from_micros(1), false), "0.000001");
        assert_eq!(format_micro(Money::from_micros(2_500), true), "$0.0025");
    }

    #[test]
    fn test_format_negative_sign_precedes_symbol() {
        assert_eq!(format_micro(Money::from_micros(-10_000), true), "-$0.01");
        assert_eq!(format_micro(Money::from_micros(-500_000), true), "-$0.5");
        assert_eq!(format_micro(Money::from_micros(-500_000), false), "-0.5");
        // Negative zero collapses to zero
        assert_eq!(format_micro(Money::parse("-0.000"), true), "$0");
    }

    #[test]
    fn test_canonical_strings_round_trip() {
        let cases = [
            ("0", "0"),
            ("0.01", "0.01"),
            ("1.230000", "1.23"),
            ("+7.5", "7.5"),
            ("-0.000001", "-0.000001"),
            ("123456789.123456", "123456789.123456"),
            ("$4.20", "4.2"),
        ];
        for (input, canonical) in cases {
            assert_eq!(Money::parse(input).to_string(), canonical, "input {input}");
        }
    }

    #[test]
    fn test_parse_inverts_format() {
        for raw in [0i128, 1, -1, 999_999, 1_000_000, -12_345_678, 10_000_000_000_001] {
            let value = Money::from_micros(raw);
            assert_eq!(Money::parse(&format_micro(value, false)), value);
            assert_eq!(Money::parse(&format_micro(value, true)), value);
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::parse("0.01");
        let b = Money::parse("0.0025");
        assert_eq!((a + b).to_string(), "0.0125");
        assert_eq!((b - a).to_usd_string(), "-$0.0075");
        assert_eq!((-a).to_string(), "-0.01");
        let total: Money = [a, b, a].into_iter().sum();
        assert_eq!(total.to_string(), "0.0225");
    }

    #[test]
    fn test_deserialize_from_wire_shapes() {
        let values: Vec<Money> =
            serde_json::from_str(r#"["0.010000", "$1.50", 2, 0.25, null, "garbage"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Money::from_micros(10_000),
                Money::from_micros(1_500_000),
                Money::from_micros(2_000_000),
                Money::from_micros(250_000),
                Money::ZERO,
                Money::ZERO,
            ]
        );
    }

    #[test]
    fn test_serialize_as_canonical_string() {
        let json = serde_json::to_string(&Money::from_micros(-250_000)).unwrap();
        assert_eq!(json, r#""-0.25""#);
    }

    #[test]
    fn test_from_str() {
        let money: Money = "0.5".parse().unwrap();
        assert_eq!(money, Money::from_micros(500_000));
    }
}
