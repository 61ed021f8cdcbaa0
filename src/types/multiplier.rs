use super::money::Money;
use crate::constants::{DEFAULT_GROUP_NAME, MICRO_SCALE, MICROS_PER_UNIT};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

// Digits kept while multiplying factors together before the final truncation
const MAX_PRODUCT_SCALE: u32 = 24;

/// A price multiplier as a fixed-point decimal with six fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Multiplier(i128);

impl Multiplier {
    pub const ONE: Multiplier = Multiplier(MICROS_PER_UNIT);

    /// Parse with the same rules as monetary decimals
    pub fn parse(raw: &str) -> Self {
        Multiplier(Money::parse(raw).micros())
    }

    #[inline]
    pub const fn from_scaled(scaled: i128) -> Self {
        Multiplier(scaled)
    }

    #[inline]
    pub const fn scaled(&self) -> i128 {
        self.0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Exact product of all factors, truncated to six fractional digits
    pub fn product<I: IntoIterator<Item = Multiplier>>(factors: I) -> Self {
        let mut numerator: i128 = 1;
        let mut scale: u32 = 0;
        for factor in factors {
            // Shed fractional digits until the next factor fits
            numerator = loop {
                match numerator.checked_mul(factor.0) {
                    Some(next) => break next,
                    None if scale > 0 => {
                        numerator /= 10;
                        scale -= 1;
                    }
                    None => break numerator.saturating_mul(factor.0),
                }
            };
            scale += MICRO_SCALE as u32;
            while scale > MAX_PRODUCT_SCALE {
                numerator /= 10;
                scale -= 1;
            }
        }

        let target = MICRO_SCALE as u32;
        if scale >= target {
            Multiplier(numerator / 10i128.pow(scale - target))
        } else {
            Multiplier(numerator.saturating_mul(10i128.pow(target - scale)))
        }
    }

    /// Apply to a base cost, truncating to micro-units.
    ///
    /// A non-positive base or multiplier yields zero.
    pub fn apply(&self, base: Money) -> Money {
        if !base.is_positive() || self.0 <= 0 {
            return Money::ZERO;
        }
        Money::from_micros(base.micros().saturating_mul(self.0) / MICROS_PER_UNIT)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::ONE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Money::from_micros(self.0))
    }
}

impl Serialize for Multiplier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Multiplier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Money::deserialize(deserializer).map(|m| Multiplier(m.micros()))
    }
}

/// Trim a group name; blank names belong to the default group
pub fn normalize_group_name(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        DEFAULT_GROUP_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// A channel group row with its price multiplier
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelGroup {
    pub name: String,
    #[serde(default)]
    pub price_multiplier: Multiplier,
}

/// Group name to multiplier lookup; always knows the default group
#[derive(Debug, Clone)]
pub struct GroupMultiplierTable {
    by_name: HashMap<String, Multiplier>,
}

impl GroupMultiplierTable {
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        by_name.insert(DEFAULT_GROUP_NAME.to_string(), Multiplier::ONE);
        Self { by_name }
    }

    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = ChannelGroup>,
    {
        let mut table = Self::new();
        for group in groups {
            table.insert(&group.name, group.price_multiplier);
        }
        table
    }

    /// Negative multipliers are stored as 1
    pub fn insert(&mut self, name: &str, multiplier: Multiplier) {
        let multiplier = if multiplier.is_negative() {
            Multiplier::ONE
        } else {
            multiplier
        };
        self.by_name.insert(normalize_group_name(name), multiplier);
    }

    /// Multiplier of a group; unknown groups count as 1
    pub fn get(&self, name: &str) -> Multiplier {
        self.by_name
            .get(name)
            .copied()
            .filter(|m| !m.is_negative())
            .unwrap_or(Multiplier::ONE)
    }
}

impl Default for GroupMultiplierTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One user group and the factor it contributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFactor {
    pub group_name: String,
    pub multiplier: Multiplier,
}

/// Multipliers resolved for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiplierPlan {
    pub user_groups: Vec<String>,
    pub user_group_factors: Vec<GroupFactor>,
    pub user_multiplier: Multiplier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_group: Option<String>,
    pub effective_multiplier: Multiplier,
}

impl MultiplierPlan {
    /// Resolve the user's groups against the table.
    ///
    /// Group names are normalized and de-duplicated in order. The
    /// subscription group is recorded only; it never changes the multiplier.
    pub fn resolve<S: AsRef<str>>(
        user_groups: &[S],
        subscription_group: Option<&str>,
        table: &GroupMultiplierTable,
    ) -> Self {
        let mut seen = HashSet::with_capacity(user_groups.len());
        let mut names = Vec::with_capacity(user_groups.len());
        let mut factors = Vec::with_capacity(user_groups.len());

        for raw in user_groups {
            let name = normalize_group_name(raw.as_ref());
            if !seen.insert(name.clone()) {
                continue;
            }
            factors.push(GroupFactor {
                group_name: name.clone(),
                multiplier: table.get(&name),
            });
            names.push(name);
        }

        let user_multiplier = Multiplier::product(factors.iter().map(|f| f.multiplier));
        Self {
            user_groups: names,
            user_group_factors: factors,
            user_multiplier,
            subscription_group: subscription_group.map(normalize_group_name),
            effective_multiplier: user_multiplier,
        }
    }
}
