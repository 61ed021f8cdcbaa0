use super::ids::{ModelId, RequestId};
use super::money::Money;
use super::tokens::TokenUsage;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Billing state of a usage event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum UsageState {
    Committed,
    Reserved,
    Void,
    Expired,
    /// Any literal the server sends that this crate does not know
    Unknown(String),
}

impl UsageState {
    pub fn as_str(&self) -> &str {
        match self {
            UsageState::Committed => "committed",
            UsageState::Reserved => "reserved",
            UsageState::Void => "void",
            UsageState::Expired => "expired",
            UsageState::Unknown(raw) => raw,
        }
    }

    /// Where the actual cost of an event in this state comes from
    pub fn cost_source(&self) -> CostSource {
        match self {
            UsageState::Committed => CostSource::Committed,
            UsageState::Reserved => CostSource::Reserved,
            _ => CostSource::None,
        }
    }
}

impl Default for UsageState {
    fn default() -> Self {
        UsageState::Unknown(String::new())
    }
}

// Missing or null states read as an unknown, blank state
fn deserialize_state<'de, D>(deserializer: D) -> Result<UsageState, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(UsageState::from)
        .unwrap_or_default())
}

impl From<String> for UsageState {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "committed" => UsageState::Committed,
            "reserved" => UsageState::Reserved,
            "void" => UsageState::Void,
            "expired" => UsageState::Expired,
            _ => UsageState::Unknown(raw),
        }
    }
}

impl From<&str> for UsageState {
    fn from(raw: &str) -> Self {
        UsageState::from(raw.to_string())
    }
}

impl From<UsageState> for String {
    fn from(state: UsageState) -> Self {
        match state {
            UsageState::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for UsageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which recorded amount counts as the event's actual cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSource {
    Committed,
    Reserved,
    None,
}

impl CostSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostSource::Committed => "committed",
            CostSource::Reserved => "reserved",
            CostSource::None => "none",
        }
    }
}

/// Cost-relevant fields of one usage event
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UsageEvent {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub request_id: RequestId,
    #[serde(default)]
    pub model: Option<ModelId>,
    #[serde(default, deserialize_with = "deserialize_state")]
    pub state: UsageState,
    #[serde(default)]
    pub committed_usd: Money,
    #[serde(default)]
    pub reserved_usd: Money,
    #[serde(flatten)]
    pub tokens: TokenUsage,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_groups: Vec<String>,
    #[serde(default)]
    pub subscription_group: Option<String>,
}

impl UsageEvent {
    /// Minimal event, mostly useful for tests and fixtures
    pub fn new(state: impl Into<UsageState>, model: Option<&str>, tokens: TokenUsage) -> Self {
        Self {
            id: 0,
            request_id: RequestId::default(),
            model: model.map(ModelId::from),
            state: state.into(),
            committed_usd: Money::ZERO,
            reserved_usd: Money::ZERO,
            tokens,
            created_at: None,
            user_groups: Vec::new(),
            subscription_group: None,
        }
    }

    /// Model id, or `None` when absent or blank
    pub fn model_id(&self) -> Option<&ModelId> {
        self.model.as_ref().filter(|m| !m.is_blank())
    }

    pub fn cost_source(&self) -> CostSource {
        self.state.cost_source()
    }

    /// The server-recorded cost for the event's billing state
    pub fn actual_cost(&self) -> Money {
        match self.cost_source() {
            CostSource::Committed => self.committed_usd,
            CostSource::Reserved => self.reserved_usd,
            CostSource::None => Money::ZERO,
        }
    }
}
