use super::ids::ModelId;
use super::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-1M-token USD rates of one model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PricingRate {
    #[serde(default)]
    pub input_usd_per_1m: Money,
    #[serde(default)]
    pub output_usd_per_1m: Money,
    #[serde(default)]
    pub cache_input_usd_per_1m: Money,
    #[serde(default)]
    pub cache_output_usd_per_1m: Money,
}

impl PricingRate {
    /// Build from four decimal strings
    pub fn from_decimals(input: &str, output: &str, cache_input: &str, cache_output: &str) -> Self {
        Self {
            input_usd_per_1m: Money::parse(input),
            output_usd_per_1m: Money::parse(output),
            cache_input_usd_per_1m: Money::parse(cache_input),
            cache_output_usd_per_1m: Money::parse(cache_output),
        }
    }
}

/// A managed model row as exported by the gateway
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ManagedModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub public_id: ModelId,
    #[serde(default)]
    pub owned_by: Option<String>,
    #[serde(flatten)]
    pub rate: PricingRate,
    #[serde(default)]
    pub status: Option<i64>,
}

/// Read-only access to model pricing, injected into the calculator
#[cfg_attr(test, mockall::automock)]
pub trait PricingLookup {
    /// Rates for a model, or `None` when the model is unknown or retired
    fn rate_for(&self, model: &ModelId) -> Option<PricingRate>;
}

/// Pricing rows keyed by model public id
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    models: HashMap<ModelId, PricingRate>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from exported rows; rows with a blank public id are skipped and
    /// later rows replace earlier ones with the same id
    pub fn from_models<I>(models: I) -> Self
    where
        I: IntoIterator<Item = ManagedModel>,
    {
        let mut table = Self::new();
        for model in models {
            if model.public_id.is_blank() {
                tracing::debug!(id = ?model.id, "Skipping pricing row without public id");
                continue;
            }
            table.insert(model.public_id, model.rate);
        }
        table
    }

    pub fn insert(&mut self, model: impl Into<ModelId>, rate: PricingRate) {
        self.models.insert(model.into(), rate);
    }

    pub fn get(&self, model: &str) -> Option<&PricingRate> {
        self.models.get(&ModelId::from(model))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl PricingLookup for PricingTable {
    fn rate_for(&self, model: &ModelId) -> Option<PricingRate> {
        self.models.get(model).copied()
    }
}

impl FromIterator<ManagedModel> for PricingTable {
    fn from_iter<I: IntoIterator<Item = ManagedModel>>(iter: I) -> Self {
        Self::from_models(iter)
    }
}
