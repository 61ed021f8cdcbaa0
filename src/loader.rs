use crate::error::{Result, UcrError};
use crate::types::{ChannelGroup, GroupMultiplierTable, ManagedModel, PricingTable, UsageEvent};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tokio::fs as async_fs;
use tokio::io::{self, AsyncReadExt};

// Exports come as a bare array or an object holding the rows under a key
const PRICING_KEYS: &[&str] = &["items", "models"];
const EVENT_KEYS: &[&str] = &["events"];
const GROUP_KEYS: &[&str] = &["groups"];

fn rows_from_json<T: DeserializeOwned>(content: &str, keys: &[&str]) -> serde_json::Result<Vec<T>> {
    let mut document: Value = serde_json::from_str(content)?;
    if let Value::Object(fields) = &mut document {
        if let Some(rows) = keys.iter().find_map(|key| fields.remove(*key)) {
            return serde_json::from_value(rows);
        }
    }
    serde_json::from_value(document)
}

fn parse_rows<T: DeserializeOwned>(
    content: &str,
    keys: &[&str],
    context: &str,
) -> Result<Vec<T>> {
    rows_from_json(content, keys).map_err(|source| UcrError::JsonParse {
        context: context.to_string(),
        source,
    })
}

async fn read_file(path: &Path) -> Result<String> {
    async_fs::read_to_string(path)
        .await
        .map_err(|source| UcrError::FileRead {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse exported pricing rows into a lookup table
pub fn parse_pricing_table(content: &str) -> Result<PricingTable> {
    let rows: Vec<ManagedModel> = parse_rows(content, PRICING_KEYS, "pricing rows")?;
    let total = rows.len();
    let table = PricingTable::from_models(rows);
    if table.len() < total {
        tracing::warn!(
            rows = total,
            priced = table.len(),
            "Some pricing rows were skipped or duplicated"
        );
    }
    Ok(table)
}

pub fn parse_usage_events(content: &str) -> Result<Vec<UsageEvent>> {
    parse_rows(content, EVENT_KEYS, "usage events")
}

pub fn parse_group_multipliers(content: &str) -> Result<GroupMultiplierTable> {
    let groups: Vec<ChannelGroup> = parse_rows(content, GROUP_KEYS, "channel groups")?;
    Ok(GroupMultiplierTable::from_groups(groups))
}

pub async fn load_pricing_table(path: &Path) -> Result<PricingTable> {
    let content = read_file(path).await?;
    let table = parse_pricing_table(&content)?;
    tracing::debug!(path = %path.display(), models = table.len(), "Loaded pricing table");
    Ok(table)
}

pub async fn load_usage_events(path: &Path) -> Result<Vec<UsageEvent>> {
    let content = read_file(path).await?;
    let events = parse_usage_events(&content)?;
    tracing::debug!(path = %path.display(), events = events.len(), "Loaded usage events");
    Ok(events)
}

/// Load usage events from stdin
pub async fn read_usage_events_stdin() -> Result<Vec<UsageEvent>> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content).await?;
    Ok(rows_from_json(&content, EVENT_KEYS)?)
}

/// Load the group multiplier table; without a path only the default group exists
pub async fn load_group_multipliers(path: Option<&Path>) -> Result<GroupMultiplierTable> {
    let Some(path) = path else {
        return Ok(GroupMultiplierTable::new());
    };
    let content = read_file(path).await?;
    parse_group_multipliers(&content)
}
