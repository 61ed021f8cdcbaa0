use crate::error::{Result, UcrError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PRICING: &str = "UCR_PRICING";
const ENV_EVENTS: &str = "UCR_EVENTS";
const ENV_GROUPS: &str = "UCR_GROUPS";
const ENV_USER_GROUPS: &str = "UCR_USER_GROUPS";
const ENV_OUTPUT: &str = "UCR_OUTPUT";
const ENV_COLOR: &str = "UCR_COLOR";

/// How reconciliation reports are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Settings of the `ucr` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pricing_path: Option<PathBuf>,
    /// Read events from stdin when unset
    pub events_path: Option<PathBuf>,
    pub groups_path: Option<PathBuf>,
    /// Groups of the user whose events are reconciled
    pub user_groups: Vec<String>,
    pub subscription_group: Option<String>,
    pub output: OutputFormat,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pricing_path: None,
            events_path: None,
            groups_path: None,
            user_groups: Vec::new(),
            subscription_group: None,
            output: OutputFormat::Text,
            color: true,
        }
    }
}

/// Values given on the command line; they win over every other source
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub pricing_path: Option<PathBuf>,
    pub events_path: Option<PathBuf>,
    pub groups_path: Option<PathBuf>,
    pub user_groups: Vec<String>,
    pub subscription_group: Option<String>,
    pub output: Option<OutputFormat>,
    pub no_color: bool,
}

/// Returns the ucr home directory (~/.ucr/)
pub fn ucr_home() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".ucr"))
}

/// Returns the path to the config file (~/.ucr/config.toml)
pub fn config_path() -> Option<PathBuf> {
    ucr_home().map(|home| home.join("config.toml"))
}

fn split_groups(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| UcrError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| UcrError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the config file, then the environment, then `overrides`
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_PRICING) {
            self.pricing_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_EVENTS) {
            self.events_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_GROUPS) {
            self.groups_path = Some(PathBuf::from(path));
        }
        if let Some(groups) = lookup(ENV_USER_GROUPS) {
            self.user_groups = split_groups(&groups);
        }
        if let Some(raw) = lookup(ENV_OUTPUT) {
            match OutputFormat::parse(&raw) {
                Some(output) => self.output = output,
                None => tracing::warn!(value = %raw, "Ignoring unknown {}", ENV_OUTPUT),
            }
        }
        if let Some(raw) = lookup(ENV_COLOR) {
            self.color = !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if overrides.pricing_path.is_some() {
            self.pricing_path = overrides.pricing_path;
        }
        if overrides.events_path.is_some() {
            self.events_path = overrides.events_path;
        }
        if overrides.groups_path.is_some() {
            self.groups_path = overrides.groups_path;
        }
        if !overrides.user_groups.is_empty() {
            self.user_groups = overrides.user_groups;
        }
        if overrides.subscription_group.is_some() {
            self.subscription_group = overrides.subscription_group;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if overrides.no_color {
            self.color = false;
        }
    }
}
