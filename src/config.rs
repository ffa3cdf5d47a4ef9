//! Runtime configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::autosave::AutoSaveConfig;
use crate::store::Ttl;

pub const DEFAULT_STORAGE_DIR: &str = ".drafts";

#[derive(Debug, Clone, PartialEq)]
pub struct DraftConfig {
    /// Lifetime of every record written.
    pub ttl: Ttl,
    pub autosave: AutoSaveConfig,
    /// Directory used by the file-backed device store.
    pub storage_dir: PathBuf,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            ttl: Ttl::default(),
            autosave: AutoSaveConfig::default(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

impl DraftConfig {
    /// Defaults overridden by environment:
    /// - `DRAFTS_TTL_HOURS` (fractional hours)
    /// - `DRAFTS_DEBOUNCE_MS`
    /// - `DRAFTS_INTERVAL_MS` (0 disables the periodic save)
    /// - `DRAFTS_AUTOSAVE` (`true`/`false`/`1`/`0`)
    /// - `DRAFTS_DIR`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(hours) = parse_var::<f64>(&lookup, "DRAFTS_TTL_HOURS")? {
            config.ttl = Ttl::from_hours(hours).context("DRAFTS_TTL_HOURS is out of range")?;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "DRAFTS_DEBOUNCE_MS")? {
            config.autosave.debounce_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "DRAFTS_INTERVAL_MS")? {
            config.autosave.interval = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("DRAFTS_AUTOSAVE") {
            config.autosave.enabled = parse_flag(&raw)
                .ok_or_else(|| anyhow!("DRAFTS_AUTOSAVE must be true/false/1/0, got {raw:?}"))?;
        }
        if let Some(dir) = lookup("DRAFTS_DIR").filter(|d| !d.trim().is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Failed to parse {name}={raw:?}"))
        })
        .transpose()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
