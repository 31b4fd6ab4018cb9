// src/config.rs

//! Server configuration: loading from TOML, resolving memory limits, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::Display;
use sysinfo::System;
use tracing::{info, warn};

/// How keys are chosen for removal once `maxmemory` is exceeded.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EvictionPolicy {
    #[default]
    NoEviction,
    AllkeysLru,
    VolatileLru,
    AllkeysRandom,
    VolatileRandom,
    VolatileTtl,
    AllkeysLfu,
    VolatileLfu,
}

/// When the append log is fsynced.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppendFsync {
    Always,
    EverySec,
    No,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub aof_enabled: bool,
    #[serde(default = "default_aof_path")]
    pub aof_path: String,
    #[serde(default = "default_appendfsync")]
    pub appendfsync: AppendFsync,
    /// Growth over the post-rewrite size, in percent, that triggers an automatic rewrite. `0` disables it.
    #[serde(default = "default_auto_aof_rewrite_percentage")]
    pub auto_aof_rewrite_percentage: u64,
    #[serde(default = "default_auto_aof_rewrite_min_size")]
    pub auto_aof_rewrite_min_size: u64,
}

fn default_aof_path() -> String {
    "carade_data/carade.aof".to_string()
}
fn default_appendfsync() -> AppendFsync {
    AppendFsync::EverySec
}
fn default_auto_aof_rewrite_percentage() -> u64 {
    100
}
fn default_auto_aof_rewrite_min_size() -> u64 {
    64 * 1024 * 1024
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            aof_enabled: false,
            aof_path: default_aof_path(),
            appendfsync: default_appendfsync(),
            auto_aof_rewrite_percentage: default_auto_aof_rewrite_percentage(),
            auto_aof_rewrite_min_size: default_auto_aof_rewrite_min_size(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum MaxMemoryConfig {
    Bytes(usize),
    String(String),
}

/// The config file as written, before memory limits are resolved.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_databases")]
    databases: usize,
    #[serde(default)]
    maxmemory: Option<MaxMemoryConfig>,
    #[serde(default)]
    maxmemory_policy: EvictionPolicy,
    #[serde(default)]
    persistence: PersistenceConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    63790
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_databases() -> usize {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub databases: usize,
    /// Memory limit in bytes. `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxmemory: Option<usize>,
    pub maxmemory_policy: EvictionPolicy,
    pub persistence: PersistenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            databases: default_databases(),
            maxmemory: None,
            maxmemory_policy: EvictionPolicy::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Config {
    /// Reads `path` if it exists, otherwise falls back to the defaults.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("Config file '{}' not found. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config file '{path}'"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents).context("Failed to parse TOML")?;

        let maxmemory = match raw.maxmemory {
            Some(cfg) => resolve_maxmemory(cfg, get_available_memory)?,
            None => None,
        };

        let config = Config {
            host: raw.host,
            port: raw.port,
            log_level: raw.log_level,
            databases: raw.databases,
            maxmemory,
            maxmemory_policy: raw.maxmemory_policy,
            persistence: raw.persistence,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.databases == 0 {
            return Err(anyhow!("databases cannot be 0"));
        }
        if self.persistence.aof_enabled && self.persistence.aof_path.trim().is_empty() {
            return Err(anyhow!(
                "persistence.aof_path cannot be empty when AOF is enabled"
            ));
        }
        if let Some(mem) = self.maxmemory
            && mem < 1_000_000
        {
            warn!(
                "low maxmemory setting: {} bytes. This may cause frequent evictions.",
                mem
            );
        }
        Ok(())
    }
}

fn get_available_memory() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.total_memory()
}

/// Turns `512mb`, `2g`, `50%` or a plain byte count into bytes. `0` means unbounded.
fn resolve_maxmemory(cfg: MaxMemoryConfig, available: impl FnOnce() -> u64) -> Result<Option<usize>> {
    let bytes = match cfg {
        MaxMemoryConfig::Bytes(b) => b,
        MaxMemoryConfig::String(s) => {
            let lower = s.trim().to_lowercase();
            if let Some(pct) = lower.strip_suffix('%') {
                let pct: f64 = pct.trim().parse().context("Invalid maxmemory percentage value")?;
                if !(0.0..=100.0).contains(&pct) {
                    return Err(anyhow!(
                        "Invalid maxmemory percentage, must be between 0 and 100"
                    ));
                }
                let total = available();
                let resolved = (total as f64 * (pct / 100.0)) as usize;
                info!(
                    "Resolved maxmemory '{}' to {} bytes ({:.2}% of {} bytes).",
                    s, resolved, pct, total
                );
                resolved
            } else {
                let (digits, multiplier) = [
                    ("gb", 1u64 << 30),
                    ("g", 1 << 30),
                    ("mb", 1 << 20),
                    ("m", 1 << 20),
                    ("kb", 1 << 10),
                    ("k", 1 << 10),
                ]
                .iter()
                .find_map(|(suffix, mult)| lower.strip_suffix(*suffix).map(|d| (d, *mult)))
                .unwrap_or((lower.as_str(), 1));
                parse_memory_string(&s, digits, multiplier)?
            }
        }
    };
    Ok((bytes > 0).then_some(bytes))
}

fn parse_memory_string(original: &str, digits: &str, multiplier: u64) -> Result<usize> {
    let value: u64 = digits.trim().parse().with_context(|| {
        format!(
            "Invalid maxmemory value '{original}'. Must be a number (bytes), a percentage (e.g., '50%'), or have a unit (e.g., '512mb')."
        )
    })?;
    usize::try_from(value.saturating_mul(multiplier)).map_err(|_| {
        anyhow!("maxmemory value '{original}' is too large for this system's architecture")
    })
}
