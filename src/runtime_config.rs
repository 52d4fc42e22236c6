// =============================================================================
// Runtime Configuration — engine settings with atomic save
// =============================================================================
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_brief_history_cap() -> usize {
    48
}

fn default_alt_instruments() -> Vec<String> {
    vec![
        "SOL-USDT-SWAP".to_string(),
        "DOGE-USDT-SWAP".to_string(),
        "XRP-USDT-SWAP".to_string(),
        "AVAX-USDT-SWAP".to_string(),
        "LINK-USDT-SWAP".to_string(),
        "ARB-USDT-SWAP".to_string(),
    ]
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the intelligence engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the REST API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Seconds between automatic refresh cycles.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Per-source cache freshness window, seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum briefs retained in the history ring.
    #[serde(default = "default_brief_history_cap")]
    pub brief_history_cap: usize,

    /// OKX instrument IDs fetched as secondary derivatives context.
    #[serde(default = "default_alt_instruments")]
    pub alt_instruments: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            refresh_interval_secs: default_refresh_interval_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            brief_history_cap: default_brief_history_cap(),
            alt_instruments: default_alt_instruments(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            refresh_interval_secs = config.refresh_interval_secs,
            cache_ttl_secs = config.cache_ttl_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply environment variable overrides on top of whatever was loaded.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("NEXUS_BIND_ADDR") {
            if !addr.is_empty() {
                self.bind_addr = addr;
            }
        }
        if let Ok(secs) = std::env::var("NEXUS_REFRESH_SECS") {
            if let Ok(parsed) = secs.parse() {
                self.refresh_interval_secs = parsed;
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert_eq!(cfg.refresh_interval_secs, 300);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.brief_history_cap, 48);
        assert_eq!(cfg.alt_instruments.len(), 6);
        assert_eq!(cfg.alt_instruments[0], "SOL-USDT-SWAP");
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.refresh_interval_secs, 300);
        assert_eq!(cfg.brief_history_cap, 48);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "refresh_interval_secs": 60, "alt_instruments": ["SOL-USDT-SWAP"] }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.refresh_interval_secs, 60);
        assert_eq!(cfg.alt_instruments, vec!["SOL-USDT-SWAP"]);
        assert_eq!(cfg.cache_ttl_secs, 300);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.bind_addr, cfg2.bind_addr);
        assert_eq!(cfg.refresh_interval_secs, cfg2.refresh_interval_secs);
        assert_eq!(cfg.alt_instruments, cfg2.alt_instruments);
    }
}
