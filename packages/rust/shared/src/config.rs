//! Application configuration for protomerge.
//!
//! User config lives at `~/.protomerge/protomerge.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ProtomergeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "protomerge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".protomerge";

/// Minimum TVL a feed record needs unless its category is exempt.
pub const DEFAULT_MIN_SIZE: f64 = 10_000_000.0;

const DEFAULT_DISALLOWED_CHAINS: &[&str] = &[
    "Bitcoin",
    "Solana",
    "Doge",
    "Ripple",
    "Tron",
    "Polkadot",
    "Near",
    "Algorand",
    "Aptos",
    "Litecoin",
    "Cosmos",
    "EOS",
    "TEZOS",
    "Zilliqa",
    "Cardano",
    "Thorchain",
    "IoTeX",
    "NEO",
];

const DEFAULT_EXCLUDED_CATEGORIES: &[&str] = &[
    "CEX",
    "AI Agents",
    "Yield Lottery",
    "Decentralized Stablecoin",
    "Anchor BTC",
    "Algo-Stables",
    "Governance Incentives",
    "Privacy",
    "Reserve Currency",
    "SoFi",
    "Staking Pool",
    "Staking",
    "Token Locker",
    "Treasury Manager",
];

// ---------------------------------------------------------------------------
// Config structs (matching protomerge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Inclusion policy for feed records.
    #[serde(default)]
    pub filter: FilterConfig,
}

/// `[feed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Endpoint returning a JSON array of protocol records.
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_feed_url() -> String {
    "https://api.llama.fi/protocols".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Curated entries merged ahead of the feed. Optional on disk.
    #[serde(default = "default_manual_entries")]
    pub manual_entries: String,

    /// Directory that receives `combined.json` and the per-category files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            manual_entries: default_manual_entries(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_manual_entries() -> String {
    "input.json".into()
}
fn default_output_dir() -> String {
    "output".into()
}

/// `[filter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum TVL for records outside the exempt categories.
    #[serde(default = "default_min_size")]
    pub min_size: f64,

    /// Categories that skip the size check.
    #[serde(default)]
    pub exempt_categories: Vec<String>,

    /// Categories that are always dropped.
    #[serde(default = "default_excluded_categories")]
    pub excluded_categories: Vec<String>,

    /// Chains that do not count towards eligibility.
    #[serde(default = "default_disallowed_chains")]
    pub disallowed_chains: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            exempt_categories: Vec::new(),
            excluded_categories: default_excluded_categories(),
            disallowed_chains: default_disallowed_chains(),
        }
    }
}

fn default_min_size() -> f64 {
    DEFAULT_MIN_SIZE
}
fn default_excluded_categories() -> Vec<String> {
    DEFAULT_EXCLUDED_CATEGORIES.iter().map(|s| s.to_string()).collect()
}
fn default_disallowed_chains() -> Vec<String> {
    DEFAULT_DISALLOWED_CHAINS.iter().map(|s| s.to_string()).collect()
}

impl AppConfig {
    /// Parse and validate the configured feed URL.
    pub fn feed_url(&self) -> Result<Url> {
        Url::parse(&self.feed.url).map_err(|e| {
            ProtomergeError::config(format!("invalid feed url '{}': {e}", self.feed.url))
        })
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.filter.min_size.is_finite() || self.filter.min_size < 0.0 {
            return Err(ProtomergeError::config(format!(
                "filter.min_size must be a non-negative number, got {}",
                self.filter.min_size
            )));
        }
        if self.feed.timeout_secs == 0 {
            return Err(ProtomergeError::config("feed.timeout_secs must be at least 1"));
        }
        self.feed_url()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Filter policy (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime inclusion policy applied to feed records.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPolicy {
    /// Inclusive lower bound on `tvl`.
    pub min_size: f64,
    /// Categories exempt from the size check.
    pub exempt_categories: HashSet<String>,
    /// Categories that exclude a record outright.
    pub excluded_categories: HashSet<String>,
    /// A record needs at least one chain outside this set.
    pub disallowed_chains: HashSet<String>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::from(&FilterConfig::default())
    }
}

impl From<&FilterConfig> for FilterPolicy {
    fn from(config: &FilterConfig) -> Self {
        Self {
            min_size: config.min_size,
            exempt_categories: config.exempt_categories.iter().cloned().collect(),
            excluded_categories: config.excluded_categories.iter().cloned().collect(),
            disallowed_chains: config.disallowed_chains.iter().cloned().collect(),
        }
    }
}

impl From<&AppConfig> for FilterPolicy {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.filter)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.protomerge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ProtomergeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.protomerge/protomerge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ProtomergeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ProtomergeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ProtomergeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ProtomergeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ProtomergeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("min_size"));
        assert!(toml_str.contains("api.llama.fi"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.filter.min_size, DEFAULT_MIN_SIZE);
        assert_eq!(parsed.paths.manual_entries, "input.json");
        assert!(parsed.filter.disallowed_chains.contains(&"Solana".to_string()));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[filter]
min_size = 5000000.0
exempt_categories = ["Bridge"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.filter.min_size, 5_000_000.0);
        assert_eq!(config.filter.exempt_categories, ["Bridge"]);
        assert!(config.filter.excluded_categories.contains(&"CEX".to_string()));
        assert_eq!(config.feed.timeout_secs, 30);
        assert_eq!(config.paths.output_dir, "output");
    }

    #[test]
    fn filter_policy_from_app_config() {
        let mut app = AppConfig::default();
        app.filter.exempt_categories = vec!["Bridge".into()];
        let policy = FilterPolicy::from(&app);
        assert_eq!(policy.min_size, DEFAULT_MIN_SIZE);
        assert!(policy.exempt_categories.contains("Bridge"));
        assert!(policy.excluded_categories.contains("Staking"));
        assert!(policy.disallowed_chains.contains("Bitcoin"));
        assert_eq!(policy.disallowed_chains.len(), DEFAULT_DISALLOWED_CHAINS.len());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.filter.min_size = -1.0;
        assert!(config.validate().is_err());

        config.filter.min_size = DEFAULT_MIN_SIZE;
        config.feed.url = "not a url".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid feed url"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = std::env::temp_dir().join(format!("pm-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[paths]\noutput_dir = \"/tmp/pm-out\"\n").unwrap();

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.paths.output_dir, "/tmp/pm-out");

        std::fs::write(&path, "[filter\nmin_size = ").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ProtomergeError::Config { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
