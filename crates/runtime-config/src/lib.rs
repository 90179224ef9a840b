//! Shared TUI/CLI configuration types.
//!
//! Both `mcphub` and `mcphub-tui` read `mcphub.toml` through these types.
//! Values are resolved in order: built-in defaults, the config file, then
//! environment overrides. Command-line flags are applied by the binaries.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "mcphub.toml";

/// Backend base URL override.
pub const ENV_SERVER_URL: &str = "MCPHUB_SERVER_URL";
/// Port the reverse proxy exposes app IDEs on.
pub const ENV_IDE_PORT: &str = "MCPHUB_TRAEFIK_PORT";
/// Roster poll interval override, in seconds.
pub const ENV_POLL_INTERVAL: &str = "MCPHUB_POLL_INTERVAL_SECS";

/// Top-level configuration (persisted as `mcphub.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Unset means requests may hang indefinitely, the way a browser fetch does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            request_timeout_secs: None,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_ide_port")]
    pub ide_port: u16,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            ide_port: default_ide_port(),
        }
    }
}

impl DashboardSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_server_url() -> String {
    "http://localhost:8081".to_string()
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_ide_port() -> u16 {
    8085
}

// ── Environment ─────────────────────────────────────────────────────────

/// Apply `MCPHUB_*` overrides through `lookup` (normally `std::env::var`).
/// Returns true when any field was updated. Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut HubConfig, lookup: impl Fn(&str) -> Option<String>) -> bool {
    let mut changed = false;

    if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
        config.server.url = url.trim().to_string();
        changed = true;
    }

    if let Some(raw) = lookup(ENV_IDE_PORT) {
        match raw.trim().parse::<u16>() {
            Ok(port) if port > 0 => {
                config.dashboard.ide_port = port;
                changed = true;
            }
            _ => warn!("ignoring {ENV_IDE_PORT}={raw:?}: not a port number"),
        }
    }

    if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => {
                config.dashboard.poll_interval_secs = secs;
                changed = true;
            }
            _ => warn!("ignoring {ENV_POLL_INTERVAL}={raw:?}: not a positive integer"),
        }
    }

    changed
}

// ── File I/O ────────────────────────────────────────────────────────────

pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Ok(PathBuf::from(xdg).join("mcphub"));
        }
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("mcphub"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Read a config file. A missing file yields defaults; a malformed one is an error.
pub fn load_file(path: &Path) -> Result<HubConfig> {
    if !path.exists() {
        return Ok(HubConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the effective configuration: file (explicit path or the default
/// location) followed by environment overrides.
pub fn load(path: Option<&Path>) -> Result<HubConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    let mut config = load_file(&path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn save(config: &HubConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
