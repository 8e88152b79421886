use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// ConfigFile — deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    #[serde(default)]
    pub viewer: ViewerConfigFile,
    #[serde(default)]
    pub sync: SyncConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub scroll_step: Option<u32>,
    pub frame_budget_ms: Option<u64>,
    pub watch_interval_ms: Option<u64>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct SyncConfigFile {
    pub enabled: Option<bool>,
}

// ---------------------------------------------------------------------------
// Config — resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub viewer: ViewerConfig,
    pub sync: SyncConfig,
}

pub struct ViewerConfig {
    pub scroll_step: u32,
    pub frame_budget: Duration,
    pub watch_interval: Duration,
}

pub struct SyncConfig {
    pub enabled: bool,
}

impl ConfigFile {
    /// Merge CLI values (overwrites set fields).
    pub fn merge_cli(&mut self, scroll_step: Option<u32>, no_sync: bool) {
        if let Some(v) = scroll_step {
            debug!("config: CLI override scroll_step={v}");
            self.viewer.scroll_step = scroll_step;
        }
        if no_sync {
            debug!("config: CLI override sync.enabled=false");
            self.sync.enabled = Some(false);
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    ///
    /// The default scroll step (3 rows) matches the sync engine's jitter
    /// threshold, so every ordinary key scroll propagates; steps below 3
    /// are treated as inertia and stay local to the scrolled pane.
    pub fn resolve(self) -> Config {
        let config = Config {
            viewer: ViewerConfig {
                scroll_step: self.viewer.scroll_step.unwrap_or(3),
                frame_budget: Duration::from_millis(self.viewer.frame_budget_ms.unwrap_or(32)),
                watch_interval: Duration::from_millis(
                    self.viewer.watch_interval_ms.unwrap_or(200),
                ),
            },
            sync: SyncConfig {
                enabled: self.sync.enabled.unwrap_or(true),
            },
        };
        info!(
            "config: resolved scroll_step={}, frame_budget={}ms, watch_interval={}ms, sync={}",
            config.viewer.scroll_step,
            config.viewer.frame_budget.as_millis(),
            config.viewer.watch_interval.as_millis(),
            config.sync.enabled,
        );
        config
    }
}

/// Resolve the XDG config path for tandem.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("tandem").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}
