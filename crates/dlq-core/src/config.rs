use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::scheduler::SchedulerConfig;

/// Connection parameters for the curl executor (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Seconds allowed to establish the connection.
    pub connect_timeout_secs: u64,
    /// Hard limit for one whole transfer, in seconds.
    pub timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Maximum redirects followed before giving up.
    pub max_redirects: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 300,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            max_redirects: 10,
        }
    }
}

fn default_progress_persist_interval_ms() -> u64 {
    1000
}

/// Global configuration loaded from `~/.config/dlq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqConfig {
    /// Maximum number of transfers running at once.
    pub max_concurrency: usize,
    /// Where finished files land. Defaults to `~/.local/share/dlq/downloads`.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Minimum spacing between progress writes to the store, per item.
    #[serde(default = "default_progress_persist_interval_ms")]
    pub progress_persist_interval_ms: u64,
    /// Optional transfer tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub transfer: Option<TransferConfig>,
}

impl Default for DlqConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            download_dir: None,
            progress_persist_interval_ms: default_progress_persist_interval_ms(),
            transfer: None,
        }
    }
}

impl DlqConfig {
    pub fn transfer(&self) -> TransferConfig {
        self.transfer.clone().unwrap_or_default()
    }

    /// Resolved download directory (explicit setting or the XDG data dir).
    pub fn download_dir(&self) -> Result<PathBuf> {
        match &self.download_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_download_dir(),
        }
    }

    /// Scheduler settings derived from this config. `max_concurrency` overrides the file value when given.
    pub fn scheduler_config(&self, max_concurrency: Option<usize>) -> Result<SchedulerConfig> {
        Ok(SchedulerConfig {
            max_concurrency: max_concurrency.unwrap_or(self.max_concurrency),
            download_dir: self.download_dir()?,
            progress_persist_interval: Duration::from_millis(self.progress_persist_interval_ms),
        })
    }
}

pub fn default_download_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlq")?;
    Ok(xdg_dirs.get_data_home().join("downloads"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DlqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DlqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DlqConfig = toml::from_str(&data)?;
    Ok(cfg)
}
