//! Configuration vault – reads/writes `~/.pilot/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pilot_kernel::NavigatorConfig;
use pilot_runtime::GoToGoalConfig;
use pilot_types::Pose2D;

/// Simulated robot set-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub max_linear: f64,
    pub max_angular: f64,
    /// Integration step of the physics task.
    pub physics_period_ms: u64,
    pub start_x: f64,
    pub start_y: f64,
    pub start_heading_deg: f64,
    /// Robot commands kept for diagnostics; zero disables the log.
    pub call_log_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_linear: 1.0,
            max_angular: 1.0,
            physics_period_ms: 20,
            start_x: 0.0,
            start_y: 0.0,
            start_heading_deg: 0.0,
            call_log_capacity: 256,
        }
    }
}

impl SimConfig {
    pub fn start_pose(&self) -> Pose2D {
        Pose2D::new(self.start_x, self.start_y, self.start_heading_deg.to_radians())
    }

    pub fn physics_period(&self) -> Duration {
        Duration::from_millis(self.physics_period_ms)
    }
}

/// Persisted user configuration stored in `~/.pilot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Period of the navigation control loop.
    #[serde(default = "default_control_period_ms")]
    pub control_period_ms: u64,

    #[serde(default)]
    pub navigator: NavigatorConfig,

    #[serde(default)]
    pub sim: SimConfig,

    #[serde(default)]
    pub follower: GoToGoalConfig,
}

fn default_control_period_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_period_ms: default_control_period_ms(),
            navigator: NavigatorConfig::default(),
            sim: SimConfig::default(),
            follower: GoToGoalConfig::default(),
        }
    }
}

impl Config {
    pub fn control_period(&self) -> Duration {
        Duration::from_millis(self.control_period_ms)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.control_period_ms == 0 {
            return Err("control_period_ms must be non-zero".to_string());
        }
        if self.sim.physics_period_ms == 0 {
            return Err("sim.physics_period_ms must be non-zero".to_string());
        }
        self.navigator.validate().map_err(|e| e.to_string())
    }
}

/// Return the path to `~/.pilot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".pilot").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
/// `PILOT_*` overrides are applied on top of the file.
pub fn load() -> Result<Option<Config>, String> {
    let Some(mut cfg) = load_from(&config_path())? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `PILOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `PILOT_CONTROL_PERIOD_MS` | `control_period_ms` |
/// | `PILOT_ALARM_TIMEOUT_SECS` | `navigator.alarm_timeout_secs` |
/// | `PILOT_WATCHDOG_PERIOD_MS` | `navigator.watchdog_period_ms` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PILOT_CONTROL_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.control_period_ms = ms;
    }
    if let Ok(v) = std::env::var("PILOT_ALARM_TIMEOUT_SECS")
        && let Ok(secs) = v.parse::<f64>()
    {
        cfg.navigator.alarm_timeout_secs = secs;
    }
    if let Ok(v) = std::env::var("PILOT_WATCHDOG_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.navigator.watchdog_period_ms = ms;
    }
}

/// Save the config to disk, creating `~/.pilot/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
