//! Run configuration – reads/writes `~/.posefuse/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Estimator and loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Control loop frequency in Hz.
    #[serde(default = "default_loop_hz")]
    pub loop_hz: f64,

    /// Number of cycles to run before reporting.
    #[serde(default = "default_cycles")]
    pub cycles: u32,

    /// IMU standard deviation fed to the rotation estimator (rad per cycle).
    #[serde(default = "default_std_dev")]
    pub imu_std_dev: f64,

    /// Drivetrain standard deviation fed to the pose estimator (m per cycle).
    #[serde(default = "default_std_dev")]
    pub drive_std_dev: f64,

    #[serde(default)]
    pub sim: SimConfig,
}

/// Simulated robot motion and sensor noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Commanded forward speed (m/s).
    pub vx: f64,
    /// Commanded sideways speed (m/s).
    pub vy: f64,
    /// Commanded yaw rate (rad/s).
    pub yaw_rate: f64,
    /// The camera reports once every this many cycles.
    pub vision_every: u32,
    /// Camera noise, x, y, z, roll, pitch, yaw.
    pub vision_std_devs: [f64; 6],
    pub drive_noise: f64,
    pub imu_noise: f64,
}

fn default_loop_hz() -> f64 {
    50.0
}
fn default_cycles() -> u32 {
    500
}
fn default_std_dev() -> f64 {
    0.1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loop_hz: default_loop_hz(),
            cycles: default_cycles(),
            imu_std_dev: default_std_dev(),
            drive_std_dev: default_std_dev(),
            sim: SimConfig::default(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            vx: 0.5,
            vy: 0.0,
            yaw_rate: 0.2,
            vision_every: 5,
            vision_std_devs: [0.05, 0.05, 0.05, 0.02, 0.02, 0.02],
            drive_noise: 0.01,
            imu_noise: 0.005,
        }
    }
}

impl Config {
    /// Seconds per cycle.
    pub fn dt(&self) -> f64 {
        1.0 / self.loop_hz
    }

    /// Timer period for the control loop, or `None` when `loop_hz` is so
    /// large the period rounds to zero or so small it overflows a
    /// [`Duration`].
    pub fn period(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.dt())
            .ok()
            .filter(|period| !period.is_zero())
    }

    /// Reject settings the estimators cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.loop_hz.is_finite() && self.loop_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "loop_hz must be positive, got {}",
                self.loop_hz
            )));
        }
        if self.period().is_none() {
            return Err(ConfigError::Invalid(format!(
                "loop_hz {} gives a cycle period outside 1 ns ..= {} s",
                self.loop_hz,
                Duration::MAX.as_secs()
            )));
        }
        let std_devs = [("imu_std_dev", self.imu_std_dev), ("drive_std_dev", self.drive_std_dev)];
        for (name, value) in std_devs {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if let Some(value) = self.sim.vision_std_devs.iter().find(|v| !(**v > 0.0)) {
            return Err(ConfigError::Invalid(format!(
                "sim.vision_std_devs must all be positive, got {value}"
            )));
        }
        for (name, value) in [("sim.drive_noise", self.sim.drive_noise), ("sim.imu_noise", self.sim.imu_noise)] {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }
        Ok(())
    }
}

/// Return the path to `~/.posefuse/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".posefuse").join("config.toml")
}

/// Load the config at `path`.  Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(toml::from_str(&raw)?))
}

/// The effective configuration: file (or defaults), then environment
/// overrides, then validation.
pub fn resolve(path: &Path) -> Result<(Config, bool), ConfigError> {
    let loaded = load_from(path)?;
    let from_file = loaded.is_some();
    let mut cfg = loaded.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok((cfg, from_file))
}

/// Apply `POSEFUSE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `POSEFUSE_LOOP_HZ` | `loop_hz` |
/// | `POSEFUSE_CYCLES` | `cycles` |
/// | `POSEFUSE_IMU_STD_DEV` | `imu_std_dev` |
/// | `POSEFUSE_DRIVE_STD_DEV` | `drive_std_dev` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(hz) = env_parse("POSEFUSE_LOOP_HZ") {
        cfg.loop_hz = hz;
    }
    if let Some(cycles) = env_parse("POSEFUSE_CYCLES") {
        cfg.cycles = cycles;
    }
    if let Some(sd) = env_parse("POSEFUSE_IMU_STD_DEV") {
        cfg.imu_std_dev = sd;
    }
    if let Some(sd) = env_parse("POSEFUSE_DRIVE_STD_DEV") {
        cfg.drive_std_dev = sd;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// Save the config to `path`, creating parent directories as needed.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
