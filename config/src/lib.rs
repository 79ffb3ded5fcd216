//! Configuration for the labrat fixture.
//!
//! The fixture runs fine with no configuration at all. An optional TOML file
//! recalibrates the depth distribution, the readiness marker, and the tokio
//! runtime for targets whose stack behaviour differs from the defaults.
//!
//! ```toml
//! [driver]
//! marker = "busyLoop starting"
//!
//! [depth]
//! offset = 1.0
//! exponent = 5.0
//! max_depth = 100000
//!
//! [runtime]
//! worker_threads = 2
//! thread_stack_size = 2097152
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use labrat_types::{DEFAULT_DEPTH_EXPONENT, DEFAULT_DEPTH_OFFSET, DEFAULT_MARKER, Depth};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LABRAT_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config at {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabratConfig {
    pub driver: Option<DriverConfig>,
    pub depth: Option<DepthConfig>,
    pub runtime: Option<RuntimeConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Line written to stdout once the busy loop is about to start.
    pub marker: Option<String>,
}

/// Shape of the depth distribution: `floor((E + offset) ^ exponent)`, `E ~ Exp(1)`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepthConfig {
    pub offset: Option<f64>,
    pub exponent: Option<f64>,
    /// Hard cap on sampled depths. Unset keeps the full heavy tail.
    pub max_depth: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    pub worker_threads: Option<usize>,
    pub thread_stack_size: Option<usize>,
}

impl LabratConfig {
    /// Load the config file if one exists.
    ///
    /// Returns `Ok(None)` when no path can be determined or the file is absent.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let config: LabratConfig = match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    fn validate(&self) -> Result<(), String> {
        let offset = self.depth_offset();
        if !offset.is_finite() || offset < 0.0 {
            return Err(format!("depth.offset must be finite and >= 0, got {offset}"));
        }
        let exponent = self.depth_exponent();
        if !exponent.is_finite() || exponent <= 0.0 {
            return Err(format!(
                "depth.exponent must be finite and > 0, got {exponent}"
            ));
        }
        if let Some(runtime) = &self.runtime {
            if runtime.worker_threads == Some(0) {
                return Err("runtime.worker_threads must be at least 1".to_string());
            }
            if runtime.thread_stack_size == Some(0) {
                return Err("runtime.thread_stack_size must be non-zero".to_string());
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn marker(&self) -> &str {
        self.driver
            .as_ref()
            .and_then(|driver| driver.marker.as_deref())
            .unwrap_or(DEFAULT_MARKER)
    }

    #[must_use]
    pub fn depth_offset(&self) -> f64 {
        self.depth
            .as_ref()
            .and_then(|depth| depth.offset)
            .unwrap_or(DEFAULT_DEPTH_OFFSET)
    }

    #[must_use]
    pub fn depth_exponent(&self) -> f64 {
        self.depth
            .as_ref()
            .and_then(|depth| depth.exponent)
            .unwrap_or(DEFAULT_DEPTH_EXPONENT)
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<Depth> {
        self.depth
            .as_ref()
            .and_then(|depth| depth.max_depth)
            .map(Depth::new)
    }

    #[must_use]
    pub fn worker_threads(&self) -> Option<usize> {
        self.runtime.as_ref().and_then(|rt| rt.worker_threads)
    }

    #[must_use]
    pub fn thread_stack_size(&self) -> Option<usize> {
        self.runtime.as_ref().and_then(|rt| rt.thread_stack_size)
    }
}

pub fn config_path() -> Option<PathBuf> {
    resolve_config_path(std::env::var_os(CONFIG_ENV_VAR), dirs::home_dir())
}

fn resolve_config_path(explicit: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match explicit {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => home.map(|home| home.join(".labrat").join("config.toml")),
    }
}
