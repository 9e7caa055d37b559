//! Simulator configuration
//!
//! Defaults mirror the physical arena: a 200 cm square floor split into
//! 10 cm blocks, and a 30 cm robot. Values can come from a JSON file, from
//! environment overrides, or from a `key -> value` parameter map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming a JSON config file
pub const CONFIG_PATH_ENV: &str = "SIM_CONFIG";
/// Environment override for the planner base URL
pub const PLANNER_URL_ENV: &str = "SIM_PLANNER_URL";
/// Environment override for the visualizer bind address
pub const BIND_ADDR_ENV: &str = "SIM_BIND";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("{name} must divide evenly into {block} cm blocks (got {value} cm)")]
    NotBlockAligned {
        name: &'static str,
        value: u32,
        block: u32,
    },

    #[error("robot footprint must be an odd number of cells (got {0})")]
    EvenFootprint(u32),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
}

/// Physical arena geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width_cm: u32,
    pub height_cm: u32,
    pub block_size_cm: u32,
    pub robot_width_cm: u32,
    pub robot_height_cm: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            width_cm: 200,
            height_cm: 200,
            block_size_cm: 10,
            robot_width_cm: 30,
            robot_height_cm: 30,
        }
    }
}

impl GridConfig {
    /// Configure the grid with parameters
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        for (key, &value) in params {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive(param_name(key)?));
            }
            let value = value.round() as u32;
            match key.as_str() {
                "width_cm" => self.width_cm = value,
                "height_cm" => self.height_cm = value,
                "block_size_cm" => self.block_size_cm = value,
                "robot_width_cm" => self.robot_width_cm = value,
                "robot_height_cm" => self.robot_height_cm = value,
                "animation_interval_ms" => {}
                other => return Err(ConfigError::UnknownParameter(other.to_string())),
            }
        }
        self.validate()
    }

    /// Check that the geometry describes a usable grid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size_cm == 0 {
            return Err(ConfigError::NotPositive("block_size_cm"));
        }
        let block = self.block_size_cm;
        for (name, value) in [
            ("width_cm", self.width_cm),
            ("height_cm", self.height_cm),
            ("robot_width_cm", self.robot_width_cm),
            ("robot_height_cm", self.robot_height_cm),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive(name));
            }
            if value % block != 0 {
                return Err(ConfigError::NotBlockAligned { name, value, block });
            }
        }
        for cells in [
            self.robot_width_cm / block,
            self.robot_height_cm / block,
        ] {
            if cells % 2 == 0 {
                return Err(ConfigError::EvenFootprint(cells));
            }
        }
        Ok(())
    }
}

/// Where the external planner lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub base_url: String,
    pub path_endpoint: String,
    pub status_endpoint: String,
    pub timeout_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            base_url: "http://127.0.0.1:5000".to_string(),
            path_endpoint: "/path".to_string(),
            status_endpoint: "/status".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl PlannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Visualizer HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:3001".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub grid: GridConfig,
    pub planner: PlannerConfig,
    pub server: ServerConfig,
    /// Delay between auto-play steps
    pub animation_interval_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            grid: GridConfig::default(),
            planner: PlannerConfig::default(),
            server: ServerConfig::default(),
            animation_interval_ms: 100,
        }
    }
}

impl SimulatorConfig {
    /// Load a JSON config file; missing keys fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: SimulatorConfig = serde_json::from_str(&text)?;
        config.grid.validate()?;
        Ok(config)
    }

    /// Defaults, then the file named by `SIM_CONFIG`, then env overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        if let Ok(url) = std::env::var(PLANNER_URL_ENV) {
            if !url.is_empty() {
                config.planner.base_url = url;
            }
        }
        if let Ok(bind) = std::env::var(BIND_ADDR_ENV) {
            if !bind.is_empty() {
                config.server.bind_addr = bind;
            }
        }
        Ok(config)
    }

    /// Configure grid geometry and timing with parameters
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        if let Some(&interval) = params.get("animation_interval_ms") {
            if interval <= 0.0 {
                return Err(ConfigError::NotPositive("animation_interval_ms"));
            }
            self.animation_interval_ms = interval.round() as u64;
        }
        self.grid.configure(params)
    }

    pub fn animation_interval(&self) -> Duration {
        Duration::from_millis(self.animation_interval_ms)
    }
}

fn param_name(key: &str) -> Result<&'static str, ConfigError> {
    match key {
        "width_cm" => Ok("width_cm"),
        "height_cm" => Ok("height_cm"),
        "block_size_cm" => Ok("block_size_cm"),
        "robot_width_cm" => Ok("robot_width_cm"),
        "robot_height_cm" => Ok("robot_height_cm"),
        "animation_interval_ms" => Ok("animation_interval_ms"),
        other => Err(ConfigError::UnknownParameter(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn defaults_describe_twenty_by_twenty_grid() {
        let config = SimulatorConfig::default();
        assert_eq!(config.grid.width_cm / config.grid.block_size_cm, 20);
        assert_eq!(config.grid.robot_width_cm / config.grid.block_size_cm, 3);
        assert_eq!(config.animation_interval(), Duration::from_millis(100));
        assert!(config.grid.validate().is_ok());
    }

    #[test]
    fn configure_rejects_non_positive_values() {
        let mut config = SimulatorConfig::default();
        let err = config.configure(&params(&[("width_cm", 0.0)])).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive("width_cm")));
    }

    #[test]
    fn configure_rejects_even_footprint() {
        let mut config = SimulatorConfig::default();
        let err = config
            .configure(&params(&[("robot_width_cm", 40.0)]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EvenFootprint(4)));
    }

    #[test]
    fn configure_updates_geometry_and_interval() {
        let mut config = SimulatorConfig::default();
        config
            .configure(&params(&[("width_cm", 300.0), ("animation_interval_ms", 250.0)]))
            .unwrap();
        assert_eq!(config.grid.width_cm, 300);
        assert_eq!(config.animation_interval_ms, 250);
    }

    #[test]
    fn configure_rejects_unknown_keys() {
        let mut config = SimulatorConfig::default();
        assert!(matches!(
            config.configure(&params(&[("wheel_base", 1.0)])),
            Err(ConfigError::UnknownParameter(_))
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{"planner": {"base_url": "http://planner:8080"}}"#).unwrap();
        assert_eq!(config.planner.base_url, "http://planner:8080");
        assert_eq!(config.planner.path_endpoint, "/path");
        assert_eq!(config.grid, GridConfig::default());
    }
}
