/// Configuration management for the orientation publisher daemon
/// Defaults work without a file; a TOML file and environment variables
/// override them.
use std::fs;
use std::path::Path;

use orientation_telemetry::{ConnectionType, Location};
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Broker connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// quickstart, iotf or local
    #[serde(rename = "type")]
    pub connection_type: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_type: "quickstart".to_string(),
        }
    }
}

/// Simulated device settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Noise seed (deterministic for reproducibility)
    pub seed: u32,
    /// Accelerometer noise amplitude (m/s²)
    pub accel_noise: f32,
    /// Magnetometer noise amplitude (µT)
    pub mag_noise: f32,
    /// Horizontal geomagnetic field strength (µT)
    pub field_horizontal: f32,
    /// Downward geomagnetic field strength (µT)
    pub field_vertical: f32,
    /// Device rotation rate about the vertical axis (deg/s)
    pub heading_rate_dps: f32,
    /// Stop after this many seconds; run until Ctrl-C when unset
    pub duration_secs: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            accel_noise: 0.05,
            mag_noise: 0.5,
            field_horizontal: 22.0,
            field_vertical: 42.0,
            heading_rate_dps: 6.0,
            duration_secs: None,
        }
    }
}

/// Fixed device location
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Both coordinates, or nothing
    pub fn location(&self) -> Option<Location> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// UI state
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Screen reported as being in the foreground
    pub screen: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Master system configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub connection: ConnectionConfig,
    pub simulation: SimulationConfig,
    pub location: LocationConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

impl SystemConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: SystemConfig = toml::from_str(contents)?;
        config.connection_type()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// ```bash
    /// export CONNECTION_TYPE="iotf"
    /// export LOG_LEVEL="debug"
    /// ```
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(connection_type) = std::env::var("CONNECTION_TYPE") {
            self.connection.connection_type = connection_type;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        self.connection_type()?;
        Ok(self)
    }

    pub fn connection_type(&self) -> Result<ConnectionType, ConfigError> {
        ConnectionType::parse(&self.connection.connection_type).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "connection type '{}'",
                self.connection.connection_type
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SystemConfig::default();
        assert_eq!(config.connection_type().unwrap(), ConnectionType::QuickStart);
        assert_eq!(config.logging.level, "info");
        assert!(config.location.location().is_none());
        assert!(config.ui.screen.is_none());
        assert!(config.simulation.duration_secs.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_content = r#"
            [connection]
            type = "iotf"

            [location]
            latitude = 37.25
            longitude = -122.5

            [ui]
            screen = "iot"
        "#;

        let config = SystemConfig::from_toml(toml_content).unwrap();
        assert_eq!(config.connection_type().unwrap(), ConnectionType::Iotf);
        let location = config.location.location().unwrap();
        assert_eq!(location.latitude, 37.25);
        assert_eq!(location.longitude, -122.5);
        assert_eq!(config.ui.screen.as_deref(), Some("iot"));
        assert_eq!(config.simulation.seed, 42);
    }

    #[test]
    fn test_half_location_is_unknown() {
        let config = SystemConfig::from_toml("[location]\nlatitude = 1.0\n").unwrap();
        assert!(config.location.location().is_none());
    }

    #[test]
    fn test_invalid_connection_type() {
        let result = SystemConfig::from_toml("[connection]\ntype = \"carrier-pigeon\"\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = SystemConfig::from_toml("[connection\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_roundtrip_sections() {
        let toml_string = toml::to_string_pretty(&SystemConfig::default()).unwrap();
        assert!(toml_string.contains("[connection]"));
        assert!(toml_string.contains("[simulation]"));
        assert!(toml_string.contains("[logging]"));
    }
}
