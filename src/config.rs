use crate::simulation::{ParameterError, SimulationSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid simulation settings: {0}")]
    Invalid(#[from] ParameterError),
    #[error("unknown log level: {0}")]
    LogLevel(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.simulation.validate()?;
    config.log_level()?;
    Ok(config)
}

/// Where a loaded [`Config`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The default config file was missing.
    BuiltinDefaults,
}

/// Load the explicit path if given; otherwise the default path, falling back
/// to built-in defaults when that file does not exist.
pub fn load(path: Option<&Path>) -> Result<(Config, ConfigSource), ConfigError> {
    match path {
        Some(path) => {
            let config = load_from_path(path)?;
            Ok((config, ConfigSource::File(path.to_path_buf())))
        }
        None => load_or_defaults(Path::new(DEFAULT_CONFIG_PATH)),
    }
}

fn load_or_defaults(path: &Path) -> Result<(Config, ConfigSource), ConfigError> {
    match load_from_path(path) {
        Ok(config) => Ok((config, ConfigSource::File(path.to_path_buf()))),
        Err(ConfigError::Read(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok((Config::default(), ConfigSource::BuiltinDefaults))
        }
        Err(err) => Err(err),
    }
}

impl Config {
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.logging
            .level
            .parse::<Level>()
            .map_err(|_| ConfigError::LogLevel(self.logging.level.clone()))
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::occupancy::OverflowPolicy;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_temp(name: &str, contents: &str) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = std::env::temp_dir().join(format!("carpark-config-{name}-{unique}.toml"));
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn default_config_file_matches_builtin_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_default()?;
        assert_eq!(config.simulation, SimulationSettings::default());
        assert_eq!(config.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(config.log_level()?, Level::INFO);
        Ok(())
    }

    #[test]
    fn partial_simulation_section_keeps_other_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp(
            "partial",
            r#"
[app]
name = "carpark-sim"

[logging]
level = "debug"

[simulation]
policy = "block"
max_hours = 500
seed = 7
"#,
        )?;

        let result = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        assert_eq!(result.simulation.policy, OverflowPolicy::Block);
        assert_eq!(result.simulation.max_hours, 500);
        assert_eq!(result.simulation.seed, Some(7));
        assert_eq!(result.simulation.warmup_hours, 100);
        assert_eq!(result.simulation.percentiles.len(), 12);
        assert_eq!(result.log_level()?, Level::DEBUG);
        Ok(())
    }

    #[test]
    fn missing_sections_are_allowed() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("empty", "")?;

        let result = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        assert_eq!(result.app.name, "carpark-sim");
        assert!(result.server.is_none());
        Ok(())
    }

    #[test]
    fn out_of_range_percentile_is_invalid() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("bad-percentile", "[simulation]\npercentiles = [50, 120]\n")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(ConfigError::Invalid(ParameterError::PercentileOutOfRange(120)))
        ));
        Ok(())
    }

    #[test]
    fn unknown_log_level_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("bad-level", "[logging]\nlevel = \"loud\"\n")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::LogLevel(_))));
        Ok(())
    }

    #[test]
    fn missing_config_file_returns_read_error() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("carpark-config-missing-{unique}.toml"));

        let result = load(Some(path.as_path()));

        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn missing_default_file_falls_back_to_builtin_defaults() -> Result<(), ConfigError> {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("carpark-config-absent-{unique}.toml"));

        let (config, source) = load_or_defaults(&path)?;

        assert_eq!(source, ConfigSource::BuiltinDefaults);
        assert_eq!(config.simulation, SimulationSettings::default());
        assert_eq!(config.server_port(), DEFAULT_SERVER_PORT);
        Ok(())
    }

    #[test]
    fn present_default_file_is_reported_as_the_source() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("present", "[logging]\nlevel = \"warn\"\n")?;

        let result = load_or_defaults(&path);
        let _ = fs::remove_file(&path);

        let (config, source) = result?;
        assert_eq!(source, ConfigSource::File(path));
        assert_eq!(config.log_level()?, Level::WARN);
        Ok(())
    }

    #[test]
    fn invalid_toml_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("invalid", "not = [valid")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        Ok(())
    }
}
