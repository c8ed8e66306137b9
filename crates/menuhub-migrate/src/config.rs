//! Runner configuration loading from file and environment variables.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level runner configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout applied to the runner's connection, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Directory of migration scripts. Unset means the scripts bundled with
    /// `menuhub-db`.
    #[serde(default)]
    pub migrations_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "menuhub_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_db_path() -> String {
    "menuhub.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            migrations_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// The configured migrations directory, or the bundled one.
    pub fn migrations_dir(&self) -> PathBuf {
        self.migrations_dir
            .clone()
            .unwrap_or_else(|| menuhub_db::bundled_migrations_dir().to_path_buf())
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override held a value of the wrong type.
    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Configuration as loaded, with whether the named file was actually read.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// False when the file was absent and defaults were used. Callers log
    /// this once their subscriber is installed.
    pub file_found: bool,
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MENUHUB_DB_PATH` overrides `database.path`
/// - `MENUHUB_DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `MENUHUB_MIGRATIONS_DIR` overrides `database.migrations_dir`
/// - `MENUHUB_LOG_LEVEL` overrides `logging.level`
/// - `MENUHUB_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if an override cannot be parsed.
pub fn load_config(path: Option<&str>) -> Result<LoadedConfig, ConfigError> {
    let (mut config, file_found) = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => (toml::from_str(&contents)?, true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Config::default(), false),
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => (Config::default(), false),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    Ok(LoadedConfig { config, file_found })
}

/// Applies `MENUHUB_*` overrides read through `lookup`.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(db_path) = lookup("MENUHUB_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(timeout) = lookup("MENUHUB_DB_BUSY_TIMEOUT_MS") {
        config.database.busy_timeout_ms =
            timeout.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "MENUHUB_DB_BUSY_TIMEOUT_MS",
                value: timeout.clone(),
            })?;
    }
    if let Some(dir) = lookup("MENUHUB_MIGRATIONS_DIR") {
        if !dir.trim().is_empty() {
            config.database.migrations_dir = Some(PathBuf::from(dir));
        }
    }
    if let Some(level) = lookup("MENUHUB_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("MENUHUB_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("absent.toml");
        let path = path.to_str().expect("temp path should be UTF-8");

        let loaded = load_config(Some(path)).expect("missing file should fall back to defaults");
        assert!(!loaded.file_found);

        let mut config = toml::from_str::<Config>("").expect("empty config should parse");
        apply_env_overrides(&mut config, env(&[])).expect("no overrides should apply");
        assert_eq!(config.database.path, "menuhub.db");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert!(config.database.migrations_dir.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn present_file_is_reported_as_found() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").expect("failed to write config");

        let loaded = load_config(path.to_str()).expect("config should load");
        assert!(loaded.file_found);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[database\npath = 3").expect("failed to write config");

        let err = load_config(path.to_str()).expect_err("malformed file should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn file_values_are_read() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "/var/lib/menuhub/store.db"
            busy_timeout_ms = 250
            migrations_dir = "db/migrations"

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.database.path, "/var/lib/menuhub/store.db");
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(
            config.database.migrations_dir(),
            PathBuf::from("db/migrations")
        );
        assert!(config.logging.json);
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config: Config = toml::from_str("[database]\npath = \"from-file.db\"\n")
            .expect("config should parse");

        apply_env_overrides(
            &mut config,
            env(&[
                ("MENUHUB_DB_PATH", "from-env.db"),
                ("MENUHUB_DB_BUSY_TIMEOUT_MS", "900"),
                ("MENUHUB_MIGRATIONS_DIR", "/srv/migrations"),
                ("MENUHUB_LOG_LEVEL", "warn"),
                ("MENUHUB_LOG_JSON", "1"),
            ]),
        )
        .expect("overrides should apply");

        assert_eq!(config.database.path, "from-env.db");
        assert_eq!(config.database.busy_timeout_ms, 900);
        assert_eq!(
            config.database.migrations_dir,
            Some(PathBuf::from("/srv/migrations"))
        );
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json);
    }

    #[test]
    fn malformed_timeout_override_is_rejected() {
        let mut config = Config::default();
        let err = apply_env_overrides(
            &mut config,
            env(&[("MENUHUB_DB_BUSY_TIMEOUT_MS", "soon")]),
        )
        .expect_err("non-numeric timeout should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: "MENUHUB_DB_BUSY_TIMEOUT_MS",
                ..
            }
        ));
    }

    #[test]
    fn unset_migrations_dir_falls_back_to_bundled_scripts() {
        let config = Config::default();
        assert_eq!(
            config.database.migrations_dir(),
            menuhub_db::bundled_migrations_dir()
        );
    }
}
