//! Layered configuration loading.
//!
//! Later layers override earlier ones:
//! 1. Built-in defaults (or a preset)
//! 2. A TOML or JSON file
//! 3. A `.env` file, which only feeds the environment
//! 4. `PREFIX__SECTION__KEY` environment variables

use std::env;
use std::fs;
use std::path::Path;

use pnyx_telemetry::LogFormat;

use crate::{ConfigError, PnyxConfig};

/// Builds a [`PnyxConfig`] from layered sources.
///
/// ```no_run
/// use pnyx_config::ConfigLoader;
///
/// # fn main() -> Result<(), pnyx_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("pnyx.toml")?
///     .with_dotenv()?
///     .with_env_prefix("PNYX")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: PnyxConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PnyxConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from [`PnyxConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = PnyxConfig::development();
        self
    }

    /// Starts from [`PnyxConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = PnyxConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file, chosen by extension.
    ///
    /// Sections present in the file replace the current ones; sections it
    /// omits take their defaults.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.config = parse(&content, &extension)
            .map_err(|err| match err {
                ConfigError::UnsupportedFormat(_) => {
                    ConfigError::UnsupportedFormat(path.display().to_string())
                }
                other => other,
            })?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` (`toml` or `json`).
    ///
    /// ```
    /// use pnyx_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\nroute_prefix = \"/v2\"\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.route_prefix, "/v2");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Reads `.env` from the working directory (or a parent) into the
    /// process environment. A missing file is not an error.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Reads a specific env file into the process environment.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path)?;
        Ok(self)
    }

    /// Enables `PREFIX__SECTION__KEY` overrides, e.g.
    /// `PNYX__SERVER__HTTP_ADDR=127.0.0.1:9000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates the result.
    pub fn load(mut self) -> Result<PnyxConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> PnyxConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(key, _)| key.starts_with(&marker))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = path.split("__").collect();
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => server.http_addr = value.to_string(),
            ["SERVER", "ROUTE_PREFIX"] => server.route_prefix = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                server.shutdown_timeout_secs = parse_u64(key, value)?;
            }
            ["SERVER", "BODY_TIMEOUT_SECS"] => server.body_timeout_secs = parse_u64(key, value)?,
            ["SERVER", "KEEP_ALIVE"] => server.keep_alive = parse_bool_var(key, value)?,

            ["LOGGING", "ENABLED"] => logging.enabled = parse_bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI"] => logging.ansi = parse_bool_var(key, value)?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                logging.include_location = parse_bool_var(key, value)?;
            }

            _ => return Err(ConfigError::UnknownEnvVar { var: key.to_string() }),
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<PnyxConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected non-negative integer"))
}

fn parse_bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, PnyxConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);

        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"http_addr": "127.0.0.1:3000"}, "logging": {"format": "compact"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_loader_with_string_unsupported() {
        let result = ConfigLoader::new().with_string("a: b", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nhttp_addr = \"127.0.0.1:4000\"\nroute_prefix = \"/v1\"\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:4000");
        assert_eq!(config.server.route_prefix, "/v1");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_loader_with_file_rejects_unknown_fields() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"server": {{"workers": 4}}}}"#).unwrap();

        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_loader_with_file_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("pnyx.toml");

        assert!(matches!(
            ConfigLoader::new().with_file(&missing),
            Err(ConfigError::FileNotFound { .. })
        ));

        let config = ConfigLoader::new()
            .with_optional_file(&missing)
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, PnyxConfig::default());
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[server]\nhttp_addr = \"nowhere\"\n", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let config = ConfigLoader::new()
            .with_string("[server]\nhttp_addr = \"nowhere\"\n", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.server.http_addr, "nowhere");
    }

    #[test]
    fn test_apply_env_var_sections() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("T__SERVER__HTTP_ADDR", "10.0.0.1:9000", "T").unwrap();
        loader.apply_env_var("T__SERVER__KEEP_ALIVE", "off", "T").unwrap();
        loader.apply_env_var("T__SERVER__BODY_TIMEOUT_SECS", "7", "T").unwrap();
        loader.apply_env_var("T__LOGGING__FORMAT", "Pretty", "T").unwrap();

        assert_eq!(loader.config.server.http_addr, "10.0.0.1:9000");
        assert!(!loader.config.server.keep_alive);
        assert_eq!(loader.config.server.body_timeout_secs, 7);
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_apply_env_var_errors() {
        let mut loader = ConfigLoader::new();
        assert!(matches!(
            loader.apply_env_var("T__SERVER__SHUTDOWN_TIMEOUT_SECS", "-1", "T"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            loader.apply_env_var("T__LOGGING__FORMAT", "xml", "T"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            loader.apply_env_var("T__SERVER__WORKERS", "4", "T"),
            Err(ConfigError::UnknownEnvVar { .. })
        ));
    }

    #[test]
    fn test_env_prefix_overrides_file() {
        env::set_var("PNYXLOADERTEST__SERVER__ROUTE_PREFIX", "/from-env");

        let config = ConfigLoader::new()
            .with_string("[server]\nroute_prefix = \"/from-file\"\n", "toml")
            .unwrap()
            .with_env_prefix("pnyxloadertest")
            .load()
            .unwrap();

        env::remove_var("PNYXLOADERTEST__SERVER__ROUTE_PREFIX");
        assert_eq!(config.server.route_prefix, "/from-env");
    }

    #[test]
    fn test_dotenv_file_feeds_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PNYXDOTENVTEST__LOGGING__LEVEL=warn").unwrap();

        let config = ConfigLoader::new()
            .with_dotenv_file(file.path())
            .unwrap()
            .with_env_prefix("PNYXDOTENVTEST")
            .load()
            .unwrap();

        env::remove_var("PNYXDOTENVTEST__LOGGING__LEVEL");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_bool() {
        for value in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(value), Some(true), "{value}");
        }
        for value in ["false", "False", "0", "no", "off"] {
            assert_eq!(parse_bool(value), Some(false), "{value}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }
}
