//! TOML configuration file parsing and loading
//!
//! Settings merge in three layers: the config file (explicit path or the
//! default under the user config directory), the `HIBP_API_KEY` environment
//! variable as credential fallback, and CLI arguments on top.

use crate::app::cli::args::Args;
use std::path::PathBuf;

const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;
const DEFAULT_EXPORT_DIR: &str = "exports";
const API_KEY_ENV_VAR: &str = "HIBP_API_KEY";

/// Configuration loading error with an operator-facing message.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Fully merged runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub rate_limit_per_minute: u32,
    pub check_pastes: bool,
    pub export_dir: PathBuf,
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_format: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            check_pastes: true,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            color: None,
            log_level: None,
            log_file: None,
            log_format: None,
        }
    }
}

/// Default config file location: `<config_dir>/breachscan/breachscan.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("breachscan").join("breachscan.toml"))
}

impl Settings {
    /// Load and merge settings for the given CLI arguments.
    pub async fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        let config_path = match &args.config_file {
            Some(path) => {
                // User specified a config file - it must exist
                if !path.exists() {
                    return Err(ConfigError::new(format!(
                        "The specified configuration file does not exist: {}",
                        path.display()
                    )));
                }
                Some(path.clone())
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Some(path),
                _ => None,
            },
        };

        if let Some(path) = config_path {
            let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
                ConfigError::new(format!(
                    "Error reading configuration file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let config = contents.parse::<toml::Table>().map_err(|e| {
                ConfigError::new(format!(
                    "Error parsing configuration file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            settings.apply_toml_values(&config)?;
        }

        settings.apply_env();
        settings.apply_args(args)?;
        Ok(settings)
    }

    /// Apply TOML configuration values.
    pub fn apply_toml_values(&mut self, config: &toml::Table) -> Result<(), ConfigError> {
        if let Some(api_key) = config.get("api-key").and_then(|v| v.as_str()) {
            self.api_key = Some(api_key.to_string());
        }
        if let Some(rate) = config.get("rate-limit-per-minute").and_then(|v| v.as_integer()) {
            self.rate_limit_per_minute = validate_rate_limit(rate)?;
        }
        if let Some(check_pastes) = config.get("check-pastes").and_then(|v| v.as_bool()) {
            self.check_pastes = check_pastes;
        }
        if let Some(export_dir) = config.get("export-dir").and_then(|v| v.as_str()) {
            self.export_dir = PathBuf::from(export_dir);
        }
        if let Some(color) = config.get("color").and_then(|v| v.as_bool()) {
            self.color = Some(color);
        }
        if let Some(log_level) = config.get("log-level").and_then(|v| v.as_str()) {
            self.log_level = Some(log_level.to_string());
        }
        if let Some(log_file) = config.get("log-file").and_then(|v| v.as_str()) {
            if log_file.eq_ignore_ascii_case("none") || log_file == "-" {
                self.log_file = None; // Magic values "none" and "-" disable file logging
            } else {
                self.log_file = Some(PathBuf::from(log_file));
            }
        }
        if let Some(log_format) = config.get("log-format").and_then(|v| v.as_str()) {
            self.log_format = Some(log_format.to_string());
        }
        Ok(())
    }

    /// Credential fallback from the environment, applied only when neither
    /// the config file nor the CLI supplied a key.
    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
                if !key.is_empty() {
                    self.api_key = Some(key);
                }
            }
        }
    }

    /// CLI arguments take precedence over everything else.
    fn apply_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(api_key) = &args.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(rate) = args.rate_limit {
            self.rate_limit_per_minute = validate_rate_limit(i64::from(rate))?;
        }
        if args.no_pastes {
            self.check_pastes = false;
        }
        if let Some(export_dir) = &args.export_dir {
            self.export_dir = export_dir.clone();
        }
        if let Some(color) = args.color {
            self.color = Some(color);
        }
        if let Some(log_level) = &args.log_level {
            self.log_level = Some(log_level.clone());
        }
        if let Some(log_file) = &args.log_file {
            if log_file.as_os_str().eq_ignore_ascii_case("none") {
                self.log_file = None;
            } else {
                self.log_file = Some(log_file.clone());
            }
        }
        if let Some(log_format) = &args.log_format {
            self.log_format = Some(log_format.clone());
        }
        Ok(())
    }
}

/// Validate the lookups-per-minute setting.
fn validate_rate_limit(value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::new(
            "Invalid value for 'rate-limit-per-minute': must be greater than 0",
        ));
    }
    u32::try_from(value).map_err(|_| {
        ConfigError::new("Invalid value for 'rate-limit-per-minute': value too large")
    })
}
