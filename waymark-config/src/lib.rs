//! Settings for waymark services
//!
//! Routes are registered in code through [`ServiceConfig`]; this crate covers
//! the deployment-time knobs around them: how logging is set up and what the
//! not-found page looks like. Settings come from a TOML, JSON or `.env`
//! file and are overridden by `WAYMARK_*` environment variables.
//!
//! ```toml
//! [log]
//! level = "debug"        # trace | debug | info | warn | error
//! format = "pretty"      # json | plain | pretty | compact
//! file = "logs/waymark.log"
//! env_filter = "waymark_core=trace"
//! spans = true
//!
//! [router]
//! not_found_template_file = "static/404.html"
//! ```
//!
//! | Variable | Setting |
//! |---|---|
//! | `WAYMARK_LOG_LEVEL` | `log.level` |
//! | `WAYMARK_LOG_FORMAT` | `log.format` |
//! | `WAYMARK_LOG_FILE` | `log.file` |
//! | `WAYMARK_LOG_ENV_FILTER` | `log.env_filter` |
//! | `WAYMARK_NOT_FOUND_TEMPLATE` | `router.not_found_template` |
//! | `WAYMARK_NOT_FOUND_TEMPLATE_FILE` | `router.not_found_template_file` |

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use waymark_core::ServiceConfig;
use waymark_core::logging::{LogConfig, LogFormat, LogLevel, LogOutput};

/// Logging section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Append to this file instead of STDOUT
    pub file: Option<String>,
    /// Filter directives; override `level` when set
    pub env_filter: Option<String>,
    pub spans: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            file: None,
            env_filter: None,
            spans: false,
        }
    }
}

/// Router section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterSettings {
    /// Inline not-found page; `${page}` is replaced by the requested path
    pub not_found_template: Option<String>,
    /// File holding the not-found page
    pub not_found_template_file: Option<String>,
}

/// Complete settings document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub log: LogSettings,
    pub router: RouterSettings,
}

impl Settings {
    /// Deserialize from a parsed document
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Parse settings text in the given format.
    ///
    /// `.env` content is read as `WAYMARK_*` overrides on top of the defaults.
    pub fn parse(content: &str, format: FileFormat) -> Result<Self> {
        let value = ConfigLoader::new(format).parse(content)?;
        match format {
            FileFormat::Env => {
                let serde_json::Value::Object(map) = value else {
                    return Err(ConfigError::ParseError("expected key/value pairs".to_string()));
                };
                let pairs = map
                    .into_iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k, v.to_string())));
                let overrides = EnvLoader::waymark().collect(pairs);
                Self::default().with_overrides(&overrides)
            }
            FileFormat::Json | FileFormat::Toml => Self::from_value(value),
        }
    }

    /// Load a settings file, detecting its format from the name
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let loader = ConfigLoader::auto(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content, loader.format())
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Full startup sequence: `.env` into the environment (if present), the
    /// optional settings file, `WAYMARK_*` overrides, then validation
    pub fn load(path: Option<&str>) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(dotenv) => debug!(path = %dotenv.display(), "Loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::LoadError(format!(".env: {e}"))),
        }

        let settings = match path {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        }
        .with_env()?;

        settings.validate()?;
        info!(
            level = settings.log.level.as_str(),
            format = ?settings.log.format,
            custom_not_found = settings.has_custom_not_found(),
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Apply the `WAYMARK_*` variables of the process environment
    pub fn with_env(self) -> Result<Self> {
        let overrides = EnvLoader::waymark().load();
        self.with_overrides(&overrides)
    }

    /// Apply overrides keyed like the variable names without prefix,
    /// e.g. `log_level`. Unknown keys are ignored.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Result<Self> {
        for (key, value) in overrides {
            match key.as_str() {
                "log_level" => {
                    self.log.level = LogLevel::parse(value).ok_or_else(|| invalid(key, value))?;
                }
                "log_format" => {
                    self.log.format = LogFormat::parse(value).ok_or_else(|| invalid(key, value))?;
                }
                "log_file" => self.log.file = Some(value.clone()),
                "log_env_filter" => self.log.env_filter = Some(value.clone()),
                "log_spans" => {
                    self.log.spans = value.parse().map_err(|_| invalid(key, value))?;
                }
                "not_found_template" => {
                    self.router.not_found_template = Some(value.clone());
                    self.router.not_found_template_file = None;
                }
                "not_found_template_file" => {
                    self.router.not_found_template_file = Some(value.clone());
                    self.router.not_found_template = None;
                }
                _ => debug!(key = %key, "Ignoring unknown override"),
            }
        }
        Ok(self)
    }

    pub fn has_custom_not_found(&self) -> bool {
        self.router.not_found_template.is_some() || self.router.not_found_template_file.is_some()
    }

    /// Logging configuration described by these settings
    pub fn log_config(&self) -> LogConfig {
        let output = match &self.log.file {
            Some(path) => LogOutput::File(path.clone()),
            None => LogOutput::Stdout,
        };
        let mut config = LogConfig::new()
            .level(self.log.level)
            .format(self.log.format)
            .output(output)
            .with_spans(self.log.spans);
        if let Some(filter) = &self.log.env_filter {
            config = config.with_env_filter(filter.clone());
        }
        config
    }

    /// The configured not-found template, read from disk when given as a file
    pub fn not_found_template(&self) -> Result<Option<String>> {
        if let Some(template) = &self.router.not_found_template {
            return Ok(Some(template.clone()));
        }
        match &self.router.not_found_template_file {
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }

    /// Install the configured not-found template into `config`
    pub fn apply(&self, config: ServiceConfig) -> Result<ServiceConfig> {
        Ok(match self.not_found_template()? {
            Some(template) => {
                if !template.contains(waymark_core::PAGE_PLACEHOLDER) {
                    debug!("Not-found template has no ${{page}} placeholder");
                }
                config.not_found_template(template)
            }
            None => config,
        })
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::exclusive(
            &self.router.not_found_template,
            &self.router.not_found_template_file,
            "router.not_found_template",
            "router.not_found_template_file",
        )?;
        if let Some(path) = &self.router.not_found_template_file {
            ConfigValidator::is_file(path, "router.not_found_template_file")?;
        }
        if let Some(file) = &self.log.file {
            ConfigValidator::not_empty(file, "log.file")?;
            ConfigValidator::parent_exists(file, "log.file")?;
        }
        if let Some(filter) = &self.log.env_filter {
            ConfigValidator::not_empty(filter, "log.env_filter")?;
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
