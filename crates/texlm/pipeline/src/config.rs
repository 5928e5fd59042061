//! Pipeline configuration
//!
//! Sources, later ones winning: built-in defaults, an optional TOML or
//! YAML file, then `TEXLM_*` environment variables with `__` between
//! nesting levels (`TEXLM_PIPELINE__MAX_RETRIES=5`).

use serde::{Deserialize, Serialize};
use texlm_oracle::OracleConfig;
use texlm_render::NumericFormatter;

pub const ENV_PREFIX: &str = "TEXLM";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: RetryConfig,

    /// Numeral formatting
    #[serde(default)]
    pub format: NumericFormatter,

    /// Oracle endpoint and models
    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retry loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Reject styled markup that alters a numeral of the numeric core
    #[serde(default = "default_true")]
    pub audit_styled_numerals: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            audit_styled_numerals: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PipelineConfig {
    /// Load and validate configuration
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&PipelineConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format.significant_figures == 0 {
            return Err(ConfigError::Invalid(
                "format.significant_figures must be at least 1".into(),
            ));
        }
        if self.oracle.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "oracle.request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
