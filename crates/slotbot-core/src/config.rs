use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub validator: Option<ValidatorConfig>,

    #[serde(default)]
    pub recognizer: RecognizerConfig,

    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_channel_id")]
    pub channel_id: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            channel_id: default_channel_id(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PromptConfig {
    #[serde(default = "default_prompt_text")]
    pub text: String,

    #[serde(default)]
    pub retry_text: Option<String>,

    #[serde(default)]
    pub culture: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            text: default_prompt_text(),
            retry_text: None,
            culture: None,
        }
    }
}

/// Rejects recognized values that are not strictly greater than `min_value`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub min_value: f64,

    #[serde(default = "default_rejection")]
    pub rejection: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RecognizerConfig {
    #[serde(default = "default_recognizer_engine")]
    pub engine: String,

    #[serde(default = "empty_table")]
    pub options: toml::Value,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            engine: default_recognizer_engine(),
            options: empty_table(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransportConfig {
    #[serde(default = "default_transport_engine")]
    pub engine: String,

    #[serde(default = "empty_table")]
    pub options: toml::Value,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            engine: default_transport_engine(),
            options: empty_table(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_channel_id() -> String {
    "console".to_string()
}

fn default_prompt_text() -> String {
    "Gimme:".to_string()
}

fn default_rejection() -> String {
    "TooSmall".to_string()
}

fn default_recognizer_engine() -> String {
    "quantity".to_string()
}

fn default_transport_engine() -> String {
    "memory".to_string()
}

fn empty_table() -> toml::Value {
    toml::Value::Table(Default::default())
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();
    let mut missing = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                missing.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = missing.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.prompt.text.trim().is_empty() {
            return Err(ConfigError::Invalid("prompt.text must not be empty".to_string()));
        }
        if let Some(ref validator) = self.validator {
            if validator.rejection.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "validator.rejection must not be empty".to_string(),
                ));
            }
            if !validator.min_value.is_finite() {
                return Err(ConfigError::Invalid(
                    "validator.min_value must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}
