//! Application configuration
//!
//! Loaded from a TOML file (or string) with environment overrides using the
//! `CHAT_` prefix and `__` for nested keys, e.g. `CHAT_MODEL__MAX_TOKENS=4096`.

use crate::chat::{ChatConfig, Model, TiktokenEstimator, TokenEstimator, WordBasedEstimator};
use crate::error::{ChatError, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model identity and context window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_model_name() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> usize {
    8192
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Sampling parameters applied to every chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_n")]
    pub n: u32,

    #[serde(default)]
    pub stop: Vec<String>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub presence_penalty: f32,

    #[serde(default)]
    pub frequency_penalty: f32,
}

fn default_temperature() -> f32 {
    1.0
}

fn default_top_p() -> f32 {
    1.0
}

fn default_n() -> u32 {
    1
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            n: default_n(),
            stop: vec![],
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

/// Tokenizer selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    #[default]
    Tiktoken,
    Word,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub kind: TokenizerKind,

    /// Only used by the word-based tokenizer
    #[serde(default = "default_tokens_per_word")]
    pub tokens_per_word: f64,
}

fn default_tokens_per_word() -> f64 {
    1.3
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: TokenizerKind::default(),
            tokens_per_word: default_tokens_per_word(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load from a file, then apply `CHAT_*` environment overrides.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config: Config = config::Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config: Config = config::Config::builder()
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Environment variables are not consulted.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the model and sampling sections describe a usable chat
    pub fn validate(&self) -> Result<()> {
        if self.tokenizer.kind == TokenizerKind::Word && self.tokenizer.tokens_per_word <= 0.0 {
            return Err(ChatError::Configuration(format!(
                "tokens_per_word must be positive, got {}",
                self.tokenizer.tokens_per_word
            )));
        }

        self.chat_config()?.validate()
    }

    /// Build the shared model described by `[model]`
    pub fn model(&self) -> Result<Arc<Model>> {
        Model::new(self.model.name.clone(), self.model.max_tokens).map(Arc::new)
    }

    /// Build a chat configuration from `[model]` and `[sampling]`
    pub fn chat_config(&self) -> Result<ChatConfig> {
        let sampling = &self.sampling;
        Ok(ChatConfig {
            model: self.model()?,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            n: sampling.n,
            stop: sampling.stop.clone(),
            max_tokens: sampling.max_tokens,
            presence_penalty: sampling.presence_penalty,
            frequency_penalty: sampling.frequency_penalty,
        })
    }

    /// Build the configured tokenizer
    pub fn token_estimator(&self) -> Result<Arc<dyn TokenEstimator>> {
        let estimator: Arc<dyn TokenEstimator> = match self.tokenizer.kind {
            TokenizerKind::Tiktoken => Arc::new(TiktokenEstimator::new()?),
            TokenizerKind::Word => Arc::new(WordBasedEstimator::new(self.tokenizer.tokens_per_word)),
        };
        Ok(estimator)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("CHAT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "gpt-4");
        assert_eq!(config.model.max_tokens, 8192);
        assert_eq!(config.sampling.temperature, 1.0);
        assert_eq!(config.tokenizer.kind, TokenizerKind::Tiktoken);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            [model]
            name = "gpt-3.5-turbo"
            max_tokens = 4096

            [sampling]
            temperature = 0.2
            stop = ["END"]
            max_tokens = 512

            [tokenizer]
            kind = "word"
            tokens_per_word = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(config.model.name, "gpt-3.5-turbo");
        assert_eq!(config.model.max_tokens, 4096);
        assert_eq!(config.sampling.temperature, 0.2);
        assert_eq!(config.sampling.stop, vec!["END".to_string()]);
        assert_eq!(config.sampling.max_tokens, Some(512));
        assert_eq!(config.tokenizer.kind, TokenizerKind::Word);

        let chat_config = config.chat_config().unwrap();
        assert_eq!(chat_config.model.max_tokens(), 4096);
        assert_eq!(chat_config.temperature, 0.2);
    }

    #[test]
    fn test_sections_default_when_missing() {
        let config = Config::from_toml_str("[logging]\njson = true\n").unwrap();
        assert!(config.logging.json);
        assert_eq!(config.model.max_tokens, 8192);
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let result = Config::from_toml_str("[sampling]\ntemperature = 2.5\n");
        assert!(matches!(result, Err(ChatError::InvalidTemperature(_))));
    }

    #[test]
    fn test_zero_context_rejected() {
        let result = Config::from_toml_str("[model]\nmax_tokens = 0\n");
        assert!(matches!(result, Err(ChatError::InvalidModel(_))));
    }

    #[test]
    fn test_word_tokenizer_from_config() {
        let config = Config::from_toml_str("[tokenizer]\nkind = \"word\"\ntokens_per_word = 2.0\n").unwrap();
        let estimator = config.token_estimator().unwrap();
        assert_eq!(estimator.count_tokens("gpt-4", "two words"), 4);
    }

    #[test]
    fn test_non_positive_tokens_per_word_rejected() {
        let result = Config::from_toml_str("[tokenizer]\nkind = \"word\"\ntokens_per_word = 0.0\n");
        assert!(matches!(result, Err(ChatError::Configuration(_))));
    }

    #[test]
    fn test_environment_overrides() {
        use std::io::Write;

        std::env::set_var("CHAT_MODEL__MAX_TOKENS", "1234");
        std::env::set_var("CHAT_SAMPLING__TEMPERATURE", "0.5");

        let from_env = Config::from_env();

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[model]\nname = \"gpt-3.5-turbo\"\nmax_tokens = 4096\n\n[sampling]\ntemperature = 1.5"
        )
        .unwrap();
        let from_file = Config::from_file(file.path());

        std::env::remove_var("CHAT_MODEL__MAX_TOKENS");
        std::env::remove_var("CHAT_SAMPLING__TEMPERATURE");

        let from_env = from_env.unwrap();
        assert_eq!(from_env.model.max_tokens, 1234);
        assert_eq!(from_env.model.name, "gpt-4");
        assert_eq!(from_env.sampling.temperature, 0.5);

        // Environment wins over the file, untouched keys keep the file value
        let from_file = from_file.unwrap();
        assert_eq!(from_file.model.max_tokens, 1234);
        assert_eq!(from_file.sampling.temperature, 0.5);
        assert_eq!(from_file.model.name, "gpt-3.5-turbo");
    }
}
