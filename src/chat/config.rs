//! Per-chat model and sampling configuration

use super::models::Model;
use crate::error::{ChatError, Result};
use std::sync::Arc;

/// Sampling parameters for a chat and the model they apply to.
///
/// Field meanings follow the OpenAI chat completions API.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub model: Arc<Model>,
    pub temperature: f32,
    pub top_p: f32,
    pub n: u32,
    pub stop: Vec<String>,
    /// Cap on generated tokens, `None` leaves it to the provider
    pub max_tokens: Option<u32>,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl ChatConfig {
    /// Configuration with provider defaults for every sampling parameter
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            temperature: 1.0,
            top_p: 1.0,
            n: 1,
            stop: Vec::new(),
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_n(mut self, n: u32) -> Self {
        self.n = n;
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_penalties(mut self, presence: f32, frequency: f32) -> Self {
        self.presence_penalty = presence;
        self.frequency_penalty = frequency;
        self
    }

    /// Validate the configuration.
    ///
    /// Only temperature is checked.
    // TODO: validate top_p, n and the penalties against provider limits
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::InvalidTemperature(self.temperature));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Arc<Model> {
        Arc::new(Model::new("gpt-4", 8192).unwrap())
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ChatConfig::new(model());
        assert!(config.validate().is_ok());
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.n, 1);
        assert!(config.stop.is_empty());
        assert_eq!(config.max_tokens, None);
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(ChatConfig::new(model()).with_temperature(0.0).validate().is_ok());
        assert!(ChatConfig::new(model()).with_temperature(2.0).validate().is_ok());
        assert!(matches!(
            ChatConfig::new(model()).with_temperature(-0.1).validate(),
            Err(ChatError::InvalidTemperature(_))
        ));
        assert!(matches!(
            ChatConfig::new(model()).with_temperature(2.5).validate(),
            Err(ChatError::InvalidTemperature(_))
        ));
        assert!(ChatConfig::new(model()).with_temperature(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_other_parameters_not_validated() {
        let config = ChatConfig::new(model())
            .with_top_p(5.0)
            .with_n(0)
            .with_penalties(-10.0, 10.0)
            .with_stop(vec!["\n".to_string()])
            .with_max_tokens(256);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tokens, Some(256));
    }

    #[test]
    fn test_model_is_shared() {
        let model = model();
        let a = ChatConfig::new(Arc::clone(&model));
        let b = ChatConfig::new(Arc::clone(&model));
        assert!(Arc::ptr_eq(&a.model, &b.model));
    }
}
