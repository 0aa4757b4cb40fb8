//! Token counting using tiktoken

use crate::error::{ChatError, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};
use tracing::debug;

/// Token counter keyed by model name.
///
/// Implementations must be deterministic for a given model/text pair.
pub trait TokenEstimator: Send + Sync {
    /// Count the tokens `text` occupies for the named model
    fn count_tokens(&self, model_name: &str, text: &str) -> usize;

    /// Count tokens for multiple texts
    fn count_batch(&self, model_name: &str, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.count_tokens(model_name, t)).collect()
    }
}

/// Tiktoken-based estimator that resolves the BPE encoding per model.
///
/// Encoders are cached by model name. Names tiktoken does not recognise fall
/// back to `cl100k_base` (GPT-4, GPT-3.5-turbo).
pub struct TiktokenEstimator {
    fallback: Arc<CoreBPE>,
    encoders: DashMap<String, Arc<CoreBPE>>,
}

impl TiktokenEstimator {
    /// Create a new tiktoken estimator
    pub fn new() -> Result<Self> {
        let fallback = cl100k_base().map_err(|e| ChatError::Tokenizer(e.to_string()))?;
        Ok(Self {
            fallback: Arc::new(fallback),
            encoders: DashMap::new(),
        })
    }

    fn encoder_for(&self, model_name: &str) -> Arc<CoreBPE> {
        if let Some(bpe) = self.encoders.get(model_name) {
            return Arc::clone(bpe.value());
        }

        let bpe = match get_bpe_from_model(model_name) {
            Ok(bpe) => Arc::new(bpe),
            Err(e) => {
                debug!("No tiktoken encoding for model '{}' ({}), using cl100k_base", model_name, e);
                Arc::clone(&self.fallback)
            }
        };
        self.encoders.insert(model_name.to_string(), Arc::clone(&bpe));
        bpe
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn count_tokens(&self, model_name: &str, text: &str) -> usize {
        self.encoder_for(model_name).encode_with_special_tokens(text).len()
    }
}

/// Word-based token estimator (fallback, ~1.3 tokens per word)
#[derive(Debug, Clone)]
pub struct WordBasedEstimator {
    tokens_per_word: f64,
}

impl WordBasedEstimator {
    pub fn new(tokens_per_word: f64) -> Self {
        Self { tokens_per_word }
    }
}

impl Default for WordBasedEstimator {
    fn default() -> Self {
        Self::new(1.3)
    }
}

impl TokenEstimator for WordBasedEstimator {
    fn count_tokens(&self, _model_name: &str, text: &str) -> usize {
        let word_count = text.split_whitespace().count();
        (word_count as f64 * self.tokens_per_word).ceil() as usize
    }
}
