//! Message entity

use super::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use super::models::{Model, Role};
use super::token_estimator::TokenEstimator;
use crate::error::{ChatError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// One turn of a conversation.
///
/// The token count is computed once at creation from the model's tokenizer
/// and never changes. Fields are private so a validated message stays
/// valid for as long as it exists. A chat rejects a message whose id it
/// already holds, but nothing stops a clone being added to a second chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    id: String,
    role: Role,
    content: String,
    token_count: usize,
    #[serde(skip)]
    model: Arc<Model>,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time and a fresh UUID
    pub fn new(
        role: Role,
        content: impl Into<String>,
        model: Arc<Model>,
        estimator: &dyn TokenEstimator,
    ) -> Result<Self> {
        Self::create(role, content, model, estimator, &SystemClock, &UuidGenerator)
    }

    /// Create a message with explicit time and id sources
    pub fn create(
        role: Role,
        content: impl Into<String>,
        model: Arc<Model>,
        estimator: &dyn TokenEstimator,
        clock: &dyn Clock,
        ids: &dyn IdGenerator,
    ) -> Result<Self> {
        let content = content.into();
        let token_count = estimator.count_tokens(model.name(), &content);

        let message = Self {
            id: ids.next_id(),
            role,
            content,
            token_count,
            model,
            created_at: clock.now(),
        };

        message.validate()?;
        Ok(message)
    }

    /// Create a message from a textual role such as `"assistant"`
    pub fn parse(
        role: &str,
        content: impl Into<String>,
        model: Arc<Model>,
        estimator: &dyn TokenEstimator,
    ) -> Result<Self> {
        let role: Role = role.parse()?;
        Self::new(role, content, model, estimator)
    }

    /// Rebuild a message from stored parts.
    ///
    /// The token count is taken as given; the tokenizer is not consulted.
    pub fn reconstitute(
        id: String,
        role: Role,
        content: String,
        token_count: usize,
        model: Arc<Model>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let message = Self {
            id,
            role,
            content,
            token_count,
            model,
            created_at,
        };

        message.validate()?;
        Ok(message)
    }

    /// Check content and timestamp. The role is valid by construction.
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() {
            return Err(ChatError::InvalidContent);
        }

        if self.created_at == DateTime::<Utc>::default() {
            return Err(ChatError::InvalidTimestamp);
        }

        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
