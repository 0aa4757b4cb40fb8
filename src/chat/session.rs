//! Chat aggregate
//!
//! A chat owns its configuration and a [`MessageWindow`]. Every append goes
//! through the window, which evicts the oldest messages until the new one
//! fits the model's context size.
//!
//! # Concurrency
//!
//! A `Chat` has no internal locking. Callers must serialize operations on a
//! single chat, for example through [`SharedChat`](super::shared::SharedChat).

use super::clock::{IdGenerator, UuidGenerator};
use super::config::ChatConfig;
use super::message::Message;
use super::models::{ChatStatus, Model, Role};
use super::window::{Admission, MessageWindow};
use crate::error::{ChatError, Result};
use crate::metrics::METRICS;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One conversation with a bounded token budget
#[derive(Debug, Clone)]
pub struct Chat {
    id: String,
    user_id: String,
    initial_system_message: Message,
    window: MessageWindow,
    status: ChatStatus,
    config: ChatConfig,
}

impl Chat {
    /// Create an active chat seeded with its system message
    pub fn new(
        user_id: impl Into<String>,
        initial_system_message: Message,
        config: ChatConfig,
    ) -> Result<Self> {
        Self::create(user_id, initial_system_message, config, &UuidGenerator)
    }

    /// Create an active chat with an explicit id source
    pub fn create(
        user_id: impl Into<String>,
        initial_system_message: Message,
        config: ChatConfig,
        ids: &dyn IdGenerator,
    ) -> Result<Self> {
        let mut chat = Self {
            id: ids.next_id(),
            user_id: user_id.into(),
            initial_system_message: initial_system_message.clone(),
            window: MessageWindow::new(),
            status: ChatStatus::Active,
            config,
        };

        if initial_system_message.role() != Role::System {
            warn!(
                "Chat {} seeded with a {} message instead of a system message",
                chat.id,
                initial_system_message.role()
            );
        }

        let seeded = match chat.validate() {
            Ok(()) => chat.append(initial_system_message),
            Err(e) => Err(e),
        };
        let admission = match seeded {
            Ok(admission) => admission,
            Err(e) => {
                warn!("Failed to create chat for user {}: {}", chat.user_id, e);
                METRICS.record_create_failure(e.kind());
                return Err(e);
            }
        };

        METRICS.record_append(
            chat.initial_system_message.role().as_str(),
            admission.evicted,
            admission.token_usage,
            chat.available_tokens(),
        );
        METRICS.record_chat_created();
        info!(
            "Created chat {} for user {} (model={}, max_tokens={})",
            chat.id,
            chat.user_id,
            chat.model().name(),
            chat.model().max_tokens()
        );

        Ok(chat)
    }

    /// Rebuild a chat from stored parts.
    ///
    /// Token usage is recomputed from `active`; a stored set of active
    /// messages that no longer fits the model is rejected.
    pub fn reconstitute(
        id: String,
        user_id: String,
        initial_system_message: Message,
        active: Vec<Message>,
        evicted: Vec<Message>,
        status: ChatStatus,
        config: ChatConfig,
    ) -> Result<Self> {
        let chat = Self {
            id,
            user_id,
            initial_system_message,
            window: MessageWindow::restore(active, evicted),
            status,
            config,
        };

        chat.validate()?;

        let max = chat.model().max_tokens();
        if chat.window.token_usage() > max {
            return Err(ChatError::MessageExceedsContext {
                tokens: chat.window.token_usage(),
                max,
            });
        }

        Ok(chat)
    }

    /// Validate the user id and configuration
    pub fn validate(&self) -> Result<()> {
        if self.user_id.is_empty() {
            return Err(ChatError::InvalidUserId);
        }

        self.config.validate()
    }

    /// Append a message, evicting the oldest ones to stay within budget.
    ///
    /// On error the chat is left unchanged.
    pub fn add_message(&mut self, message: Message) -> Result<()> {
        if !self.status.accepts_messages() {
            warn!("Rejected message {} for ended chat {}", message.id(), self.id);
            METRICS.record_rejection(ChatError::SessionEnded.kind());
            return Err(ChatError::SessionEnded);
        }

        let max_tokens = self.model().max_tokens();
        let role = message.role();
        let message_id = message.id().to_string();

        let admission = match self.append(message) {
            Ok(admission) => admission,
            Err(e) => {
                warn!("Rejected message {} for chat {}: {}", message_id, self.id, e);
                METRICS.record_rejection(e.kind());
                return Err(e);
            }
        };

        debug!(
            "Chat {}: appended {} message {}, evicted={}, tokens={}/{}",
            self.id,
            role,
            message_id,
            admission.evicted,
            admission.token_usage,
            max_tokens
        );
        METRICS.record_append(
            role.as_str(),
            admission.evicted,
            admission.token_usage,
            max_tokens - admission.token_usage,
        );

        Ok(())
    }

    /// Admit a message built for this chat's model into the window
    fn append(&mut self, message: Message) -> Result<Admission> {
        if message.model().as_ref() != self.model().as_ref() {
            return Err(ChatError::InvalidModel(format!(
                "message {} was counted for model '{}', chat uses '{}'",
                message.id(),
                message.model().name(),
                self.model().name()
            )));
        }

        let max_tokens = self.model().max_tokens();
        self.window.admit(message, max_tokens)
    }

    /// Mark the chat as ended. Calling it again has no further effect.
    pub fn end(&mut self) {
        if self.status == ChatStatus::Ended {
            return;
        }
        self.status = ChatStatus::Ended;
        METRICS.record_chat_ended();
        info!("Ended chat {} with {} active messages", self.id, self.window.len());
    }

    /// Active messages, oldest first
    pub fn messages(&self) -> &[Message] {
        self.window.active()
    }

    pub fn count_messages(&self) -> usize {
        self.window.len()
    }

    /// Messages evicted to keep the chat within budget, in eviction order
    pub fn evicted_messages(&self) -> &[Message] {
        self.window.evicted()
    }

    pub fn token_usage(&self) -> usize {
        self.window.token_usage()
    }

    /// Tokens still free in the model's context window
    pub fn available_tokens(&self) -> usize {
        self.model().max_tokens().saturating_sub(self.window.token_usage())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn initial_system_message(&self) -> &Message {
        &self.initial_system_message
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        self.status == ChatStatus::Ended
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.config.model
    }
}
