//! Value types shared by messages and chats

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::System => "system",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "system" => Ok(Role::System),
            "assistant" => Ok(Role::Assistant),
            other => Err(ChatError::InvalidRole(other.to_string())),
        }
    }
}

/// Lifecycle status of a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    #[default]
    Active,
    Ended,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Active => "active",
            ChatStatus::Ended => "ended",
        }
    }

    /// Returns true if messages may still be appended
    pub fn accepts_messages(&self) -> bool {
        matches!(self, ChatStatus::Active)
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatStatus {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(ChatStatus::Active),
            "ended" => Ok(ChatStatus::Ended),
            other => Err(ChatError::InvalidStatus(other.to_string())),
        }
    }
}

/// Language model identity and context window size.
///
/// Built once from configuration and shared as `Arc<Model>` by every
/// message and chat config that refers to it. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    name: String,
    max_tokens: usize,
}

impl Model {
    /// Create a model, rejecting an empty name or a zero-sized context window
    pub fn new(name: impl Into<String>, max_tokens: usize) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ChatError::InvalidModel("model name must not be empty".to_string()));
        }
        if max_tokens == 0 {
            return Err(ChatError::InvalidModel(format!(
                "max_tokens for '{}' must be greater than zero",
                name
            )));
        }
        Ok(Self { name, max_tokens })
    }

    /// Name used to select the tokenizer encoding
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum context size in tokens
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}
