//! Sliding-window message storage with token accounting
//!
//! Active and evicted messages live in one structure so that a message is
//! always in exactly one of the two sequences and the token total always
//! matches the active sequence.

use super::message::Message;
use crate::error::{ChatError, Result};
use tracing::debug;

/// Result of admitting a message into the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Messages moved from the active to the evicted sequence
    pub evicted: usize,
    /// Token usage after the append
    pub token_usage: usize,
}

/// Active messages in insertion order plus the messages evicted from them
#[derive(Debug, Clone, Default)]
pub struct MessageWindow {
    active: Vec<Message>,
    evicted: Vec<Message>,
    token_usage: usize,
}

impl MessageWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a window from stored sequences, recomputing token usage
    pub fn restore(active: Vec<Message>, evicted: Vec<Message>) -> Self {
        let mut window = Self {
            active,
            evicted,
            token_usage: 0,
        };
        window.refresh_token_usage();
        window
    }

    /// Append `message`, evicting the oldest active messages until it fits
    /// within `max_tokens`.
    ///
    /// Fails without touching the window when the message is larger than
    /// the whole budget or its id is already active or evicted.
    pub fn admit(&mut self, message: Message, max_tokens: usize) -> Result<Admission> {
        if self.contains(message.id()) {
            return Err(ChatError::DuplicateMessage(message.id().to_string()));
        }

        let needed = message.token_count();
        if needed > max_tokens {
            return Err(ChatError::MessageExceedsContext {
                tokens: needed,
                max: max_tokens,
            });
        }

        let mut evicted = 0;
        loop {
            let available = max_tokens.saturating_sub(self.token_usage);

            if needed <= available {
                self.active.push(message);
                self.refresh_token_usage();
                break;
            }

            if self.active.is_empty() {
                return Err(ChatError::MessageExceedsContext {
                    tokens: needed,
                    max: max_tokens,
                });
            }

            let oldest = self.active.remove(0);
            debug!(
                "Evicting message {} ({} tokens) to make room for {} tokens",
                oldest.id(),
                oldest.token_count(),
                needed
            );
            self.evicted.push(oldest);
            self.refresh_token_usage();
            evicted += 1;
        }

        Ok(Admission {
            evicted,
            token_usage: self.token_usage,
        })
    }

    /// Active messages, oldest first
    pub fn active(&self) -> &[Message] {
        &self.active
    }

    /// Evicted messages in eviction order
    pub fn evicted(&self) -> &[Message] {
        &self.evicted
    }

    /// True if a message with `id` is active or was evicted
    pub fn contains(&self, id: &str) -> bool {
        self.active.iter().chain(self.evicted.iter()).any(|m| m.id() == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Sum of token counts over the active messages
    pub fn token_usage(&self) -> usize {
        self.token_usage
    }

    fn refresh_token_usage(&mut self) {
        self.token_usage = self.active.iter().map(Message::token_count).sum();
    }
}
