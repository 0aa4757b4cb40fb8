//! Chat Context - token-budgeted chat sessions
//!
//! Keeps a conversation with a language model inside the model's context
//! window: messages are appended in order, and the oldest ones are evicted
//! whenever a new message would push the token total past the limit.

pub mod chat;
pub mod config;
pub mod error;
pub mod metrics;
pub mod observability;

pub use chat::{Chat, ChatConfig, ChatStatus, Message, Model, Role, TokenEstimator};
pub use error::{ChatError, Result};
