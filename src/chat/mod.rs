//! Chat sessions with token budget enforcement
//!
//! A [`Chat`] accumulates [`Message`]s and keeps the total token count of its
//! active messages within the model's context window by evicting the oldest
//! messages first.

pub mod clock;
pub mod config;
pub mod message;
pub mod models;
pub mod session;
pub mod shared;
pub mod token_estimator;
pub mod window;

pub use clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use config::ChatConfig;
pub use message::Message;
pub use models::{ChatStatus, Model, Role};
pub use session::Chat;
pub use shared::{ChatRegistry, SharedChat};
pub use token_estimator::{TiktokenEstimator, TokenEstimator, WordBasedEstimator};
pub use window::{Admission, MessageWindow};
