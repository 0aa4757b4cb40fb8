//! Serialized access to chats from async callers

use super::message::Message;
use super::models::ChatStatus;
use super::session::Chat;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A chat behind one exclusive lock.
///
/// Cloning is cheap and every clone refers to the same chat, so concurrent
/// tasks appending to it are applied one at a time.
#[derive(Debug, Clone)]
pub struct SharedChat {
    id: Arc<str>,
    user_id: Arc<str>,
    inner: Arc<Mutex<Chat>>,
}

impl SharedChat {
    pub fn new(chat: Chat) -> Self {
        Self {
            id: Arc::from(chat.id()),
            user_id: Arc::from(chat.user_id()),
            inner: Arc::new(Mutex::new(chat)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn add_message(&self, message: Message) -> Result<()> {
        self.inner.lock().await.add_message(message)
    }

    pub async fn end(&self) {
        self.inner.lock().await.end();
    }

    /// Snapshot of the active messages
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.lock().await.messages().to_vec()
    }

    pub async fn count_messages(&self) -> usize {
        self.inner.lock().await.count_messages()
    }

    pub async fn token_usage(&self) -> usize {
        self.inner.lock().await.token_usage()
    }

    pub async fn status(&self) -> ChatStatus {
        self.inner.lock().await.status()
    }

    /// Run `f` against the chat while holding the lock
    pub async fn read<R>(&self, f: impl FnOnce(&Chat) -> R) -> R {
        let chat = self.inner.lock().await;
        f(&chat)
    }
}

/// In-memory lookup of live chats by id
#[derive(Debug, Default)]
pub struct ChatRegistry {
    chats: DashMap<String, SharedChat>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chat, returning the shared handle
    pub fn insert(&self, chat: Chat) -> SharedChat {
        let shared = SharedChat::new(chat);
        debug!("Registering chat {}", shared.id());
        self.chats.insert(shared.id().to_string(), shared.clone());
        shared
    }

    pub fn get(&self, id: &str) -> Option<SharedChat> {
        self.chats.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &str) -> Option<SharedChat> {
        self.chats.remove(id).map(|(_, chat)| chat)
    }

    /// All chats owned by `user_id`
    pub fn for_user(&self, user_id: &str) -> Vec<SharedChat> {
        self.chats
            .iter()
            .filter(|entry| entry.value().user_id() == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::config::ChatConfig;
    use crate::chat::models::{Model, Role};
    use crate::chat::token_estimator::WordBasedEstimator;

    fn new_chat(user_id: &str) -> Chat {
        let model = Arc::new(Model::new("gpt-4", 50).unwrap());
        let system = Message::new(
            Role::System,
            "be brief",
            Arc::clone(&model),
            &WordBasedEstimator::new(1.0),
        )
        .unwrap();
        Chat::new(user_id, system, ChatConfig::new(model)).unwrap()
    }

    #[tokio::test]
    async fn test_shared_chat_serializes_appends() {
        let chat = new_chat("user-1");
        let model = Arc::clone(chat.model());
        let shared = SharedChat::new(chat);

        let mut handles = Vec::new();
        for i in 0..20 {
            let shared = shared.clone();
            let model = Arc::clone(&model);
            handles.push(tokio::spawn(async move {
                let msg = Message::new(
                    Role::User,
                    format!("message {} here", i),
                    model,
                    &WordBasedEstimator::new(1.0),
                )
                .unwrap();
                shared.add_message(msg).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let (usage, active, evicted) = shared
            .read(|c| {
                (
                    c.token_usage(),
                    c.messages().iter().map(Message::token_count).sum::<usize>(),
                    c.evicted_messages().len(),
                )
            })
            .await;
        assert_eq!(usage, active);
        assert!(usage <= 50);
        assert_eq!(shared.count_messages().await + evicted, 21);
    }

    #[tokio::test]
    async fn test_shared_chat_end() {
        let shared = SharedChat::new(new_chat("user-1"));
        shared.end().await;
        assert_eq!(shared.status().await, ChatStatus::Ended);
        assert_eq!(shared.messages().await.len(), 1);
        assert_eq!(shared.token_usage().await, 2);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ChatRegistry::new();
        let a = registry.insert(new_chat("alice"));
        registry.insert(new_chat("alice"));
        registry.insert(new_chat("bob"));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.for_user("alice").len(), 2);
        assert!(registry.get(a.id()).is_some());

        assert!(registry.remove(a.id()).is_some());
        assert!(registry.get(a.id()).is_none());
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
