//! Moderation Store: a raw key-value backend plus the typed key scheme on top.
//!
//! Callers never build keys or decode values themselves; `ModerationStore`
//! owns the three namespaces and checks value types on every read.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    domain::{ChatId, MessageId},
    errors::Error,
    Result,
};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Raw durable key-value backend. No transactions, no compare-and-set.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn put(&self, key: &str, value: Value) -> Result<()>;
}

/// Every key the relay writes, by namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// `msg-map-{forwarded_message_id}` -> guest chat id.
    ConversationMapping(MessageId),
    /// `isblocked-{chat_id}` -> bool.
    BlockState(ChatId),
    /// `lastmsg-{chat_id}` -> epoch millis.
    LastNotification(ChatId),
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKey::ConversationMapping(id) => write!(f, "msg-map-{id}"),
            StoreKey::BlockState(chat) => write!(f, "isblocked-{chat}"),
            StoreKey::LastNotification(chat) => write!(f, "lastmsg-{chat}"),
        }
    }
}

/// Typed access layer over a [`KvStore`].
#[derive(Clone)]
pub struct ModerationStore {
    kv: Arc<dyn KvStore>,
}

impl ModerationStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Guest chat behind a message the relay forwarded to the administrator.
    pub async fn conversation(&self, forwarded: MessageId) -> Result<Option<ChatId>> {
        let key = StoreKey::ConversationMapping(forwarded);
        self.read(key, |v| v.as_i64().map(ChatId), "an integer chat id")
            .await
    }

    pub async fn record_conversation(&self, forwarded: MessageId, guest: ChatId) -> Result<()> {
        self.write(StoreKey::ConversationMapping(forwarded), Value::from(guest.0))
            .await
    }

    /// Absent means not blocked.
    pub async fn is_blocked(&self, chat_id: ChatId) -> Result<bool> {
        let key = StoreKey::BlockState(chat_id);
        Ok(self
            .read(key, Value::as_bool, "a boolean")
            .await?
            .unwrap_or(false))
    }

    pub async fn set_blocked(&self, chat_id: ChatId, blocked: bool) -> Result<()> {
        self.write(StoreKey::BlockState(chat_id), Value::Bool(blocked))
            .await
    }

    pub async fn last_notification(&self, chat_id: ChatId) -> Result<Option<i64>> {
        let key = StoreKey::LastNotification(chat_id);
        self.read(key, Value::as_i64, "an integer timestamp").await
    }

    pub async fn set_last_notification(&self, chat_id: ChatId, epoch_ms: i64) -> Result<()> {
        self.write(StoreKey::LastNotification(chat_id), Value::from(epoch_ms))
            .await
    }

    async fn read<T>(
        &self,
        key: StoreKey,
        decode: impl FnOnce(&Value) -> Option<T>,
        expected: &str,
    ) -> Result<Option<T>> {
        let key = key.to_string();
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(None);
        };
        match decode(&raw) {
            Some(v) => Ok(Some(v)),
            None => Err(Error::Store {
                key,
                reason: format!("expected {expected}, found {raw}"),
            }),
        }
    }

    async fn write(&self, key: StoreKey, value: Value) -> Result<()> {
        self.kv.put(&key.to_string(), value).await
    }
}
