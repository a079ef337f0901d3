//! Chat document store.
//!
//! Messages are append-only. Moderation rewrites `text` in place and sets
//! `moderated`; no history of the original text is kept.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::actor::{Actor, Role};
use crate::error::{PortalError, Result};

pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const DEFAULT_MODERATION_TEXT: &str = "[removed by moderator]";
/// Messages a [`MemoryChatStore`] keeps before dropping the oldest.
pub const DEFAULT_RETAINED_MESSAGES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub author_email: String,
    pub author_role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub moderated: bool,
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn append(&self, author: &Actor, text: &str) -> Result<ChatMessage>;

    /// The newest `limit` messages, oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ChatMessage>>;

    async fn moderate(&self, id: &str, replacement: &str) -> Result<ChatMessage>;
}

// ---------------------------------------------------------------------------
// MemoryChatStore
// ---------------------------------------------------------------------------

/// Development store held in process memory.
///
/// Nothing is persisted and each server process has its own history, so
/// instances behind a load balancer do not see each other's messages. Only
/// the newest `retain` messages are kept.
pub struct MemoryChatStore {
    messages: RwLock<VecDeque<ChatMessage>>,
    retain: usize,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETAINED_MESSAGES)
    }

    pub fn with_retention(retain: usize) -> Self {
        Self {
            messages: RwLock::new(VecDeque::new()),
            retain: retain.max(1),
        }
    }
}

impl Default for MemoryChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn append(&self, author: &Actor, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PortalError::EmptyMessage);
        }
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            author_email: author.email().to_string(),
            author_role: author.role(),
            text: text.to_string(),
            created_at: Utc::now(),
            moderated: false,
        };
        let mut messages = self.messages.write().await;
        if messages.len() >= self.retain {
            messages.pop_front();
        }
        messages.push_back(message.clone());
        Ok(message)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let start = messages.len().saturating_sub(limit);
        Ok(messages.iter().skip(start).cloned().collect())
    }

    async fn moderate(&self, id: &str, replacement: &str) -> Result<ChatMessage> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| PortalError::MessageNotFound(id.to_string()))?;
        message.text = replacement.to_string();
        message.moderated = true;
        Ok(message.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
