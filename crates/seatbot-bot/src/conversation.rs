// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat conversation state.
//!
//! Every chat gets a [`ChatSlot`] with two locks: `turn` serializes message
//! handling for the chat (held across the model call), `state` guards the
//! data and is only held for short reads and appends so the admin surface
//! never waits on a model call.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use seatbot_core::{ChatMessage, SeatbotError, Speaker};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::text::{is_group_chat, phone_from_chat_id};

/// Default number of messages kept per conversation.
pub const DEFAULT_CONVERSATION_CAPACITY: usize = 50;

/// One chat's history and flags.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub chat_id: String,
    pub display_name: String,
    pub phone_number: String,
    pub is_group: bool,
    pub paused: bool,
    pub last_activity: DateTime<Utc>,
    pub unread_count: u32,
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl Conversation {
    pub fn new(chat_id: &str, display_name_hint: Option<&str>, capacity: usize, now: DateTime<Utc>) -> Self {
        let phone_number = phone_from_chat_id(chat_id).to_string();
        let display_name = display_name_hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map_or_else(|| phone_number.clone(), str::to_string);
        let capacity = capacity.max(1);

        Self {
            chat_id: chat_id.to_string(),
            display_name,
            phone_number,
            is_group: is_group_chat(chat_id),
            paused: false,
            last_activity: now,
            unread_count: 0,
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a message, dropping the oldest beyond capacity.
    pub fn append(&mut self, from: Speaker, text: impl Into<String>, now: DateTime<Utc>) -> ChatMessage {
        let message = ChatMessage {
            from,
            text: text.into(),
            timestamp: now,
        };
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message.clone());
        self.last_activity = now;
        message
    }

    /// Stored messages, oldest first.
    pub fn messages(&self) -> &VecDeque<ChatMessage> {
        &self.messages
    }

    /// Adopts a newer profile name supplied by the transport.
    pub fn refresh_display_name(&mut self, hint: Option<&str>) {
        if let Some(name) = hint.map(str::trim).filter(|h| !h.is_empty())
            && name != self.display_name
        {
            self.display_name = name.to_string();
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            chat_id: self.chat_id.clone(),
            display_name: self.display_name.clone(),
            phone_number: self.phone_number.clone(),
            is_group: self.is_group,
            paused: self.paused,
            last_activity: self.last_activity,
            unread_count: self.unread_count,
            last_message: self.messages.back().map(|m| m.text.clone()),
        }
    }

    pub fn detail(&self) -> ConversationDetail {
        ConversationDetail {
            summary: self.summary(),
            messages: self.messages.iter().cloned().collect(),
        }
    }
}

/// List entry for the admin surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub chat_id: String,
    pub display_name: String,
    pub phone_number: String,
    pub is_group: bool,
    pub paused: bool,
    pub last_activity: DateTime<Utc>,
    pub unread_count: u32,
    pub last_message: Option<String>,
}

/// A conversation with its full stored history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub summary: ConversationSummary,
    pub messages: Vec<ChatMessage>,
}

/// Lock pair for one chat.
pub struct ChatSlot {
    turn: Mutex<()>,
    state: Mutex<Conversation>,
}

impl ChatSlot {
    fn new(conversation: Conversation) -> Self {
        Self {
            turn: Mutex::new(()),
            state: Mutex::new(conversation),
        }
    }

    /// Held for the whole handling of one inbound message.
    pub async fn lock_turn(&self) -> MutexGuard<'_, ()> {
        self.turn.lock().await
    }

    pub async fn state(&self) -> MutexGuard<'_, Conversation> {
        self.state.lock().await
    }

    fn in_flight(&self) -> bool {
        self.turn.try_lock().is_err()
    }
}

pub type ConversationHandle = Arc<ChatSlot>;

/// All live conversations keyed by chat id.
pub struct ConversationStore {
    chats: DashMap<String, ConversationHandle>,
    capacity: usize,
    max_idle: Duration,
}

impl ConversationStore {
    pub fn new(capacity: usize, max_idle: Duration) -> Self {
        Self {
            chats: DashMap::new(),
            capacity,
            max_idle,
        }
    }

    /// Returns the chat's slot, creating the conversation on first contact.
    pub fn get_or_create(&self, chat_id: &str, display_name_hint: Option<&str>) -> ConversationHandle {
        if let Some(slot) = self.chats.get(chat_id) {
            return Arc::clone(slot.value());
        }
        let slot = self
            .chats
            .entry(chat_id.to_string())
            .or_insert_with(|| {
                debug!(chat_id, "conversation created");
                Arc::new(ChatSlot::new(Conversation::new(
                    chat_id,
                    display_name_hint,
                    self.capacity,
                    Utc::now(),
                )))
            });
        Arc::clone(slot.value())
    }

    pub fn get(&self, chat_id: &str) -> Option<ConversationHandle> {
        self.chats.get(chat_id).map(|slot| Arc::clone(slot.value()))
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// Summaries, most recently active first.
    pub async fn list(&self) -> Vec<ConversationSummary> {
        let slots: Vec<ConversationHandle> = self.chats.iter().map(|e| Arc::clone(e.value())).collect();
        let mut summaries = Vec::with_capacity(slots.len());
        for slot in slots {
            summaries.push(slot.state().await.summary());
        }
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }

    pub async fn detail(&self, chat_id: &str) -> Result<ConversationDetail, SeatbotError> {
        let slot = self.require(chat_id)?;
        let detail = slot.state().await.detail();
        Ok(detail)
    }

    /// Human takeover toggle for one chat.
    pub async fn set_paused(&self, chat_id: &str, paused: bool) -> Result<ConversationSummary, SeatbotError> {
        let slot = self.require(chat_id)?;
        let mut conversation = slot.state().await;
        conversation.paused = paused;
        info!(chat_id, paused, "conversation pause toggled");
        Ok(conversation.summary())
    }

    /// Resets the unread counter when an operator opens the chat.
    pub async fn mark_read(&self, chat_id: &str) -> Result<(), SeatbotError> {
        let slot = self.require(chat_id)?;
        slot.state().await.unread_count = 0;
        Ok(())
    }

    /// Removes unpaused conversations idle longer than the configured age.
    /// Chats with a message in flight are left for the next sweep.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.chats.len();
        self.chats.retain(|_, slot| {
            if slot.in_flight() {
                return true;
            }
            match slot.state.try_lock() {
                Ok(conversation) => conversation.paused || now - conversation.last_activity <= self.max_idle,
                Err(_) => true,
            }
        });
        let removed = before.saturating_sub(self.chats.len());
        if removed > 0 {
            info!(removed, remaining = self.chats.len(), "swept idle conversations");
        }
        removed
    }

    fn require(&self, chat_id: &str) -> Result<ConversationHandle, SeatbotError> {
        self.get(chat_id)
            .ok_or_else(|| SeatbotError::conversation_not_found(chat_id))
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERSATION_CAPACITY, Duration::hours(24))
    }
}
