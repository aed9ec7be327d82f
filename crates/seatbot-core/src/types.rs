// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Seatbot core.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sampling temperature used for every chat generation.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Nucleus sampling cutoff used for every chat generation.
pub const DEFAULT_TOP_P: f32 = 0.92;

/// Top-k sampling cutoff used for every chat generation.
pub const DEFAULT_TOP_K: u32 = 40;

/// Unique identifier for a message accepted by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Store,
    Skill,
}

// --- Tenant configuration ---

/// Which kinds of chats the bot answers automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotSettings {
    /// Answer messages posted in group chats.
    pub respond_groups: bool,
    /// Answer contacts saved in the address book.
    pub respond_saved: bool,
    /// Answer numbers that are not saved contacts.
    pub respond_unsaved: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            respond_groups: false,
            respond_saved: true,
            respond_unsaved: true,
        }
    }
}

/// A tenant's bot configuration document.
///
/// A tenant that never saved a configuration is represented by
/// [`TenantConfig::default`], which keeps the bot enabled with empty texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantConfig {
    pub enabled: bool,
    pub business_name: String,
    pub schedule: String,
    pub personality: String,
    pub context_text: String,
    pub fallback_message: String,
    pub max_tokens: Option<u32>,
    #[serde(rename = "botSettings")]
    pub settings: BotSettings,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            business_name: String::new(),
            schedule: String::new(),
            personality: String::new(),
            context_text: String::new(),
            fallback_message: String::new(),
            max_tokens: None,
            settings: BotSettings::default(),
        }
    }
}

// --- Inventory ---

/// A shared streaming account as stored by the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub platform: String,
    pub total_seats: i64,
}

/// A client occupying one seat on a platform until `subscription_end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub platform: String,
    #[serde(default)]
    pub subscription_end: Option<DateTime<Utc>>,
}

/// Seat availability for one platform.
///
/// `occupied_seats` may exceed `total_seats` when client records outlive
/// their account; [`InventoryEntry::available_seats`] clamps at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub platform: String,
    pub total_seats: i64,
    pub occupied_seats: i64,
}

impl InventoryEntry {
    /// Seats that can still be sold, never negative.
    pub fn available_seats(&self) -> i64 {
        (self.total_seats - self.occupied_seats).max(0)
    }

    /// True when no seat is left on this platform.
    pub fn is_sold_out(&self) -> bool {
        self.available_seats() == 0
    }
}

/// Folds account and client records into per-platform inventory entries.
///
/// Clients whose subscription ends after `now` occupy one seat each. A client
/// referencing a platform without accounts still yields an entry (with zero
/// total seats) so the platform renders as sold out rather than vanishing.
/// Entries are ordered by platform name.
pub fn compute_inventory(
    accounts: &[AccountRecord],
    clients: &[ClientRecord],
    now: DateTime<Utc>,
) -> Vec<InventoryEntry> {
    let mut by_platform: BTreeMap<&str, InventoryEntry> = BTreeMap::new();

    for account in accounts {
        let entry = by_platform
            .entry(account.platform.as_str())
            .or_insert_with(|| InventoryEntry {
                platform: account.platform.clone(),
                total_seats: 0,
                occupied_seats: 0,
            });
        entry.total_seats += account.total_seats;
    }

    for client in clients {
        let active = client.subscription_end.is_some_and(|end| end > now);
        if !active {
            continue;
        }
        let entry = by_platform
            .entry(client.platform.as_str())
            .or_insert_with(|| InventoryEntry {
                platform: client.platform.clone(),
                total_seats: 0,
                occupied_seats: 0,
            });
        entry.occupied_seats += 1;
    }

    by_platform.into_values().collect()
}

// --- Conversation, order and schedule records ---

/// Who authored a stored chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The customer on the other end of the chat.
    Customer,
    /// An automatic reply (model, skill, fallback or scheduled message).
    Bot,
    /// A manual reply typed by a human operator.
    Agent,
}

/// One message in a conversation's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub from: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Fulfilment state of an order. Unrecognized states are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Completed,
    Other(String),
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Completed => f.write_str("completed"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// A sale captured from a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Ledger-assigned id, never reused.
    pub id: u64,
    pub platform: String,
    pub customer_name: String,
    pub phone_number: String,
    /// Always at least 1.
    pub quantity: u32,
    pub status: OrderStatus,
    pub source_chat_id: String,
    pub created_at: DateTime<Utc>,
}

/// A message queued for later (optionally repeated) delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMessage {
    pub id: String,
    pub chat_id: String,
    pub text: String,
    pub next_run_at: DateTime<Utc>,
    pub recurring: bool,
    /// Repeat interval for recurring messages; ignored otherwise.
    pub interval_ms: u64,
    pub active: bool,
    pub send_count: u32,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Channel types ---

/// An inbound message event received from a messaging transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Transport-assigned message id.
    pub id: String,
    /// Chat identity (`<phone>@s.whatsapp.net`, `<id>@g.us`, `status@broadcast`).
    pub chat_id: String,
    /// True when the message was sent by the bot's own account.
    pub from_me: bool,
    /// Profile or address-book name supplied by the transport, if any.
    pub push_name: Option<String>,
    /// Text body; empty for media-only messages.
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// An outbound text message to deliver through a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub text: String,
}

/// Chat presence states a transport can display to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Presence {
    Composing,
    Paused,
}

// --- Provider types ---

/// Author of a turn sent to the language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One conversation turn in a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// A text generation request for a language model provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    /// Alternating turns, starting with a user turn.
    pub turns: Vec<ConversationTurn>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl GenerationRequest {
    /// Builds a request with the bot's fixed sampling parameters.
    pub fn new(system_prompt: String, turns: Vec<ConversationTurn>, max_tokens: u32) -> Self {
        Self {
            system_prompt,
            turns,
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
        }
    }
}

// --- Skill types ---

/// Result of offering a message to a skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillOutcome {
    /// The skill answered the message; the language model is not consulted.
    pub handled: bool,
    /// Reply text, meaningful only when `handled` is true.
    pub response: String,
}

impl SkillOutcome {
    pub fn handled(response: impl Into<String>) -> Self {
        Self {
            handled: true,
            response: response.into(),
        }
    }

    pub fn declined() -> Self {
        Self {
            handled: false,
            response: String::new(),
        }
    }
}
