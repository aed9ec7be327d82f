// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Seatbot sales bot.
//!
//! This crate provides the error type, the domain types shared across crate
//! boundaries, and the adapter traits for the bot's external collaborators:
//! the messaging transport, the language model, the tenant store, and skills.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SeatbotError;
pub use types::{
    AccountRecord, AdapterType, BotSettings, ChatMessage, ClientRecord, ConversationTurn,
    GenerationRequest, HealthStatus, InboundMessage, InventoryEntry, MessageId, Order,
    OrderStatus, OutboundMessage, Presence, ScheduledMessage, SkillOutcome, Speaker,
    TenantConfig, TurnRole, compute_inventory,
};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, PluginAdapter, ProviderAdapter, Skill, TenantStore};
