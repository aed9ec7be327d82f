// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Seatbot sales bot.

use thiserror::Error;

/// The primary error type used across all Seatbot adapter traits and core operations.
#[derive(Debug, Error)]
pub enum SeatbotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Tenant store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging transport errors (connection dropped, send rejected, bad payload).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Language model provider errors (API failure, blocked output, empty candidate).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An admin-facing lookup referenced an identifier that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A caller-supplied value was rejected (empty text, missing interval).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SeatbotError {
    /// Shorthand for a [`SeatbotError::NotFound`] on a missing order.
    pub fn order_not_found(id: u64) -> Self {
        Self::NotFound {
            kind: "order",
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`SeatbotError::NotFound`] on a missing conversation.
    pub fn conversation_not_found(chat_id: &str) -> Self {
        Self::NotFound {
            kind: "conversation",
            id: chat_id.to_string(),
        }
    }

    /// Shorthand for a [`SeatbotError::NotFound`] on a missing scheduled message.
    pub fn schedule_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "scheduled message",
            id: id.to_string(),
        }
    }

    /// Returns true for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
