// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging transport (WhatsApp).

use async_trait::async_trait;

use crate::error::SeatbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundMessage, Presence};

/// Adapter for the bidirectional messaging transport.
///
/// Inbound message events come out of [`receive`](ChannelAdapter::receive);
/// replies, presence updates and read receipts go back in.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), SeatbotError>;

    /// Receives the next inbound message event.
    async fn receive(&self) -> Result<InboundMessage, SeatbotError>;

    /// Sends a text message to a chat.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, SeatbotError>;

    /// Updates the typing indicator shown in a chat.
    async fn set_presence(&self, chat_id: &str, presence: Presence) -> Result<(), SeatbotError>;

    /// Marks the chat's pending inbound messages as read.
    async fn mark_read(&self, chat_id: &str) -> Result<(), SeatbotError>;
}
