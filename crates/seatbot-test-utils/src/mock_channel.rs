// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and captured outbound messages, presence updates and read receipts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use seatbot_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundMessage, MessageId, OutboundMessage,
    PluginAdapter, Presence, SeatbotError,
};

/// A mock messaging channel for testing.
///
/// - **inbound**: messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured for `sent_messages()`
pub struct MockChannel {
    inbound: Mutex<VecDeque<InboundMessage>>,
    sent: Mutex<Vec<OutboundMessage>>,
    presence: Mutex<Vec<(String, Presence)>>,
    reads: Mutex<Vec<String>>,
    notify: Notify,
    fail_sends: AtomicBool,
    closed: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            presence: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
            notify: Notify::new(),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Queue an inbound message for the next `receive()`.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Make `receive()` fail once the queue is empty, as a dropped transport would.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Make every `send()` fail with a channel error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Presence updates in call order.
    pub async fn presence_log(&self) -> Vec<(String, Presence)> {
        self.presence.lock().await.clone()
    }

    /// Chats marked read, in call order.
    pub async fn read_receipts(&self) -> Vec<String> {
        self.reads.lock().await.clone()
    }

    /// Polls until at least `count` messages were sent or `timeout` passes,
    /// then returns everything sent so far.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<OutboundMessage> {
        let _ = tokio::time::timeout(timeout, async {
            while self.sent_count().await < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        self.sent_messages().await
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, SeatbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SeatbotError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), SeatbotError> {
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, SeatbotError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(SeatbotError::Channel {
                    message: "mock channel closed".into(),
                    source: None,
                });
            }
            self.notify.notified().await;
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, SeatbotError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SeatbotError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn set_presence(&self, chat_id: &str, presence: Presence) -> Result<(), SeatbotError> {
        self.presence.lock().await.push((chat_id.to_string(), presence));
        Ok(())
    }

    async fn mark_read(&self, chat_id: &str) -> Result<(), SeatbotError> {
        self.reads.lock().await.push(chat_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_inbound(text: &str) -> InboundMessage {
        InboundMessage {
            id: format!("test-{}", uuid::Uuid::new_v4()),
            chat_id: "5215550001@s.whatsapp.net".to_string(),
            from_me: false,
            push_name: Some("Ana".to_string()),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn receive_returns_injected_messages() {
        let channel = MockChannel::new();
        channel.inject_message(make_inbound("hola")).await;
        let received = channel.receive().await.unwrap();
        assert_eq!(received.text, "hola");
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let msg_id = channel
            .send(OutboundMessage {
                chat_id: "1@s.whatsapp.net".into(),
                text: "respuesta".into(),
            })
            .await
            .unwrap();
        assert!(msg_id.0.starts_with("mock-msg-"));
        assert_eq!(channel.sent_messages().await[0].text, "respuesta");
    }

    #[tokio::test]
    async fn failing_sends_capture_nothing() {
        let channel = MockChannel::new();
        channel.fail_sends(true);
        let result = channel
            .send(OutboundMessage {
                chat_id: "1@s.whatsapp.net".into(),
                text: "x".into(),
            })
            .await;
        assert!(result.is_err());
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn closed_channel_drains_then_errors() {
        let channel = MockChannel::new();
        channel.inject_message(make_inbound("última")).await;
        channel.close();
        assert_eq!(channel.receive().await.unwrap().text, "última");
        assert!(channel.receive().await.is_err());
    }

    #[tokio::test]
    async fn records_presence_and_reads() {
        let channel = MockChannel::new();
        channel.mark_read("1@s.whatsapp.net").await.unwrap();
        channel.set_presence("1@s.whatsapp.net", Presence::Composing).await.unwrap();
        assert_eq!(channel.read_receipts().await, ["1@s.whatsapp.net"]);
        assert_eq!(channel.presence_log().await[0].1, Presence::Composing);
    }
}
