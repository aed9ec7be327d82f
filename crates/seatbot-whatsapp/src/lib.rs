// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel adapter for Seatbot.
//!
//! Inbound messages arrive through the gateway's webhook route and are fed in
//! via [`WebhookIngress`]; replies, read receipts and typing indicators go out
//! through the Graph API `messages` endpoint.

pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use seatbot_config::model::WhatsAppConfig;
use seatbot_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundMessage, MessageId, OutboundMessage,
    PluginAdapter, Presence, SeatbotError,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub use webhook::{Verification, WebhookIngress, chat_id_for, parse_webhook_payload};

/// WhatsApp Cloud API channel implementing [`ChannelAdapter`].
pub struct WhatsAppChannel {
    client: reqwest::Client,
    access_token: String,
    messages_url: String,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    ingress: WebhookIngress,
    /// Latest inbound message id per chat, the target of read receipts.
    last_inbound: Arc<DashMap<String, String>>,
}

impl WhatsAppChannel {
    /// Creates the adapter. Requires `access_token` and `phone_number_id`.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, SeatbotError> {
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SeatbotError::Config("whatsapp.access_token is required".into()))?;
        let phone_number_id = config
            .phone_number_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| SeatbotError::Config("whatsapp.phone_number_id is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SeatbotError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let (tx, rx) = mpsc::channel(100);
        let last_inbound = Arc::new(DashMap::new());
        let ingress = WebhookIngress::new(
            config.verify_token.clone(),
            config.app_secret.clone(),
            tx,
            last_inbound.clone(),
        );

        Ok(Self {
            client,
            access_token,
            messages_url: format!(
                "{}/{}/{}/messages",
                config.base_url.trim_end_matches('/'),
                config.api_version,
                phone_number_id
            ),
            inbound_rx: tokio::sync::Mutex::new(rx),
            ingress,
            last_inbound,
        })
    }

    /// Handle for the webhook route.
    pub fn ingress(&self) -> WebhookIngress {
        self.ingress.clone()
    }

    async fn post(&self, body: serde_json::Value) -> Result<serde_json::Value, SeatbotError> {
        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SeatbotError::Channel {
                message: format!("WhatsApp request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            error!(status = %status, "WhatsApp API rejected request");
            return Err(SeatbotError::Channel {
                message: format!("WhatsApp API returned {status}: {text}"),
                source: None,
            });
        }
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::Null))
    }
}

/// Cloud API recipient: the phone part of a chat id, without a leading `+`.
fn recipient(chat_id: &str) -> &str {
    chat_id
        .split('@')
        .next()
        .unwrap_or(chat_id)
        .trim_start_matches('+')
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
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
        self.inbound_rx.lock().await.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    async fn connect(&mut self) -> Result<(), SeatbotError> {
        // Webhook mode: nothing to dial, deliveries arrive through the gateway.
        info!(url = %self.messages_url, "WhatsApp channel ready (webhook mode)");
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, SeatbotError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| SeatbotError::Channel {
            message: "WhatsApp inbound channel closed".into(),
            source: None,
        })
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, SeatbotError> {
        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": recipient(&msg.chat_id),
            "type": "text",
            "text": {"preview_url": false, "body": msg.text},
        });
        let response = self.post(body).await?;
        let id = response
            .pointer("/messages/0/id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        debug!(chat_id = %msg.chat_id, message_id = %id, "WhatsApp message sent");
        Ok(MessageId(id))
    }

    async fn set_presence(&self, chat_id: &str, presence: Presence) -> Result<(), SeatbotError> {
        // The Cloud API only exposes a typing indicator tied to an inbound
        // message; it clears itself when the reply lands.
        if presence != Presence::Composing {
            return Ok(());
        }
        let Some(message_id) = self.last_inbound.get(chat_id).map(|id| id.clone()) else {
            return Ok(());
        };
        self.post(serde_json::json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
            "typing_indicator": {"type": "text"},
        }))
        .await
        .map(|_| ())
    }

    async fn mark_read(&self, chat_id: &str) -> Result<(), SeatbotError> {
        let Some(message_id) = self.last_inbound.get(chat_id).map(|id| id.clone()) else {
            return Ok(());
        };
        self.post(serde_json::json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
        }))
        .await
        .map(|_| ())
    }
}
