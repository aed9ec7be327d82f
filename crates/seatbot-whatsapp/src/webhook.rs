// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingress: subscription handshake, signature check and payload parsing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use seatbot_core::{InboundMessage, SeatbotError};
use sha2::Sha256;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Suffix the core uses to recognize one-to-one chats.
pub const USER_CHAT_SUFFIX: &str = "@s.whatsapp.net";

/// Builds the chat id for a Cloud API phone number.
pub fn chat_id_for(phone: &str) -> String {
    format!("{}{USER_CHAT_SUFFIX}", phone.trim_start_matches('+'))
}

/// Verifies an `X-Hub-Signature-256` header (`sha256=<hex>`) over the raw body.
pub fn verify_signature(app_secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Extracts text messages from a Cloud API webhook payload.
///
/// Status updates and media without a caption are skipped. The sender's
/// profile name comes from the sibling `contacts` array.
pub fn parse_webhook_payload(payload: &serde_json::Value) -> Vec<InboundMessage> {
    let mut messages = Vec::new();

    let Some(entries) = payload.get("entry").and_then(|e| e.as_array()) else {
        return messages;
    };

    for change in entries
        .iter()
        .filter_map(|entry| entry.get("changes").and_then(|c| c.as_array()))
        .flatten()
    {
        let Some(value) = change.get("value") else {
            continue;
        };
        let Some(msgs) = value.get("messages").and_then(|m| m.as_array()) else {
            continue;
        };
        let contacts = value.get("contacts").and_then(|c| c.as_array());

        for msg in msgs {
            let Some(from) = msg.get("from").and_then(|f| f.as_str()) else {
                continue;
            };

            let text = message_text(msg);
            if text.is_none() {
                debug!(from, kind = ?msg.get("type"), "skipping non-text WhatsApp message");
            }

            let push_name = contacts
                .and_then(|list| {
                    list.iter()
                        .find(|c| c.get("wa_id").and_then(|w| w.as_str()) == Some(from))
                        .or_else(|| list.first())
                })
                .and_then(|c| c.pointer("/profile/name"))
                .and_then(|n| n.as_str())
                .map(str::to_string);

            let timestamp = msg
                .get("timestamp")
                .and_then(|t| t.as_str())
                .and_then(|t| t.parse::<i64>().ok())
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .unwrap_or_else(Utc::now);

            messages.push(InboundMessage {
                id: msg
                    .get("id")
                    .and_then(|i| i.as_str())
                    .unwrap_or_default()
                    .to_string(),
                chat_id: chat_id_for(from),
                from_me: false,
                push_name,
                text: text.unwrap_or_default(),
                timestamp,
            });
        }
    }

    messages
}

fn message_text(msg: &serde_json::Value) -> Option<String> {
    msg.pointer("/text/body")
        .or_else(|| msg.pointer("/image/caption"))
        .or_else(|| msg.pointer("/video/caption"))
        .or_else(|| msg.pointer("/button/text"))
        .or_else(|| msg.pointer("/interactive/button_reply/title"))
        .and_then(|b| b.as_str())
        .map(str::to_string)
}

/// Outcome of a webhook subscription handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Echo this challenge with 200.
    Accepted(String),
    /// Reply 403.
    Rejected,
}

/// Cloneable handle the HTTP layer uses to feed webhook deliveries in.
#[derive(Clone)]
pub struct WebhookIngress {
    verify_token: Option<String>,
    app_secret: Option<String>,
    tx: mpsc::Sender<InboundMessage>,
    last_inbound: Arc<DashMap<String, String>>,
}

impl WebhookIngress {
    pub(crate) fn new(
        verify_token: Option<String>,
        app_secret: Option<String>,
        tx: mpsc::Sender<InboundMessage>,
        last_inbound: Arc<DashMap<String, String>>,
    ) -> Self {
        Self {
            verify_token,
            app_secret,
            tx,
            last_inbound,
        }
    }

    /// Answers the `hub.mode=subscribe` handshake.
    pub fn verify_subscription(
        &self,
        mode: Option<&str>,
        token: Option<&str>,
        challenge: Option<&str>,
    ) -> Verification {
        match (&self.verify_token, mode, token, challenge) {
            (Some(expected), Some("subscribe"), Some(token), Some(challenge))
                if token == expected =>
            {
                Verification::Accepted(challenge.to_string())
            }
            _ => {
                warn!("WhatsApp webhook verification failed");
                Verification::Rejected
            }
        }
    }

    /// True when no app secret is configured or the signature matches.
    pub fn signature_ok(&self, body: &[u8], signature_header: Option<&str>) -> bool {
        match &self.app_secret {
            None => true,
            Some(secret) => signature_header.is_some_and(|h| verify_signature(secret, body, h)),
        }
    }

    /// Parses a delivery and queues every text message for the bot loop.
    ///
    /// Returns how many messages were queued.
    pub async fn ingest(&self, payload: &serde_json::Value) -> Result<usize, SeatbotError> {
        let messages = parse_webhook_payload(payload);
        let count = messages.len();
        for msg in messages {
            if !msg.id.is_empty() {
                self.last_inbound.insert(msg.chat_id.clone(), msg.id.clone());
            }
            self.tx.send(msg).await.map_err(|e| SeatbotError::Channel {
                message: "WhatsApp inbound queue closed".into(),
                source: Some(Box::new(e)),
            })?;
        }
        Ok(count)
    }
}
