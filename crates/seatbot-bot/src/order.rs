// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order tag detection in model replies.
//!
//! The prompt instructs the model to append, once a sale is confirmed:
//!
//! ```text
//! [PEDIDO_CONFIRMADO]{"plataforma":"Netflix","nombre":"Ana","telefono":"5551234567","cantidad":2}
//! ```
//!
//! The tag never reaches the customer. Only the first tag in a reply records
//! an order; every occurrence is removed from the text.

use std::sync::Arc;

use seatbot_core::Order;
use serde_json::{Map, Value};
use tracing::warn;

use crate::ledger::{OrderDraft, OrderLedger};

/// Literal marker preceding the order JSON.
pub const ORDER_MARKER: &str = "[PEDIDO_CONFIRMADO]";

/// Chat facts used to fill fields the model left out.
#[derive(Debug, Clone, Copy)]
pub struct OrderOrigin<'a> {
    pub chat_id: &'a str,
    pub phone: &'a str,
    pub display_name: &'a str,
}

/// Result of scanning one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub order: Option<Order>,
    pub cleaned_text: String,
}

enum TagPayload {
    Parsed(Map<String, Value>),
    Malformed(String),
}

/// Records orders announced by the model into the shared ledger.
pub struct OrderExtractor {
    ledger: Arc<OrderLedger>,
}

impl OrderExtractor {
    pub fn new(ledger: Arc<OrderLedger>) -> Self {
        Self { ledger }
    }

    /// Strips every order tag from `reply` and records the first one, if valid.
    pub async fn extract(&self, reply: &str, origin: OrderOrigin<'_>) -> Extraction {
        let (cleaned_text, payload) = scan_tags(reply);

        let draft = match payload {
            Some(TagPayload::Parsed(fields)) => draft_from_fields(&fields, origin),
            Some(TagPayload::Malformed(raw)) => {
                warn!(chat_id = origin.chat_id, raw = %raw, "malformed order tag ignored");
                None
            }
            None => None,
        };

        let order = match draft {
            Some(draft) => Some(self.ledger.record(draft).await),
            None => None,
        };

        Extraction {
            order,
            cleaned_text,
        }
    }
}

/// Removes order tags without recording anything.
///
/// Text without the marker is returned unchanged.
pub fn strip_order_tags(reply: &str) -> String {
    scan_tags(reply).0
}

fn scan_tags(reply: &str) -> (String, Option<TagPayload>) {
    if !reply.contains(ORDER_MARKER) {
        return (reply.to_string(), None);
    }

    let mut cleaned = String::with_capacity(reply.len());
    let mut first: Option<TagPayload> = None;
    let mut rest = reply;

    while let Some(pos) = rest.find(ORDER_MARKER) {
        cleaned.push_str(&rest[..pos]);
        let after_marker = &rest[pos + ORDER_MARKER.len()..];
        let (payload, consumed) = parse_payload(after_marker);
        if first.is_none() {
            first = Some(payload);
        }
        rest = &after_marker[consumed..];
    }
    cleaned.push_str(rest);

    (cleaned.trim().to_string(), first)
}

/// Parses the JSON object following a marker and returns how many bytes of
/// `input` belong to the tag.
fn parse_payload(input: &str) -> (TagPayload, usize) {
    let skipped = input.len() - input.trim_start().len();
    let json_start = &input[skipped..];

    if json_start.starts_with('{') {
        let mut stream = serde_json::Deserializer::from_str(json_start).into_iter::<Value>();
        if let Some(Ok(Value::Object(fields))) = stream.next() {
            return (TagPayload::Parsed(fields), skipped + stream.byte_offset());
        }
    }

    let line_end = input.find('\n').unwrap_or(input.len());
    (
        TagPayload::Malformed(input[..line_end].trim().to_string()),
        line_end,
    )
}

fn draft_from_fields(fields: &Map<String, Value>, origin: OrderOrigin<'_>) -> Option<OrderDraft> {
    let Some(platform) = fields.get("plataforma").and_then(text_value) else {
        warn!(chat_id = origin.chat_id, "order tag without platform ignored");
        return None;
    };

    Some(OrderDraft {
        platform,
        customer_name: fields
            .get("nombre")
            .and_then(text_value)
            .unwrap_or_else(|| origin.display_name.to_string()),
        phone_number: fields
            .get("telefono")
            .and_then(text_value)
            .unwrap_or_else(|| origin.phone.to_string()),
        quantity: fields.get("cantidad").map_or(1, quantity_value),
        source_chat_id: origin.chat_id.to_string(),
    })
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn quantity_value(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(|q| q.clamp(1, i64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbot_core::OrderStatus;

    const ORIGIN: OrderOrigin<'static> = OrderOrigin {
        chat_id: "5219990001111@s.whatsapp.net",
        phone: "5219990001111",
        display_name: "Cliente Uno",
    };

    fn extractor() -> (OrderExtractor, Arc<OrderLedger>) {
        let ledger = Arc::new(OrderLedger::default());
        (OrderExtractor::new(ledger.clone()), ledger)
    }

    #[tokio::test]
    async fn well_formed_tag_records_order() {
        let (extractor, ledger) = extractor();
        let reply = "¡Listo Ana! Un asesor te contactará para el pago.\n[PEDIDO_CONFIRMADO]{\"plataforma\":\"Netflix\",\"nombre\":\"Ana\",\"telefono\":\"5551234567\",\"cantidad\":2}";

        let result = extractor.extract(reply, ORIGIN).await;
        let order = result.order.expect("order recorded");
        assert_eq!(order.platform, "Netflix");
        assert_eq!(order.customer_name, "Ana");
        assert_eq!(order.phone_number, "5551234567");
        assert_eq!(order.quantity, 2);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.source_chat_id, ORIGIN.chat_id);
        assert!(!result.cleaned_text.contains(ORDER_MARKER));
        assert_eq!(
            result.cleaned_text,
            "¡Listo Ana! Un asesor te contactará para el pago."
        );
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn missing_fields_default_from_chat() {
        let (extractor, _) = extractor();
        let reply = "Perfecto [PEDIDO_CONFIRMADO] {\"plataforma\":\"Max\"}";
        let order = extractor.extract(reply, ORIGIN).await.order.unwrap();
        assert_eq!(order.customer_name, "Cliente Uno");
        assert_eq!(order.phone_number, "5219990001111");
        assert_eq!(order.quantity, 1);
    }

    #[tokio::test]
    async fn numeric_and_string_values_accepted() {
        let (extractor, _) = extractor();
        let reply =
            "[PEDIDO_CONFIRMADO]{\"plataforma\":\"Disney+\",\"telefono\":5551234567,\"cantidad\":\"3\"}";
        let order = extractor.extract(reply, ORIGIN).await.order.unwrap();
        assert_eq!(order.phone_number, "5551234567");
        assert_eq!(order.quantity, 3);

        let (extractor, _) = self::extractor();
        let reply = "[PEDIDO_CONFIRMADO]{\"plataforma\":\"Disney+\",\"cantidad\":0}";
        assert_eq!(extractor.extract(reply, ORIGIN).await.order.unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn malformed_json_is_stripped_without_order() {
        let (extractor, ledger) = extractor();
        let reply = "Gracias!\n[PEDIDO_CONFIRMADO]{\"plataforma\": \"Netflix\", nombre}\nTe escribimos pronto.";
        let result = extractor.extract(reply, ORIGIN).await;
        assert!(result.order.is_none());
        assert_eq!(result.cleaned_text, "Gracias!\n\nTe escribimos pronto.");
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn only_first_tag_records_but_all_are_stripped() {
        let (extractor, ledger) = extractor();
        let reply = "A [PEDIDO_CONFIRMADO]{\"plataforma\":\"Netflix\"} B [PEDIDO_CONFIRMADO]{\"plataforma\":\"Max\"}";
        let result = extractor.extract(reply, ORIGIN).await;
        assert_eq!(result.order.unwrap().platform, "Netflix");
        assert_eq!(result.cleaned_text, "A  B");
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn tag_without_platform_records_nothing() {
        let (extractor, ledger) = extractor();
        let reply = "Ok [PEDIDO_CONFIRMADO]{\"nombre\":\"Ana\"}";
        let result = extractor.extract(reply, ORIGIN).await;
        assert!(result.order.is_none());
        assert_eq!(result.cleaned_text, "Ok");
        assert!(ledger.is_empty().await);
    }

    #[test]
    fn stripping_untagged_text_is_identity() {
        let text = "  Hola, ¿qué plataforma te interesa?\n";
        assert_eq!(strip_order_tags(text), text);
    }

    #[test]
    fn stripping_tagged_text_removes_marker() {
        let text = "Listo [PEDIDO_CONFIRMADO]{\"plataforma\":\"Netflix\"}";
        assert_eq!(strip_order_tags(text), "Listo");
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn untagged_text_is_returned_unchanged(text in "[^\\[]{0,200}") {
                prop_assert_eq!(strip_order_tags(&text), text);
            }

            #[test]
            fn marker_never_survives(prefix in "[a-z ]{0,40}", suffix in "[a-z {}\":]{0,40}") {
                let reply = format!("{prefix}{ORDER_MARKER}{suffix}");
                prop_assert!(!strip_order_tags(&reply).contains(ORDER_MARKER));
            }
        }
    }
}
