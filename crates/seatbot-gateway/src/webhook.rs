// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API webhook routes.
//!
//! `GET` answers Meta's subscription handshake, `POST` receives deliveries.
//! Both are unauthenticated; deliveries are checked against
//! `X-Hub-Signature-256` when an app secret is configured.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use seatbot_whatsapp::{Verification, WebhookIngress};

/// Query parameters of the subscription handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhook/whatsapp
pub async fn verify(
    State(ingress): State<WebhookIngress>,
    Query(params): Query<VerifyQuery>,
) -> Response {
    match ingress.verify_subscription(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
    ) {
        Verification::Accepted(challenge) => {
            tracing::info!("WhatsApp webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        Verification::Rejected => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
    }
}

/// POST /webhook/whatsapp
pub async fn receive(
    State(ingress): State<WebhookIngress>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok());
    if !ingress.signature_ok(&body, signature) {
        tracing::warn!("WhatsApp webhook signature rejected");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "invalid signature"})),
        )
            .into_response();
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "WhatsApp webhook body is not JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "invalid JSON payload"})),
            )
                .into_response();
        }
    };

    match ingress.ingest(&payload).await {
        Ok(queued) => {
            if queued > 0 {
                tracing::debug!(queued, "WhatsApp messages queued");
            }
            (StatusCode::OK, Json(serde_json::json!({"status": "ok", "queued": queued})))
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to queue WhatsApp delivery");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}
