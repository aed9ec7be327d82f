// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the admin REST API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seatbot_bot::{ConversationDetail, ConversationSummary};
use seatbot_core::{
    AccountRecord, ChatMessage, ClientRecord, ConversationTurn, InventoryEntry, Order,
    OrderStatus, ScheduledMessage, SeatbotError, TenantConfig, compute_inventory,
};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Maps core errors onto HTTP statuses with an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub SeatbotError);

impl From<SeatbotError> for ApiError {
    fn from(err: SeatbotError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SeatbotError::NotFound { .. } => StatusCode::NOT_FOUND,
            SeatbotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SeatbotError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            SeatbotError::Channel { .. } | SeatbotError::Provider { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "admin request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// --- Health ---

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
    /// Messages delivered since start.
    pub sent: u64,
    pub paused: bool,
    pub conversations: usize,
}

/// GET /health (unauthenticated).
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let bot = state.bot();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: bot.uptime().as_secs(),
        started_at: bot.started_at(),
        sent: bot.sent_count(),
        paused: bot.is_globally_paused(),
        conversations: bot.conversations.len(),
    })
}

// --- Conversations ---

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
}

/// GET /v1/conversations
pub async fn list_conversations(State(state): State<GatewayState>) -> Json<ConversationListResponse> {
    Json(ConversationListResponse {
        conversations: state.bot().conversations.list().await,
    })
}

/// GET /v1/conversations/{chat_id}
///
/// Opening a chat resets its unread counter.
pub async fn get_conversation(
    State(state): State<GatewayState>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<ConversationDetail>> {
    let conversations = &state.bot().conversations;
    conversations.mark_read(&chat_id).await?;
    Ok(Json(conversations.detail(&chat_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub text: String,
}

/// POST /v1/conversations/{chat_id}/reply
pub async fn post_conversation_reply(
    State(state): State<GatewayState>,
    Path(chat_id): Path<String>,
    Json(body): Json<ReplyRequest>,
) -> ApiResult<Json<ChatMessage>> {
    let message = state.orchestrator.send_agent_reply(&chat_id, &body.text).await?;
    Ok(Json(message))
}

#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub paused: bool,
}

/// POST /v1/conversations/{chat_id}/pause
pub async fn post_conversation_pause(
    State(state): State<GatewayState>,
    Path(chat_id): Path<String>,
    Json(body): Json<PauseRequest>,
) -> ApiResult<Json<ConversationSummary>> {
    let summary = state
        .bot()
        .conversations
        .set_paused(&chat_id, body.paused)
        .await?;
    Ok(Json(summary))
}

// --- Orders ---

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

/// GET /v1/orders
pub async fn list_orders(State(state): State<GatewayState>) -> Json<OrderListResponse> {
    Json(OrderListResponse {
        orders: state.bot().ledger.list().await,
    })
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

/// PATCH /v1/orders/{id}
pub async fn patch_order(
    State(state): State<GatewayState>,
    Path(id): Path<u64>,
    Json(body): Json<OrderStatusRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.bot().ledger.update_status(id, body.status).await?))
}

/// DELETE /v1/orders/{id}
pub async fn delete_order(
    State(state): State<GatewayState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.bot().ledger.remove(id).await?))
}

// --- Global pause ---

#[derive(Debug, Serialize)]
pub struct BotPauseResponse {
    pub paused: bool,
}

/// GET /v1/bot/pause
pub async fn get_bot_pause(State(state): State<GatewayState>) -> Json<BotPauseResponse> {
    Json(BotPauseResponse {
        paused: state.bot().is_globally_paused(),
    })
}

/// POST /v1/bot/pause
pub async fn post_bot_pause(
    State(state): State<GatewayState>,
    Json(body): Json<PauseRequest>,
) -> Json<BotPauseResponse> {
    state.bot().set_globally_paused(body.paused);
    Json(BotPauseResponse {
        paused: state.bot().is_globally_paused(),
    })
}

// --- Schedules ---

#[derive(Debug, Serialize)]
pub struct ScheduleListResponse {
    pub schedules: Vec<ScheduledMessage>,
}

/// GET /v1/schedules
pub async fn list_schedules(State(state): State<GatewayState>) -> Json<ScheduleListResponse> {
    Json(ScheduleListResponse {
        schedules: state.bot().schedules.list().await,
    })
}

/// Request body for POST /v1/schedules. A missing `runAt` means "now".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub chat_id: String,
    pub text: String,
    #[serde(default)]
    pub run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub interval_ms: u64,
}

/// POST /v1/schedules
pub async fn create_schedule(
    State(state): State<GatewayState>,
    Json(body): Json<CreateScheduleRequest>,
) -> ApiResult<(StatusCode, Json<ScheduledMessage>)> {
    let message = state
        .bot()
        .schedules
        .create(
            &body.chat_id,
            &body.text,
            body.run_at.unwrap_or_else(Utc::now),
            body.recurring,
            body.interval_ms,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// DELETE /v1/schedules/{id}
pub async fn delete_schedule(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.bot().schedules.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Inventory push ---

/// Request body for POST /v1/sync.
///
/// `inventory` wins when present; otherwise availability is computed from
/// `accounts` and `clients`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncRequest {
    pub config: Option<TenantConfig>,
    pub accounts: Vec<AccountRecord>,
    pub clients: Vec<ClientRecord>,
    pub inventory: Option<Vec<InventoryEntry>>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub inventory: Vec<InventoryEntry>,
    pub config_updated: bool,
}

/// POST /v1/sync
pub async fn post_sync(
    State(state): State<GatewayState>,
    Json(body): Json<SyncRequest>,
) -> Json<SyncResponse> {
    let inventory = body
        .inventory
        .unwrap_or_else(|| compute_inventory(&body.accounts, &body.clients, Utc::now()));
    let config_updated = body.config.is_some();
    state
        .bot()
        .push_inventory_sync(body.config, inventory.clone())
        .await;
    Json(SyncResponse {
        inventory,
        config_updated,
    })
}

// --- Stateless chat ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /v1/chat
pub async fn post_chat(
    State(state): State<GatewayState>,
    Json(body): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let reply = state
        .orchestrator
        .generate_stateless(&body.message, &body.history)
        .await?;
    Ok(Json(ChatResponse { reply }))
}
