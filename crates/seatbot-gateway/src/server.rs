// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use seatbot_bot::{BotState, ResponseOrchestrator};
use seatbot_core::SeatbotError;
use seatbot_whatsapp::WebhookIngress;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::{handlers, webhook};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Reply pipeline; also owns the bot state the admin routes read.
    pub orchestrator: Arc<ResponseOrchestrator>,
}

impl GatewayState {
    pub fn new(orchestrator: Arc<ResponseOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn bot(&self) -> &Arc<BotState> {
        self.orchestrator.state()
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from seatbot-config).
#[derive(Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Bearer token for `/v1/*` (None = auth disabled).
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Builds the full router.
///
/// - `GET /health` (public)
/// - `/v1/*` admin routes (bearer auth when a token is configured)
/// - `GET|POST /webhook/whatsapp` when `whatsapp` is given
pub fn build_router(
    state: GatewayState,
    auth: AuthConfig,
    whatsapp: Option<WebhookIngress>,
) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .with_state(state.clone());

    let mut api_routes = Router::new()
        .route("/v1/conversations", get(handlers::list_conversations))
        .route("/v1/conversations/{chat_id}", get(handlers::get_conversation))
        .route(
            "/v1/conversations/{chat_id}/reply",
            post(handlers::post_conversation_reply),
        )
        .route(
            "/v1/conversations/{chat_id}/pause",
            post(handlers::post_conversation_pause),
        )
        .route("/v1/orders", get(handlers::list_orders))
        .route(
            "/v1/orders/{id}",
            axum::routing::patch(handlers::patch_order).delete(handlers::delete_order),
        )
        .route(
            "/v1/bot/pause",
            get(handlers::get_bot_pause).post(handlers::post_bot_pause),
        )
        .route(
            "/v1/schedules",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route(
            "/v1/schedules/{id}",
            axum::routing::delete(handlers::delete_schedule),
        )
        .route("/v1/sync", post(handlers::post_sync))
        .route("/v1/chat", post(handlers::post_chat));

    if auth.is_enabled() {
        api_routes = api_routes.route_layer(axum_middleware::from_fn_with_state(
            auth,
            auth_middleware,
        ));
    } else {
        tracing::warn!("gateway.bearer_token not set -- admin API is unauthenticated");
    }
    let api_routes = api_routes.with_state(state);

    let mut app = Router::new().merge(public_routes).merge(api_routes);

    if let Some(ingress) = whatsapp {
        let webhook_routes = Router::new()
            .route(
                "/webhook/whatsapp",
                get(webhook::verify).post(webhook::receive),
            )
            .with_state(ingress);
        app = app.merge(webhook_routes);
    }

    app.layer(CorsLayer::permissive())
}

/// Binds and serves `router` until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    router: Router,
    cancel: CancellationToken,
) -> Result<(), SeatbotError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SeatbotError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| SeatbotError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
