// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for Seatbot.
//!
//! Serves the bearer-protected admin API under `/v1`, an unauthenticated
//! `/health` probe and, when a WhatsApp channel is configured, the Cloud API
//! webhook.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webhook;

pub use auth::AuthConfig;
pub use handlers::{ApiError, ErrorResponse};
pub use server::{GatewayState, ServerConfig, build_router, start_server};
