// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the hosted language model.

use async_trait::async_trait;

use crate::error::SeatbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GenerationRequest;

/// Adapter for a hosted text-generation API.
///
/// The bot treats the model as an opaque function from a system prompt and
/// conversation turns to reply text.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Generates the next assistant reply.
    async fn generate(&self, request: GenerationRequest) -> Result<String, SeatbotError>;
}
