// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Skill trait for non-LLM handlers that can intercept specific intents.

use async_trait::async_trait;

use crate::error::SeatbotError;
use crate::types::SkillOutcome;

/// A pluggable capability consulted before the language model.
///
/// The orchestrator offers each inbound text to registered skills in order;
/// the first skill that accepts it and reports the message as handled
/// supplies the reply.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Returns the skill's unique name.
    fn name(&self) -> &str;

    /// Cheap pre-check on the raw message text.
    fn can_handle(&self, text: &str) -> bool;

    /// Produces a reply for a message accepted by [`can_handle`](Skill::can_handle).
    async fn handle(&self, text: &str) -> Result<SkillOutcome, SeatbotError>;
}
