// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-triggered skill for delegation tests.

use async_trait::async_trait;

use seatbot_core::{SeatbotError, Skill, SkillOutcome};

enum Behavior {
    Respond(String),
    Decline,
    Fail,
}

/// Accepts messages containing `trigger` and answers per its behavior.
pub struct MockSkill {
    name: String,
    trigger: String,
    behavior: Behavior,
}

impl MockSkill {
    /// A skill that accepts but declines until given a behavior.
    pub fn new(name: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trigger: trigger.into(),
            behavior: Behavior::Decline,
        }
    }

    pub fn responding(mut self, response: impl Into<String>) -> Self {
        self.behavior = Behavior::Respond(response.into());
        self
    }

    pub fn declining(mut self) -> Self {
        self.behavior = Behavior::Decline;
        self
    }

    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }
}

#[async_trait]
impl Skill for MockSkill {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, text: &str) -> bool {
        text.contains(&self.trigger)
    }

    async fn handle(&self, _text: &str) -> Result<SkillOutcome, SeatbotError> {
        match &self.behavior {
            Behavior::Respond(response) => Ok(SkillOutcome::handled(response.clone())),
            Behavior::Decline => Ok(SkillOutcome::declined()),
            Behavior::Fail => Err(SeatbotError::Internal(format!("skill {} failed", self.name))),
        }
    }
}
