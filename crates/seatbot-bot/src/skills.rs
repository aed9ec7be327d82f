// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable skills consulted before the language model.

use std::sync::Arc;

use seatbot_core::{SeatbotError, Skill};
use tracing::debug;

/// Ordered list of skills; the first one that handles a message wins.
#[derive(Default, Clone)]
pub struct SkillRegistry {
    skills: Vec<Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        debug!(skill = skill.name(), "skill registered");
        self.skills.push(skill);
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Offers `text` to each accepting skill in registration order.
    ///
    /// Returns the first handled response, `None` when every skill declined.
    /// A skill error aborts the lookup.
    pub async fn try_handle(&self, text: &str) -> Result<Option<String>, SeatbotError> {
        for skill in &self.skills {
            if !skill.can_handle(text) {
                continue;
            }
            let outcome = skill.handle(text).await?;
            if outcome.handled {
                debug!(skill = skill.name(), "skill handled message");
                return Ok(Some(outcome.response));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbot_test_utils::MockSkill;

    #[tokio::test]
    async fn first_accepting_skill_wins() {
        let mut registry = SkillRegistry::new();
        registry.register(Arc::new(MockSkill::new("decline", "codigo").declining()));
        registry.register(Arc::new(MockSkill::new("answer", "codigo").responding("respuesta A")));
        registry.register(Arc::new(MockSkill::new("late", "codigo").responding("respuesta B")));

        let reply = registry.try_handle("revisa este codigo").await.unwrap();
        assert_eq!(reply.as_deref(), Some("respuesta A"));
    }

    #[tokio::test]
    async fn unmatched_text_falls_through() {
        let mut registry = SkillRegistry::new();
        registry.register(Arc::new(MockSkill::new("answer", "codigo").responding("x")));
        assert_eq!(registry.try_handle("hola").await.unwrap(), None);
        assert_eq!(SkillRegistry::new().try_handle("hola").await.unwrap(), None);
    }

    #[tokio::test]
    async fn skill_error_propagates() {
        let mut registry = SkillRegistry::new();
        registry.register(Arc::new(MockSkill::new("broken", "codigo").failing()));
        assert!(registry.try_handle("codigo").await.is_err());
    }
}
