// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the bot state and orchestrator with mock adapters
//! and zero reply delay. Provides `send_message()` to drive the full reply
//! pipeline in tests.

use std::sync::Arc;

use chrono::Utc;
use seatbot_bot::{BotState, Disposition, ResponseOrchestrator, SkillRegistry};
use seatbot_config::model::BotConfig;
use seatbot_core::{InboundMessage, InventoryEntry, Skill, TenantConfig, TenantStore};

use crate::mock_channel::MockChannel;
use crate::mock_provider::MockProvider;
use crate::mock_store::MockStore;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    bot: BotConfig,
    tenant_config: Option<TenantConfig>,
    inventory: Vec<InventoryEntry>,
    store: Option<Arc<MockStore>>,
    skills: SkillRegistry,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            bot: BotConfig {
                reply_delay_min_ms: 0,
                reply_delay_max_ms: 0,
                ..BotConfig::default()
            },
            tenant_config: None,
            inventory: Vec::new(),
            store: None,
            skills: SkillRegistry::new(),
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Override `[bot]` settings. Reply delay stays as given.
    pub fn with_bot_config(mut self, bot: BotConfig) -> Self {
        self.bot = bot;
        self
    }

    /// Push a tenant config into the cache before the first message.
    pub fn with_tenant_config(mut self, config: TenantConfig) -> Self {
        self.tenant_config = Some(config);
        self
    }

    /// Push an inventory snapshot into the cache before the first message.
    pub fn with_inventory(mut self, inventory: Vec<InventoryEntry>) -> Self {
        self.inventory = inventory;
        self
    }

    /// Back the caches with a mock tenant store.
    pub fn with_store(mut self, store: Arc<MockStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_skill(mut self, skill: Arc<dyn Skill>) -> Self {
        self.skills.register(skill);
        self
    }

    pub async fn build(self) -> TestHarness {
        let store: Option<Arc<dyn TenantStore>> = self
            .store
            .clone()
            .map(|s| s as Arc<dyn TenantStore>);
        let state = BotState::new(&self.bot, store);

        if self.tenant_config.is_some() || !self.inventory.is_empty() {
            state
                .push_inventory_sync(self.tenant_config, self.inventory)
                .await;
        }

        let mock_provider = Arc::new(MockProvider::with_responses(self.responses));
        let mock_channel = Arc::new(MockChannel::new());
        let orchestrator = Arc::new(ResponseOrchestrator::new(
            state.clone(),
            mock_channel.clone(),
            mock_provider.clone(),
            self.skills,
        ));

        TestHarness {
            mock_provider,
            mock_channel,
            mock_store: self.store,
            state,
            orchestrator,
        }
    }
}

/// A complete bot environment with mock adapters.
pub struct TestHarness {
    pub mock_provider: Arc<MockProvider>,
    pub mock_channel: Arc<MockChannel>,
    pub mock_store: Option<Arc<MockStore>>,
    pub state: Arc<BotState>,
    pub orchestrator: Arc<ResponseOrchestrator>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sends `text` from `chat_id` through the full reply pipeline.
    pub async fn send_message(&self, chat_id: &str, push_name: Option<&str>, text: &str) -> Disposition {
        self.orchestrator
            .handle_inbound(inbound(chat_id, push_name, text))
            .await
    }
}

/// Builds a customer message as the transport would deliver it.
pub fn inbound(chat_id: &str, push_name: Option<&str>, text: &str) -> InboundMessage {
    InboundMessage {
        id: format!("wamid.{}", uuid::Uuid::new_v4()),
        chat_id: chat_id.to_string(),
        from_me: false,
        push_name: push_name.map(str::to_string),
        text: text.to_string(),
        timestamp: Utc::now(),
    }
}
