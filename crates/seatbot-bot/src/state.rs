// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide bot context shared by the orchestrator, timers and gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use seatbot_config::model::BotConfig;
use seatbot_core::{BotSettings, InventoryEntry, TenantConfig, TenantStore};
use tokio::sync::RwLock;
use tracing::info;

use crate::config_cache::ConfigCache;
use crate::conversation::ConversationStore;
use crate::inventory::InventorySnapshot;
use crate::ledger::OrderLedger;
use crate::prompt::PromptBuilder;
use crate::schedule::ScheduleStore;

/// Per-reply limits taken from `[bot]`.
#[derive(Debug, Clone)]
pub struct BotLimits {
    pub history_turns: usize,
    pub live_max_tokens: u32,
    pub api_max_tokens: u32,
    pub reply_timeout: Duration,
    pub reply_delay_min_ms: u64,
    pub reply_delay_max_ms: u64,
}

impl From<&BotConfig> for BotLimits {
    fn from(config: &BotConfig) -> Self {
        Self {
            history_turns: config.history_turns,
            live_max_tokens: config.live_max_tokens,
            api_max_tokens: config.api_max_tokens,
            reply_timeout: Duration::from_secs(config.reply_timeout_secs),
            reply_delay_min_ms: config.reply_delay_min_ms,
            reply_delay_max_ms: config.reply_delay_max_ms.max(config.reply_delay_min_ms),
        }
    }
}

/// Everything the bot mutates at runtime, owned in one place.
pub struct BotState {
    pub tenant_id: String,
    pub config_cache: ConfigCache,
    pub inventory: InventorySnapshot,
    pub prompt: PromptBuilder,
    pub conversations: ConversationStore,
    pub ledger: Arc<OrderLedger>,
    pub schedules: ScheduleStore,
    pub limits: BotLimits,
    settings: Arc<RwLock<BotSettings>>,
    global_paused: AtomicBool,
    sent: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl BotState {
    /// `store = None` runs without a tenant store; configuration and
    /// inventory then arrive only through [`BotState::push_inventory_sync`].
    pub fn new(config: &BotConfig, store: Option<Arc<dyn TenantStore>>) -> Arc<Self> {
        let settings = Arc::new(RwLock::new(BotSettings::default()));
        let max_idle = chrono::Duration::hours(
            i64::try_from(config.conversation_max_age_hours).unwrap_or(24),
        );

        Arc::new(Self {
            tenant_id: config.tenant_id.clone(),
            config_cache: ConfigCache::new(
                store.clone(),
                Duration::from_secs(config.config_ttl_secs),
                settings.clone(),
            ),
            inventory: InventorySnapshot::new(store, Duration::from_secs(config.inventory_ttl_secs)),
            prompt: PromptBuilder::new(),
            conversations: ConversationStore::new(config.conversation_capacity, max_idle),
            ledger: Arc::new(OrderLedger::new(config.ledger_capacity)),
            schedules: ScheduleStore::new(),
            limits: BotLimits::from(config),
            settings,
            global_paused: AtomicBool::new(config.start_paused),
            sent: AtomicU64::new(0),
            started: Instant::now(),
            started_at: Utc::now(),
        })
    }

    /// Current tenant configuration (cached).
    pub async fn tenant_config(&self) -> TenantConfig {
        self.config_cache.get_config(&self.tenant_id).await
    }

    /// Current seat availability (cached).
    pub async fn available_accounts(&self) -> Vec<InventoryEntry> {
        self.inventory.get_available_accounts(&self.tenant_id).await
    }

    /// Filter flags from the most recently loaded tenant config.
    pub async fn settings(&self) -> BotSettings {
        *self.settings.read().await
    }

    pub fn is_globally_paused(&self) -> bool {
        self.global_paused.load(Ordering::SeqCst)
    }

    pub fn set_globally_paused(&self, paused: bool) {
        let previous = self.global_paused.swap(paused, Ordering::SeqCst);
        if previous != paused {
            info!(paused, "global pause toggled");
        }
    }

    pub fn record_sent(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Admin push: overwrite the cached config (when given) and inventory.
    pub async fn push_inventory_sync(&self, config: Option<TenantConfig>, inventory: Vec<InventoryEntry>) {
        if let Some(config) = config {
            self.config_cache.set_config(&self.tenant_id, config).await;
        }
        info!(platforms = inventory.len(), "inventory pushed");
        self.inventory.set_snapshot(&self.tenant_id, inventory).await;
    }
}
