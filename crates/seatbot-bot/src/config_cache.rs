// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant configuration cache.

use std::sync::Arc;
use std::time::Duration;

use seatbot_core::{BotSettings, SeatbotError, TenantConfig, TenantStore};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::TimedCache;

/// Serves a tenant's [`TenantConfig`] from a short-lived cache.
///
/// Never fails: a store error yields the last good value, and a tenant with
/// nothing known yet gets [`TenantConfig::default`] (enabled, empty texts).
/// Every successful fetch also publishes the document's [`BotSettings`] to
/// the shared filter flags.
pub struct ConfigCache {
    store: Option<Arc<dyn TenantStore>>,
    cache: TimedCache<TenantConfig>,
    settings: Arc<RwLock<BotSettings>>,
}

impl ConfigCache {
    /// `store = None` runs in disconnected-store mode, where configuration only
    /// arrives through [`ConfigCache::set_config`].
    pub fn new(
        store: Option<Arc<dyn TenantStore>>,
        ttl: Duration,
        settings: Arc<RwLock<BotSettings>>,
    ) -> Self {
        Self {
            store,
            cache: TimedCache::new(ttl),
            settings,
        }
    }

    pub async fn get_config(&self, tenant_id: &str) -> TenantConfig {
        let Some(store) = &self.store else {
            return self.cache.last(tenant_id).await.unwrap_or_default();
        };

        let settings = &self.settings;
        let fetched = self
            .cache
            .get_or_refresh(tenant_id, || async move {
                let config = store
                    .fetch_tenant_config(tenant_id)
                    .await?
                    .unwrap_or_default();
                *settings.write().await = config.settings;
                debug!(tenant_id, enabled = config.enabled, "tenant config fetched");
                Ok::<_, SeatbotError>(config)
            })
            .await;

        fetched.unwrap_or_default()
    }

    /// Push override from the admin panel; honored for a full TTL window.
    pub async fn set_config(&self, tenant_id: &str, config: TenantConfig) {
        *self.settings.write().await = config.settings;
        self.cache.set(tenant_id, config).await;
    }
}
