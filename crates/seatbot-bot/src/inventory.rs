// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seat availability snapshot per tenant.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use seatbot_core::{InventoryEntry, SeatbotError, TenantStore, compute_inventory};
use tracing::debug;

use crate::cache::TimedCache;

/// Serves per-platform seat availability computed from store records.
pub struct InventorySnapshot {
    store: Option<Arc<dyn TenantStore>>,
    cache: TimedCache<Vec<InventoryEntry>>,
}

impl InventorySnapshot {
    pub fn new(store: Option<Arc<dyn TenantStore>>, ttl: Duration) -> Self {
        Self {
            store,
            cache: TimedCache::new(ttl),
        }
    }

    /// Current inventory, sorted by platform. Empty if nothing is known.
    pub async fn get_available_accounts(&self, tenant_id: &str) -> Vec<InventoryEntry> {
        let Some(store) = &self.store else {
            return self.cache.last(tenant_id).await.unwrap_or_default();
        };

        self.cache
            .get_or_refresh(tenant_id, || async move {
                let (accounts, clients) = store.fetch_accounts_and_clients(tenant_id).await?;
                let entries = compute_inventory(&accounts, &clients, Utc::now());
                debug!(tenant_id, platforms = entries.len(), "inventory recomputed");
                Ok::<_, SeatbotError>(entries)
            })
            .await
            .unwrap_or_default()
    }

    /// Push override; resets the freshness window.
    pub async fn set_snapshot(&self, tenant_id: &str, entries: Vec<InventoryEntry>) {
        self.cache.set(tenant_id, entries).await;
    }
}
