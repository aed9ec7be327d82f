// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory tenant store with a failure switch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use seatbot_core::{
    AccountRecord, AdapterType, ClientRecord, HealthStatus, PluginAdapter, SeatbotError,
    TenantConfig, TenantStore,
};

/// A `TenantStore` backed by hash maps, counting every fetch.
#[derive(Default)]
pub struct MockStore {
    configs: Mutex<HashMap<String, TenantConfig>>,
    inventory: Mutex<HashMap<String, (Vec<AccountRecord>, Vec<ClientRecord>)>>,
    failing: AtomicBool,
    config_fetches: AtomicUsize,
    inventory_fetches: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_config(&self, tenant_id: &str, config: TenantConfig) {
        self.configs.lock().await.insert(tenant_id.to_string(), config);
    }

    pub async fn set_inventory(
        &self,
        tenant_id: &str,
        accounts: Vec<AccountRecord>,
        clients: Vec<ClientRecord>,
    ) {
        self.inventory
            .lock()
            .await
            .insert(tenant_id.to_string(), (accounts, clients));
    }

    /// While set, every fetch fails with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn config_fetches(&self) -> usize {
        self.config_fetches.load(Ordering::SeqCst)
    }

    pub fn inventory_fetches(&self) -> usize {
        self.inventory_fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), SeatbotError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SeatbotError::Storage {
                source: Box::new(std::io::Error::other("mock store unavailable")),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MockStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, SeatbotError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("failing".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SeatbotError> {
        Ok(())
    }
}

#[async_trait]
impl TenantStore for MockStore {
    async fn fetch_tenant_config(&self, tenant_id: &str) -> Result<Option<TenantConfig>, SeatbotError> {
        self.config_fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.configs.lock().await.get(tenant_id).cloned())
    }

    async fn fetch_accounts_and_clients(
        &self,
        tenant_id: &str,
    ) -> Result<(Vec<AccountRecord>, Vec<ClientRecord>), SeatbotError> {
        self.inventory_fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .inventory
            .lock()
            .await
            .get(tenant_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_tenant_has_no_config() {
        let store = MockStore::new();
        assert_eq!(store.fetch_tenant_config("t").await.unwrap(), None);
        assert_eq!(store.config_fetches(), 1);
    }

    #[tokio::test]
    async fn failing_switch_errors_every_fetch() {
        let store = MockStore::new();
        store.set_failing(true);
        assert!(store.fetch_tenant_config("t").await.is_err());
        assert!(store.fetch_accounts_and_clients("t").await.is_err());
        store.set_failing(false);
        assert!(store.fetch_accounts_and_clients("t").await.unwrap().0.is_empty());
    }
}
