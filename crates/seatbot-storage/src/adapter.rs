// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`TenantStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use seatbot_config::model::StorageConfig;
use seatbot_core::{
    AccountRecord, AdapterType, ClientRecord, HealthStatus, PluginAdapter, SeatbotError,
    TenantConfig, TenantStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed tenant store.
///
/// The database is opened lazily by [`SqliteTenantStore::initialize`].
pub struct SqliteTenantStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteTenantStore {
    /// Creates a store that will open `config.database_path` on initialize.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wraps an already-open database.
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: String::new(),
                wal_mode: false,
            },
            db: OnceCell::from(db),
        }
    }

    /// Opens the database and runs migrations.
    pub async fn initialize(&self) -> Result<(), SeatbotError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| SeatbotError::Storage {
            source: "tenant store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite tenant store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, SeatbotError> {
        self.db.get().ok_or_else(|| SeatbotError::Storage {
            source: "tenant store not initialized -- call initialize() first".into(),
        })
    }

    /// Saves a tenant's configuration document.
    pub async fn save_tenant_config(
        &self,
        tenant_id: &str,
        config: &TenantConfig,
    ) -> Result<(), SeatbotError> {
        queries::tenants::upsert_tenant_config(self.db()?, tenant_id, config).await
    }

    /// Records a shared account.
    pub async fn insert_account(
        &self,
        tenant_id: &str,
        account: &AccountRecord,
    ) -> Result<i64, SeatbotError> {
        queries::inventory::insert_account(self.db()?, tenant_id, account).await
    }

    /// Records a client seat.
    pub async fn insert_client(
        &self,
        tenant_id: &str,
        client: &ClientRecord,
    ) -> Result<i64, SeatbotError> {
        queries::inventory::insert_client(self.db()?, tenant_id, client).await
    }

    /// Replaces the tenant's accounts and clients wholesale.
    pub async fn replace_inventory(
        &self,
        tenant_id: &str,
        accounts: &[AccountRecord],
        clients: &[ClientRecord],
    ) -> Result<(), SeatbotError> {
        let db = self.db()?;
        queries::inventory::clear_inventory(db, tenant_id).await?;
        for account in accounts {
            queries::inventory::insert_account(db, tenant_id, account).await?;
        }
        for client in clients {
            queries::inventory::insert_client(db, tenant_id, client).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteTenantStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, SeatbotError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SeatbotError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl TenantStore for SqliteTenantStore {
    async fn fetch_tenant_config(
        &self,
        tenant_id: &str,
    ) -> Result<Option<TenantConfig>, SeatbotError> {
        queries::tenants::get_tenant_config(self.db()?, tenant_id).await
    }

    async fn fetch_accounts_and_clients(
        &self,
        tenant_id: &str,
    ) -> Result<(Vec<AccountRecord>, Vec<ClientRecord>), SeatbotError> {
        let db = self.db()?;
        let accounts = queries::inventory::list_accounts(db, tenant_id).await?;
        let clients = queries::inventory::list_clients(db, tenant_id).await?;
        Ok((accounts, clients))
    }
}
