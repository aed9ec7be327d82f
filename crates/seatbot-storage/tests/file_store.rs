// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed tenant store behavior across reopen.

use seatbot_config::model::StorageConfig;
use seatbot_core::{AccountRecord, PluginAdapter, TenantConfig, TenantStore};
use seatbot_storage::SqliteTenantStore;

fn config_for(dir: &tempfile::TempDir) -> StorageConfig {
    StorageConfig {
        database_path: dir.path().join("nested/seatbot.db").display().to_string(),
        wal_mode: true,
    }
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let store = SqliteTenantStore::new(config_for(&dir));
    store.initialize().await.unwrap();
    store
        .save_tenant_config(
            "t1",
            &TenantConfig {
                business_name: "Cuentas Ya".to_string(),
                ..TenantConfig::default()
            },
        )
        .await
        .unwrap();
    store
        .insert_account(
            "t1",
            &AccountRecord {
                platform: "Max".to_string(),
                total_seats: 4,
            },
        )
        .await
        .unwrap();
    store.shutdown().await.unwrap();
    drop(store);

    let reopened = SqliteTenantStore::new(config_for(&dir));
    reopened.initialize().await.unwrap();
    let config = reopened.fetch_tenant_config("t1").await.unwrap().unwrap();
    assert_eq!(config.business_name, "Cuentas Ya");
    let (accounts, _) = reopened.fetch_accounts_and_clients("t1").await.unwrap();
    assert_eq!(accounts.len(), 1);
}

#[tokio::test]
async fn double_initialize_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteTenantStore::new(config_for(&dir));
    store.initialize().await.unwrap();
    assert!(store.initialize().await.is_err());
}
