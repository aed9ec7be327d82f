// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant configuration documents.

use rusqlite::{OptionalExtension, params};
use seatbot_core::{SeatbotError, TenantConfig};
use tracing::warn;

use crate::database::{Database, map_tr_err};

/// Fetches a tenant's configuration document.
///
/// A document that no longer parses is treated as absent so the bot keeps
/// running on defaults.
pub async fn get_tenant_config(
    db: &Database,
    tenant_id: &str,
) -> Result<Option<TenantConfig>, SeatbotError> {
    let id = tenant_id.to_string();
    let raw = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT config_json FROM tenant_configs WHERE tenant_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(raw.and_then(|json| match serde_json::from_str(&json) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(tenant_id, error = %e, "stored tenant config is not valid JSON, ignoring");
            None
        }
    }))
}

/// Inserts or replaces a tenant's configuration document.
pub async fn upsert_tenant_config(
    db: &Database,
    tenant_id: &str,
    config: &TenantConfig,
) -> Result<(), SeatbotError> {
    let id = tenant_id.to_string();
    let json = serde_json::to_string(config).map_err(|e| SeatbotError::Storage {
        source: Box::new(e),
    })?;
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tenant_configs (tenant_id, config_json, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(tenant_id) DO UPDATE SET
                     config_json = excluded.config_json,
                     updated_at = excluded.updated_at",
                params![id, json, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
