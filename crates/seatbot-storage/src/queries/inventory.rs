// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account and client rows that inventory is computed from.

use chrono::{DateTime, Utc};
use rusqlite::params;
use seatbot_core::{AccountRecord, ClientRecord, SeatbotError};
use tracing::warn;

use crate::database::{Database, map_tr_err};

/// Inserts an account holding `total_seats` seats on `platform`.
pub async fn insert_account(
    db: &Database,
    tenant_id: &str,
    account: &AccountRecord,
) -> Result<i64, SeatbotError> {
    let (id, account) = (tenant_id.to_string(), account.clone());
    let now = Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO accounts (tenant_id, platform, total_seats, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, account.platform, account.total_seats, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts a client occupying a seat on `platform`.
pub async fn insert_client(
    db: &Database,
    tenant_id: &str,
    client: &ClientRecord,
) -> Result<i64, SeatbotError> {
    let id = tenant_id.to_string();
    let platform = client.platform.clone();
    let end = client.subscription_end.map(|t| t.to_rfc3339());
    let now = Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO clients (tenant_id, platform, subscription_end, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, platform, end, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Lists every account belonging to the tenant.
pub async fn list_accounts(
    db: &Database,
    tenant_id: &str,
) -> Result<Vec<AccountRecord>, SeatbotError> {
    let id = tenant_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<AccountRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT platform, total_seats FROM accounts WHERE tenant_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![id], |row| {
                Ok(AccountRecord {
                    platform: row.get(0)?,
                    total_seats: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Lists every client belonging to the tenant.
///
/// Unparseable end dates are read as "no end date", so the client does not
/// occupy a seat.
pub async fn list_clients(
    db: &Database,
    tenant_id: &str,
) -> Result<Vec<ClientRecord>, SeatbotError> {
    let id = tenant_id.to_string();
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<(String, Option<String>)>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT platform, subscription_end FROM clients WHERE tenant_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(rows
        .into_iter()
        .map(|(platform, end)| {
            let subscription_end = end.and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    warn!(platform = %platform, raw = %raw, error = %e, "bad subscription_end");
                    None
                }
            });
            ClientRecord {
                platform,
                subscription_end,
            }
        })
        .collect())
}

/// Removes every account and client row for the tenant.
pub async fn clear_inventory(db: &Database, tenant_id: &str) -> Result<(), SeatbotError> {
    let id = tenant_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM accounts WHERE tenant_id = ?1", params![id])?;
            tx.execute("DELETE FROM clients WHERE tenant_id = ?1", params![id])?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}
