// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant store trait for the document database behind the admin panel.

use async_trait::async_trait;

use crate::error::SeatbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AccountRecord, ClientRecord, TenantConfig};

/// Read contract over the tenant's persisted documents.
///
/// The bot only reads through this trait; the admin panel owns writes.
#[async_trait]
pub trait TenantStore: PluginAdapter {
    /// Fetches the tenant's bot configuration, `None` if never saved.
    async fn fetch_tenant_config(
        &self,
        tenant_id: &str,
    ) -> Result<Option<TenantConfig>, SeatbotError>;

    /// Fetches the account and client records used to compute inventory.
    async fn fetch_accounts_and_clients(
        &self,
        tenant_id: &str,
    ) -> Result<(Vec<AccountRecord>, Vec<ClientRecord>), SeatbotError>;
}
