// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Seatbot process.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key stops
//! the process at startup instead of silently falling back to a default.
//! Tenant-level settings (business name, tone, fallback text) are NOT here:
//! they live in the tenant store and are read through the config cache.

use serde::{Deserialize, Serialize};

/// Top-level Seatbot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeatbotConfig {
    /// Bot behavior: tenant identity, caches, limits, timers.
    #[serde(default)]
    pub bot: BotConfig,

    /// Gemini language model settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// WhatsApp Cloud API transport settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Tenant store (SQLite) settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admin HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Bot behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Tenant whose configuration and inventory this process serves.
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Start with the global pause engaged.
    #[serde(default)]
    pub start_paused: bool,

    /// Stored messages kept per conversation.
    #[serde(default = "default_conversation_capacity")]
    pub conversation_capacity: usize,

    /// Most recent stored messages sent to the model as history.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Orders retained by the ledger before the oldest are dropped.
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,

    /// Seconds a fetched tenant configuration stays fresh.
    #[serde(default = "default_config_ttl_secs")]
    pub config_ttl_secs: u64,

    /// Seconds a computed inventory snapshot stays fresh.
    #[serde(default = "default_inventory_ttl_secs")]
    pub inventory_ttl_secs: u64,

    /// Upper bound on a single model call before the fallback reply is used.
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,

    /// Output token cap for live chat when the tenant sets none.
    #[serde(default = "default_live_max_tokens")]
    pub live_max_tokens: u32,

    /// Output token cap for the stateless chat endpoint when the tenant sets none.
    #[serde(default = "default_api_max_tokens")]
    pub api_max_tokens: u32,

    /// Lower bound of the randomized delay before a reply is sent.
    #[serde(default = "default_reply_delay_min_ms")]
    pub reply_delay_min_ms: u64,

    /// Upper bound of the randomized delay before a reply is sent.
    #[serde(default = "default_reply_delay_max_ms")]
    pub reply_delay_max_ms: u64,

    /// Hours of inactivity after which an unpaused conversation is dropped.
    #[serde(default = "default_conversation_max_age_hours")]
    pub conversation_max_age_hours: u64,

    /// Seconds between conversation sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Seconds between scheduled-message ticks.
    #[serde(default = "default_scheduler_interval_secs")]
    pub scheduler_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            tenant_id: default_tenant_id(),
            log_level: default_log_level(),
            start_paused: false,
            conversation_capacity: default_conversation_capacity(),
            history_turns: default_history_turns(),
            ledger_capacity: default_ledger_capacity(),
            config_ttl_secs: default_config_ttl_secs(),
            inventory_ttl_secs: default_inventory_ttl_secs(),
            reply_timeout_secs: default_reply_timeout_secs(),
            live_max_tokens: default_live_max_tokens(),
            api_max_tokens: default_api_max_tokens(),
            reply_delay_min_ms: default_reply_delay_min_ms(),
            reply_delay_max_ms: default_reply_delay_max_ms(),
            conversation_max_age_hours: default_conversation_max_age_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
            scheduler_interval_secs: default_scheduler_interval_secs(),
        }
    }
}

fn default_tenant_id() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_conversation_capacity() -> usize {
    50
}

fn default_history_turns() -> usize {
    20
}

fn default_ledger_capacity() -> usize {
    500
}

fn default_config_ttl_secs() -> u64 {
    60
}

fn default_inventory_ttl_secs() -> u64 {
    120
}

fn default_reply_timeout_secs() -> u64 {
    25
}

fn default_live_max_tokens() -> u32 {
    600
}

fn default_api_max_tokens() -> u32 {
    512
}

fn default_reply_delay_min_ms() -> u64 {
    800
}

fn default_reply_delay_max_ms() -> u64 {
    2300
}

fn default_conversation_max_age_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    30 * 60
}

fn default_scheduler_interval_secs() -> u64 {
    30
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for replies.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL, overridable for proxies and tests.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout_secs(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    20
}

/// WhatsApp Cloud API configuration. `access_token = None` disables the transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Permanent or system-user access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone number id messages are sent from.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Token echoed during webhook subscription verification.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret for `X-Hub-Signature-256` verification. `None` skips the check.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Graph API version segment.
    #[serde(default = "default_graph_api_version")]
    pub api_version: String,

    /// Graph API base URL, overridable for tests.
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            app_secret: None,
            api_version: default_graph_api_version(),
            base_url: default_graph_base_url(),
        }
    }
}

fn default_graph_api_version() -> String {
    "v21.0".to_string()
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

/// Tenant store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file. Empty runs in disconnected-store
    /// mode, where config and inventory arrive only through the sync endpoint.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("seatbot").join("seatbot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("seatbot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Admin HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Serve the admin API and webhook routes.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*`. `None` leaves the API open.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}
