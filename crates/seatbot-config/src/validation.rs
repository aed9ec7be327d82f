// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde cannot express: non-empty identifiers, sane
//! bind addresses, ordered delay bounds and non-zero timers.

use crate::diagnostic::ConfigError;
use crate::model::SeatbotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &SeatbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let bot = &config.bot;

    if bot.tenant_id.trim().is_empty() {
        errors.push(ConfigError::validation("bot.tenant_id must not be empty"));
    }

    let positive: [(&str, u64); 9] = [
        ("bot.conversation_capacity", bot.conversation_capacity as u64),
        ("bot.history_turns", bot.history_turns as u64),
        ("bot.ledger_capacity", bot.ledger_capacity as u64),
        ("bot.config_ttl_secs", bot.config_ttl_secs),
        ("bot.inventory_ttl_secs", bot.inventory_ttl_secs),
        ("bot.reply_timeout_secs", bot.reply_timeout_secs),
        ("bot.sweep_interval_secs", bot.sweep_interval_secs),
        ("bot.scheduler_interval_secs", bot.scheduler_interval_secs),
        ("gemini.timeout_secs", config.gemini.timeout_secs),
    ];
    for (key, value) in positive {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{key} must be greater than zero"
            )));
        }
    }

    if bot.live_max_tokens == 0 || bot.api_max_tokens == 0 {
        errors.push(ConfigError::validation(
            "bot.live_max_tokens and bot.api_max_tokens must be greater than zero",
        ));
    }

    if bot.reply_delay_min_ms > bot.reply_delay_max_ms {
        errors.push(ConfigError::validation(format!(
            "bot.reply_delay_min_ms ({}) must not exceed bot.reply_delay_max_ms ({})",
            bot.reply_delay_min_ms, bot.reply_delay_max_ms
        )));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.gateway.enabled && config.gateway.port == 0 {
        errors.push(ConfigError::validation(
            "gateway.port must be non-zero when the gateway is enabled",
        ));
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "gateway.bearer_token must not be blank; remove the key to disable auth",
        ));
    }

    if config.whatsapp.access_token.is_some() && config.whatsapp.phone_number_id.is_none() {
        errors.push(ConfigError::validation(
            "whatsapp.phone_number_id is required when whatsapp.access_token is set",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
