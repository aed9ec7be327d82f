// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./seatbot.toml` > `~/.config/seatbot/seatbot.toml` >
//! `/etc/seatbot/seatbot.toml`, with environment variable overrides via the
//! `SEATBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SeatbotConfig;

/// System-wide config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/seatbot/seatbot.toml";

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "seatbot.toml";

/// Config sections that `SEATBOT_<SECTION>_<KEY>` variables map into.
const ENV_SECTIONS: &[&str] = &["bot", "gemini", "whatsapp", "storage", "gateway"];

/// Returns the per-user config path (`~/.config/seatbot/seatbot.toml`), if a
/// config directory exists on this platform.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("seatbot").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/seatbot/seatbot.toml`
/// 3. `~/.config/seatbot/seatbot.toml`
/// 4. `./seatbot.toml`
/// 5. `SEATBOT_*` environment variables
pub fn load_config() -> Result<SeatbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SeatbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SeatbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SeatbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SeatbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SeatbotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `SEATBOT_GEMINI_API_KEY` to `gemini.api_key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores stay intact.
fn env_provider() -> Env {
    Env::prefixed("SEATBOT_").map(|key| env_key_to_path(key.as_str()).into())
}

fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(env_key_to_path("gemini_api_key"), "gemini.api_key");
        assert_eq!(env_key_to_path("bot_reply_delay_min_ms"), "bot.reply_delay_min_ms");
        assert_eq!(env_key_to_path("whatsapp_phone_number_id"), "whatsapp.phone_number_id");
        assert_eq!(env_key_to_path("unknown"), "unknown");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[bot]\ntenant_id = \"from-file\"\n")?;
            jail.set_env("SEATBOT_BOT_TENANT_ID", "from-env");
            jail.set_env("SEATBOT_GATEWAY_PORT", "8088");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.bot.tenant_id, "from-env");
            assert_eq!(config.gateway.port, 8088);
            Ok(())
        });
    }
}
