// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `seatbot status` command implementation.
//!
//! Reads the gateway's public health endpoint. Reports "not running" when
//! nothing answers.

use std::io::IsTerminal;
use std::time::Duration;

use seatbot_config::model::SeatbotConfig;
use seatbot_core::SeatbotError;
use serde::{Deserialize, Serialize};

/// Health endpoint response from the gateway.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    uptime_secs: u64,
    sent: u64,
    paused: bool,
    conversations: usize,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub sent: Option<u64>,
    pub paused: Option<bool>,
    pub conversations: Option<usize>,
    pub endpoint: String,
}

impl StatusResponse {
    fn offline(endpoint: String) -> Self {
        Self {
            running: false,
            status: "not running".to_string(),
            uptime_secs: None,
            uptime_human: None,
            sent: None,
            paused: None,
            conversations: None,
            endpoint,
        }
    }
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Run the `seatbot status` command.
pub async fn run_status(config: &SeatbotConfig, json: bool) -> Result<(), SeatbotError> {
    let endpoint = format!(
        "http://{}:{}/health",
        config.gateway.host, config.gateway.port
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| SeatbotError::Internal(format!("failed to create HTTP client: {e}")))?;

    let status = match client.get(&endpoint).send().await {
        Ok(resp) if resp.status().is_success() => {
            let health: HealthResponse = resp.json().await.map_err(|e| {
                SeatbotError::Internal(format!("failed to parse health response: {e}"))
            })?;
            StatusResponse {
                running: true,
                status: health.status,
                uptime_secs: Some(health.uptime_secs),
                uptime_human: Some(format_uptime(health.uptime_secs)),
                sent: Some(health.sent),
                paused: Some(health.paused),
                conversations: Some(health.conversations),
                endpoint,
            }
        }
        _ => StatusResponse::offline(endpoint),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_status(&status, std::io::stdout().is_terminal());
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  seatbot status");
    println!("  {}", "-".repeat(35));

    if status.running {
        let uptime = status.uptime_human.as_deref().unwrap_or("?");
        if use_color {
            println!("    State:    {} {} (uptime: {uptime})", "✓".green(), status.status.green());
        } else {
            println!("    State:    [OK] {} (uptime: {uptime})", status.status);
        }
        if status.paused == Some(true) {
            println!("    Replies:  paused");
        }
        println!("    Sent:     {}", status.sent.unwrap_or(0));
        println!("    Chats:    {}", status.conversations.unwrap_or(0));
    } else {
        if use_color {
            println!("    State:    {} {}", "✗".red(), "not running".red());
        } else {
            println!("    State:    [FAIL] not running");
        }
        println!("    Endpoint: {}", status.endpoint);
        println!();
        println!("  Start with: seatbot serve");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(120), "2m");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(3720), "1h 2m");
    }

    #[test]
    fn format_uptime_days() {
        assert_eq!(format_uptime(90060), "1d 1h 1m");
    }

    #[test]
    fn health_body_parses() {
        let body = r#"{"status":"ok","version":"0.1.0","uptime_secs":61,"started_at":"2026-01-01T00:00:00Z","sent":4,"paused":false,"conversations":2}"#;
        let health: HealthResponse = serde_json::from_str(body).unwrap();
        assert_eq!(health.sent, 4);
        assert_eq!(health.conversations, 2);
    }

    #[test]
    fn offline_status_serializes() {
        let resp = StatusResponse::offline("http://127.0.0.1:3000/health".into());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"running\":false"));
        assert!(json.contains("\"sent\":null"));
    }

    #[tokio::test]
    async fn unreachable_gateway_reports_offline() {
        let mut config = SeatbotConfig::default();
        config.gateway.host = "127.0.0.1".into();
        config.gateway.port = 1;
        run_status(&config, true).await.unwrap();
    }
}
