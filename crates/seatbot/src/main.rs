// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seatbot - WhatsApp sales assistant for streaming-seat resellers.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use seatbot_config::model::SeatbotConfig;

/// Seatbot - WhatsApp sales assistant for streaming-seat resellers.
#[derive(Parser, Debug)]
#[command(name = "seatbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot, the admin API and the webhook receiver.
    Serve,
    /// Query a running instance's health endpoint.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and exit.
    Check,
    /// Print the effective configuration with secrets masked.
    Show,
}

fn load_config(path: Option<&PathBuf>) -> SeatbotConfig {
    let loaded = match path {
        Some(path) => seatbot_config::load_and_validate_path(path),
        None => seatbot_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            seatbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => {
            println!(
                "seatbot: config ok (tenant_id={})",
                config.bot.tenant_id
            );
            Ok(())
        }
        Some(Commands::Config {
            action: ConfigAction::Show,
        }) => match seatbot_config::to_redacted_toml(&config) {
            Ok(text) => {
                print!("{text}");
                Ok(())
            }
            Err(e) => Err(seatbot_core::SeatbotError::Config(format!(
                "failed to render config: {e}"
            ))),
        },
        None => {
            println!("seatbot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
