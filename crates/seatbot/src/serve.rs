// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `seatbot serve` command implementation.
//!
//! Opens the tenant store, connects the Gemini provider and the WhatsApp
//! channel, starts the admin gateway and runs the bot loop until a shutdown
//! signal arrives.

use std::sync::Arc;

use seatbot_bot::{
    BotRuntime, BotState, ResponseOrchestrator, RuntimeOptions, SkillRegistry,
    install_signal_handler,
};
use seatbot_config::model::{GatewayConfig, SeatbotConfig, StorageConfig};
use seatbot_core::{ChannelAdapter, ProviderAdapter, SeatbotError, TenantStore};
use seatbot_gateway::{AuthConfig, GatewayState, ServerConfig, build_router, start_server};
use seatbot_gemini::GeminiProvider;
use seatbot_storage::SqliteTenantStore;
use seatbot_whatsapp::WhatsAppChannel;
use tracing::{error, info, warn};

/// Runs the `seatbot serve` command.
pub async fn run_serve(config: SeatbotConfig) -> Result<(), SeatbotError> {
    init_tracing(&config.bot.log_level);

    info!(tenant_id = %config.bot.tenant_id, "starting seatbot serve");

    let store = open_tenant_store(&config.storage).await?;

    let provider: Arc<dyn ProviderAdapter> = Arc::new(GeminiProvider::new(&config.gemini)?);

    let mut whatsapp = WhatsAppChannel::new(&config.whatsapp)?;
    whatsapp.connect().await?;
    let ingress = whatsapp.ingress();
    let channel: Arc<dyn ChannelAdapter> = Arc::new(whatsapp);

    let state = BotState::new(&config.bot, store);
    if state.is_globally_paused() {
        warn!("starting with automatic replies paused");
    }
    let orchestrator = Arc::new(ResponseOrchestrator::new(
        state,
        channel,
        provider,
        SkillRegistry::default(),
    ));

    let cancel = install_signal_handler();

    let gateway = if config.gateway.enabled {
        let router = build_router(
            GatewayState::new(orchestrator.clone()),
            AuthConfig {
                bearer_token: config.gateway.bearer_token.clone(),
            },
            Some(ingress),
        );
        let server_config = server_config(&config.gateway);
        let gateway_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            start_server(&server_config, router, gateway_cancel).await
        }))
    } else {
        warn!("gateway disabled -- no webhook receiver, inbound WhatsApp messages will not arrive");
        None
    };

    let mut runtime = BotRuntime::new(orchestrator, RuntimeOptions::from(&config.bot));
    let result = runtime.run(cancel.clone()).await;

    // The loop can also stop on a channel failure; take the gateway down with it.
    cancel.cancel();
    if let Some(handle) = gateway {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "gateway exited with error"),
            Err(e) => error!(error = %e, "gateway task panicked"),
        }
    }

    result?;
    info!("seatbot serve shutdown complete");
    Ok(())
}

/// Opens SQLite when a database path is configured.
///
/// An empty path runs without a store: tenant config and inventory then come
/// only from `POST /v1/sync`.
async fn open_tenant_store(
    config: &StorageConfig,
) -> Result<Option<Arc<dyn TenantStore>>, SeatbotError> {
    if config.database_path.trim().is_empty() {
        warn!("storage.database_path is empty -- running without a tenant store");
        return Ok(None);
    }

    if let Some(parent) = std::path::Path::new(&config.database_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| SeatbotError::Storage {
            source: Box::new(e),
        })?;
    }

    let store = SqliteTenantStore::new(config.clone());
    store.initialize().await?;
    info!(path = %config.database_path, "tenant store ready");
    Ok(Some(Arc::new(store)))
}

fn server_config(config: &GatewayConfig) -> ServerConfig {
    ServerConfig {
        host: config.host.clone(),
        port: config.port,
        bearer_token: config.bearer_token.clone(),
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("seatbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
