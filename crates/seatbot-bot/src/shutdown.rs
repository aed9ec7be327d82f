// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! SIGTERM and SIGINT (Ctrl+C) cancel a [`CancellationToken`] watched by the
//! bot loop and its timers. Chat workers are then given a bounded window to
//! finish the message they are handling.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
            let _ = ctrl_c.await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// Waits up to `timeout` for chat workers to finish, aborting stragglers.
pub async fn drain_workers(handles: Vec<JoinHandle<()>>, timeout: Duration) {
    let pending: Vec<JoinHandle<()>> = handles.into_iter().filter(|h| !h.is_finished()).collect();
    if pending.is_empty() {
        info!("no active chat workers to drain");
        return;
    }

    info!(count = pending.len(), "waiting for active chat workers to complete");
    let aborts: Vec<_> = pending.iter().map(JoinHandle::abort_handle).collect();

    let all = async {
        for handle in pending {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(timeout, all).await.is_ok() {
        info!("all chat workers drained");
        return;
    }

    let remaining = aborts.iter().filter(|a| !a.is_finished()).count();
    warn!(remaining, "drain timeout reached, interrupting chat workers");
    for abort in aborts {
        abort.abort();
    }
}
