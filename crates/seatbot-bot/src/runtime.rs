// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot event loop, per-chat workers and background timers.
//!
//! Inbound messages are handed to one worker task per chat, so a chat is
//! handled strictly in arrival order while different chats proceed
//! concurrently. The conversation sweep and the scheduled-message tick run as
//! independent interval tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use seatbot_config::model::BotConfig;
use seatbot_core::{InboundMessage, SeatbotError, Speaker};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::orchestrator::ResponseOrchestrator;
use crate::shutdown;
use crate::state::BotState;

/// Timer and worker tuning.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub sweep_interval: Duration,
    pub scheduler_interval: Duration,
    /// A chat worker exits after this long without messages.
    pub worker_idle: Duration,
    pub drain_timeout: Duration,
}

impl From<&BotConfig> for RuntimeOptions {
    fn from(config: &BotConfig) -> Self {
        Self {
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            scheduler_interval: Duration::from_secs(config.scheduler_interval_secs),
            worker_idle: Duration::from_secs(300),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

struct ChatWorker {
    tx: mpsc::UnboundedSender<InboundMessage>,
    handle: JoinHandle<()>,
}

pub struct BotRuntime {
    orchestrator: Arc<ResponseOrchestrator>,
    options: RuntimeOptions,
    workers: HashMap<String, ChatWorker>,
}

impl BotRuntime {
    pub fn new(orchestrator: Arc<ResponseOrchestrator>, options: RuntimeOptions) -> Self {
        Self {
            orchestrator,
            options,
            workers: HashMap::new(),
        }
    }

    /// Runs until `cancel` fires or the channel fails, then drains workers.
    ///
    /// A receive failure is returned after the drain.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), SeatbotError> {
        info!("bot loop running");
        let timers_cancel = cancel.child_token();
        let sweeper = spawn_sweeper(
            self.orchestrator.state().clone(),
            self.options.sweep_interval,
            timers_cancel.clone(),
        );
        let scheduler = spawn_scheduler(
            self.orchestrator.clone(),
            self.options.scheduler_interval,
            timers_cancel.clone(),
        );

        let outcome = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bot loop");
                    break Ok(());
                }
                msg = self.orchestrator.channel().receive() => {
                    match msg {
                        Ok(inbound) => self.dispatch(inbound),
                        Err(e) => {
                            error!(error = %e, "channel receive failed, stopping bot loop");
                            break Err(e);
                        }
                    }
                }
            }
        };

        timers_cancel.cancel();
        let handles: Vec<JoinHandle<()>> = self.workers.drain().map(|(_, w)| w.handle).collect();
        shutdown::drain_workers(handles, self.options.drain_timeout).await;
        let _ = sweeper.await;
        let _ = scheduler.await;

        info!("bot loop stopped");
        outcome
    }

    /// Queues a message on its chat's worker, starting one if needed.
    pub fn dispatch(&mut self, msg: InboundMessage) {
        self.workers.retain(|_, w| !w.handle.is_finished());

        let msg = match self.workers.get(&msg.chat_id) {
            Some(worker) => match worker.tx.send(msg) {
                Ok(()) => return,
                Err(mpsc::error::SendError(msg)) => msg,
            },
            None => msg,
        };

        // A closed worker may still be draining; its successor waits for it.
        let predecessor = self.workers.remove(&msg.chat_id).map(|w| w.handle);

        let chat_id = msg.chat_id.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        // A fresh receiver is open, so this cannot fail.
        let _ = tx.send(msg);
        let handle = tokio::spawn(chat_worker(
            self.orchestrator.clone(),
            rx,
            self.options.worker_idle,
            predecessor,
        ));
        debug!(chat_id = %chat_id, "chat worker started");
        self.workers.insert(chat_id, ChatWorker { tx, handle });
    }

    pub fn active_workers(&self) -> usize {
        self.workers.values().filter(|w| !w.handle.is_finished()).count()
    }
}

async fn chat_worker(
    orchestrator: Arc<ResponseOrchestrator>,
    mut rx: mpsc::UnboundedReceiver<InboundMessage>,
    idle: Duration,
    predecessor: Option<JoinHandle<()>>,
) {
    if let Some(previous) = predecessor
        && let Err(e) = previous.await
    {
        warn!(error = %e, "previous chat worker failed");
    }
    loop {
        match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(msg)) => {
                orchestrator.handle_inbound(msg).await;
            }
            Ok(None) => break,
            Err(_) => {
                // Refuse new messages, then finish anything already queued.
                rx.close();
                while let Some(msg) = rx.recv().await {
                    orchestrator.handle_inbound(msg).await;
                }
                break;
            }
        }
    }
}

/// Periodically drops idle conversations.
pub fn spawn_sweeper(state: Arc<BotState>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = state.conversations.sweep(Utc::now());
                    debug!(removed, "conversation sweep finished");
                }
            }
        }
    })
}

/// Periodically delivers due scheduled messages.
pub fn spawn_scheduler(
    orchestrator: Arc<ResponseOrchestrator>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    run_due_schedules(&orchestrator, Utc::now()).await;
                }
            }
        }
    })
}

/// Sends every message due at `now` and purges finished ones.
///
/// Returns the number of messages delivered.
pub async fn run_due_schedules(orchestrator: &ResponseOrchestrator, now: DateTime<Utc>) -> usize {
    let state = orchestrator.state();
    let mut delivered = 0;

    for message in state.schedules.due(now).await {
        if let Err(e) = orchestrator.deliver(&message.chat_id, &message.text).await {
            // Left due; retried on the next tick.
            warn!(id = %message.id, chat_id = %message.chat_id, error = %e, "scheduled send failed");
            continue;
        }
        if let Err(e) = state.schedules.mark_sent(&message.id, now).await {
            debug!(id = %message.id, error = %e, "scheduled message deleted while sending");
        }
        if let Some(slot) = state.conversations.get(&message.chat_id) {
            slot.state().await.append(Speaker::Bot, message.text.clone(), now);
        }
        info!(id = %message.id, chat_id = %message.chat_id, "scheduled message sent");
        delivered += 1;
    }

    state.schedules.purge(now).await;
    delivered
}
