// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seatbot's conversational core.
//!
//! Wires the tenant caches, prompt builder, conversation store, order capture
//! and scheduled messages behind the [`ResponseOrchestrator`], and runs them
//! from the [`BotRuntime`] loop. Transports, the language model and the tenant
//! store plug in through the `seatbot-core` adapter traits.

pub mod cache;
pub mod config_cache;
pub mod conversation;
pub mod history;
pub mod inventory;
pub mod ledger;
pub mod order;
pub mod orchestrator;
pub mod prompt;
pub mod runtime;
pub mod schedule;
pub mod shutdown;
pub mod skills;
pub mod state;
pub mod text;

pub use cache::TimedCache;
pub use config_cache::ConfigCache;
pub use conversation::{
    ChatSlot, Conversation, ConversationDetail, ConversationHandle, ConversationStore,
    ConversationSummary,
};
pub use history::{normalize_history, normalize_turns};
pub use inventory::InventorySnapshot;
pub use ledger::{OrderDraft, OrderLedger};
pub use orchestrator::{
    Disposition, GENERIC_APOLOGY, IgnoreReason, ReplySource, ResponseOrchestrator, fallback_text,
};
pub use order::{Extraction, ORDER_MARKER, OrderExtractor, OrderOrigin, strip_order_tags};
pub use prompt::PromptBuilder;
pub use runtime::{BotRuntime, RuntimeOptions, run_due_schedules};
pub use schedule::ScheduleStore;
pub use shutdown::install_signal_handler;
pub use skills::SkillRegistry;
pub use state::{BotLimits, BotState};
