// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Seatbot integration tests.
//!
//! Provides mock adapters and a test harness for fast, deterministic tests
//! without WhatsApp, Gemini or a database.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted language model (replies, errors, hangs)
//! - [`MockChannel`] - messaging channel with injection and capture
//! - [`MockStore`] - in-memory tenant store with a failure switch
//! - [`MockSkill`] - keyword-triggered skill
//! - [`TestHarness`] - bot state and orchestrator wired to the mocks

pub mod harness;
pub mod mock_channel;
pub mod mock_provider;
pub mod mock_skill;
pub mod mock_store;

pub use harness::{TestHarness, TestHarnessBuilder, inbound};
pub use mock_channel::MockChannel;
pub use mock_provider::{DEFAULT_MOCK_REPLY, MockProvider};
pub use mock_skill::MockSkill;
pub use mock_store::MockStore;
