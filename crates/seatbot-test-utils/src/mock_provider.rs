// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted outcomes and
//! records every request it receives.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use seatbot_core::{
    AdapterType, GenerationRequest, HealthStatus, PluginAdapter, ProviderAdapter, SeatbotError,
};

/// Text returned when no outcome is scripted.
pub const DEFAULT_MOCK_REPLY: &str = "mock response";

enum Scripted {
    Reply(String),
    Error(String),
    Hang,
}

/// A mock LLM provider that plays back scripted outcomes in FIFO order.
///
/// When the script is empty, [`DEFAULT_MOCK_REPLY`] is returned.
pub struct MockProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock provider pre-loaded with replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Scripted::Reply).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn push_reply(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Reply(text.into()));
    }

    /// Next call fails with a provider error, as an API outage would.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Error(message.into()));
    }

    /// Next call never completes.
    pub async fn hang_next(&self) {
        self.script.lock().await.push_back(Scripted::Hang);
    }

    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().await.last().cloned()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SeatbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SeatbotError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, SeatbotError> {
        self.requests.lock().await.push(request);
        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Error(message)) => Err(SeatbotError::Provider {
                message,
                source: None,
            }),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Ok(DEFAULT_MOCK_REPLY.to_string()),
        }
    }
}
