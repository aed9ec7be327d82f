// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant value cache with a freshness window and stale fallback.
//!
//! Clock reads go through `tokio::time::Instant` so paused-time tests can
//! advance past the TTL without sleeping.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use seatbot_core::SeatbotError;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

struct Slot<T> {
    value: T,
    fetched_at: Instant,
}

/// Keyed cache whose entries are fresh for `ttl` after they were stored.
///
/// Stale entries are kept as the fallback for failed refreshes.
pub struct TimedCache<T> {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if it is younger than the TTL.
    pub async fn fresh(&self, key: &str) -> Option<T> {
        let slots = self.slots.lock().await;
        slots
            .get(key)
            .filter(|slot| slot.fetched_at.elapsed() < self.ttl)
            .map(|slot| slot.value.clone())
    }

    /// The cached value regardless of age.
    pub async fn last(&self, key: &str) -> Option<T> {
        self.slots.lock().await.get(key).map(|slot| slot.value.clone())
    }

    /// Stores `value` and restarts its freshness window.
    pub async fn set(&self, key: &str, value: T) {
        self.slots.lock().await.insert(
            key.to_string(),
            Slot {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn is_fresh(&self, key: &str) -> bool {
        self.fresh(key).await.is_some()
    }

    /// Returns the fresh value, or runs `fetch` and caches its result.
    ///
    /// When `fetch` fails the last known value is returned (possibly `None`).
    /// The lock is not held while `fetch` runs.
    pub async fn get_or_refresh<F, Fut>(&self, key: &str, fetch: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SeatbotError>>,
    {
        if let Some(value) = self.fresh(key).await {
            return Some(value);
        }

        match fetch().await {
            Ok(value) => {
                debug!(key, "cache refreshed");
                self.set(key, value.clone()).await;
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "cache refresh failed, serving last known value");
                self.last(key).await
            }
        }
    }
}
