// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled outbound messages.

use chrono::{DateTime, Duration, Utc};
use seatbot_core::{ScheduledMessage, SeatbotError};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Inactive messages are kept this long after their last send.
const RETAIN_AFTER_LAST_SEND_HOURS: i64 = 24;

/// Admin-created messages waiting for the scheduler tick.
#[derive(Default)]
pub struct ScheduleStore {
    messages: Mutex<Vec<ScheduledMessage>>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self) -> Vec<ScheduledMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn create(
        &self,
        chat_id: &str,
        text: &str,
        run_at: DateTime<Utc>,
        recurring: bool,
        interval_ms: u64,
    ) -> Result<ScheduledMessage, SeatbotError> {
        if chat_id.trim().is_empty() {
            return Err(SeatbotError::InvalidInput("chat id must not be empty".into()));
        }
        if text.trim().is_empty() {
            return Err(SeatbotError::InvalidInput("text must not be empty".into()));
        }
        if recurring && interval_ms == 0 {
            return Err(SeatbotError::InvalidInput(
                "recurring messages need a positive interval".into(),
            ));
        }

        let message = ScheduledMessage {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.trim().to_string(),
            text: text.to_string(),
            next_run_at: run_at,
            recurring,
            interval_ms: if recurring { interval_ms } else { 0 },
            active: true,
            send_count: 0,
            last_sent_at: None,
            created_at: Utc::now(),
        };
        self.messages.lock().await.push(message.clone());
        info!(id = %message.id, chat_id = %message.chat_id, recurring, "scheduled message created");
        Ok(message)
    }

    pub async fn delete(&self, id: &str) -> Result<(), SeatbotError> {
        let mut messages = self.messages.lock().await;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        if messages.len() == before {
            return Err(SeatbotError::schedule_not_found(id));
        }
        Ok(())
    }

    /// Active messages whose run time has arrived.
    pub async fn due(&self, now: DateTime<Utc>) -> Vec<ScheduledMessage> {
        self.messages
            .lock()
            .await
            .iter()
            .filter(|m| m.active && m.next_run_at <= now)
            .cloned()
            .collect()
    }

    /// Records a delivery. Recurring messages move to their next slot after
    /// `now`; one-shot messages deactivate.
    pub async fn mark_sent(&self, id: &str, now: DateTime<Utc>) -> Result<(), SeatbotError> {
        let mut messages = self.messages.lock().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| SeatbotError::schedule_not_found(id))?;

        message.send_count += 1;
        message.last_sent_at = Some(now);

        if !message.recurring {
            message.active = false;
            return Ok(());
        }

        let step = i64::try_from(message.interval_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .and_then(Duration::try_milliseconds);
        while message.active && message.next_run_at <= now {
            match step.and_then(|step| message.next_run_at.checked_add_signed(step)) {
                Some(next) => message.next_run_at = next,
                None => message.active = false,
            }
        }
        Ok(())
    }

    /// Drops inactive messages last sent more than a day before `now`.
    pub async fn purge(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::hours(RETAIN_AFTER_LAST_SEND_HOURS);
        let mut messages = self.messages.lock().await;
        let before = messages.len();
        messages.retain(|m| m.active || m.last_sent_at.is_none_or(|sent| sent > cutoff));
        let purged = before - messages.len();
        if purged > 0 {
            debug!(purged, "purged finished scheduled messages");
        }
        purged
    }
}
