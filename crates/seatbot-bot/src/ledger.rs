// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded in-memory order ledger.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use seatbot_core::{Order, OrderStatus, SeatbotError};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default number of orders retained.
pub const DEFAULT_LEDGER_CAPACITY: usize = 500;

/// Order fields known before the ledger assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub platform: String,
    pub customer_name: String,
    pub phone_number: String,
    pub quantity: u32,
    pub source_chat_id: String,
}

/// Orders captured from model replies, newest last.
///
/// Ids come from a process-wide counter and are never reused, even after the
/// oldest entries fall off the front.
pub struct OrderLedger {
    capacity: usize,
    next_id: AtomicU64,
    orders: Mutex<VecDeque<Order>>,
}

impl OrderLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_id: AtomicU64::new(1),
            orders: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Assigns an id, stamps the order pending and appends it.
    pub async fn record(&self, draft: OrderDraft) -> Order {
        let order = Order {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            platform: draft.platform,
            customer_name: draft.customer_name,
            phone_number: draft.phone_number,
            quantity: draft.quantity.max(1),
            status: OrderStatus::Pending,
            source_chat_id: draft.source_chat_id,
            created_at: Utc::now(),
        };

        let mut orders = self.orders.lock().await;
        orders.push_back(order.clone());
        while orders.len() > self.capacity {
            if let Some(dropped) = orders.pop_front() {
                debug!(order_id = dropped.id, "ledger full, dropped oldest order");
            }
        }

        info!(
            order_id = order.id,
            platform = %order.platform,
            quantity = order.quantity,
            chat_id = %order.source_chat_id,
            "order recorded"
        );
        order
    }

    /// All retained orders, oldest first.
    pub async fn list(&self) -> Vec<Order> {
        self.orders.lock().await.iter().cloned().collect()
    }

    pub async fn get(&self, id: u64) -> Result<Order, SeatbotError> {
        self.orders
            .lock()
            .await
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| SeatbotError::order_not_found(id))
    }

    pub async fn update_status(&self, id: u64, status: OrderStatus) -> Result<Order, SeatbotError> {
        let mut orders = self.orders.lock().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| SeatbotError::order_not_found(id))?;
        order.status = status;
        Ok(order.clone())
    }

    pub async fn remove(&self, id: u64) -> Result<Order, SeatbotError> {
        let mut orders = self.orders.lock().await;
        let index = orders
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| SeatbotError::order_not_found(id))?;
        orders
            .remove(index)
            .ok_or_else(|| SeatbotError::order_not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.orders.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.lock().await.is_empty()
    }
}

impl Default for OrderLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_CAPACITY)
    }
}
