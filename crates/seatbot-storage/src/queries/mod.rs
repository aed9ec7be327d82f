// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over [`crate::Database`].

pub mod inventory;
pub mod tenants;
