// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic mutation modules.
//!
//! This module contains all state-changing operations for the persistence layer.
//! Mutations use Diesel DSL exclusively, with `get_last_insert_rowid()` from the
//! `PersistenceBackend` trait as the only backend-specific helper.
//!
//! ## Module Organization
//!
//! - `events` — Events, categories and ticket inventory creation
//! - `tickets` — Ticket binding, pricing and release
//! - `reservations` — Reservation rows
//! - `promo_codes` — Access tokens and promo codes
//! - `waiting_queue` — Waiting queue subscriptions
//! - `allowlist` — Attendee groups and acquisitions
//! - `billing` — Billing documents and invoice sequences
//! - `payments` — Transactions and additional services
//! - `jobs` — Admin job queue
//! - `audit` — Audit event persistence

pub mod allowlist;
pub mod audit;
pub mod billing;
pub mod events;
pub mod jobs;
pub mod payments;
pub mod promo_codes;
pub mod reservations;
pub mod tickets;
pub mod waiting_queue;

pub use allowlist::*;
pub use audit::*;
pub use billing::*;
pub use events::*;
pub use jobs::*;
pub use payments::*;
pub use promo_codes::*;
pub use reservations::*;
pub use tickets::*;
pub use waiting_queue::*;
