// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for the persistence layer.
//!
//! ## Module Organization
//!
//! - `events` — Events and ticket categories
//! - `tickets` — Ticket inventory and allocation locks
//! - `reservations` — Reservations and promo code usage counts
//! - `promo_codes` — Promo codes and access tokens
//! - `waiting_queue` — Waiting queue subscriptions
//! - `allowlist` — Attendee groups, links and acquisitions
//! - `billing` — Billing documents and invoice sequences
//! - `payments` — Transactions and additional services
//! - `jobs` — Admin job queue
//! - `audit` — Audit timeline
//!
//! ## Backend-Specific Functions
//!
//! Every query exists in monomorphic `_sqlite` and `_mysql` versions. Most
//! are generated by `backend_fn!`; the `lock_*` pairs are written by hand
//! because only `MySQL` takes row locks. `Store` dispatches to the version
//! matching the active connection.

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
