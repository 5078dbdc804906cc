// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod allocation;
mod apply;
mod cache;
mod collaborators;
mod command;
mod error;
mod payment;
mod state;

#[cfg(test)]
mod tests;

pub use allocation::{TicketRequest, check_special_price};
pub use apply::apply;
pub use cache::ExpiringCache;
pub use collaborators::{
    Attachment, Clock, DynamicDiscount, ExtensionHooks, ManualClock, NoopExtensionHooks,
    NotificationContext, NotificationSink, SystemClock,
};
pub use command::Command;
pub use error::CoreError;
pub use payment::{
    Capability, PaymentContext, PaymentProvider, PaymentResult, PaymentSpecification,
    TransactionInit, WebhookPayload, WebhookStatus,
};
pub use state::{ReservationState, TransitionResult};
