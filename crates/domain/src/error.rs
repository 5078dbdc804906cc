// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A persisted enum value could not be recognized.
    #[error("Unknown {kind} value '{value}'")]
    UnknownValue {
        /// The enum being parsed.
        kind: &'static str,
        /// The raw value.
        value: String,
    },
    /// A reservation status transition is not permitted by the lifecycle.
    #[error("Invalid reservation status transition from {from} to {to}: {reason}")]
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was refused.
        reason: String,
    },
    /// A requested ticket quantity is zero or otherwise unusable.
    #[error("Invalid ticket quantity: {0}")]
    InvalidQuantity(u32),
    /// A monetary amount is negative where it must not be.
    #[error("Invalid amount for {field}: {amount}")]
    InvalidAmount {
        /// The field holding the amount.
        field: &'static str,
        /// The offending amount in minor units.
        amount: i64,
    },
    /// A VAT percentage could not be parsed.
    #[error("Invalid VAT rate: {0}")]
    InvalidVatRate(String),
    /// The event declares an unknown time zone.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
    /// A working-period configuration is inconsistent.
    #[error("Invalid working period: {reason}")]
    InvalidWorkingPeriod {
        /// Description of the problem.
        reason: String,
    },
    /// Date arithmetic produced a value outside the supported range.
    #[error("Date arithmetic overflow while {operation}")]
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// A promo code is not valid at the given instant.
    #[error("Promo code '{code}' is not valid at this time")]
    PromoCodeNotActive {
        /// The code.
        code: String,
    },
    /// A promo code does not apply to the requested category.
    #[error("Promo code '{code}' does not apply to category {category_id}")]
    PromoCodeNotApplicable {
        /// The code.
        code: String,
        /// The category the code was used for.
        category_id: i64,
    },
    /// An e-mail address is empty or malformed.
    #[error("Invalid e-mail address: '{0}'")]
    InvalidEmail(String),
    /// The category is disabled, outside its sale window or foreign to the event.
    #[error("Category {category_id} is not on sale")]
    CategoryNotOnSale {
        /// The category.
        category_id: i64,
    },
    /// The event does not accept waiting-queue subscriptions.
    #[error("Event {event_id} has no open waiting queue")]
    WaitingQueueClosed {
        /// The event.
        event_id: i64,
    },
    /// The sum of bounded categories exceeds the event capacity.
    #[error("Bounded categories need {requested} seats but the event has {available}")]
    CapacityExceeded {
        /// Seats requested by bounded categories.
        requested: u32,
        /// Seats of the event.
        available: u32,
    },
}
