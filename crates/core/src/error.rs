// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use alfio_domain::{DomainError, ReservationStatus};
use thiserror::Error;

/// Business errors raised by the reservation engine.
///
/// Every variant maps to a stable error code through [`CoreError::error_code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Fewer seats than requested could be claimed.
    #[error("Not enough tickets available")]
    NotEnoughTickets,
    /// The category is restricted and no access token was supplied.
    #[error("Category {category_id} requires an access token")]
    MissingSpecialPriceToken {
        /// The restricted category.
        category_id: i64,
    },
    /// The access token is unknown, already used or bound to another category.
    #[error("Access token '{code}' is not valid")]
    InvalidSpecialPriceToken {
        /// The token as supplied.
        code: String,
    },
    /// The promo code usage cap would be exceeded.
    #[error("Promo code usage limit exceeded")]
    TooManyTicketsForDiscountCode,
    /// No active payment method is available for the selected categories.
    #[error("No payment method available for this reservation")]
    CannotProceedWithPayment,
    /// The reservation is not in a status that allows the operation.
    #[error("Reservation {reservation_id} is in incompatible state {status}")]
    IncompatibleState {
        /// The reservation.
        reservation_id: String,
        /// Its current status.
        status: ReservationStatus,
    },
    /// The promo code is unknown or outside its validity window.
    #[error("Promo code '{code}' is not valid")]
    InvalidPromoCode {
        /// The code as supplied.
        code: String,
    },
    /// A referenced entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// The kind of entity.
        entity: &'static str,
        /// The identifier looked up.
        id: String,
    },
    /// A domain rule was violated.
    #[error("Domain violation: {0}")]
    DomainViolation(#[from] DomainError),
}

impl CoreError {
    /// Stable code exposed to callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotEnoughTickets => "STEP_1_NOT_ENOUGH_TICKETS",
            Self::MissingSpecialPriceToken { .. } => "STEP_1_ACCESS_RESTRICTED",
            Self::InvalidSpecialPriceToken { .. } => "STEP_1_CODE_NOT_FOUND",
            Self::TooManyTicketsForDiscountCode => "STEP_2_DISCOUNT_CODE_USAGE_EXCEEDED",
            Self::CannotProceedWithPayment => "STEP_2_NO_PAYMENT_METHOD",
            Self::IncompatibleState { .. } => "RESERVATION_INCOMPATIBLE_STATE",
            Self::InvalidPromoCode { .. } => "STEP_1_CODE_EXPIRED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DomainViolation(_) => "VALIDATION_ERROR",
        }
    }

    /// Builds an `IncompatibleState` error.
    #[must_use]
    pub fn incompatible(reservation_id: &str, status: ReservationStatus) -> Self {
        Self::IncompatibleState {
            reservation_id: reservation_id.to_string(),
            status,
        }
    }

    /// Builds a `NotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
