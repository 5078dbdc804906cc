// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reservation lifecycle states and the transitions between them.
//!
//! The only backwards edge is the re-transition to `PENDING` after a
//! failed or abandoned payment attempt. Everything else moves forward
//! towards one of the terminal states.

use crate::error::DomainError;
use crate::types::string_enum;

string_enum! {
    /// Status of a ticket reservation.
    pub enum ReservationStatus {
        /// Seats are held and the buyer has not paid yet.
        Pending => "PENDING",
        /// A payment attempt is in progress.
        InPayment => "IN_PAYMENT",
        /// The payment was handed over to an external provider.
        ExternalProcessingPayment => "EXTERNAL_PROCESSING_PAYMENT",
        /// The external provider accepted the payment and will confirm it later.
        WaitingExternalConfirmation => "WAITING_EXTERNAL_CONFIRMATION",
        /// Waiting for a bank transfer.
        OfflinePayment => "OFFLINE_PAYMENT",
        /// Bank transfer accepted after the event, tickets already usable.
        DeferredOfflinePayment => "DEFERRED_OFFLINE_PAYMENT",
        /// Paid and confirmed.
        Complete => "COMPLETE",
        /// A payment attempt never came back and needs manual review.
        Stuck => "STUCK",
        /// Cancelled, expired or released.
        Cancelled => "CANCELLED",
        /// A credit note cancelled the invoice of a completed reservation.
        CreditNoteIssued => "CREDIT_NOTE_ISSUED",
    }
}

impl ReservationStatus {
    /// Returns true if nothing can follow this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::CreditNoteIssued)
    }

    /// Returns true if a payment attempt is underway.
    #[must_use]
    pub const fn is_payment_in_progress(&self) -> bool {
        matches!(
            self,
            Self::InPayment | Self::ExternalProcessingPayment | Self::WaitingExternalConfirmation
        )
    }

    /// Statuses whose tickets count against promo-code usage caps.
    #[must_use]
    pub const fn counts_for_promo_usage(&self) -> bool {
        matches!(
            self,
            Self::InPayment
                | Self::ExternalProcessingPayment
                | Self::WaitingExternalConfirmation
                | Self::OfflinePayment
                | Self::DeferredOfflinePayment
                | Self::Complete
                | Self::Stuck
        )
    }

    /// Statuses the finalizer accepts in its first phase.
    #[must_use]
    pub const fn is_finalizable(&self) -> bool {
        matches!(
            self,
            Self::InPayment
                | Self::ExternalProcessingPayment
                | Self::WaitingExternalConfirmation
                | Self::OfflinePayment
                | Self::DeferredOfflinePayment
                | Self::Stuck
                | Self::Complete
        )
    }

    /// Statuses an organizer or the expiry sweep can cancel.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::OfflinePayment | Self::DeferredOfflinePayment | Self::Stuck
        )
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid = match self {
            Self::Pending => matches!(
                new_status,
                Self::InPayment | Self::ExternalProcessingPayment | Self::Cancelled
            ),
            Self::InPayment => matches!(
                new_status,
                Self::Pending
                    | Self::ExternalProcessingPayment
                    | Self::OfflinePayment
                    | Self::DeferredOfflinePayment
                    | Self::Complete
                    | Self::Stuck
            ),
            Self::ExternalProcessingPayment => matches!(
                new_status,
                Self::Pending | Self::WaitingExternalConfirmation | Self::Complete | Self::Stuck
            ),
            Self::WaitingExternalConfirmation => {
                matches!(new_status, Self::Pending | Self::Complete | Self::Stuck)
            }
            Self::OfflinePayment | Self::DeferredOfflinePayment | Self::Stuck => {
                matches!(new_status, Self::Complete | Self::Cancelled)
            }
            // releasing the last ticket of a completed reservation cancels it
            Self::Complete => matches!(new_status, Self::CreditNoteIssued | Self::Cancelled),
            Self::Cancelled | Self::CreditNoteIssued => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by reservation lifecycle".to_string(),
            })
        }
    }
}
