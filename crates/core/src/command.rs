// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use alfio_domain::PaymentProxy;

/// A command represents a requested reservation transition as data only.
///
/// Commands are the only way to request status changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Record the creation of a reservation.
    Create,
    /// Begin a payment attempt through `proxy`.
    StartPayment {
        /// The payment channel.
        proxy: PaymentProxy,
    },
    /// Hand the payment over to an external provider.
    StartExternalPayment,
    /// The provider accepted the payment but confirms it asynchronously.
    AwaitExternalConfirmation,
    /// Return to `PENDING` after a failed or abandoned payment.
    RevertToPending {
        /// Why the attempt failed.
        reason: String,
    },
    /// First finalization phase completed.
    MarkReadyForConfirmation {
        /// The invoice number assigned, if any.
        invoice_number: Option<String>,
    },
    /// Second finalization phase: confirm the reservation.
    Finalize {
        /// The payment channel that settled the reservation.
        proxy: PaymentProxy,
        /// Bank transfer accepted after tickets are delivered.
        deferred: bool,
    },
    /// A bank transfer or manual payment has been confirmed.
    ConfirmOfflinePayment,
    /// Cancel the reservation.
    Cancel {
        /// Cancelled by the expiry sweep rather than by a person.
        expired: bool,
    },
    /// A payment attempt never came back.
    MarkStuck,
    /// A credit note cancelled the invoice.
    IssueCreditNote,
    /// A ticket of a completed reservation has been released.
    ReleaseTicket {
        /// Whether it was the last ticket of the reservation.
        last: bool,
    },
}

impl Command {
    /// Name of the command, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::StartPayment { .. } => "StartPayment",
            Self::StartExternalPayment => "StartExternalPayment",
            Self::AwaitExternalConfirmation => "AwaitExternalConfirmation",
            Self::RevertToPending { .. } => "RevertToPending",
            Self::MarkReadyForConfirmation { .. } => "MarkReadyForConfirmation",
            Self::Finalize { .. } => "Finalize",
            Self::ConfirmOfflinePayment => "ConfirmOfflinePayment",
            Self::Cancel { .. } => "Cancel",
            Self::MarkStuck => "MarkStuck",
            Self::IssueCreditNote => "IssueCreditNote",
            Self::ReleaseTicket { .. } => "ReleaseTicket",
        }
    }
}
