// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use alfio_audit::{AuditEvent, StateSnapshot};
use alfio_domain::{PaymentProxy, Reservation, ReservationStatus};

/// The part of a reservation the state machine reasons about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationState {
    /// The reservation identifier.
    pub reservation_id: String,
    /// The reservation's event.
    pub event_id: i64,
    /// Current lifecycle status.
    pub status: ReservationStatus,
    /// Payment channel chosen at checkout.
    pub payment_proxy: Option<PaymentProxy>,
    /// Set by the first finalization phase.
    pub ready_for_confirmation: bool,
    /// Set by the second finalization phase.
    pub finalized: bool,
}

impl ReservationState {
    /// Creates the state of a freshly created reservation.
    #[must_use]
    pub const fn pending(reservation_id: String, event_id: i64) -> Self {
        Self {
            reservation_id,
            event_id,
            status: ReservationStatus::Pending,
            payment_proxy: None,
            ready_for_confirmation: false,
            finalized: false,
        }
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub const fn to_snapshot(&self) -> StateSnapshot {
        StateSnapshot::of(self.status)
    }
}

impl From<&Reservation> for ReservationState {
    fn from(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.id.clone(),
            event_id: reservation.event_id,
            status: reservation.status,
            payment_proxy: reservation.payment_proxy,
            ready_for_confirmation: reservation.ready_for_confirmation,
            finalized: reservation.finalized,
        }
    }
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub new_state: ReservationState,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}
