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
    clippy::all
)]

use alfio_domain::ReservationStatus;

/// The kind of entity performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    /// The buyer, through the public flow.
    Customer,
    /// An organizer or administrator.
    Admin,
    /// A background sweep or job.
    System,
    /// A payment provider callback.
    PaymentProvider,
}

impl ActorKind {
    /// Returns the persisted text form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::System => "system",
            Self::PaymentProvider => "payment_provider",
        }
    }

    /// Parses the persisted text form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        [Self::Customer, Self::Admin, Self::System, Self::PaymentProvider]
            .into_iter()
            .find(|kind| kind.as_str() == value)
    }
}

/// Represents the entity performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The kind of actor.
    pub kind: ActorKind,
}

impl Actor {
    /// Creates a new Actor.
    #[must_use]
    pub const fn new(id: String, kind: ActorKind) -> Self {
        Self { id, kind }
    }

    /// The actor used by periodic sweeps and admin jobs.
    #[must_use]
    pub fn system() -> Self {
        Self::new(String::from("system"), ActorKind::System)
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID, job ID).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// What happened to a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventType {
    ReservationCreate,
    ReservationComplete,
    ReservationOfflinePayment,
    ReservationOfflinePaymentConfirmed,
    PaymentAttempt,
    PaymentFailed,
    ExternalPaymentStarted,
    ExternalPaymentConfirmed,
    InvoiceNumberAssigned,
    CancelReservation,
    CancelReservationExpired,
    ReservationStuck,
    CreditNoteIssued,
    TicketReleased,
    WaitingQueueOffer,
}

impl AuditEventType {
    /// Every event type.
    pub const ALL: &'static [Self] = &[
        Self::ReservationCreate,
        Self::ReservationComplete,
        Self::ReservationOfflinePayment,
        Self::ReservationOfflinePaymentConfirmed,
        Self::PaymentAttempt,
        Self::PaymentFailed,
        Self::ExternalPaymentStarted,
        Self::ExternalPaymentConfirmed,
        Self::InvoiceNumberAssigned,
        Self::CancelReservation,
        Self::CancelReservationExpired,
        Self::ReservationStuck,
        Self::CreditNoteIssued,
        Self::TicketReleased,
        Self::WaitingQueueOffer,
    ];

    /// Parses the persisted text form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }

    /// Returns the persisted text form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReservationCreate => "RESERVATION_CREATE",
            Self::ReservationComplete => "RESERVATION_COMPLETE",
            Self::ReservationOfflinePayment => "RESERVATION_OFFLINE_PAYMENT",
            Self::ReservationOfflinePaymentConfirmed => "RESERVATION_OFFLINE_PAYMENT_CONFIRMED",
            Self::PaymentAttempt => "PAYMENT_ATTEMPT",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::ExternalPaymentStarted => "EXTERNAL_PAYMENT_STARTED",
            Self::ExternalPaymentConfirmed => "EXTERNAL_PAYMENT_CONFIRMED",
            Self::InvoiceNumberAssigned => "INVOICE_NUMBER_ASSIGNED",
            Self::CancelReservation => "CANCEL_RESERVATION",
            Self::CancelReservationExpired => "CANCEL_RESERVATION_EXPIRED",
            Self::ReservationStuck => "RESERVATION_STUCK",
            Self::CreditNoteIssued => "CREDIT_NOTE_ISSUED",
            Self::TicketReleased => "TICKET_RELEASED",
            Self::WaitingQueueOffer => "WAITING_QUEUE_OFFER",
        }
    }
}

/// The reservation status captured before or after a transition.
///
/// `None` is used before a reservation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub status: Option<ReservationStatus>,
}

impl StateSnapshot {
    /// Creates a snapshot of `status`.
    #[must_use]
    pub const fn of(status: ReservationStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    /// Snapshot of a reservation that did not exist yet.
    #[must_use]
    pub const fn none() -> Self {
        Self { status: None }
    }

    /// Persisted text form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match &self.status {
            Some(status) => status.as_str(),
            None => "NONE",
        }
    }

    /// Parses the persisted text form.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is neither `NONE` nor a reservation status.
    pub fn parse(value: &str) -> Result<Self, alfio_domain::DomainError> {
        if value == "NONE" {
            return Ok(Self::none());
        }
        value.parse::<ReservationStatus>().map(Self::of)
    }
}

/// An immutable audit event representing a reservation transition.
///
/// Every successful reservation transition produces exactly one audit
/// event, written in the same transaction as the change it records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The reservation the event belongs to.
    pub reservation_id: String,
    /// The event the reservation belongs to.
    pub event_id: i64,
    /// What happened.
    pub event_type: AuditEventType,
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The state before the transition.
    pub before: StateSnapshot,
    /// The state after the transition.
    pub after: StateSnapshot,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `reservation_id` - The reservation that changed
    /// * `event_id` - The reservation's event
    /// * `event_type` - What happened
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `before` - The state before the transition
    /// * `after` - The state after the transition
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        reservation_id: String,
        event_id: i64,
        event_type: AuditEventType,
        actor: Actor,
        cause: Cause,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            reservation_id,
            event_id,
            event_type,
            actor,
            cause,
            before,
            after,
        }
    }
}
