// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod billing_tests;
mod concurrency_tests;
mod finalizer_tests;
mod organizer_tests;

use std::sync::{Arc, Mutex};

use alfio::{
    Attachment, DynamicDiscount, ExtensionHooks, ManualClock, NotificationContext,
    NotificationSink, PaymentProvider, PaymentResult,
};
use alfio_audit::{Actor, ActorKind};
use alfio_domain::{
    CategoryAccessType, CategoryStatus, Event, EventFormat, PaymentMethod, PaymentProxy,
    Reservation, Ticket, TicketCategory, VatRate, VatStatus,
};
use alfio_persistence::Persistence;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    CreatedEvent, PaymentRequest, ReservationRequest, ReservationSettings, ServiceContext,
    ServiceError, TicketLine, TicketReservationManager, create_event,
};

/// A Monday morning, well before the event.
pub const NOW: OffsetDateTime = datetime!(2026-03-02 10:00 UTC);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub kind: String,
    pub reservation_id: Option<String>,
    pub recipient: String,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.sent().into_iter().map(|mail| mail.kind).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn send_simple_email(
        &self,
        context: &NotificationContext,
        reservation_id: Option<&str>,
        recipient: &str,
        _subject: &str,
        body: &dyn Fn() -> String,
        _attachments: Vec<Attachment>,
    ) {
        assert!(!body().is_empty());
        self.sent.lock().unwrap().push(SentEmail {
            kind: context.kind.clone(),
            reservation_id: reservation_id.map(ToString::to_string),
            recipient: recipient.to_string(),
        });
    }
}

#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub confirmed: Mutex<Vec<String>>,
    pub expired: Mutex<Vec<String>>,
    pub cancelled: Mutex<Vec<String>>,
    pub stuck: Mutex<Vec<String>>,
    pub assigned: Mutex<Vec<i64>>,
    pub invoice_number: Option<String>,
    pub dynamic_discount: Option<DynamicDiscount>,
}

impl ExtensionHooks for RecordingHooks {
    fn reservation_confirmed(&self, reservation: &Reservation) {
        self.confirmed.lock().unwrap().push(reservation.id.clone());
    }

    fn reservations_expired(&self, _event_id: i64, reservation_ids: &[String]) {
        self.expired.lock().unwrap().extend_from_slice(reservation_ids);
    }

    fn reservations_cancelled(&self, _event_id: i64, reservation_ids: &[String]) {
        self.cancelled.lock().unwrap().extend_from_slice(reservation_ids);
    }

    fn reservations_stuck(&self, _event_id: i64, reservation_ids: &[String]) {
        self.stuck.lock().unwrap().extend_from_slice(reservation_ids);
    }

    fn ticket_assigned(&self, ticket: &Ticket) {
        self.assigned.lock().unwrap().push(ticket.id);
    }

    fn invoice_number(&self, _reservation: &Reservation) -> Option<String> {
        self.invoice_number.clone()
    }

    fn dynamic_discount(
        &self,
        _event_id: i64,
        _category_quantities: &[(i64, u32)],
    ) -> Option<DynamicDiscount> {
        self.dynamic_discount.clone()
    }
}

/// A manager over an in-memory store with a frozen clock.
pub struct Harness {
    pub persistence: Persistence,
    pub manager: TicketReservationManager,
    pub clock: Arc<ManualClock>,
    pub mails: Arc<RecordingSink>,
    pub hooks: Arc<RecordingHooks>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(ReservationSettings::default(), RecordingHooks::default(), approving_card())
    }

    pub fn with_settings(settings: ReservationSettings) -> Self {
        Self::build(settings, RecordingHooks::default(), approving_card())
    }

    pub fn with_hooks(hooks: RecordingHooks) -> Self {
        Self::build(ReservationSettings::default(), hooks, approving_card())
    }

    pub fn with_card(card: PaymentProvider) -> Self {
        Self::build(ReservationSettings::default(), RecordingHooks::default(), card)
    }

    fn build(settings: ReservationSettings, hooks: RecordingHooks, card: PaymentProvider) -> Self {
        let clock = Arc::new(ManualClock::new(NOW));
        let mails = Arc::new(RecordingSink::default());
        let hooks = Arc::new(hooks);
        let context = ServiceContext::new(settings)
            .with_clock(clock.clone())
            .with_notifications(mails.clone())
            .with_hooks(hooks.clone());
        let mut manager = TicketReservationManager::new(context);
        manager.payments_mut().register(card);
        Self {
            persistence: Persistence::new_in_memory().unwrap(),
            manager,
            clock,
            mails,
            hooks,
        }
    }

    pub fn setup(&mut self, event: &Event, categories: &[TicketCategory]) -> CreatedEvent {
        create_event(&mut self.persistence, event, categories).unwrap()
    }

    /// One bounded category of `seats` tickets at 100.00.
    pub fn setup_simple(&mut self, seats: u32) -> (i64, i64) {
        let created = self.setup(&test_event(seats), &[category("Standard", true, seats, 10_000)]);
        (created.event_id, created.category_ids[0])
    }

    pub fn reserve(&mut self, event_id: i64, lines: Vec<TicketLine>) -> Result<String, ServiceError> {
        self.manager
            .create_ticket_reservation(&mut self.persistence, &request(event_id, lines), &customer())
    }

    pub fn pay(&mut self, reservation_id: &str, payment: &PaymentRequest) -> PaymentResult {
        self.manager
            .perform_payment(&mut self.persistence, reservation_id, payment, &customer())
            .unwrap()
    }

    pub fn reservation(&mut self, reservation_id: &str) -> Reservation {
        self.persistence.store().reservation(reservation_id).unwrap()
    }

    pub fn tickets(&mut self, reservation_id: &str) -> Vec<Ticket> {
        self.persistence
            .store()
            .tickets_by_reservation(reservation_id)
            .unwrap()
    }

    /// Stores a buyer e-mail so that confirmations are sent.
    pub fn set_customer(&mut self, reservation_id: &str, email: &str) {
        let mut store = self.persistence.store();
        let mut reservation = store.reservation(reservation_id).unwrap();
        reservation.customer.full_name = Some(String::from("Ada Lovelace"));
        reservation.customer.email = Some(email.to_string());
        store.update_reservation(&reservation).unwrap();
    }
}

pub fn customer() -> Actor {
    Actor::new(String::from("buyer@example.org"), ActorKind::Customer)
}

pub fn admin() -> Actor {
    Actor::new(String::from("admin"), ActorKind::Admin)
}

pub fn test_event(seats: u32) -> Event {
    Event {
        id: 0,
        short_name: String::from("rustconf-2026"),
        organization_id: 1,
        format: EventFormat::InPerson,
        currency: String::from("CHF"),
        available_seats: seats,
        vat_status: VatStatus::Included,
        vat_rate: VatRate::from_basis_points(770),
        time_zone: String::from("Europe/Zurich"),
        begin: datetime!(2026-06-01 09:00 UTC),
        end: datetime!(2026-06-02 18:00 UTC),
        allowed_payment_proxies: vec![PaymentProxy::Stripe, PaymentProxy::Offline],
        waiting_queue_enabled: false,
        pre_registration_enabled: false,
        organizer_country: Some(String::from("CH")),
    }
}

pub fn category(name: &str, bounded: bool, max_tickets: u32, src_price: i64) -> TicketCategory {
    TicketCategory {
        id: 0,
        event_id: 0,
        name: name.to_string(),
        bounded,
        max_tickets: if bounded { max_tickets } else { 0 },
        src_price,
        access_restricted: false,
        inception: datetime!(2026-01-01 00:00 UTC),
        expiration: datetime!(2026-05-31 00:00 UTC),
        ordinal: 0,
        access_type: CategoryAccessType::Inherit,
        status: CategoryStatus::Active,
        blacklisted_payment_methods: vec![],
    }
}

pub fn request(event_id: i64, lines: Vec<TicketLine>) -> ReservationRequest {
    ReservationRequest {
        event_id,
        lines,
        additional_services: vec![],
        promo_code: None,
        language: String::from("en"),
    }
}

pub fn card() -> PaymentRequest {
    PaymentRequest {
        proxy: PaymentProxy::Stripe,
        method: PaymentMethod::CreditCard,
        gateway_token: Some(String::from("tok_visa")),
    }
}

pub fn bank_transfer() -> PaymentRequest {
    PaymentRequest {
        proxy: PaymentProxy::Offline,
        method: PaymentMethod::BankTransfer,
        gateway_token: None,
    }
}

pub fn approving_card() -> PaymentProvider {
    card_provider(|spec| PaymentResult::Successful {
        gateway_id: format!("ch_{}", spec.reservation_id),
    })
}

pub fn card_provider(
    pay: impl Fn(&alfio::PaymentSpecification) -> PaymentResult + Send + Sync + 'static,
) -> PaymentProvider {
    PaymentProvider::new("stripe", PaymentProxy::Stripe, vec![PaymentMethod::CreditCard], pay)
}
