// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use crate::{
    AdminJobManager, FinalizeOutcome, FinalizePayload, JobRunSummary, ReservationSettings,
    TicketLine,
};
use alfio::CoreError;
use alfio_domain::{
    AdminJobStatus, BillingDocumentType, FINALIZE_RESERVATION_JOB, PaymentProxy,
    ReservationStatus, TicketStatus,
};
use time::Duration;

fn invoiced_reservation(h: &mut Harness, event_id: i64, category_id: i64) -> String {
    let id = h.reserve(event_id, vec![TicketLine::new(category_id, 1)]).unwrap();
    let mut store = h.persistence.store();
    let mut reservation = store.reservation(&id).unwrap();
    reservation.customer.email = Some(String::from("ada@example.org"));
    reservation.billing.company_name = Some(String::from("Analytical Engines Ltd"));
    reservation.billing.invoice_requested = true;
    store.update_reservation(&reservation).unwrap();
    id
}

/// Moves a reservation to EXTERNAL_PROCESSING_PAYMENT through a pending charge.
fn in_external_payment(h: &mut Harness) -> String {
    let (event_id, category_id) = h.setup_simple(5);
    let id = invoiced_reservation(h, event_id, category_id);
    let result = h.pay(&id, &card());
    assert!(matches!(result, alfio::PaymentResult::Pending { .. }));
    id
}

fn pending_card() -> alfio::PaymentProvider {
    card_provider(|spec| alfio::PaymentResult::Pending {
        gateway_id: format!("pi_{}", spec.reservation_id),
    })
}

#[test]
fn test_prepare_assigns_invoice_number_once() {
    let mut h = Harness::with_card(pending_card());
    let first = in_external_payment(&mut h);

    let prepared = h
        .manager
        .finalizer()
        .prepare(&mut h.persistence, &first, &Actor::system())
        .unwrap();
    assert!(prepared.ready_for_confirmation);
    assert_eq!(prepared.invoice_number.as_deref(), Some("INV-001"));

    let again = h
        .manager
        .finalizer()
        .prepare(&mut h.persistence, &first, &Actor::system())
        .unwrap();
    assert_eq!(again.invoice_number.as_deref(), Some("INV-001"));

    let event_id = prepared.event_id;
    let category_id = h.tickets(&first)[0].category_id.unwrap();
    let second = invoiced_reservation(&mut h, event_id, category_id);
    h.pay(&second, &card());
    let next = h
        .manager
        .finalizer()
        .prepare(&mut h.persistence, &second, &Actor::system())
        .unwrap();
    assert_eq!(next.invoice_number.as_deref(), Some("INV-002"));
}

#[test]
fn test_extension_overrides_invoice_number() {
    let mut h = Harness::with_hooks(RecordingHooks {
        invoice_number: Some(String::from("2026/ACME/7")),
        ..RecordingHooks::default()
    });
    let (event_id, category_id) = h.setup_simple(2);
    let id = invoiced_reservation(&mut h, event_id, category_id);

    assert!(h.pay(&id, &card()).is_successful());

    let reservation = h.reservation(&id);
    assert_eq!(reservation.invoice_number.as_deref(), Some("2026/ACME/7"));
    let invoice = h
        .persistence
        .store()
        .valid_billing_document(&id, BillingDocumentType::Invoice)
        .unwrap()
        .unwrap();
    assert_eq!(invoice.number, "2026/ACME/7");
}

#[test]
fn test_pending_reservation_cannot_be_finalized() {
    let mut h = Harness::new();
    let (event_id, category_id) = h.setup_simple(2);
    let id = h.reserve(event_id, vec![TicketLine::new(category_id, 1)]).unwrap();

    let result = h.manager.finalizer().finalize_reservation(
        &mut h.persistence,
        &id,
        PaymentProxy::Stripe,
        None,
        &Actor::system(),
    );
    assert_eq!(
        result,
        Err(crate::ServiceError::Core(CoreError::incompatible(
            &id,
            ReservationStatus::Pending
        )))
    );
    assert!(h.tickets(&id).iter().all(|t| t.status == TicketStatus::Pending));
}

#[test]
fn test_second_phase_failure_schedules_retry() {
    let mut h = Harness::with_settings(ReservationSettings {
        job_max_attempts: 2,
        ..ReservationSettings::default()
    });
    let mut broken = test_event(2);
    broken.time_zone = String::from("Mars/Olympus_Mons");
    let created = h.setup(&broken, &[category("Standard", true, 2, 10_000)]);
    let id = invoiced_reservation(&mut h, created.event_id, created.category_ids[0]);

    assert!(h.pay(&id, &bank_transfer()).is_successful());

    // phase 1 committed, phase 2 rolled back
    let reservation = h.reservation(&id);
    assert_eq!(reservation.status, ReservationStatus::InPayment);
    assert!(reservation.ready_for_confirmation);
    assert_eq!(reservation.invoice_number.as_deref(), Some("INV-001"));
    assert!(h.tickets(&id).iter().all(|t| t.status == TicketStatus::Pending));

    let jobs = h
        .persistence
        .store()
        .jobs_by_name(FINALIZE_RESERVATION_JOB)
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].execute_at, NOW + Duration::seconds(2));
    let payload: FinalizePayload = serde_json::from_value(jobs[0].payload.clone()).unwrap();
    assert_eq!(payload.reservation_id, id);
    assert_eq!(payload.proxy, PaymentProxy::Offline);

    // not due yet
    let summary = h.manager.process_admin_jobs(&mut h.persistence).unwrap();
    assert_eq!(summary, JobRunSummary::default());

    h.clock.advance(Duration::seconds(3));
    let summary = h.manager.process_admin_jobs(&mut h.persistence).unwrap();
    assert_eq!(summary.rescheduled, 1);
    let job = &h.persistence.store().jobs_by_name(FINALIZE_RESERVATION_JOB).unwrap()[0];
    assert_eq!(job.status, AdminJobStatus::Scheduled);
    assert_eq!(job.attempts, 1);
    assert!(job.last_error.is_some());

    h.clock.advance(Duration::seconds(3));
    let summary = h.manager.process_admin_jobs(&mut h.persistence).unwrap();
    assert_eq!(summary.failed, 1);
    let job = &h.persistence.store().jobs_by_name(FINALIZE_RESERVATION_JOB).unwrap()[0];
    assert_eq!(job.status, AdminJobStatus::Failed);

    // the invoice number survived every attempt
    assert_eq!(h.reservation(&id).invoice_number.as_deref(), Some("INV-001"));
}

#[test]
fn test_retry_job_completes_prepared_reservation() {
    let mut h = Harness::with_card(pending_card());
    let id = in_external_payment(&mut h);
    h.manager
        .finalizer()
        .prepare(&mut h.persistence, &id, &Actor::system())
        .unwrap();
    let payload = serde_json::to_value(FinalizePayload {
        reservation_id: id.clone(),
        proxy: PaymentProxy::Stripe,
        gateway_id: Some(String::from("pi_retry")),
    })
    .unwrap();
    h.persistence
        .transaction(|store| AdminJobManager::schedule(store, FINALIZE_RESERVATION_JOB, payload, NOW))
        .unwrap();

    let summary = h.manager.process_admin_jobs(&mut h.persistence).unwrap();
    assert_eq!(summary.executed, 1);

    let reservation = h.reservation(&id);
    assert_eq!(reservation.status, ReservationStatus::Complete);
    assert_eq!(reservation.invoice_number.as_deref(), Some("INV-001"));
    let transaction = h.persistence.store().transaction(&id).unwrap().unwrap();
    assert_eq!(transaction.gateway_transaction_id, "pi_retry");
    let job = &h.persistence.store().jobs_by_name(FINALIZE_RESERVATION_JOB).unwrap()[0];
    assert_eq!(job.status, AdminJobStatus::Executed);

    // a late duplicate leaves the reservation alone
    let outcome = h
        .manager
        .finalizer()
        .complete(&mut h.persistence, &id, PaymentProxy::Stripe, None, &Actor::system())
        .unwrap();
    assert_eq!(outcome, FinalizeOutcome::AlreadyFinalized);
    assert_eq!(h.hooks.confirmed.lock().unwrap().len(), 1);
}

#[test]
fn test_unknown_job_is_rescheduled() {
    let mut h = Harness::new();
    h.persistence
        .transaction(|store| {
            AdminJobManager::schedule(store, "REGENERATE_PDF", serde_json::json!({}), NOW)
        })
        .unwrap();

    let summary = h.manager.process_admin_jobs(&mut h.persistence).unwrap();
    assert_eq!(summary.rescheduled, 1);
    let job = &h.persistence.store().jobs_by_name("REGENERATE_PDF").unwrap()[0];
    assert_eq!(job.status, AdminJobStatus::Scheduled);
    assert_eq!(job.execute_at, NOW + Duration::seconds(2));
}
