// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use crate::{BillingDocumentManager, ServiceError, TicketLine};
use alfio::CoreError;
use alfio_domain::{
    BillingDocumentStatus, BillingDocumentType, ReservationStatus, TicketStatus,
    TransactionStatus,
};
use alfio_persistence::TicketPool;

fn paid(h: &mut Harness, invoice: bool) -> (String, i64, i64) {
    let (event_id, category_id) = h.setup_simple(3);
    let id = h.reserve(event_id, vec![TicketLine::new(category_id, 2)]).unwrap();
    {
        let mut store = h.persistence.store();
        let mut reservation = store.reservation(&id).unwrap();
        reservation.customer.email = Some(String::from("ada@example.org"));
        reservation.billing.invoice_requested = invoice;
        store.update_reservation(&reservation).unwrap();
    }
    assert!(h.pay(&id, &card()).is_successful());
    (id, event_id, category_id)
}

#[test]
fn test_invoice_is_created_for_invoiced_reservation() {
    let mut h = Harness::new();
    let (id, _, _) = paid(&mut h, true);

    let mut store = h.persistence.store();
    let invoice = store
        .valid_billing_document(&id, BillingDocumentType::Invoice)
        .unwrap()
        .unwrap();
    assert_eq!(invoice.number, "INV-001");
    assert_eq!(invoice.model["reservation_id"], id.as_str());
    assert_eq!(invoice.model["lines"].as_array().map(Vec::len), Some(2));
    assert!(
        store
            .valid_billing_document(&id, BillingDocumentType::Receipt)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_regenerating_a_document_invalidates_the_previous_one() {
    let mut h = Harness::new();
    let (id, event_id, _) = paid(&mut h, false);

    h.persistence
        .transaction(|store| {
            let event = store.event(event_id)?;
            let reservation = store.reservation(&id)?;
            BillingDocumentManager::create_billing_document(
                store,
                &event,
                &reservation,
                BillingDocumentType::Receipt,
                &id,
                NOW,
            )
        })
        .unwrap();

    let documents = h.persistence.store().billing_documents(&id).unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(
        documents
            .iter()
            .filter(|d| d.status == BillingDocumentStatus::Valid)
            .count(),
        1
    );
}

#[test]
fn test_credit_note_cancels_the_invoice() {
    let mut h = Harness::new();
    let (id, event_id, category_id) = paid(&mut h, true);

    let note = h
        .manager
        .issue_credit_note(&mut h.persistence, &id, &admin())
        .unwrap();

    assert_eq!(note.document_type, BillingDocumentType::CreditNote);
    assert_eq!(note.number, "CN-INV-001");
    assert_eq!(h.reservation(&id).status, ReservationStatus::CreditNoteIssued);
    assert!(h.tickets(&id).is_empty());

    let mut store = h.persistence.store();
    assert_eq!(
        store
            .count_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free])
            .unwrap(),
        3
    );
    // the money was received, the payment row stays
    let transaction = store.transaction(&id).unwrap().unwrap();
    assert_eq!(transaction.status, TransactionStatus::Complete);
}

#[test]
fn test_credit_note_requires_an_invoice() {
    let mut h = Harness::new();
    let (id, _, _) = paid(&mut h, false);

    let result = h
        .manager
        .issue_credit_note(&mut h.persistence, &id, &admin());
    assert_eq!(
        result,
        Err(ServiceError::Core(CoreError::incompatible(
            &id,
            ReservationStatus::Complete
        )))
    );
}
