// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invoice numbers and billing documents.

use alfio::ExtensionHooks;
use alfio_domain::{
    BillingDetails, BillingDocument, BillingDocumentStatus, BillingDocumentType, CustomerDetails,
    Event, InvoiceNumberFormat, Reservation, TotalPrice, credit_note_number,
};
use alfio_persistence::{PersistenceError, Store};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::ServiceError;

/// Content stored with a billing document.
#[derive(Debug, Serialize)]
struct BillingModel<'a> {
    reservation_id: &'a str,
    event: &'a str,
    currency: &'a str,
    customer: &'a CustomerDetails,
    billing: &'a BillingDetails,
    total: TotalPrice,
    vat_status: &'static str,
    lines: Vec<BillingLine>,
}

#[derive(Debug, Serialize)]
struct BillingLine {
    ticket_id: i64,
    category_id: Option<i64>,
    src_price: i64,
    discount: i64,
    vat: i64,
    final_price: i64,
}

/// Issues invoice numbers and keeps one valid document per type.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillingDocumentManager;

impl BillingDocumentManager {
    /// Returns the next invoice number of the event's organization.
    ///
    /// An extension override wins over the organization sequence, which is
    /// then left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence cannot be locked or advanced.
    pub fn next_invoice_number(
        store: &mut Store<'_>,
        event: &Event,
        reservation: &Reservation,
        format: &InvoiceNumberFormat,
        hooks: &dyn ExtensionHooks,
    ) -> Result<String, ServiceError> {
        if let Some(number) = hooks.invoice_number(reservation) {
            debug!(reservation_id = %reservation.id, %number, "Invoice number overridden");
            return Ok(number);
        }
        let sequence = store.next_invoice_sequence(event.organization_id)?;
        Ok(format.format(sequence))
    }

    /// Creates a VALID document of `document_type`, invalidating older ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be stored.
    pub fn create_billing_document(
        store: &mut Store<'_>,
        event: &Event,
        reservation: &Reservation,
        document_type: BillingDocumentType,
        number: &str,
        now: OffsetDateTime,
    ) -> Result<BillingDocument, ServiceError> {
        let tickets = store.tickets_by_reservation(&reservation.id)?;
        let model = BillingModel {
            reservation_id: &reservation.id,
            event: &event.short_name,
            currency: &reservation.currency,
            customer: &reservation.customer,
            billing: &reservation.billing,
            total: reservation.total(),
            vat_status: reservation.vat_status.as_str(),
            lines: tickets
                .iter()
                .map(|t| BillingLine {
                    ticket_id: t.id,
                    category_id: t.category_id,
                    src_price: t.src_price,
                    discount: t.discount,
                    vat: t.vat,
                    final_price: t.final_price,
                })
                .collect(),
        };
        let model = serde_json::to_value(&model)
            .map_err(PersistenceError::from)?;

        store.invalidate_billing_documents(&reservation.id, document_type)?;
        let mut document = BillingDocument {
            id: 0,
            reservation_id: reservation.id.clone(),
            organization_id: event.organization_id,
            number: number.to_string(),
            document_type,
            status: BillingDocumentStatus::Valid,
            model,
            generated_at: now,
        };
        document.id = store.insert_billing_document(&document)?;
        info!(
            reservation_id = %reservation.id,
            document_type = %document_type,
            number,
            "Billing document created"
        );
        Ok(document)
    }

    /// Returns the valid invoice or receipt of `reservation`, creating it if needed.
    ///
    /// Reservations with an invoice number get an invoice, every other one
    /// a receipt numbered after the reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or stored.
    pub fn get_or_create_billing_document(
        store: &mut Store<'_>,
        event: &Event,
        reservation: &Reservation,
        now: OffsetDateTime,
    ) -> Result<BillingDocument, ServiceError> {
        let (document_type, number) = reservation.invoice_number.as_deref().map_or(
            (BillingDocumentType::Receipt, reservation.id.as_str()),
            |number| (BillingDocumentType::Invoice, number),
        );
        if let Some(existing) = store.valid_billing_document(&reservation.id, document_type)? {
            return Ok(existing);
        }
        Self::create_billing_document(store, event, reservation, document_type, number, now)
    }

    /// Makes sure a billing document exists, without returning it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or stored.
    pub fn ensure_billing_document_is_present(
        store: &mut Store<'_>,
        event: &Event,
        reservation: &Reservation,
        now: OffsetDateTime,
    ) -> Result<(), ServiceError> {
        Self::get_or_create_billing_document(store, event, reservation, now).map(|_| ())
    }

    /// Creates the credit note cancelling the reservation's invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be stored.
    pub fn create_credit_note(
        store: &mut Store<'_>,
        event: &Event,
        reservation: &Reservation,
        invoice_number: &str,
        now: OffsetDateTime,
    ) -> Result<BillingDocument, ServiceError> {
        Self::create_billing_document(
            store,
            event,
            reservation,
            BillingDocumentType::CreditNote,
            &credit_note_number(invoice_number),
            now,
        )
    }
}
