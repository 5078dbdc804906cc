// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The reservation aggregate.

use crate::pricing::TotalPrice;
use crate::reservation_status::ReservationStatus;
use crate::types::{PaymentProxy, VatRate, VatStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A cart of tickets and additional services held until payment.
///
/// The metadata flags `ready_for_confirmation` and `finalized` make the
/// two finalization phases idempotent: the first is set once the invoice
/// number is assigned, the second once tickets have been acquired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub event_id: i64,
    pub status: ReservationStatus,
    #[serde(with = "time::serde::timestamp")]
    pub validity: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp::option")]
    pub confirmed_at: Option<OffsetDateTime>,
    pub currency: String,
    pub vat_status: VatStatus,
    pub vat_rate: VatRate,
    pub src_price: i64,
    pub final_price: i64,
    pub vat: i64,
    pub discount: i64,
    pub promo_code_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub payment_proxy: Option<PaymentProxy>,
    pub customer: CustomerDetails,
    pub billing: BillingDetails,
    pub language: String,
    pub ready_for_confirmation: bool,
    pub finalized: bool,
}

impl Reservation {
    /// Whether the reservation has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.validity < now
    }

    /// Totals currently persisted on the reservation.
    #[must_use]
    pub const fn total(&self) -> TotalPrice {
        TotalPrice {
            src_price: self.src_price,
            price_with_vat: self.final_price,
            vat: self.vat,
            discount: self.discount,
            discount_applied_count: 0,
        }
    }

    /// Whether finalization must produce an invoice rather than a receipt.
    #[must_use]
    pub const fn requires_invoice(&self) -> bool {
        self.billing.invoice_requested && self.final_price > 0
    }
}

/// Who made the reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Billing data collected before payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub vat_number: Option<String>,
    /// ISO country code of the buyer.
    pub country: Option<String>,
    pub invoice_requested: bool,
    /// Whether the VAT number passed validation.
    pub vat_number_validated: bool,
}

impl BillingDetails {
    /// Whether the buyer is a business with a validated VAT number.
    #[must_use]
    pub fn is_validated_business(&self) -> bool {
        self.vat_number_validated
            && self
                .vat_number
                .as_deref()
                .is_some_and(|number| !number.trim().is_empty())
    }
}
