// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing documents and invoice numbering.

use crate::types::{BillingDocumentStatus, BillingDocumentType};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An invoice, receipt or credit note issued for a reservation.
///
/// At most one document per reservation and type is `VALID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDocument {
    pub id: i64,
    pub reservation_id: String,
    pub organization_id: i64,
    pub number: String,
    pub document_type: BillingDocumentType,
    pub status: BillingDocumentStatus,
    pub model: serde_json::Value,
    #[serde(with = "time::serde::timestamp")]
    pub generated_at: OffsetDateTime,
}

/// How sequential invoice numbers are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceNumberFormat {
    pub prefix: String,
    /// Minimum number of digits, zero padded.
    pub width: usize,
}

impl Default for InvoiceNumberFormat {
    fn default() -> Self {
        Self {
            prefix: "INV-".to_string(),
            width: 3,
        }
    }
}

impl InvoiceNumberFormat {
    /// Renders sequence value `sequence` as an invoice number.
    #[must_use]
    pub fn format(&self, sequence: i64) -> String {
        format!("{}{:0width$}", self.prefix, sequence, width = self.width)
    }
}

/// Number of a credit note cancelling `invoice_number`.
#[must_use]
pub fn credit_note_number(invoice_number: &str) -> String {
    format!("CN-{invoice_number}")
}
