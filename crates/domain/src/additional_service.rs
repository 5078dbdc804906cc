// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{AdditionalServiceItemStatus, SupplementPolicy, VatStatus};
use serde::{Deserialize, Serialize};

/// A supplement sold together with tickets (e.g. a T-shirt, a dinner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalService {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    /// Price in cents.
    pub price: i64,
    pub vat_status: VatStatus,
    pub policy: SupplementPolicy,
    /// Per-ticket cap for `OPTIONAL_MAX_AMOUNT_PER_TICKET`.
    pub max_per_ticket: Option<u32>,
    pub active: bool,
}

impl AdditionalService {
    /// Quantity added automatically to a reservation of `tickets` tickets.
    #[must_use]
    pub fn mandatory_quantity(&self, tickets: u32) -> u32 {
        match self.policy {
            SupplementPolicy::MandatoryOneForTicket if self.active => tickets,
            _ => 0,
        }
    }

    /// Validates a requested quantity of an optional service.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` when the service is mandatory,
    /// inactive or the per-ticket cap is exceeded.
    pub fn validate_requested(&self, quantity: u32, tickets: u32) -> Result<(), DomainError> {
        let allowed = self.active
            && match self.policy {
                SupplementPolicy::MandatoryOneForTicket => false,
                SupplementPolicy::OptionalUnlimitedAmount => true,
                SupplementPolicy::OptionalMaxAmountPerTicket => {
                    let cap = self.max_per_ticket.unwrap_or(1).saturating_mul(tickets);
                    quantity <= cap
                }
            };
        if allowed && quantity > 0 {
            Ok(())
        } else {
            Err(DomainError::InvalidQuantity(quantity))
        }
    }
}

/// One unit of an additional service held by a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalServiceItem {
    pub id: i64,
    pub uuid: String,
    pub reservation_id: String,
    pub additional_service_id: i64,
    pub status: AdditionalServiceItemStatus,
    pub src_price: i64,
    pub final_price: i64,
    pub vat: i64,
    pub discount: i64,
}
