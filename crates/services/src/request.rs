// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inputs and outputs of the reservation operations.

use alfio::TicketRequest;
use alfio_domain::{
    BillingDetails, CustomerDetails, DomainError, PaymentMethod, PaymentProxy, TicketHolder,
};
use serde::{Deserialize, Serialize};

/// Seats requested for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLine {
    pub category_id: i64,
    pub quantity: u32,
    /// Access token for a restricted category.
    pub special_price_code: Option<String>,
}

impl TicketLine {
    /// A line without access token.
    #[must_use]
    pub const fn new(category_id: i64, quantity: u32) -> Self {
        Self {
            category_id,
            quantity,
            special_price_code: None,
        }
    }

    /// Sets the access token.
    #[must_use]
    pub fn with_token(mut self, code: &str) -> Self {
        self.special_price_code = Some(code.to_string());
        self
    }

    pub(crate) const fn as_ticket_request(&self) -> TicketRequest {
        TicketRequest {
            category_id: self.category_id,
            quantity: self.quantity,
        }
    }
}

/// An optional supplement requested by the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalServiceLine {
    pub service_id: i64,
    pub quantity: u32,
}

/// Everything needed to create a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub event_id: i64,
    pub lines: Vec<TicketLine>,
    pub additional_services: Vec<AdditionalServiceLine>,
    /// Discount or access code typed by the buyer.
    pub promo_code: Option<String>,
    pub language: String,
}

impl ReservationRequest {
    /// Validates the shape of the request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` for an empty request or a zero line.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::InvalidQuantity(0));
        }
        self.lines
            .iter()
            .try_for_each(|line| line.as_ticket_request().validate())
    }

    /// Number of tickets requested.
    #[must_use]
    pub fn ticket_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// Ticket holder for one reserved ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeAssignment {
    pub ticket_id: i64,
    pub holder: TicketHolder,
}

/// Contact, billing and attendee data collected before payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub customer: CustomerDetails,
    pub billing: BillingDetails,
    pub attendees: Vec<AttendeeAssignment>,
}

/// Payment channel chosen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub proxy: PaymentProxy,
    pub method: PaymentMethod,
    /// Token obtained client side, for token based providers.
    pub gateway_token: Option<String>,
}
