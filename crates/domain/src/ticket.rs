// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::pricing::PriceBreakdown;
use crate::types::{TicketStatus, VatStatus};
use serde::{Deserialize, Serialize};

/// A single seat of an event.
///
/// A ticket carries no reservation while it is FREE, RELEASED or
/// PRE_RESERVED. Tickets of unbounded categories have no category until
/// they are reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub uuid: String,
    pub public_uuid: String,
    pub event_id: i64,
    pub category_id: Option<i64>,
    pub status: TicketStatus,
    pub reservation_id: Option<String>,
    pub src_price: i64,
    pub final_price: i64,
    pub vat: i64,
    pub discount: i64,
    pub vat_status: VatStatus,
    pub currency: String,
    pub user_language: Option<String>,
    pub holder: Option<TicketHolder>,
}

impl Ticket {
    /// Current price of the ticket.
    #[must_use]
    pub const fn price(&self) -> PriceBreakdown {
        PriceBreakdown {
            src_price: self.src_price,
            discount: self.discount,
            vat: self.vat,
            final_price: self.final_price,
        }
    }

    /// Whether the holder has been assigned.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.holder.is_some()
    }
}

/// The attendee a ticket is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHolder {
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}
