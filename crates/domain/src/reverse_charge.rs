// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! EU reverse-charge VAT evaluation.
//!
//! Reverse charge applies to business buyers with a validated VAT number
//! located in an EU country other than the organizer's. It can be enabled
//! separately for in-person and online attendance; when it covers every
//! format the event offers, the whole reservation becomes exempt,
//! otherwise only the matching categories stop charging VAT.

use crate::event::{Event, TicketCategory};
use crate::reservation::BillingDetails;
use crate::types::{EventFormat, VatStatus};

const EU_COUNTRIES: [&str; 27] = [
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

/// Which attendance formats reverse charge is enabled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReverseChargeConfig {
    pub in_person: bool,
    pub online: bool,
}

/// Outcome of the reverse-charge evaluation for one reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverseCharge {
    /// VAT is charged normally.
    NotApplicable,
    /// Every category is exempt; carries the reservation-level status.
    Full(VatStatus),
    /// Only categories of the given format stop charging VAT.
    Partial(EventFormat),
}

/// Returns true if `country` is an EU member state.
#[must_use]
pub fn is_eu_country(country: &str) -> bool {
    let upper = country.trim().to_ascii_uppercase();
    // Greece uses EL in VAT numbers
    let normalized = if upper == "EL" { "GR" } else { upper.as_str() };
    EU_COUNTRIES.contains(&normalized)
}

/// Decides whether reverse charge applies to a reservation.
#[must_use]
pub fn evaluate_reverse_charge(
    event: &Event,
    billing: &BillingDetails,
    config: ReverseChargeConfig,
) -> ReverseCharge {
    if !matches!(event.vat_status, VatStatus::Included | VatStatus::NotIncluded) {
        return ReverseCharge::NotApplicable;
    }
    let (Some(buyer), Some(organizer)) = (
        billing.country.as_deref(),
        event.organizer_country.as_deref(),
    ) else {
        return ReverseCharge::NotApplicable;
    };
    let cross_border_eu = is_eu_country(buyer)
        && is_eu_country(organizer)
        && !buyer.eq_ignore_ascii_case(organizer);
    if !billing.is_validated_business() || !cross_border_eu {
        return ReverseCharge::NotApplicable;
    }

    let covers_all = match event.format {
        EventFormat::InPerson => config.in_person,
        EventFormat::Online => config.online,
        EventFormat::Hybrid => config.in_person && config.online,
    };
    if covers_all {
        return ReverseCharge::Full(event.vat_status.to_exempt());
    }
    match (event.format, config.in_person, config.online) {
        (EventFormat::Hybrid, true, false) => ReverseCharge::Partial(EventFormat::InPerson),
        (EventFormat::Hybrid, false, true) => ReverseCharge::Partial(EventFormat::Online),
        _ => ReverseCharge::NotApplicable,
    }
}

/// VAT status to apply to the tickets of `category`.
#[must_use]
pub fn category_vat_status(
    event: &Event,
    category: &TicketCategory,
    outcome: ReverseCharge,
) -> VatStatus {
    match outcome {
        ReverseCharge::NotApplicable => event.vat_status,
        ReverseCharge::Full(status) => status,
        ReverseCharge::Partial(format) => {
            if category.effective_format(event.format) == format {
                event.vat_status.to_not_charged()
            } else {
                event.vat_status
            }
        }
    }
}

/// VAT status stored on the reservation itself.
#[must_use]
pub const fn reservation_vat_status(event: &Event, outcome: ReverseCharge) -> VatStatus {
    match outcome {
        ReverseCharge::Full(status) => status,
        ReverseCharge::NotApplicable | ReverseCharge::Partial(_) => event.vat_status,
    }
}
