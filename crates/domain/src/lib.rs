// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod additional_service;
mod admin_job;
mod allowlist;
mod billing;
mod error;
mod event;
mod expiration;
mod payment;
mod pricing;
mod promo_code;
mod reservation;
mod reservation_status;
mod reverse_charge;
mod seat_distribution;
mod ticket;
mod types;
mod waiting_queue;

#[cfg(test)]
mod tests;

pub use additional_service::{AdditionalService, AdditionalServiceItem};
pub use admin_job::{AdminJob, FINALIZE_RESERVATION_JOB};
pub use allowlist::{
    Group, GroupLink, GroupMember, email_domain, find_matching_member, normalize_email,
};
pub use billing::{BillingDocument, InvoiceNumberFormat, credit_note_number};
pub use error::DomainError;
pub use event::{Event, TicketCategory, available_seats, first_expiring_unbounded};
pub use expiration::{WorkingPeriod, offline_payment_deadline, waiting_queue_expiration};
pub use payment::Transaction;
pub use pricing::{
    Discount, PriceBreakdown, TotalPrice, calculate_price, calculate_total, discount_for,
};
pub use promo_code::{PromoCodeDiscount, SpecialPrice};
pub use reservation::{BillingDetails, CustomerDetails, Reservation};
pub use reservation_status::ReservationStatus;
pub use reverse_charge::{
    ReverseCharge, ReverseChargeConfig, category_vat_status, evaluate_reverse_charge,
    is_eu_country, reservation_vat_status,
};
pub use seat_distribution::{CategoryAvailability, SeatAllocation, distribute_seats};
pub use ticket::{Ticket, TicketHolder};
pub use types::{
    AdditionalServiceItemStatus, AdminJobStatus, BillingDocumentStatus, BillingDocumentType,
    CategoryAccessType, CategoryStatus, CodeType, DiscountType, EventFormat, LinkType, MatchType,
    PaymentMethod, PaymentProxy, SpecialPriceStatus, SubscriptionType, SupplementPolicy,
    TicketStatus, TransactionStatus, VatRate, VatStatus, WaitingQueueStatus,
};
pub use waiting_queue::{WaitingQueueSubscription, validate_subscriber_email};
