// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their conversion into domain values.
//!
//! Rows mirror the tables one-to-one. Enumerations are stored in their
//! text form, timestamps as unix seconds, money in minor units.

use alfio_audit::{Actor, ActorKind, AuditEvent, AuditEventType, Cause, StateSnapshot};
use alfio_domain::{
    AdditionalService, AdditionalServiceItem, AdminJob, BillingDetails, BillingDocument,
    CustomerDetails, DomainError, Event, GroupLink, GroupMember, PaymentProxy, PromoCodeDiscount,
    Reservation,
    SpecialPrice, Ticket, TicketCategory, TicketHolder, Transaction, VatRate,
    WaitingQueueSubscription,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

use crate::diesel_schema;
use crate::error::PersistenceError;

// ============================================================================
// Column helpers
// ============================================================================

pub(crate) fn to_timestamp(value: i64) -> Result<OffsetDateTime, PersistenceError> {
    Ok(OffsetDateTime::from_unix_timestamp(value)?)
}

pub(crate) const fn from_timestamp(value: OffsetDateTime) -> i64 {
    value.unix_timestamp()
}

pub(crate) fn to_u32(value: i64, column: &str) -> Result<u32, PersistenceError> {
    u32::try_from(value)
        .map_err(|_| PersistenceError::InvalidStoredValue(format!("{column}: {value}")))
}

pub(crate) fn parse<T>(value: &str) -> Result<T, PersistenceError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(value.parse::<T>()?)
}

/// Parses a comma separated list of enumeration values.
pub(crate) fn parse_list<T>(value: &str) -> Result<Vec<T>, PersistenceError>
where
    T: FromStr<Err = DomainError>,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse::<T>)
        .collect()
}

/// Renders values as a comma separated list.
pub(crate) fn join_list<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Events & categories
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::events)]
pub struct EventRow {
    pub id: i64,
    pub short_name: String,
    pub organization_id: i64,
    pub format: String,
    pub currency: String,
    pub available_seats: i64,
    pub vat_status: String,
    pub vat_rate: i64,
    pub time_zone: String,
    pub begin_ts: i64,
    pub end_ts: i64,
    pub allowed_payment_proxies: String,
    pub waiting_queue_enabled: bool,
    pub pre_registration_enabled: bool,
    pub organizer_country: Option<String>,
}

impl TryFrom<EventRow> for Event {
    type Error = PersistenceError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            short_name: row.short_name,
            organization_id: row.organization_id,
            format: parse(&row.format)?,
            currency: row.currency,
            available_seats: to_u32(row.available_seats, "events.available_seats")?,
            vat_status: parse(&row.vat_status)?,
            vat_rate: VatRate::from_basis_points(to_u32(row.vat_rate, "events.vat_rate")?),
            time_zone: row.time_zone,
            begin: to_timestamp(row.begin_ts)?,
            end: to_timestamp(row.end_ts)?,
            allowed_payment_proxies: parse_list(&row.allowed_payment_proxies)?,
            waiting_queue_enabled: row.waiting_queue_enabled,
            pre_registration_enabled: row.pre_registration_enabled,
            organizer_country: row.organizer_country,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::ticket_categories)]
pub struct CategoryRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub bounded: bool,
    pub max_tickets: i64,
    pub src_price: i64,
    pub access_restricted: bool,
    pub inception: i64,
    pub expiration: i64,
    pub ordinal: i32,
    pub access_type: String,
    pub status: String,
    pub blacklisted_payment_methods: String,
}

impl TryFrom<CategoryRow> for TicketCategory {
    type Error = PersistenceError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            bounded: row.bounded,
            max_tickets: to_u32(row.max_tickets, "ticket_categories.max_tickets")?,
            src_price: row.src_price,
            access_restricted: row.access_restricted,
            inception: to_timestamp(row.inception)?,
            expiration: to_timestamp(row.expiration)?,
            ordinal: row.ordinal,
            access_type: parse(&row.access_type)?,
            status: parse(&row.status)?,
            blacklisted_payment_methods: parse_list(&row.blacklisted_payment_methods)?,
        })
    }
}

// ============================================================================
// Tickets & reservations
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::tickets)]
pub struct TicketRow {
    pub id: i64,
    pub uuid: String,
    pub public_uuid: String,
    pub event_id: i64,
    pub category_id: Option<i64>,
    pub status: String,
    pub reservation_id: Option<String>,
    pub src_price: i64,
    pub final_price: i64,
    pub vat: i64,
    pub discount: i64,
    pub vat_status: String,
    pub currency: String,
    pub user_language: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = PersistenceError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let holder: Option<TicketHolder> = match (row.full_name, row.email) {
            (Some(full_name), Some(email)) => Some(TicketHolder {
                full_name,
                first_name: row.first_name,
                last_name: row.last_name,
                email,
            }),
            _ => None,
        };
        Ok(Self {
            id: row.id,
            uuid: row.uuid,
            public_uuid: row.public_uuid,
            event_id: row.event_id,
            category_id: row.category_id,
            status: parse(&row.status)?,
            reservation_id: row.reservation_id,
            src_price: row.src_price,
            final_price: row.final_price,
            vat: row.vat,
            discount: row.discount,
            vat_status: parse(&row.vat_status)?,
            currency: row.currency,
            user_language: row.user_language,
            holder,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::reservations)]
pub struct ReservationRow {
    pub id: String,
    pub event_id: i64,
    pub status: String,
    pub validity: i64,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
    pub currency: String,
    pub vat_status: String,
    pub vat_rate: i64,
    pub src_price: i64,
    pub final_price: i64,
    pub vat: i64,
    pub discount: i64,
    pub promo_code_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub payment_proxy: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub billing_company: Option<String>,
    pub billing_address: Option<String>,
    pub vat_number: Option<String>,
    pub vat_country: Option<String>,
    pub invoice_requested: bool,
    pub vat_number_validated: bool,
    pub language: String,
    pub ready_for_confirmation: bool,
    pub finalized: bool,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = PersistenceError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            status: parse(&row.status)?,
            validity: to_timestamp(row.validity)?,
            created_at: to_timestamp(row.created_at)?,
            confirmed_at: row.confirmed_at.map(to_timestamp).transpose()?,
            currency: row.currency,
            vat_status: parse(&row.vat_status)?,
            vat_rate: VatRate::from_basis_points(to_u32(row.vat_rate, "reservations.vat_rate")?),
            src_price: row.src_price,
            final_price: row.final_price,
            vat: row.vat,
            discount: row.discount,
            promo_code_id: row.promo_code_id,
            invoice_number: row.invoice_number,
            payment_proxy: row.payment_proxy.as_deref().map(parse).transpose()?,
            customer: CustomerDetails {
                full_name: row.full_name,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
            },
            billing: BillingDetails {
                company_name: row.billing_company,
                address: row.billing_address,
                vat_number: row.vat_number,
                country: row.vat_country,
                invoice_requested: row.invoice_requested,
                vat_number_validated: row.vat_number_validated,
            },
            language: row.language,
            ready_for_confirmation: row.ready_for_confirmation,
            finalized: row.finalized,
        })
    }
}

/// Full column set of a reservation, used for insert and update.
///
/// `None` fields are written as NULL on update.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = diesel_schema::reservations)]
#[diesel(treat_none_as_null = true)]
pub struct ReservationChanges<'a> {
    pub id: &'a str,
    pub event_id: i64,
    pub status: &'static str,
    pub validity: i64,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
    pub currency: &'a str,
    pub vat_status: &'static str,
    pub vat_rate: i64,
    pub src_price: i64,
    pub final_price: i64,
    pub vat: i64,
    pub discount: i64,
    pub promo_code_id: Option<i64>,
    pub invoice_number: Option<&'a str>,
    pub payment_proxy: Option<&'static str>,
    pub full_name: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub billing_company: Option<&'a str>,
    pub billing_address: Option<&'a str>,
    pub vat_number: Option<&'a str>,
    pub vat_country: Option<&'a str>,
    pub invoice_requested: bool,
    pub vat_number_validated: bool,
    pub language: &'a str,
    pub ready_for_confirmation: bool,
    pub finalized: bool,
}

impl<'a> From<&'a Reservation> for ReservationChanges<'a> {
    fn from(reservation: &'a Reservation) -> Self {
        Self {
            id: &reservation.id,
            event_id: reservation.event_id,
            status: reservation.status.as_str(),
            validity: from_timestamp(reservation.validity),
            created_at: from_timestamp(reservation.created_at),
            confirmed_at: reservation.confirmed_at.map(from_timestamp),
            currency: &reservation.currency,
            vat_status: reservation.vat_status.as_str(),
            vat_rate: i64::from(reservation.vat_rate.basis_points()),
            src_price: reservation.src_price,
            final_price: reservation.final_price,
            vat: reservation.vat,
            discount: reservation.discount,
            promo_code_id: reservation.promo_code_id,
            invoice_number: reservation.invoice_number.as_deref(),
            payment_proxy: reservation.payment_proxy.as_ref().map(PaymentProxy::as_str),
            full_name: reservation.customer.full_name.as_deref(),
            first_name: reservation.customer.first_name.as_deref(),
            last_name: reservation.customer.last_name.as_deref(),
            email: reservation.customer.email.as_deref(),
            billing_company: reservation.billing.company_name.as_deref(),
            billing_address: reservation.billing.address.as_deref(),
            vat_number: reservation.billing.vat_number.as_deref(),
            vat_country: reservation.billing.country.as_deref(),
            invoice_requested: reservation.billing.invoice_requested,
            vat_number_validated: reservation.billing.vat_number_validated,
            language: &reservation.language,
            ready_for_confirmation: reservation.ready_for_confirmation,
            finalized: reservation.finalized,
        }
    }
}

// ============================================================================
// Tokens & promo codes
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::special_prices)]
pub struct SpecialPriceRow {
    pub id: i64,
    pub code: String,
    pub category_id: i64,
    pub price: i64,
    pub status: String,
    pub reservation_id: Option<String>,
    pub access_code_id: Option<i64>,
}

impl TryFrom<SpecialPriceRow> for SpecialPrice {
    type Error = PersistenceError;

    fn try_from(row: SpecialPriceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            code: row.code,
            category_id: row.category_id,
            price: row.price,
            status: parse(&row.status)?,
            reservation_id: row.reservation_id,
            access_code_id: row.access_code_id,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::promo_codes)]
pub struct PromoCodeRow {
    pub id: i64,
    pub code: String,
    pub event_id: Option<i64>,
    pub organization_id: i64,
    pub code_type: String,
    pub discount_type: String,
    pub discount_amount: i64,
    pub categories: String,
    pub hidden_category_id: Option<i64>,
    pub max_usage: Option<i64>,
    pub valid_from: i64,
    pub valid_to: i64,
}

impl TryFrom<PromoCodeRow> for PromoCodeDiscount {
    type Error = PersistenceError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            code: row.code,
            event_id: row.event_id,
            organization_id: row.organization_id,
            code_type: parse(&row.code_type)?,
            discount_type: parse(&row.discount_type)?,
            discount_amount: row.discount_amount,
            categories: serde_json::from_str(&row.categories)?,
            hidden_category_id: row.hidden_category_id,
            max_usage: row
                .max_usage
                .map(|max| to_u32(max, "promo_codes.max_usage"))
                .transpose()?,
            valid_from: to_timestamp(row.valid_from)?,
            valid_to: to_timestamp(row.valid_to)?,
        })
    }
}

// ============================================================================
// Waiting queue & allowlist
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::waiting_queue)]
pub struct WaitingQueueRow {
    pub id: i64,
    pub event_id: i64,
    pub full_name: String,
    pub email: String,
    pub language: String,
    pub selected_category_id: Option<i64>,
    pub subscription_type: String,
    pub status: String,
    pub reservation_id: Option<String>,
    pub created_at: i64,
}

impl TryFrom<WaitingQueueRow> for WaitingQueueSubscription {
    type Error = PersistenceError;

    fn try_from(row: WaitingQueueRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            full_name: row.full_name,
            email: row.email,
            language: row.language,
            selected_category_id: row.selected_category_id,
            subscription_type: parse(&row.subscription_type)?,
            status: parse(&row.status)?,
            reservation_id: row.reservation_id,
            created_at: to_timestamp(row.created_at)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::group_links)]
pub struct GroupLinkRow {
    pub id: i64,
    pub group_id: i64,
    pub event_id: i64,
    pub category_id: Option<i64>,
    pub link_type: String,
    pub match_type: String,
    pub max_allocation: Option<i64>,
    pub active: bool,
}

impl TryFrom<GroupLinkRow> for GroupLink {
    type Error = PersistenceError;

    fn try_from(row: GroupLinkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            group_id: row.group_id,
            event_id: row.event_id,
            category_id: row.category_id,
            link_type: parse(&row.link_type)?,
            match_type: parse(&row.match_type)?,
            max_allocation: row
                .max_allocation
                .map(|max| to_u32(max, "group_links.max_allocation"))
                .transpose()?,
            active: row.active,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::group_members)]
pub struct GroupMemberRow {
    pub id: i64,
    pub group_id: i64,
    pub value: String,
    pub description: Option<String>,
    pub active: bool,
}

impl From<GroupMemberRow> for GroupMember {
    fn from(row: GroupMemberRow) -> Self {
        Self {
            id: row.id,
            group_id: row.group_id,
            value: row.value,
            description: row.description,
            active: row.active,
        }
    }
}

// ============================================================================
// Additional services
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::additional_services)]
pub struct AdditionalServiceRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub price: i64,
    pub vat_status: String,
    pub policy: String,
    pub max_per_ticket: Option<i64>,
    pub active: bool,
}

impl TryFrom<AdditionalServiceRow> for AdditionalService {
    type Error = PersistenceError;

    fn try_from(row: AdditionalServiceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            price: row.price,
            vat_status: parse(&row.vat_status)?,
            policy: parse(&row.policy)?,
            max_per_ticket: row
                .max_per_ticket
                .map(|max| to_u32(max, "additional_services.max_per_ticket"))
                .transpose()?,
            active: row.active,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::additional_service_items)]
pub struct AdditionalServiceItemRow {
    pub id: i64,
    pub uuid: String,
    pub reservation_id: String,
    pub additional_service_id: i64,
    pub status: String,
    pub src_price: i64,
    pub final_price: i64,
    pub vat: i64,
    pub discount: i64,
}

impl TryFrom<AdditionalServiceItemRow> for AdditionalServiceItem {
    type Error = PersistenceError;

    fn try_from(row: AdditionalServiceItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            uuid: row.uuid,
            reservation_id: row.reservation_id,
            additional_service_id: row.additional_service_id,
            status: parse(&row.status)?,
            src_price: row.src_price,
            final_price: row.final_price,
            vat: row.vat,
            discount: row.discount,
        })
    }
}

// ============================================================================
// Payments, billing & jobs
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::transactions)]
pub struct TransactionRow {
    pub id: i64,
    pub reservation_id: String,
    pub gateway_transaction_id: String,
    pub gateway_payment_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub payment_proxy: String,
    pub platform_fee: i64,
    pub gateway_fee: i64,
    pub status: String,
    pub created_at: i64,
    pub metadata: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            reservation_id: row.reservation_id,
            gateway_transaction_id: row.gateway_transaction_id,
            gateway_payment_id: row.gateway_payment_id,
            amount: row.amount,
            currency: row.currency,
            description: row.description,
            payment_proxy: parse(&row.payment_proxy)?,
            platform_fee: row.platform_fee,
            gateway_fee: row.gateway_fee,
            status: parse(&row.status)?,
            created_at: to_timestamp(row.created_at)?,
            metadata: serde_json::from_str(&row.metadata)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::billing_documents)]
pub struct BillingDocumentRow {
    pub id: i64,
    pub reservation_id: String,
    pub organization_id: i64,
    pub number: String,
    pub document_type: String,
    pub status: String,
    pub model: String,
    pub generated_at: i64,
}

impl TryFrom<BillingDocumentRow> for BillingDocument {
    type Error = PersistenceError;

    fn try_from(row: BillingDocumentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            reservation_id: row.reservation_id,
            organization_id: row.organization_id,
            number: row.number,
            document_type: parse(&row.document_type)?,
            status: parse(&row.status)?,
            model: serde_json::from_str(&row.model)?,
            generated_at: to_timestamp(row.generated_at)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::admin_jobs)]
pub struct AdminJobRow {
    pub id: i64,
    pub job_name: String,
    pub payload: String,
    pub execute_at: i64,
    pub status: String,
    pub attempts: i64,
    pub last_error: Option<String>,
}

impl TryFrom<AdminJobRow> for AdminJob {
    type Error = PersistenceError;

    fn try_from(row: AdminJobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            job_name: row.job_name,
            payload: serde_json::from_str(&row.payload)?,
            execute_at: to_timestamp(row.execute_at)?,
            status: parse(&row.status)?,
            attempts: to_u32(row.attempts, "admin_jobs.attempts")?,
            last_error: row.last_error,
        })
    }
}

// ============================================================================
// Audit
// ============================================================================

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

impl From<&Actor> for ActorData {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id.clone(),
            actor_type: actor.kind.as_str().to_string(),
        }
    }
}

impl From<&Cause> for CauseData {
    fn from(cause: &Cause) -> Self {
        Self {
            id: cause.id.clone(),
            description: cause.description.clone(),
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = diesel_schema::audit_events)]
pub struct AuditEventRow {
    pub id: i64,
    pub reservation_id: String,
    pub event_id: i64,
    pub event_type: String,
    pub actor_json: String,
    pub cause_json: String,
    pub before_status: String,
    pub after_status: String,
    pub created_at: i64,
}

impl TryFrom<AuditEventRow> for AuditEvent {
    type Error = PersistenceError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        let actor: ActorData = serde_json::from_str(&row.actor_json)?;
        let cause: CauseData = serde_json::from_str(&row.cause_json)?;
        let kind: ActorKind = ActorKind::parse(&actor.actor_type).ok_or_else(|| {
            PersistenceError::InvalidStoredValue(format!("actor type {}", actor.actor_type))
        })?;
        let event_type: AuditEventType = AuditEventType::parse(&row.event_type).ok_or_else(|| {
            PersistenceError::InvalidStoredValue(format!("audit event type {}", row.event_type))
        })?;
        Ok(Self::new(
            row.reservation_id,
            row.event_id,
            event_type,
            Actor::new(actor.id, kind),
            Cause::new(cause.id, cause.description),
            StateSnapshot::parse(&row.before_status)?,
            StateSnapshot::parse(&row.after_status)?,
        ))
    }
}
