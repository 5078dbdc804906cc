// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend dispatch for queries and mutations.

use alfio::TransitionResult;
use alfio_audit::AuditEvent;
use alfio_domain::{
    AdditionalService, AdditionalServiceItem, AdditionalServiceItemStatus, AdminJob,
    AdminJobStatus, BillingDocument, BillingDocumentType, Event, Group, GroupLink, GroupMember,
    PriceBreakdown, PromoCodeDiscount, Reservation, ReservationStatus, SpecialPrice,
    SpecialPriceStatus, Ticket, TicketCategory, TicketHolder, TicketStatus, Transaction,
    VatStatus, WaitingQueueStatus, WaitingQueueSubscription,
};
use diesel::SqliteConnection;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::PersistenceError;
use crate::mutations::*;
use crate::queries::*;

/// Calls the `_sqlite` or `_mysql` variant of a function for the store's backend.
macro_rules! dispatch {
    ($store:expr, $func:ident ( $($arg:expr),* $(,)? )) => {
        pastey::paste! {
            match $store {
                Store::Sqlite(conn) => [<$func _sqlite>](conn $(, $arg)*),
                #[cfg(feature = "mysql")]
                Store::Mysql(conn) => [<$func _mysql>](conn $(, $arg)*),
            }
        }
    };
}

/// A connection handle bound to the current transaction.
///
/// Obtained from [`crate::Persistence::transaction`] or
/// [`crate::Persistence::store`].
pub enum Store<'a> {
    Sqlite(&'a mut SqliteConnection),
    #[cfg(feature = "mysql")]
    Mysql(&'a mut MysqlConnection),
}

impl Store<'_> {
    // ========================================================================
    // Events & categories
    // ========================================================================

    /// Loads an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event does not exist.
    pub fn event(&mut self, event_id: i64) -> Result<Event, PersistenceError> {
        dispatch!(self, find_event(event_id))
    }

    /// Loads every event with the waiting queue or pre-registration enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn events_with_waiting_queue(&mut self) -> Result<Vec<Event>, PersistenceError> {
        dispatch!(self, find_events_with_waiting_queue())
    }

    /// Loads a ticket category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    pub fn category(&mut self, category_id: i64) -> Result<TicketCategory, PersistenceError> {
        dispatch!(self, find_category(category_id))
    }

    /// Loads the categories of an event by ordinal.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn categories(&mut self, event_id: i64) -> Result<Vec<TicketCategory>, PersistenceError> {
        dispatch!(self, find_categories(event_id))
    }

    /// Inserts an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_event(&mut self, event: &Event) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_event(event))
    }

    /// Inserts a ticket category.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_category(&mut self, category: &TicketCategory) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_category(category))
    }

    /// Creates FREE tickets.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_tickets(
        &mut self,
        event_id: i64,
        category_id: Option<i64>,
        count: u32,
        src_price: i64,
        vat_status: VatStatus,
        currency: &str,
    ) -> Result<usize, PersistenceError> {
        dispatch!(
            self,
            insert_tickets(event_id, category_id, count, src_price, vat_status, currency)
        )
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    /// Loads the tickets of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn tickets_by_reservation(
        &mut self,
        reservation_id: &str,
    ) -> Result<Vec<Ticket>, PersistenceError> {
        dispatch!(self, find_tickets_by_reservation(reservation_id))
    }

    /// Loads a ticket.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ticket does not exist.
    pub fn ticket(&mut self, ticket_id: i64) -> Result<Ticket, PersistenceError> {
        dispatch!(self, find_ticket(ticket_id))
    }

    /// Loads the tickets of an event in a status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn tickets_by_status(
        &mut self,
        event_id: i64,
        status: TicketStatus,
    ) -> Result<Vec<Ticket>, PersistenceError> {
        dispatch!(self, find_tickets_by_status(event_id, status))
    }

    /// Counts tickets of a pool in any of `statuses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_tickets(
        &mut self,
        event_id: i64,
        pool: TicketPool,
        statuses: &[TicketStatus],
    ) -> Result<u32, PersistenceError> {
        dispatch!(self, count_tickets(event_id, pool, statuses))
    }

    /// Counts the FREE tickets `category` could still sell.
    ///
    /// Unbounded categories share the event pool, so every unbounded
    /// category of an event reports the same figure.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_available_tickets(
        &mut self,
        category: &TicketCategory,
    ) -> Result<u32, PersistenceError> {
        self.count_tickets(category.event_id, TicketPool::of(category), &[TicketStatus::Free])
    }

    /// Claims up to `limit` tickets of a pool in any of `statuses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn lock_tickets(
        &mut self,
        event_id: i64,
        pool: TicketPool,
        statuses: &[TicketStatus],
        limit: u32,
    ) -> Result<Vec<i64>, PersistenceError> {
        dispatch!(self, lock_tickets(event_id, pool, statuses, limit))
    }

    /// Binds claimed tickets to a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn reserve_tickets(
        &mut self,
        ticket_ids: &[i64],
        reservation_id: &str,
        category_id: i64,
        src_price: i64,
        language: &str,
    ) -> Result<usize, PersistenceError> {
        dispatch!(
            self,
            reserve_tickets(ticket_ids, reservation_id, category_id, src_price, language)
        )
    }

    /// Writes a price to the tickets of a reservation in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_ticket_prices(
        &mut self,
        reservation_id: &str,
        category_id: i64,
        price: &PriceBreakdown,
        vat_status: VatStatus,
    ) -> Result<usize, PersistenceError> {
        dispatch!(
            self,
            update_ticket_prices(reservation_id, category_id, price, vat_status)
        )
    }

    /// Moves every ticket of a reservation to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_ticket_status_for_reservation(
        &mut self,
        reservation_id: &str,
        status: TicketStatus,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, set_ticket_status_for_reservation(reservation_id, status))
    }

    /// Moves the given tickets to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_ticket_status(
        &mut self,
        ticket_ids: &[i64],
        status: TicketStatus,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, set_ticket_status(ticket_ids, status))
    }

    /// Returns tickets to the inventory in `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn release_tickets(
        &mut self,
        ticket_ids: &[i64],
        status: TicketStatus,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, release_tickets(ticket_ids, status))
    }

    /// Returns every ticket of a reservation to the inventory in `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or update fails.
    pub fn release_reservation_tickets(
        &mut self,
        reservation_id: &str,
        status: TicketStatus,
    ) -> Result<usize, PersistenceError> {
        let ticket_ids: Vec<i64> = self
            .tickets_by_reservation(reservation_id)?
            .iter()
            .map(|ticket| ticket.id)
            .collect();
        self.release_tickets(&ticket_ids, status)
    }

    /// Stores the attendee of a ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn assign_ticket_holder(
        &mut self,
        ticket_id: i64,
        holder: &TicketHolder,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, assign_ticket_holder(ticket_id, holder))
    }

    /// Reverts every RELEASED ticket of an event to FREE.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn revert_released_tickets(&mut self, event_id: i64) -> Result<usize, PersistenceError> {
        dispatch!(self, revert_released_tickets(event_id))
    }

    // ========================================================================
    // Reservations
    // ========================================================================

    /// Loads a reservation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the reservation does not exist.
    pub fn reservation(&mut self, reservation_id: &str) -> Result<Reservation, PersistenceError> {
        dispatch!(self, find_reservation(reservation_id))
    }

    /// Loads a reservation and locks its row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the reservation does not exist.
    pub fn lock_reservation(
        &mut self,
        reservation_id: &str,
    ) -> Result<Reservation, PersistenceError> {
        dispatch!(self, lock_reservation(reservation_id))
    }

    /// Loads reservations in `statuses` whose validity ended before `before`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn reservations_expired_before(
        &mut self,
        statuses: &[ReservationStatus],
        before: OffsetDateTime,
    ) -> Result<Vec<Reservation>, PersistenceError> {
        dispatch!(self, find_reservations_expired_before(statuses, before))
    }

    /// Loads the reservations of an event in one of `statuses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn reservations_by_status(
        &mut self,
        event_id: i64,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<Reservation>, PersistenceError> {
        dispatch!(self, find_reservations_by_status(event_id, statuses))
    }

    /// Counts tickets that used a promo code in reservations of `statuses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_promo_code_usage(
        &mut self,
        promo_code_id: i64,
        statuses: &[ReservationStatus],
        exclude_reservation: &str,
    ) -> Result<u32, PersistenceError> {
        dispatch!(
            self,
            count_promo_code_usage(promo_code_id, statuses, exclude_reservation)
        )
    }

    /// Inserts a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), PersistenceError> {
        dispatch!(self, insert_reservation(reservation))
    }

    /// Overwrites a reservation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the reservation does not exist.
    pub fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), PersistenceError> {
        dispatch!(self, update_reservation(reservation))
    }

    // ========================================================================
    // Tokens & promo codes
    // ========================================================================

    /// Finds an access token by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn special_price_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<SpecialPrice>, PersistenceError> {
        dispatch!(self, find_special_price_by_code(code))
    }

    /// Loads the tokens bound to a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn special_prices_by_reservation(
        &mut self,
        reservation_id: &str,
    ) -> Result<Vec<SpecialPrice>, PersistenceError> {
        dispatch!(self, find_special_prices_by_reservation(reservation_id))
    }

    /// Finds the promo code `code` for an event, falling back to the organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn promo_code(
        &mut self,
        event_id: i64,
        organization_id: i64,
        code: &str,
    ) -> Result<Option<PromoCodeDiscount>, PersistenceError> {
        dispatch!(self, find_promo_code(event_id, organization_id, code))
    }

    /// Loads a promo code by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the promo code does not exist.
    pub fn promo_code_by_id(
        &mut self,
        promo_code_id: i64,
    ) -> Result<PromoCodeDiscount, PersistenceError> {
        dispatch!(self, find_promo_code_by_id(promo_code_id))
    }

    /// Loads a promo code and locks its row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the promo code does not exist.
    pub fn lock_promo_code(
        &mut self,
        promo_code_id: i64,
    ) -> Result<PromoCodeDiscount, PersistenceError> {
        dispatch!(self, lock_promo_code(promo_code_id))
    }

    /// Claims up to `limit` FREE unbound tokens of a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn lock_free_tokens(
        &mut self,
        category_id: i64,
        limit: u32,
    ) -> Result<Vec<i64>, PersistenceError> {
        dispatch!(self, lock_free_tokens(category_id, limit))
    }

    /// Inserts an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_special_price(&mut self, token: &SpecialPrice) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_special_price(token))
    }

    /// Binds a FREE token to a reservation; `false` if it was taken meanwhile.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn bind_special_price(
        &mut self,
        token_id: i64,
        reservation_id: &str,
    ) -> Result<bool, PersistenceError> {
        dispatch!(self, bind_special_price(token_id, reservation_id))
    }

    /// Binds claimed tokens to a reservation on behalf of an access code.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn bind_tokens_to_access_code(
        &mut self,
        token_ids: &[i64],
        reservation_id: &str,
        access_code_id: i64,
    ) -> Result<usize, PersistenceError> {
        dispatch!(
            self,
            bind_tokens_to_access_code(token_ids, reservation_id, access_code_id)
        )
    }

    /// Moves the tokens of a reservation to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_special_price_status_for_reservation(
        &mut self,
        reservation_id: &str,
        status: SpecialPriceStatus,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, set_special_price_status_for_reservation(reservation_id, status))
    }

    /// Returns the tokens of a reservation to FREE.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn reset_special_prices_for_reservation(
        &mut self,
        reservation_id: &str,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, reset_special_prices_for_reservation(reservation_id))
    }

    /// Inserts a promo code.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_promo_code(&mut self, promo: &PromoCodeDiscount) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_promo_code(promo))
    }

    // ========================================================================
    // Waiting queue
    // ========================================================================

    /// Finds the subscription holding a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn subscription_by_reservation(
        &mut self,
        reservation_id: &str,
    ) -> Result<Option<WaitingQueueSubscription>, PersistenceError> {
        dispatch!(self, find_subscription_by_reservation(reservation_id))
    }

    /// Loads every subscription of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn subscriptions(
        &mut self,
        event_id: i64,
    ) -> Result<Vec<WaitingQueueSubscription>, PersistenceError> {
        dispatch!(self, find_subscriptions(event_id))
    }

    /// Counts the WAITING subscriptions of an event, including the ones
    /// another transaction holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_waiting_subscriptions(&mut self, event_id: i64) -> Result<u32, PersistenceError> {
        dispatch!(self, count_waiting_subscriptions(event_id))
    }

    /// Claims the WAITING subscriptions of an event in FIFO order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn lock_waiting_subscriptions(
        &mut self,
        event_id: i64,
    ) -> Result<Vec<WaitingQueueSubscription>, PersistenceError> {
        dispatch!(self, lock_waiting_subscriptions(event_id))
    }

    /// Inserts a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_subscription(
        &mut self,
        subscription: &WaitingQueueSubscription,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_subscription(subscription))
    }

    /// Updates a subscription's status and offered reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_subscription(
        &mut self,
        subscription_id: i64,
        status: WaitingQueueStatus,
        reservation_id: Option<&str>,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, update_subscription(subscription_id, status, reservation_id))
    }

    /// Moves the subscription holding a reservation to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_subscription_status_for_reservation(
        &mut self,
        reservation_id: &str,
        status: WaitingQueueStatus,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, update_subscription_status_for_reservation(reservation_id, status))
    }

    // ========================================================================
    // Allowlist
    // ========================================================================

    /// Loads the active group links covering a category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn active_group_links(
        &mut self,
        event_id: i64,
        category_id: i64,
    ) -> Result<Vec<GroupLink>, PersistenceError> {
        dispatch!(self, find_active_group_links(event_id, category_id))
    }

    /// Loads the active members of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn active_group_members(
        &mut self,
        group_id: i64,
    ) -> Result<Vec<GroupMember>, PersistenceError> {
        dispatch!(self, find_active_group_members(group_id))
    }

    /// Counts the acquisitions of a member through a link.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_acquisitions(
        &mut self,
        group_link_id: i64,
        group_member_id: i64,
    ) -> Result<u32, PersistenceError> {
        dispatch!(self, count_acquisitions(group_link_id, group_member_id))
    }

    /// Locks a group link row.
    ///
    /// # Errors
    ///
    /// Returns an error if the link does not exist.
    pub fn lock_group_link(&mut self, group_link_id: i64) -> Result<(), PersistenceError> {
        dispatch!(self, lock_group_link(group_link_id))
    }

    /// Inserts a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_group(&mut self, group: &Group) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_group(group))
    }

    /// Inserts a group member.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_group_member(&mut self, member: &GroupMember) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_group_member(member))
    }

    /// Inserts a group link.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_group_link(&mut self, link: &GroupLink) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_group_link(link))
    }

    /// Records an acquisition.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_acquisition(
        &mut self,
        group_member_id: i64,
        group_link_id: i64,
        ticket_id: i64,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, insert_acquisition(group_member_id, group_link_id, ticket_id))
    }

    /// Deletes the acquisitions of a reservation's tickets.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_acquisitions_for_reservation(
        &mut self,
        reservation_id: &str,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, delete_acquisitions_for_reservation(reservation_id))
    }

    /// Deletes the group acquisition of one ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_acquisition_for_ticket(&mut self, ticket_id: i64) -> Result<usize, PersistenceError> {
        dispatch!(self, delete_acquisition_for_ticket(ticket_id))
    }

    // ========================================================================
    // Payments & additional services
    // ========================================================================

    /// Finds the transaction of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn transaction(
        &mut self,
        reservation_id: &str,
    ) -> Result<Option<Transaction>, PersistenceError> {
        dispatch!(self, find_transaction(reservation_id))
    }

    /// Inserts a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_transaction(&mut self, transaction: &Transaction) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_transaction(transaction))
    }

    /// Updates a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_transaction(&mut self, transaction: &Transaction) -> Result<(), PersistenceError> {
        dispatch!(self, update_transaction(transaction))
    }

    /// Deletes the transaction of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_transaction(&mut self, reservation_id: &str) -> Result<usize, PersistenceError> {
        dispatch!(self, delete_transaction(reservation_id))
    }

    /// Loads the active additional services of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn additional_services(
        &mut self,
        event_id: i64,
    ) -> Result<Vec<AdditionalService>, PersistenceError> {
        dispatch!(self, find_additional_services(event_id))
    }

    /// Loads the additional service items of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn additional_service_items(
        &mut self,
        reservation_id: &str,
    ) -> Result<Vec<AdditionalServiceItem>, PersistenceError> {
        dispatch!(self, find_additional_service_items(reservation_id))
    }

    /// Inserts an additional service.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_additional_service(
        &mut self,
        service: &AdditionalService,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_additional_service(service))
    }

    /// Inserts an additional service item.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_additional_service_item(
        &mut self,
        item: &AdditionalServiceItem,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_additional_service_item(item))
    }

    /// Moves the additional service items of a reservation to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_additional_service_items_status(
        &mut self,
        reservation_id: &str,
        status: AdditionalServiceItemStatus,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, set_additional_service_items_status(reservation_id, status))
    }

    // ========================================================================
    // Billing
    // ========================================================================

    /// Finds the VALID document of a type for a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn valid_billing_document(
        &mut self,
        reservation_id: &str,
        document_type: BillingDocumentType,
    ) -> Result<Option<BillingDocument>, PersistenceError> {
        dispatch!(self, find_valid_billing_document(reservation_id, document_type))
    }

    /// Loads every billing document of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn billing_documents(
        &mut self,
        reservation_id: &str,
    ) -> Result<Vec<BillingDocument>, PersistenceError> {
        dispatch!(self, find_billing_documents(reservation_id))
    }

    /// Inserts a billing document.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_billing_document(
        &mut self,
        document: &BillingDocument,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_billing_document(document))
    }

    /// Marks the VALID documents of a type NOT_VALID.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn invalidate_billing_documents(
        &mut self,
        reservation_id: &str,
        document_type: BillingDocumentType,
    ) -> Result<usize, PersistenceError> {
        dispatch!(self, invalidate_billing_documents(reservation_id, document_type))
    }

    /// Takes the next value of an organization's invoice sequence.
    ///
    /// The sequence row is locked, created at 1 on first use, and advanced.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or update fails.
    pub fn next_invoice_sequence(&mut self, organization_id: i64) -> Result<i64, PersistenceError> {
        let current: Option<i64> = dispatch!(self, lock_invoice_sequence(organization_id))?;
        let value: i64 = current.unwrap_or(1);
        if current.is_some() {
            dispatch!(self, update_invoice_sequence(organization_id, value + 1))?;
        } else {
            dispatch!(self, create_invoice_sequence(organization_id, value + 1))?;
        }
        debug!(organization_id, value, "Took invoice sequence value");
        Ok(value)
    }

    // ========================================================================
    // Admin jobs
    // ========================================================================

    /// Loads the jobs with a name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn jobs_by_name(&mut self, job_name: &str) -> Result<Vec<AdminJob>, PersistenceError> {
        dispatch!(self, find_jobs_by_name(job_name))
    }

    /// Claims up to `limit` jobs due at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn lock_due_jobs(
        &mut self,
        now: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<AdminJob>, PersistenceError> {
        dispatch!(self, lock_due_jobs(now, limit))
    }

    /// Schedules a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_admin_job(&mut self, job: &AdminJob) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_admin_job(job))
    }

    /// Records the outcome of a job run.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_admin_job(
        &mut self,
        job_id: i64,
        status: AdminJobStatus,
        attempts: u32,
        execute_at: OffsetDateTime,
        last_error: Option<&str>,
    ) -> Result<(), PersistenceError> {
        dispatch!(
            self,
            update_admin_job(job_id, status, attempts, execute_at, last_error)
        )
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Persists the audit event of a state transition.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn record_transition(
        &mut self,
        result: &TransitionResult,
        at: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        self.insert_audit_event(&result.audit_event, at)
    }

    /// Persists an audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn insert_audit_event(
        &mut self,
        event: &AuditEvent,
        at: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, insert_audit_event(event, at))
    }

    /// Loads the audit timeline of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if events cannot be loaded.
    pub fn audit_events(&mut self, reservation_id: &str) -> Result<Vec<AuditEvent>, PersistenceError> {
        dispatch!(self, find_audit_events(reservation_id))
    }
}
