// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Waiting queue subscriptions and seat redistribution.

use alfio::{Command, ReservationState, apply};
use alfio_audit::{Actor, AuditEvent, AuditEventType, StateSnapshot};
use alfio_domain::{
    CategoryAvailability, DomainError, Event, ReservationStatus, SubscriptionType, Ticket,
    TicketCategory, TicketStatus, WaitingQueueStatus, WaitingQueueSubscription, distribute_seats,
    first_expiring_unbounded, validate_subscriber_email, waiting_queue_expiration,
};
use alfio_persistence::{Persistence, Store};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::allocator::{bind_tickets, draft_reservation, pool_of, price_category, refresh_totals};
use crate::context::ServiceContext;
use crate::error::ServiceError;
use crate::lifecycle::cause;

/// A subscriber's request to be notified of free seats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub event_id: i64,
    pub full_name: String,
    pub email: String,
    pub language: String,
    pub selected_category_id: Option<i64>,
}

/// A seat offered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Offer {
    subscription: WaitingQueueSubscription,
    reservation_id: String,
    validity: OffsetDateTime,
}

/// What a redistribution run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionSummary {
    /// Seats offered to subscribers.
    pub offered: usize,
    /// RELEASED tickets returned to FREE.
    pub reverted: usize,
    /// FREE tickets set aside for pre-sales subscribers.
    pub pre_reserved: usize,
}

/// Manages subscriptions and hands released seats to subscribers.
#[derive(Clone)]
pub struct WaitingQueueManager {
    context: ServiceContext,
}

impl std::fmt::Debug for WaitingQueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitingQueueManager").finish_non_exhaustive()
    }
}

impl WaitingQueueManager {
    #[must_use]
    pub const fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    /// Adds a subscriber to the queue of an event.
    ///
    /// Before any category is on sale the subscription is a pre-sales one
    /// and requires pre-registration; afterwards it is a sold-out one and
    /// requires the waiting queue.
    ///
    /// # Errors
    ///
    /// * `InvalidEmail` - the address is malformed
    /// * `WaitingQueueClosed` - the event accepts no subscription of that kind
    pub fn subscribe(
        &self,
        persistence: &mut Persistence,
        request: &SubscriptionRequest,
    ) -> Result<i64, ServiceError> {
        validate_subscriber_email(&request.email)?;
        let now = self.context.now();
        persistence.transaction(|store| {
            let event = store.event(request.event_id)?;
            let categories = store.categories(event.id)?;
            let sale_open = categories.iter().any(|c| c.is_on_sale(now));
            let subscription_type = if sale_open {
                SubscriptionType::SoldOut
            } else {
                SubscriptionType::PreSales
            };
            let accepted = match subscription_type {
                SubscriptionType::SoldOut => event.waiting_queue_enabled,
                SubscriptionType::PreSales => event.pre_registration_enabled,
            };
            if !accepted || event.has_started(now) {
                return Err(DomainError::WaitingQueueClosed { event_id: event.id }.into());
            }
            let subscription = WaitingQueueSubscription {
                id: 0,
                event_id: event.id,
                full_name: request.full_name.trim().to_string(),
                email: request.email.trim().to_string(),
                language: request.language.clone(),
                selected_category_id: request.selected_category_id,
                subscription_type,
                status: WaitingQueueStatus::Waiting,
                reservation_id: None,
                created_at: now,
            };
            let id = store.insert_subscription(&subscription)?;
            info!(
                event_id = event.id,
                subscription_id = id,
                %subscription_type,
                "Waiting queue subscription added"
            );
            Ok(id)
        })
    }

    /// Redistributes seats of every event with a waiting queue.
    ///
    /// An event that fails is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the events cannot be listed.
    pub fn distribute_all(
        &self,
        persistence: &mut Persistence,
    ) -> Result<DistributionSummary, ServiceError> {
        let events = persistence.store().events_with_waiting_queue()?;
        let mut total = DistributionSummary::default();
        for event in events {
            match self.distribute_seats(persistence, event.id) {
                Ok(summary) => {
                    total.offered += summary.offered;
                    total.reverted += summary.reverted;
                    total.pre_reserved += summary.pre_reserved;
                }
                Err(err) => warn!(event_id = event.id, error = %err, "Seat distribution failed"),
            }
        }
        Ok(total)
    }

    /// Offers released seats to waiting subscribers, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails; nothing is offered in that case.
    pub fn distribute_seats(
        &self,
        persistence: &mut Persistence,
        event_id: i64,
    ) -> Result<DistributionSummary, ServiceError> {
        let now = self.context.now();
        let (event, offers, summary) = persistence.transaction(|store| {
            let event = store.event(event_id)?;
            let released = store.tickets_by_status(event_id, TicketStatus::Released)?;
            let mut summary = DistributionSummary::default();

            // counted without locks: rows held by a concurrent run still wait
            if store.count_waiting_subscriptions(event_id)? == 0 {
                if !released.is_empty() {
                    summary.reverted = store.revert_released_tickets(event_id)?;
                    info!(event_id, reverted = summary.reverted, "Released tickets returned to sale");
                }
                return Ok::<_, ServiceError>((event, Vec::new(), summary));
            }
            let subscriptions = store.lock_waiting_subscriptions(event_id)?;
            if subscriptions.is_empty() {
                debug!(event_id, "Subscriptions held by another distribution");
                return Ok((event, Vec::new(), summary));
            }

            if !released.is_empty() {
                let offers =
                    self.offer(store, &event, subscriptions, &released, TicketStatus::Released, now)?;
                summary.offered = offers.len();
                return Ok((event, offers, summary));
            }

            if !event.pre_registration_enabled {
                return Ok((event, Vec::new(), summary));
            }
            let pre_sales: Vec<WaitingQueueSubscription> = subscriptions
                .into_iter()
                .filter(|s| s.subscription_type == SubscriptionType::PreSales)
                .collect();
            if pre_sales.is_empty() {
                return Ok((event, Vec::new(), summary));
            }
            let categories = store.categories(event_id)?;
            let pre_reserved = store.tickets_by_status(event_id, TicketStatus::PreReserved)?;
            if !pre_reserved.is_empty() && self.sale_opens_soon(&categories, now) {
                let offers = self.offer(
                    store,
                    &event,
                    pre_sales,
                    &pre_reserved,
                    TicketStatus::PreReserved,
                    now,
                )?;
                summary.offered = offers.len();
                return Ok((event, offers, summary));
            }
            summary.pre_reserved = Self::pre_reserve(
                store,
                &event,
                &categories,
                pre_sales.len(),
                pre_reserved.len(),
                now,
            )?;
            Ok((event, Vec::new(), summary))
        })?;

        for offer in &offers {
            self.context.notify(
                &event,
                "waiting-queue-offer",
                Some(offer.reservation_id.as_str()),
                &offer.subscription.email,
                "A seat is available for you",
                &|| {
                    format!(
                        "A seat for {} is held for you until {}. Reservation: {}",
                        event.short_name, offer.validity, offer.reservation_id
                    )
                },
            );
        }
        if summary != DistributionSummary::default() {
            info!(
                event_id,
                offered = summary.offered,
                reverted = summary.reverted,
                pre_reserved = summary.pre_reserved,
                "Waiting queue distributed"
            );
        }
        Ok(summary)
    }

    fn sale_opens_soon(&self, categories: &[TicketCategory], now: OffsetDateTime) -> bool {
        categories
            .iter()
            .filter(|c| c.is_active() && !c.access_restricted)
            .map(|c| c.inception)
            .min()
            .is_some_and(|opens| opens - now <= self.context.settings.pre_sales_window)
    }

    /// Creates one single-ticket reservation per subscriber, FIFO.
    ///
    /// `candidates` only tell which pools hold `source` tickets; every seat
    /// is claimed through the ticket row locks, so at most one seat per
    /// claimable ticket is offered.
    fn offer(
        &self,
        store: &mut Store<'_>,
        event: &Event,
        subscriptions: Vec<WaitingQueueSubscription>,
        candidates: &[Ticket],
        source: TicketStatus,
        now: OffsetDateTime,
    ) -> Result<Vec<Offer>, ServiceError> {
        let settings = &self.context.settings;
        let validity = waiting_queue_expiration(
            now,
            settings.waiting_queue_timeout_hours,
            &event.time_zone,
            settings.working_period,
        )?;
        let categories = store.categories(event.id)?;
        let mut pools: Vec<Option<i64>> = Vec::new();
        for ticket in candidates {
            if !pools.contains(&ticket.category_id) {
                pools.push(ticket.category_id);
            }
        }

        let mut offers = Vec::new();
        for subscription in subscriptions {
            if pools.is_empty() {
                break;
            }
            let Some((category, ticket_id)) =
                Self::claim_seat(store, event.id, &categories, &mut pools, &subscription, source, now)?
            else {
                debug!(subscription_id = subscription.id, "No seat left for the subscriber");
                continue;
            };
            let reservation_id = uuid::Uuid::new_v4().to_string();
            let mut reservation =
                draft_reservation(event, &reservation_id, now, validity, &subscription.language);
            reservation.customer.full_name = Some(subscription.full_name.clone());
            reservation.customer.email = Some(subscription.email.clone());
            store.insert_reservation(&reservation)?;
            bind_tickets(store, &[ticket_id], &reservation_id, &category, &subscription.language)?;
            price_category(store, event, &reservation_id, &category, None, event.vat_status)?;
            refresh_totals(store, &mut reservation, None)?;
            store.update_reservation(&reservation)?;

            let created = apply(
                &ReservationState::pending(reservation_id.clone(), event.id),
                Command::Create,
                Actor::system(),
                cause("waiting queue offer"),
            )?;
            store.record_transition(&created, now)?;
            store.insert_audit_event(
                &AuditEvent::new(
                    reservation_id.clone(),
                    event.id,
                    AuditEventType::WaitingQueueOffer,
                    Actor::system(),
                    cause(&format!("subscription {}", subscription.id)),
                    StateSnapshot::none(),
                    StateSnapshot::of(ReservationStatus::Pending),
                ),
                now,
            )?;
            store.update_subscription(
                subscription.id,
                WaitingQueueStatus::Pending,
                Some(&reservation_id),
            )?;
            debug!(
                subscription_id = subscription.id,
                %reservation_id,
                ticket_id,
                "Seat offered"
            );
            offers.push(Offer {
                subscription,
                reservation_id,
                validity,
            });
        }
        Ok(offers)
    }

    /// Locks one `source` ticket for `subscription`.
    ///
    /// Pools found empty are dropped from `pools`.
    fn claim_seat(
        store: &mut Store<'_>,
        event_id: i64,
        categories: &[TicketCategory],
        pools: &mut Vec<Option<i64>>,
        subscription: &WaitingQueueSubscription,
        source: TicketStatus,
        now: OffsetDateTime,
    ) -> Result<Option<(TicketCategory, i64)>, ServiceError> {
        let mut index = 0;
        while index < pools.len() {
            let Some(category) = Self::category_for(categories, subscription, pools[index], now)
            else {
                index += 1;
                continue;
            };
            let ids = store.lock_tickets(event_id, pool_of(category), &[source], 1)?;
            if let Some(&ticket_id) = ids.first() {
                return Ok(Some((category.clone(), ticket_id)));
            }
            pools.remove(index);
        }
        Ok(None)
    }

    /// The category a freed ticket is offered in.
    ///
    /// Bounded tickets keep their category. Tickets of the shared pool go
    /// to the subscriber's unbounded choice, else to the unbounded category
    /// closing first.
    fn category_for<'c>(
        categories: &'c [TicketCategory],
        subscription: &WaitingQueueSubscription,
        ticket_category: Option<i64>,
        now: OffsetDateTime,
    ) -> Option<&'c TicketCategory> {
        if let Some(category_id) = ticket_category {
            return categories.iter().find(|c| c.id == category_id);
        }
        subscription
            .selected_category_id
            .and_then(|id| categories.iter().find(|c| c.id == id && !c.bounded))
            .or_else(|| first_expiring_unbounded(categories, now))
    }

    /// Sets FREE seats aside for pre-sales subscribers.
    ///
    /// Seats are spread over unrestricted categories in proportion to what
    /// each still has. Returns the number of tickets pre-reserved.
    fn pre_reserve(
        store: &mut Store<'_>,
        event: &Event,
        categories: &[TicketCategory],
        subscribers: usize,
        already_reserved: usize,
        now: OffsetDateTime,
    ) -> Result<usize, ServiceError> {
        let wanted = subscribers.saturating_sub(already_reserved);
        if wanted == 0 {
            return Ok(0);
        }
        let open = |c: &&TicketCategory| c.is_active() && !c.access_restricted && c.expiration > now;
        // unbounded categories share one pool, represented by the one closing first
        let mut eligible: Vec<&TicketCategory> =
            categories.iter().filter(|c| c.bounded).filter(open).collect();
        if let Some(unbounded) = categories
            .iter()
            .filter(|c| !c.bounded)
            .filter(open)
            .min_by_key(|c| (c.expiration, c.ordinal))
        {
            eligible.push(unbounded);
        }
        let mut availability = Vec::with_capacity(eligible.len());
        for category in &eligible {
            let available = store.count_available_tickets(category)?;
            availability.push(CategoryAvailability {
                category_id: category.id,
                available,
            });
        }
        let existing: u32 = availability.iter().map(|a| a.available).sum();
        let seats = u32::try_from(wanted).unwrap_or(u32::MAX).min(existing);

        let mut pre_reserved = 0;
        for allocation in distribute_seats(seats, &availability) {
            let Some(category) = eligible.iter().find(|c| c.id == allocation.category_id) else {
                continue;
            };
            let ids = store.lock_tickets(
                event.id,
                pool_of(category),
                &[TicketStatus::Free],
                allocation.seats,
            )?;
            pre_reserved += store.set_ticket_status(&ids, TicketStatus::PreReserved)?;
        }
        if pre_reserved > 0 {
            info!(event_id = event.id, pre_reserved, "Seats pre-reserved for pre-sales");
        }
        Ok(pre_reserved)
    }
}
