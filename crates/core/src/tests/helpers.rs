// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ReservationState, apply, Command};
use alfio_audit::{Actor, ActorKind, Cause};
use alfio_domain::{
    CategoryAccessType, CategoryStatus, ReservationStatus, SpecialPrice, SpecialPriceStatus,
    TicketCategory,
};
use time::macros::datetime;

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("buyer@example.org"), ActorKind::Customer)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Checkout"))
}

pub fn create_test_state() -> ReservationState {
    ReservationState::pending(String::from("res-1"), 1)
}

/// Drives a fresh reservation through `commands`, panicking on failure.
pub fn state_after(commands: Vec<Command>) -> ReservationState {
    commands
        .into_iter()
        .fold(create_test_state(), |state, command| {
            apply(&state, command, create_test_actor(), create_test_cause())
                .unwrap()
                .new_state
        })
}

pub fn state_with_status(status: ReservationStatus) -> ReservationState {
    ReservationState {
        status,
        ..create_test_state()
    }
}

pub fn create_test_category(access_restricted: bool) -> TicketCategory {
    TicketCategory {
        id: 10,
        event_id: 1,
        name: String::from("VIP"),
        bounded: true,
        max_tickets: 5,
        src_price: 10_000,
        access_restricted,
        inception: datetime!(2026-01-01 00:00 UTC),
        expiration: datetime!(2026-12-01 00:00 UTC),
        ordinal: 1,
        access_type: CategoryAccessType::Inherit,
        status: CategoryStatus::Active,
        blacklisted_payment_methods: vec![],
    }
}

pub fn create_test_token(category_id: i64, status: SpecialPriceStatus) -> SpecialPrice {
    SpecialPrice {
        id: 1,
        code: String::from("VIP-TOKEN"),
        category_id,
        price: 0,
        status,
        reservation_id: None,
        access_code_id: None,
    }
}
