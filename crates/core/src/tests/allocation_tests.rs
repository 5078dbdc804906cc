// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{create_test_category, create_test_token};
use crate::{CoreError, TicketRequest, check_special_price};
use alfio_domain::{DomainError, SpecialPriceStatus};

#[test]
fn test_unrestricted_category_ignores_token() {
    let category = create_test_category(false);
    assert!(check_special_price(&category, None, None, 4).is_ok());
}

#[test]
fn test_restricted_category_without_code_is_missing() {
    let category = create_test_category(true);
    let result = check_special_price(&category, None, None, 1);
    assert_eq!(
        result,
        Err(CoreError::MissingSpecialPriceToken { category_id: 10 })
    );
}

#[test]
fn test_unknown_token_is_invalid() {
    let category = create_test_category(true);
    let result = check_special_price(&category, Some("NOPE"), None, 1);
    assert!(matches!(
        result,
        Err(CoreError::InvalidSpecialPriceToken { code }) if code == "NOPE"
    ));
}

#[test]
fn test_used_token_is_invalid() {
    let category = create_test_category(true);
    let token = create_test_token(10, SpecialPriceStatus::Pending);
    let result = check_special_price(&category, Some("VIP-TOKEN"), Some(&token), 1);
    assert!(matches!(
        result,
        Err(CoreError::InvalidSpecialPriceToken { .. })
    ));
}

#[test]
fn test_token_of_other_category_is_invalid() {
    let category = create_test_category(true);
    let token = create_test_token(99, SpecialPriceStatus::Free);
    let result = check_special_price(&category, Some("VIP-TOKEN"), Some(&token), 1);
    assert!(matches!(
        result,
        Err(CoreError::InvalidSpecialPriceToken { .. })
    ));
}

#[test]
fn test_one_token_cannot_buy_two_tickets() {
    let category = create_test_category(true);
    let token = create_test_token(10, SpecialPriceStatus::Free);
    let result = check_special_price(&category, Some("VIP-TOKEN"), Some(&token), 2);
    assert_eq!(result, Err(CoreError::NotEnoughTickets));
    assert!(check_special_price(&category, Some("VIP-TOKEN"), Some(&token), 1).is_ok());
}

#[test]
fn test_zero_quantity_rejected() {
    let request = TicketRequest {
        category_id: 1,
        quantity: 0,
    };
    assert_eq!(request.validate(), Err(DomainError::InvalidQuantity(0)));
}
