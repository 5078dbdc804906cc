// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use alfio_domain::{DomainError, SpecialPrice, TicketCategory};

/// A request for seats of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    pub category_id: i64,
    pub quantity: u32,
}

impl TicketRequest {
    /// Validates the requested quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` for zero.
    pub const fn validate(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::InvalidQuantity(self.quantity));
        }
        Ok(())
    }
}

/// Checks the access token supplied for a category.
///
/// Unrestricted categories ignore the token. A restricted category needs a
/// FREE token of the same category, and a token buys exactly one ticket.
///
/// # Arguments
///
/// * `category` - The category being reserved
/// * `code` - The token as supplied by the buyer
/// * `token` - The token row found for `code`, if any
/// * `quantity` - Number of tickets requested
///
/// # Errors
///
/// * `MissingSpecialPriceToken` - restricted category without a code
/// * `InvalidSpecialPriceToken` - unknown, used or foreign token
/// * `NotEnoughTickets` - more than one ticket for a single token
pub fn check_special_price(
    category: &TicketCategory,
    code: Option<&str>,
    token: Option<&SpecialPrice>,
    quantity: u32,
) -> Result<(), CoreError> {
    if !category.access_restricted {
        return Ok(());
    }
    let Some(code) = code else {
        return Err(CoreError::MissingSpecialPriceToken {
            category_id: category.id,
        });
    };
    if !token.is_some_and(|t| t.is_usable_for(category.id)) {
        return Err(CoreError::InvalidSpecialPriceToken {
            code: code.to_string(),
        });
    }
    if quantity > 1 {
        return Err(CoreError::NotEnoughTickets);
    }
    Ok(())
}
