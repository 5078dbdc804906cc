// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Promo codes and special price tokens.
//!
//! A promo code either discounts prices (`DISCOUNT`, `DYNAMIC`) or unlocks
//! a hidden category (`ACCESS`). Special prices are single-use tokens that
//! gate access-restricted categories.

use crate::error::DomainError;
use crate::pricing::Discount;
use crate::types::{CodeType, DiscountType, SpecialPriceStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A promo code defined for an event or an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCodeDiscount {
    pub id: i64,
    pub code: String,
    pub event_id: Option<i64>,
    pub organization_id: i64,
    pub code_type: CodeType,
    pub discount_type: DiscountType,
    /// Percent for `PERCENTAGE`, cents otherwise.
    pub discount_amount: i64,
    /// Categories the code applies to. Empty means every category.
    pub categories: Vec<i64>,
    /// The category unlocked by an `ACCESS` code.
    pub hidden_category_id: Option<i64>,
    /// Maximum number of tickets that may use the code.
    pub max_usage: Option<u32>,
    #[serde(with = "time::serde::timestamp")]
    pub valid_from: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub valid_to: OffsetDateTime,
}

impl PromoCodeDiscount {
    /// Whether the code can be used at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        self.valid_from <= now && now < self.valid_to
    }

    /// Whether the code discounts tickets of `category_id`.
    #[must_use]
    pub fn applies_to_category(&self, category_id: i64) -> bool {
        if self.code_type == CodeType::Access {
            return self.hidden_category_id == Some(category_id);
        }
        self.categories.is_empty() || self.categories.contains(&category_id)
    }

    /// The discount carried by the code, if it discounts anything.
    #[must_use]
    pub const fn discount(&self) -> Option<Discount> {
        match (self.code_type, self.discount_type) {
            (CodeType::Access, _) | (_, DiscountType::None) => None,
            _ => Some(Discount {
                discount_type: self.discount_type,
                amount: self.discount_amount,
            }),
        }
    }

    /// Validates the code for use at `now`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PromoCodeNotActive` outside the validity window.
    pub fn validate_active(&self, now: OffsetDateTime) -> Result<(), DomainError> {
        if self.is_active_at(now) {
            Ok(())
        } else {
            Err(DomainError::PromoCodeNotActive {
                code: self.code.clone(),
            })
        }
    }

    /// Returns true if adding `requested` tickets to `already_used` would
    /// exceed the usage cap.
    #[must_use]
    pub fn exceeds_usage(&self, already_used: u32, requested: u32) -> bool {
        self.max_usage
            .is_some_and(|max| already_used.saturating_add(requested) > max)
    }
}

/// A single-use token granting access to a restricted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialPrice {
    pub id: i64,
    pub code: String,
    pub category_id: i64,
    /// Price override in cents.
    pub price: i64,
    pub status: SpecialPriceStatus,
    pub reservation_id: Option<String>,
    pub access_code_id: Option<i64>,
}

impl SpecialPrice {
    /// Whether the token can be bound to a new reservation for `category_id`.
    #[must_use]
    pub fn is_usable_for(&self, category_id: i64) -> bool {
        self.status == SpecialPriceStatus::Free
            && self.category_id == category_id
            && self.reservation_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn promo(code_type: CodeType, discount_type: DiscountType) -> PromoCodeDiscount {
        PromoCodeDiscount {
            id: 1,
            code: "SPRING".to_string(),
            event_id: Some(1),
            organization_id: 1,
            code_type,
            discount_type,
            discount_amount: 10,
            categories: vec![],
            hidden_category_id: Some(7),
            max_usage: Some(3),
            valid_from: datetime!(2026-01-01 00:00 UTC),
            valid_to: datetime!(2026-02-01 00:00 UTC),
        }
    }

    #[test]
    fn test_validity_window() {
        let code = promo(CodeType::Discount, DiscountType::Percentage);
        assert!(code.validate_active(datetime!(2026-01-15 00:00 UTC)).is_ok());
        assert!(matches!(
            code.validate_active(datetime!(2026-02-01 00:00 UTC)),
            Err(DomainError::PromoCodeNotActive { .. })
        ));
    }

    #[test]
    fn test_empty_category_list_applies_everywhere() {
        let mut code = promo(CodeType::Discount, DiscountType::Percentage);
        assert!(code.applies_to_category(42));
        code.categories = vec![1, 2];
        assert!(!code.applies_to_category(42));
        assert!(code.applies_to_category(2));
    }

    #[test]
    fn test_access_code_only_targets_hidden_category() {
        let code = promo(CodeType::Access, DiscountType::None);
        assert!(code.applies_to_category(7));
        assert!(!code.applies_to_category(1));
        assert!(code.discount().is_none());
    }

    #[test]
    fn test_usage_cap() {
        let code = promo(CodeType::Discount, DiscountType::FixedAmount);
        assert!(!code.exceeds_usage(1, 2));
        assert!(code.exceeds_usage(1, 3));
        let uncapped = PromoCodeDiscount {
            max_usage: None,
            ..code
        };
        assert!(!uncapped.exceeds_usage(1000, 1000));
    }

    #[test]
    fn test_special_price_usable_only_when_free() {
        let mut token = SpecialPrice {
            id: 1,
            code: "TOKEN".to_string(),
            category_id: 3,
            price: 0,
            status: SpecialPriceStatus::Free,
            reservation_id: None,
            access_code_id: None,
        };
        assert!(token.is_usable_for(3));
        assert!(!token.is_usable_for(4));
        token.status = SpecialPriceStatus::Pending;
        assert!(!token.is_usable_for(3));
    }
}
