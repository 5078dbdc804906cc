// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Price calculation in minor currency units.
//!
//! Every amount is an `i64` number of cents. Divisions round half up, so
//! computing the same ticket twice always yields the same breakdown and a
//! retried reservation never drifts by a cent.
//!
//! ## Rules
//!
//! - `PERCENTAGE` discounts take `src * pct / 100`, `FIXED_AMOUNT` takes the
//!   amount; both are capped at the source price.
//! - `FIXED_AMOUNT_RESERVATION` never touches individual tickets and is
//!   subtracted once from the reservation total.
//! - VAT is computed on the taxable amount (`src - discount`) according to
//!   the [`VatStatus`].

use crate::error::DomainError;
use crate::types::{DiscountType, VatRate, VatStatus};
use serde::{Deserialize, Serialize};

const BASIS_POINTS: i128 = 10_000;

/// A discount resolved for a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// How `amount` is interpreted.
    pub discount_type: DiscountType,
    /// Percent for `PERCENTAGE`, cents otherwise.
    pub amount: i64,
}

impl Discount {
    /// Creates a discount, rejecting negative amounts and percentages above 100.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` for out-of-range amounts.
    pub fn new(discount_type: DiscountType, amount: i64) -> Result<Self, DomainError> {
        let out_of_range = amount < 0 || (discount_type == DiscountType::Percentage && amount > 100);
        if out_of_range {
            return Err(DomainError::InvalidAmount {
                field: "discount_amount",
                amount,
            });
        }
        Ok(Self {
            discount_type,
            amount,
        })
    }

    /// Whether the discount is applied per ticket.
    #[must_use]
    pub const fn is_per_ticket(&self) -> bool {
        matches!(
            self.discount_type,
            DiscountType::Percentage | DiscountType::FixedAmount
        )
    }
}

/// The price of one ticket or one additional service item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// List price before discount and VAT adjustments.
    pub src_price: i64,
    /// Discount taken off the source price.
    pub discount: i64,
    /// VAT amount contained in or added to the final price.
    pub vat: i64,
    /// Amount the buyer pays.
    pub final_price: i64,
}

impl PriceBreakdown {
    /// Amount subject to VAT.
    #[must_use]
    pub const fn taxable(&self) -> i64 {
        self.src_price - self.discount
    }
}

/// Aggregated price of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TotalPrice {
    /// Sum of source prices.
    pub src_price: i64,
    /// Amount the buyer pays, VAT included.
    pub price_with_vat: i64,
    /// VAT contained in `price_with_vat`.
    pub vat: i64,
    /// Total discount granted.
    pub discount: i64,
    /// Number of discount applications shown in the summary.
    pub discount_applied_count: u32,
}

impl TotalPrice {
    /// Whether the buyer has anything to pay.
    #[must_use]
    pub const fn requires_payment(&self) -> bool {
        self.price_with_vat > 0
    }
}

/// Divides a non-negative numerator rounding half up.
fn div_half_up(numerator: i128, denominator: i128) -> i64 {
    let rounded = (numerator * 2 + denominator) / (denominator * 2);
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

/// Computes the discount granted on a single source price.
#[must_use]
pub fn discount_for(src_price: i64, discount: Option<&Discount>) -> i64 {
    let Some(discount) = discount else {
        return 0;
    };
    let raw = match discount.discount_type {
        DiscountType::Percentage => div_half_up(
            i128::from(src_price) * i128::from(discount.amount),
            100,
        ),
        DiscountType::FixedAmount => discount.amount,
        DiscountType::FixedAmountReservation | DiscountType::None => 0,
    };
    raw.clamp(0, src_price.max(0))
}

/// Calculates the price of one item.
///
/// # Arguments
///
/// * `src_price` - List price in cents
/// * `vat_status` - VAT mode applied to this item
/// * `vat_rate` - VAT rate
/// * `discount` - Per-ticket discount, if any
///
/// # Errors
///
/// Returns `DomainError::InvalidAmount` if the source price is negative.
pub fn calculate_price(
    src_price: i64,
    vat_status: VatStatus,
    vat_rate: VatRate,
    discount: Option<&Discount>,
) -> Result<PriceBreakdown, DomainError> {
    if src_price < 0 {
        return Err(DomainError::InvalidAmount {
            field: "src_price",
            amount: src_price,
        });
    }

    let discount_amount = discount_for(src_price, discount);
    let taxable = src_price - discount_amount;
    let rate = i128::from(vat_rate.basis_points());

    let (vat, final_price) = match vat_status {
        VatStatus::Included => {
            let vat = included_vat(taxable, rate);
            (vat, taxable)
        }
        VatStatus::NotIncluded => {
            let vat = div_half_up(i128::from(taxable) * rate, BASIS_POINTS);
            (vat, taxable + vat)
        }
        VatStatus::IncludedNotCharged => (0, taxable - included_vat(taxable, rate)),
        VatStatus::None
        | VatStatus::IncludedExempt
        | VatStatus::NotIncludedExempt
        | VatStatus::NotIncludedNotCharged => (0, taxable),
    };

    Ok(PriceBreakdown {
        src_price,
        discount: discount_amount,
        vat,
        final_price,
    })
}

fn included_vat(taxable: i64, rate: i128) -> i64 {
    let net = div_half_up(i128::from(taxable) * BASIS_POINTS, BASIS_POINTS + rate);
    taxable - net
}

/// Aggregates item prices into the reservation total.
///
/// A `FIXED_AMOUNT_RESERVATION` discount is subtracted once from the sum and
/// the VAT is reduced proportionally.
///
/// # Arguments
///
/// * `items` - Every ticket and additional service line
/// * `discount` - The reservation's discount, if any
#[must_use]
pub fn calculate_total(items: &[PriceBreakdown], discount: Option<&Discount>) -> TotalPrice {
    let src_price: i64 = items.iter().map(|i| i.src_price).sum();
    let mut price_with_vat: i64 = items.iter().map(|i| i.final_price).sum();
    let mut vat: i64 = items.iter().map(|i| i.vat).sum();
    let mut total_discount: i64 = items.iter().map(|i| i.discount).sum();
    let discounted_items = items.iter().filter(|i| i.discount > 0).count();

    let mut discount_applied_count = match discount.map(|d| d.discount_type) {
        Some(DiscountType::FixedAmount) => u32::try_from(discounted_items).unwrap_or(u32::MAX),
        Some(_) => u32::from(discounted_items > 0),
        None => 0,
    };

    if let Some(reservation_discount) =
        discount.filter(|d| d.discount_type == DiscountType::FixedAmountReservation)
    {
        let applied = reservation_discount.amount.clamp(0, price_with_vat.max(0));
        if applied > 0 {
            let remaining = price_with_vat - applied;
            vat = if price_with_vat == 0 {
                0
            } else {
                div_half_up(
                    i128::from(vat) * i128::from(remaining),
                    i128::from(price_with_vat),
                )
            };
            price_with_vat = remaining;
            total_discount += applied;
            discount_applied_count = 1;
        }
    }

    TotalPrice {
        src_price,
        price_with_vat,
        vat,
        discount: total_discount,
        discount_applied_count,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pct(amount: i64) -> Discount {
        Discount {
            discount_type: DiscountType::Percentage,
            amount,
        }
    }

    fn fixed(amount: i64) -> Discount {
        Discount {
            discount_type: DiscountType::FixedAmount,
            amount,
        }
    }

    #[test]
    fn test_zero_vat_final_is_source_minus_discount() {
        let d = fixed(250);
        let price = calculate_price(1000, VatStatus::None, VatRate::ZERO, Some(&d)).unwrap();
        assert_eq!(price.final_price, 750);
        assert_eq!(price.vat, 0);
        assert_eq!(price.discount, 250);
    }

    #[test]
    fn test_included_vat_is_contained_in_price() {
        let rate = VatRate::from_basis_points(2000);
        let price = calculate_price(1200, VatStatus::Included, rate, None).unwrap();
        assert_eq!(price.final_price, 1200);
        assert_eq!(price.vat, 200);
    }

    #[test]
    fn test_not_included_vat_is_added() {
        let rate = VatRate::from_basis_points(2000);
        let price = calculate_price(1000, VatStatus::NotIncluded, rate, None).unwrap();
        assert_eq!(price.final_price, 1200);
        assert_eq!(price.vat, 200);
    }

    #[test]
    fn test_included_and_not_included_agree_on_net() {
        let rate = VatRate::from_basis_points(770);
        let not_included = calculate_price(10_000, VatStatus::NotIncluded, rate, None).unwrap();
        let included =
            calculate_price(not_included.final_price, VatStatus::Included, rate, None).unwrap();
        assert_eq!(included.vat, not_included.vat);
        assert_eq!(included.final_price - included.vat, 10_000);
    }

    #[test]
    fn test_half_up_rounding() {
        // 7.7% of 1005 = 77.385 -> 77
        let rate = VatRate::from_basis_points(770);
        let price = calculate_price(1005, VatStatus::NotIncluded, rate, None).unwrap();
        assert_eq!(price.vat, 77);
        // 50% of 3 = 1.5 -> 2
        assert_eq!(discount_for(3, Some(&pct(50))), 2);
    }

    #[test]
    fn test_fixed_discount_capped_at_source_price() {
        let d = fixed(5000);
        let price = calculate_price(1000, VatStatus::None, VatRate::ZERO, Some(&d)).unwrap();
        assert_eq!(price.discount, 1000);
        assert_eq!(price.final_price, 0);
    }

    #[test]
    fn test_included_not_charged_removes_vat() {
        let rate = VatRate::from_basis_points(2000);
        let price = calculate_price(1200, VatStatus::IncludedNotCharged, rate, None).unwrap();
        assert_eq!(price.vat, 0);
        assert_eq!(price.final_price, 1000);
    }

    #[test]
    fn test_exempt_statuses_charge_no_vat() {
        let rate = VatRate::from_basis_points(2000);
        for status in [
            VatStatus::IncludedExempt,
            VatStatus::NotIncludedExempt,
            VatStatus::NotIncludedNotCharged,
        ] {
            let price = calculate_price(1000, status, rate, None).unwrap();
            assert_eq!(price.vat, 0);
            assert_eq!(price.final_price, 1000);
        }
    }

    #[test]
    fn test_negative_source_price_rejected() {
        let result = calculate_price(-1, VatStatus::None, VatRate::ZERO, None);
        assert!(matches!(result, Err(DomainError::InvalidAmount { .. })));
    }

    #[test]
    fn test_reservation_discount_applied_once() {
        let d = Discount {
            discount_type: DiscountType::FixedAmountReservation,
            amount: 500,
        };
        let item = calculate_price(1000, VatStatus::None, VatRate::ZERO, Some(&d)).unwrap();
        assert_eq!(item.discount, 0);
        let total = calculate_total(&[item, item, item], Some(&d));
        assert_eq!(total.price_with_vat, 2500);
        assert_eq!(total.discount, 500);
        assert_eq!(total.discount_applied_count, 1);
    }

    #[test]
    fn test_discount_count_per_type() {
        let f = fixed(100);
        let item = calculate_price(1000, VatStatus::None, VatRate::ZERO, Some(&f)).unwrap();
        let total = calculate_total(&[item, item], Some(&f));
        assert_eq!(total.discount_applied_count, 2);

        let p = pct(10);
        let item = calculate_price(1000, VatStatus::None, VatRate::ZERO, Some(&p)).unwrap();
        let total = calculate_total(&[item, item], Some(&p));
        assert_eq!(total.discount_applied_count, 1);
        assert_eq!(total.discount, 200);
    }

    #[test]
    fn test_discount_rejects_percentage_above_hundred() {
        assert!(Discount::new(DiscountType::Percentage, 101).is_err());
        assert!(Discount::new(DiscountType::FixedAmount, -1).is_err());
        assert!(Discount::new(DiscountType::FixedAmount, 10_000).is_ok());
    }

    #[test]
    fn test_free_total_requires_no_payment() {
        let total = calculate_total(&[PriceBreakdown::default()], None);
        assert!(!total.requires_payment());
    }
}
