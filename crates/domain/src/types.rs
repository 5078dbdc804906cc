// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persisted enumerations shared by every layer.
//!
//! Each enum is stored as its upper-case text form. The `string_enum!`
//! macro keeps the text form, `FromStr` and `Display` in one place so the
//! persistence layer can round-trip values without ad-hoc matches.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Declares a text-backed enum with `as_str`, `FromStr` and `Display`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $text:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant
            ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the persisted text form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err($crate::error::DomainError::UnknownValue {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Status of a single ticket row.
    pub enum TicketStatus {
        /// Available for sale.
        Free => "FREE",
        /// Held by a reservation that has not been paid yet.
        Pending => "PENDING",
        /// Confirmed but payment is collected later (on site / bank transfer).
        ToBePaid => "TO_BE_PAID",
        /// Paid and assigned.
        Acquired => "ACQUIRED",
        /// Cancelled by an organizer.
        Cancelled => "CANCELLED",
        /// Attendee has been checked in.
        CheckedIn => "CHECKED_IN",
        /// Expired without payment.
        Expired => "EXPIRED",
        /// Removed from the inventory.
        Invalidated => "INVALIDATED",
        /// Returned to the pool, reserved for the waiting queue.
        Released => "RELEASED",
        /// Set aside for pre-registered waiting-queue subscribers.
        PreReserved => "PRE_RESERVED",
    }
}

impl TicketStatus {
    /// Statuses for which a ticket carries no reservation.
    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        matches!(self, Self::Free | Self::Released | Self::PreReserved)
    }

    /// Statuses counted as sold when computing seat availability.
    #[must_use]
    pub const fn is_sold(&self) -> bool {
        matches!(self, Self::Acquired | Self::ToBePaid | Self::CheckedIn)
    }
}

string_enum! {
    /// Status of a special price (one-time access token).
    pub enum SpecialPriceStatus {
        /// Generated but not distributed yet.
        Waiting => "WAITING",
        /// Usable.
        Free => "FREE",
        /// Bound to an unpaid reservation.
        Pending => "PENDING",
        /// Consumed by a confirmed reservation.
        Taken => "TAKEN",
        /// Revoked.
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    /// How VAT is applied to a price.
    pub enum VatStatus {
        /// No VAT applies.
        None => "NONE",
        /// Prices include VAT.
        Included => "INCLUDED",
        /// VAT is added on top of prices.
        NotIncluded => "NOT_INCLUDED",
        /// Prices include VAT but the buyer is exempt.
        IncludedExempt => "INCLUDED_EXEMPT",
        /// VAT would be added but the buyer is exempt.
        NotIncludedExempt => "NOT_INCLUDED_EXEMPT",
        /// Prices include VAT which is deducted and not charged.
        IncludedNotCharged => "INCLUDED_NOT_CHARGED",
        /// VAT would be added but is not charged.
        NotIncludedNotCharged => "NOT_INCLUDED_NOT_CHARGED",
    }
}

impl VatStatus {
    /// Returns `true` when no VAT amount is charged for this status.
    #[must_use]
    pub const fn is_vat_exempt(&self) -> bool {
        !matches!(self, Self::Included | Self::NotIncluded)
    }

    /// Exempt variant used when reverse charge applies to the whole reservation.
    #[must_use]
    pub const fn to_exempt(&self) -> Self {
        match self {
            Self::Included | Self::IncludedNotCharged => Self::IncludedExempt,
            Self::NotIncluded | Self::NotIncludedNotCharged => Self::NotIncludedExempt,
            other => *other,
        }
    }

    /// Not-charged variant used when reverse charge applies to some categories.
    #[must_use]
    pub const fn to_not_charged(&self) -> Self {
        match self {
            Self::Included => Self::IncludedNotCharged,
            Self::NotIncluded => Self::NotIncludedNotCharged,
            other => *other,
        }
    }
}

string_enum! {
    /// Payment channel used to settle a reservation.
    pub enum PaymentProxy {
        /// Card payments via Stripe.
        Stripe => "STRIPE",
        /// PayPal redirect flow.
        Paypal => "PAYPAL",
        /// Bank transfer, confirmed manually or by matching.
        Offline => "OFFLINE",
        /// Paid at the venue.
        OnSite => "ON_SITE",
        /// Reservation created by an administrator.
        Admin => "ADMIN",
        /// Nothing to pay.
        None => "NONE",
    }
}

impl PaymentProxy {
    /// Whether tickets are acquired immediately on finalization.
    #[must_use]
    pub const fn acquires_tickets_immediately(&self) -> bool {
        !matches!(self, Self::Offline | Self::OnSite)
    }
}

string_enum! {
    /// Payment method selected by the buyer.
    pub enum PaymentMethod {
        /// Credit or debit card.
        CreditCard => "CREDIT_CARD",
        /// PayPal account.
        Paypal => "PAYPAL",
        /// iDEAL bank redirect.
        Ideal => "IDEAL",
        /// Bank transfer.
        BankTransfer => "BANK_TRANSFER",
        /// Pay at the venue.
        OnSite => "ON_SITE",
        /// Free reservation.
        None => "NONE",
    }
}

string_enum! {
    /// Event format, relevant for reverse-charge decisions.
    pub enum EventFormat {
        /// Physical attendance only.
        InPerson => "IN_PERSON",
        /// Online only.
        Online => "ONLINE",
        /// Both, per category.
        Hybrid => "HYBRID",
    }
}

string_enum! {
    /// How a category is attended.
    pub enum CategoryAccessType {
        /// Same as the event format.
        Inherit => "INHERIT",
        /// Physical attendance.
        InPerson => "IN_PERSON",
        /// Online attendance.
        Online => "ONLINE",
    }
}

string_enum! {
    /// Whether a category can be sold.
    pub enum CategoryStatus {
        /// On sale.
        Active => "ACTIVE",
        /// Disabled by the organizer.
        NotActive => "NOT_ACTIVE",
    }
}

string_enum! {
    /// Purpose of a promo code.
    pub enum CodeType {
        /// Price discount.
        Discount => "DISCOUNT",
        /// Unlocks a hidden, access-restricted category.
        Access => "ACCESS",
        /// Generated at runtime by an extension.
        Dynamic => "DYNAMIC",
    }
}

string_enum! {
    /// How a discount amount is interpreted.
    pub enum DiscountType {
        /// Amount in minor units, off every qualifying ticket.
        FixedAmount => "FIXED_AMOUNT",
        /// Percentage off every qualifying ticket.
        Percentage => "PERCENTAGE",
        /// Amount in minor units, off the reservation total once.
        FixedAmountReservation => "FIXED_AMOUNT_RESERVATION",
        /// No discount.
        None => "NONE",
    }
}

string_enum! {
    /// Status of a waiting-queue subscription.
    pub enum WaitingQueueStatus {
        /// Waiting for a seat.
        Waiting => "WAITING",
        /// A seat has been offered through a pending reservation.
        Pending => "PENDING",
        /// The offered reservation was confirmed.
        Acquired => "ACQUIRED",
        /// The offered reservation expired.
        Expired => "EXPIRED",
        /// Unsubscribed.
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    /// Why a subscriber joined the waiting queue.
    pub enum SubscriptionType {
        /// Registered before the sale opened.
        PreSales => "PRE_SALES",
        /// Registered after the event sold out.
        SoldOut => "SOLD_OUT",
    }
}

string_enum! {
    /// Status of a payment transaction.
    pub enum TransactionStatus {
        /// Started but not confirmed.
        Pending => "PENDING",
        /// Money received.
        Complete => "COMPLETE",
        /// Bank transfer awaiting review.
        OfflinePendingReview => "OFFLINE_PENDING_REVIEW",
        /// A matching bank transfer has been found.
        OfflineMatchingPaymentFound => "OFFLINE_MATCHING_PAYMENT_FOUND",
        /// Rejected or failed.
        Failed => "FAILED",
    }
}

string_enum! {
    /// Kind of billing document.
    pub enum BillingDocumentType {
        /// Tax invoice with a sequential number.
        Invoice => "INVOICE",
        /// Simple receipt.
        Receipt => "RECEIPT",
        /// Credit note cancelling an invoice.
        CreditNote => "CREDIT_NOTE",
    }
}

string_enum! {
    /// Validity of a billing document.
    pub enum BillingDocumentStatus {
        /// Current document.
        Valid => "VALID",
        /// Superseded document.
        NotValid => "NOT_VALID",
    }
}

string_enum! {
    /// Usage policy of a group link.
    pub enum LinkType {
        /// Each member value may be used for one ticket.
        OncePerValue => "ONCE_PER_VALUE",
        /// Each member value may be used up to the configured maximum.
        LimitedQuantity => "LIMITED_QUANTITY",
        /// No limit.
        Unlimited => "UNLIMITED",
    }
}

string_enum! {
    /// How holder e-mails are matched against group members.
    pub enum MatchType {
        /// Exact (case-insensitive) match only.
        Full => "FULL",
        /// Exact match or same e-mail domain.
        EmailDomain => "EMAIL_DOMAIN",
    }
}

string_enum! {
    /// How an additional service is attached to reservations.
    pub enum SupplementPolicy {
        /// Added automatically, once per ticket.
        MandatoryOneForTicket => "MANDATORY_ONE_FOR_TICKET",
        /// Optional, any quantity.
        OptionalUnlimitedAmount => "OPTIONAL_UNLIMITED_AMOUNT",
        /// Optional, at most the configured quantity per ticket.
        OptionalMaxAmountPerTicket => "OPTIONAL_MAX_AMOUNT_PER_TICKET",
    }
}

string_enum! {
    /// Status of a reserved additional service item.
    pub enum AdditionalServiceItemStatus {
        /// Held by an unpaid reservation.
        Pending => "PENDING",
        /// Payment collected later.
        ToBePaid => "TO_BE_PAID",
        /// Paid.
        Acquired => "ACQUIRED",
        /// Released.
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    /// Status of an admin job.
    pub enum AdminJobStatus {
        /// Waiting for its execution time.
        Scheduled => "SCHEDULED",
        /// Picked by a worker.
        Running => "RUNNING",
        /// Completed successfully.
        Executed => "EXECUTED",
        /// Gave up after the maximum number of attempts.
        Failed => "FAILED",
    }
}

/// A VAT rate expressed in basis points (hundredths of a percent).
///
/// `770` is 7.70%. Integer storage keeps price arithmetic exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VatRate(u32);

impl VatRate {
    /// A rate of zero.
    pub const ZERO: Self = Self(0);

    /// Creates a rate from basis points.
    #[must_use]
    pub const fn from_basis_points(basis_points: u32) -> Self {
        Self(basis_points)
    }

    /// Returns the rate in basis points.
    #[must_use]
    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// Parses a decimal percentage such as `"7.7"` or `"22"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a non-negative number with at
    /// most two decimals.
    pub fn parse_percent(value: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidVatRate(value.to_string());
        let trimmed: &str = value.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() || fraction.len() > 2 {
            return Err(invalid());
        }
        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let fraction: u32 = if fraction.is_empty() {
            0
        } else {
            let parsed: u32 = fraction.parse().map_err(|_| invalid())?;
            if fraction.len() == 1 { parsed * 10 } else { parsed }
        };
        whole
            .checked_mul(100)
            .and_then(|bp| bp.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl std::fmt::Display for VatRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
