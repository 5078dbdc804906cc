// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{PaymentProxy, TransactionStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The payment record of a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub reservation_id: String,
    pub gateway_transaction_id: String,
    pub gateway_payment_id: Option<String>,
    /// Amount in cents.
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub payment_proxy: PaymentProxy,
    pub platform_fee: i64,
    pub gateway_fee: i64,
    pub status: TransactionStatus,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    pub metadata: serde_json::Value,
}

impl Transaction {
    /// Whether money has been received.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == TransactionStatus::Complete
    }

    /// Whether a bank transfer still awaits confirmation.
    #[must_use]
    pub const fn is_offline_pending(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::OfflinePendingReview | TransactionStatus::OfflineMatchingPaymentFound
        )
    }
}
