// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{SubscriptionType, WaitingQueueStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A person waiting for a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingQueueSubscription {
    pub id: i64,
    pub event_id: i64,
    pub full_name: String,
    pub email: String,
    pub language: String,
    pub selected_category_id: Option<i64>,
    pub subscription_type: SubscriptionType,
    pub status: WaitingQueueStatus,
    pub reservation_id: Option<String>,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

impl WaitingQueueStatus {
    /// Validates a subscription status change.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        let valid = match self {
            Self::Waiting => matches!(new_status, Self::Pending | Self::Cancelled),
            Self::Pending => matches!(
                new_status,
                Self::Acquired | Self::Expired | Self::Cancelled
            ),
            Self::Acquired | Self::Expired | Self::Cancelled => false,
        };
        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by waiting queue lifecycle".to_string(),
            })
        }
    }
}

/// Validates a subscriber e-mail before it enters the queue.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` if the address has no local part or
/// no domain.
pub fn validate_subscriber_email(email: &str) -> Result<(), DomainError> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::InvalidEmail(email.to_string())),
    }
}
