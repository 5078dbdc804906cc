// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendee allowlists (groups) and their matching rules.

use crate::types::{LinkType, MatchType};
use serde::{Deserialize, Serialize};

/// A named list of allowed member values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub active: bool,
}

/// One allowed value: an e-mail address or an `@domain` pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: i64,
    pub group_id: i64,
    pub value: String,
    pub description: Option<String>,
    pub active: bool,
}

/// Binds a group to an event, and optionally to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLink {
    pub id: i64,
    pub group_id: i64,
    pub event_id: i64,
    pub category_id: Option<i64>,
    pub link_type: LinkType,
    pub match_type: MatchType,
    pub max_allocation: Option<u32>,
    pub active: bool,
}

impl GroupLink {
    /// Number of tickets a single member may acquire, `None` for unlimited.
    ///
    /// A capped link is locked while its acquisitions are counted.
    #[must_use]
    pub fn allocation_cap(&self) -> Option<u32> {
        match self.link_type {
            LinkType::OncePerValue => Some(1),
            LinkType::LimitedQuantity => Some(self.max_allocation.unwrap_or(1)),
            LinkType::Unlimited => None,
        }
    }
}

/// Normalizes an e-mail for comparison.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// The `@domain` part of an e-mail address, lower-cased.
#[must_use]
pub fn email_domain(email: &str) -> Option<String> {
    let normalized = normalize_email(email);
    let at = normalized.rfind('@')?;
    let domain = &normalized[at..];
    (domain.len() > 1).then(|| domain.to_string())
}

/// Finds the member matching `email` under the link's match type.
///
/// Exact matches win; `EMAIL_DOMAIN` links fall back to a member whose value
/// is the e-mail's `@domain`.
#[must_use]
pub fn find_matching_member<'a>(
    members: &'a [GroupMember],
    match_type: MatchType,
    email: &str,
) -> Option<&'a GroupMember> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return None;
    }
    let active = || members.iter().filter(|m| m.active);
    if let Some(exact) = active().find(|m| normalize_email(&m.value) == normalized) {
        return Some(exact);
    }
    if match_type != MatchType::EmailDomain {
        return None;
    }
    let domain = email_domain(&normalized)?;
    active().find(|m| normalize_email(&m.value) == domain)
}
