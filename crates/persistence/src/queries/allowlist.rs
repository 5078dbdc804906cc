// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendee group (allowlist) queries.

use alfio_domain::{GroupLink, GroupMember};
use diesel::prelude::*;

use crate::data_models::{GroupLinkRow, GroupMemberRow, to_u32};
use crate::diesel_schema::{allowlisted_tickets, group_links, group_members};
use crate::error::PersistenceError;

backend_fn! {
/// Loads the active links of an event that cover `category_id`.
///
/// Links without a category cover every category. Ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_active_group_links(
    conn: &mut _,
    event_id: i64,
    category_id: i64,
) -> Result<Vec<GroupLink>, PersistenceError> {
    group_links::table
        .filter(group_links::event_id.eq(event_id))
        .filter(group_links::active.eq(true))
        .filter(
            group_links::category_id
                .eq(category_id)
                .or(group_links::category_id.is_null()),
        )
        .order(group_links::id.asc())
        .select(GroupLinkRow::as_select())
        .load(conn)?
        .into_iter()
        .map(GroupLink::try_from)
        .collect()
}
}

backend_fn! {
/// Loads the active members of a group.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_active_group_members(
    conn: &mut _,
    group_id: i64,
) -> Result<Vec<GroupMember>, PersistenceError> {
    Ok(group_members::table
        .filter(group_members::group_id.eq(group_id))
        .filter(group_members::active.eq(true))
        .order(group_members::id.asc())
        .select(GroupMemberRow::as_select())
        .load(conn)?
        .into_iter()
        .map(GroupMember::from)
        .collect())
}
}

backend_fn! {
/// Counts the tickets a member already acquired through a link.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_acquisitions(
    conn: &mut _,
    group_link_id: i64,
    group_member_id: i64,
) -> Result<u32, PersistenceError> {
    let count: i64 = allowlisted_tickets::table
        .filter(allowlisted_tickets::group_link_id.eq(group_link_id))
        .filter(allowlisted_tickets::group_member_id.eq(group_member_id))
        .count()
        .get_result(conn)?;
    to_u32(count, "allowlisted_tickets.count")
}
}

/// Locks a group link for the duration of the transaction.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn lock_group_link_sqlite(
    conn: &mut diesel::SqliteConnection,
    group_link_id: i64,
) -> Result<(), PersistenceError> {
    group_links::table
        .find(group_link_id)
        .select(group_links::id)
        .first::<i64>(conn)?;
    Ok(())
}

/// Locks a group link for the duration of the transaction.
///
/// # Errors
///
/// Returns an error if the query fails.
#[cfg(feature = "mysql")]
pub fn lock_group_link_mysql(
    conn: &mut diesel::MysqlConnection,
    group_link_id: i64,
) -> Result<(), PersistenceError> {
    group_links::table
        .find(group_link_id)
        .select(group_links::id)
        .for_update()
        .first::<i64>(conn)?;
    Ok(())
}
