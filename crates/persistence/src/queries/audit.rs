// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use alfio_audit::AuditEvent;
use diesel::prelude::*;

use crate::data_models::AuditEventRow;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

backend_fn! {
/// Retrieves the audit timeline of a reservation in insertion order.
///
/// # Errors
///
/// Returns an error if events cannot be retrieved or deserialized.
pub fn find_audit_events(
    conn: &mut _,
    reservation_id: &str,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    audit_events::table
        .filter(audit_events::reservation_id.eq(reservation_id))
        .order(audit_events::id.asc())
        .select(AuditEventRow::as_select())
        .load(conn)?
        .into_iter()
        .map(AuditEvent::try_from)
        .collect()
}
}
