// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event persistence.

use alfio_audit::AuditEvent;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::data_models::{ActorData, CauseData, from_timestamp};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

backend_fn! {
/// Persists an audit event.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `event` - The audit event to persist
/// * `created_at` - When the transition happened
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if persistence or serialization fails.
pub fn insert_audit_event(
    conn: &mut _,
    event: &AuditEvent,
    created_at: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let actor_json: String = serde_json::to_string(&ActorData::from(&event.actor))?;
    let cause_json: String = serde_json::to_string(&CauseData::from(&event.cause))?;

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::reservation_id.eq(&event.reservation_id),
            audit_events::event_id.eq(event.event_id),
            audit_events::event_type.eq(event.event_type.as_str()),
            audit_events::actor_json.eq(actor_json),
            audit_events::cause_json.eq(cause_json),
            audit_events::before_status.eq(event.before.as_str()),
            audit_events::after_status.eq(event.after.as_str()),
            audit_events::created_at.eq(from_timestamp(created_at)),
        ))
        .execute(conn)?;

    let audit_id: i64 = conn.get_last_insert_rowid()?;
    debug!(
        audit_id,
        reservation_id = %event.reservation_id,
        event_type = event.event_type.as_str(),
        "Persisted audit event"
    );
    Ok(audit_id)
}
}
