// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use alfio::{Attachment, NotificationContext, NotificationSink};
use tracing::info;

/// Notification sink that only logs.
///
/// Used when no mail transport is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn send_simple_email(
        &self,
        context: &NotificationContext,
        reservation_id: Option<&str>,
        recipient: &str,
        subject: &str,
        _body: &dyn Fn() -> String,
        attachments: Vec<Attachment>,
    ) {
        info!(
            event_id = context.event_id,
            organization_id = context.organization_id,
            kind = %context.kind,
            reservation_id = reservation_id.unwrap_or("-"),
            recipient,
            subject,
            attachments = attachments.len(),
            "E-mail queued"
        );
    }
}
