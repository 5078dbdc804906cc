// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collaborators shared by every manager.

use std::sync::Arc;

use alfio::{
    Clock, ExtensionHooks, NoopExtensionHooks, NotificationContext, NotificationSink, SystemClock,
};
use alfio_domain::Event;
use time::OffsetDateTime;

use crate::notification::TracingNotificationSink;
use crate::settings::ReservationSettings;

/// Settings plus the injected collaborators.
///
/// Cloning is cheap; collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct ServiceContext {
    pub settings: ReservationSettings,
    pub clock: Arc<dyn Clock>,
    pub notifications: Arc<dyn NotificationSink>,
    pub hooks: Arc<dyn ExtensionHooks>,
}

impl ServiceContext {
    /// System clock, logging notifications and no extensions.
    #[must_use]
    pub fn new(settings: ReservationSettings) -> Self {
        Self {
            settings,
            clock: Arc::new(SystemClock),
            notifications: Arc::new(TracingNotificationSink),
            hooks: Arc::new(NoopExtensionHooks),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the notification sink.
    #[must_use]
    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = notifications;
        self
    }

    /// Replaces the extension hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn ExtensionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// The current instant.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Sends an e-mail about `event`.
    pub(crate) fn notify(
        &self,
        event: &Event,
        kind: &str,
        reservation_id: Option<&str>,
        recipient: &str,
        subject: &str,
        body: &dyn Fn() -> String,
    ) {
        let context = NotificationContext {
            event_id: event.id,
            organization_id: event.organization_id,
            kind: kind.to_string(),
        };
        self.notifications.send_simple_email(
            &context,
            reservation_id,
            recipient,
            subject,
            body,
            Vec::new(),
        );
    }
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self::new(ReservationSettings::default())
    }
}
