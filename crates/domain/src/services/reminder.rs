//! Event reminders: scheduling and dispatch of due reminders.

use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::models::{Event, NewReminder, Reminder, ReminderOption};
use crate::services::lease::SweepLease;
use crate::services::notification::{
    dispatch, dispatch_email, EmailGateway, EmailTemplate, Notification, NotificationGateway,
    NotificationKind,
};
use crate::store::{StoreError, Stores};

/// Lease name for the global reminder drain.
pub const REMINDER_LEASE: &str = "reminder_sweep";

/// Email template used for reminders.
pub const REMINDER_TEMPLATE: &str = "event_reminder";

#[derive(Clone)]
pub struct ReminderScheduler {
    stores: Stores,
    notifier: Arc<dyn NotificationGateway>,
    mailer: Arc<dyn EmailGateway>,
    lease: SweepLease,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(
        stores: Stores,
        notifier: Arc<dyn NotificationGateway>,
        mailer: Arc<dyn EmailGateway>,
        lease: SweepLease,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            notifier,
            mailer,
            lease,
            clock,
        }
    }

    /// Schedules a reminder `option` before the event starts.
    pub async fn schedule(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        option: &str,
    ) -> DomainResult<Reminder> {
        let option: ReminderOption = option.parse().map_err(DomainError::InvalidOption)?;
        let event = self
            .stores
            .events
            .find_event(event_id)
            .await?
            .ok_or(DomainError::NotFound("Event"))?;

        let new = NewReminder {
            event_id,
            user_id,
            option,
            remind_at: option.remind_at(event.start_datetime),
        };
        match self
            .stores
            .reminders
            .insert_reminder(new, self.clock.now())
            .await
        {
            Ok(reminder) => {
                tracing::debug!(
                    reminder_id = %reminder.id,
                    event_id = %event_id,
                    option = %option,
                    remind_at = %reminder.remind_at,
                    "Reminder scheduled"
                );
                Ok(reminder)
            }
            Err(StoreError::UniqueViolation(_)) => Err(DomainError::DuplicatePending),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Reminder>> {
        Ok(self.stores.reminders.list_reminders_for_user(user_id).await?)
    }

    /// Claims and dispatches due reminders.
    ///
    /// With `user_id` set only that user's reminders are drained. Without it
    /// every user's are, under the reminder lease.
    pub async fn run_due(&self, user_id: Option<Uuid>, limit: i64) -> DomainResult<Vec<Reminder>> {
        match user_id {
            Some(_) => self.drain(user_id, limit).await,
            None => {
                let guard = self.lease.acquire(REMINDER_LEASE).await?;
                let result = self.drain(None, limit).await;
                guard.release().await;
                result
            }
        }
    }

    async fn drain(&self, user_id: Option<Uuid>, limit: i64) -> DomainResult<Vec<Reminder>> {
        let claimed = self
            .stores
            .reminders
            .claim_due(user_id, self.clock.now(), limit)
            .await?;

        for reminder in &claimed {
            match self.stores.events.find_event(reminder.event_id).await {
                Ok(Some(event)) => self.deliver(reminder, &event).await,
                Ok(None) => tracing::warn!(
                    reminder_id = %reminder.id,
                    event_id = %reminder.event_id,
                    "Event for reminder no longer exists, skipping dispatch"
                ),
                Err(e) => tracing::warn!(
                    reminder_id = %reminder.id,
                    error = %e,
                    "Failed to load event for reminder, skipping dispatch"
                ),
            }
        }

        if !claimed.is_empty() {
            tracing::info!(count = claimed.len(), "Reminders dispatched");
        }
        Ok(claimed)
    }

    async fn deliver(&self, reminder: &Reminder, event: &Event) {
        dispatch(
            self.notifier.as_ref(),
            Notification::for_event(
                reminder.user_id,
                NotificationKind::EventReminder,
                event.id,
                format!("{} starts at {}", event.title, event.start_datetime.to_rfc3339()),
            ),
        )
        .await;

        let identity = match self.stores.identities.find_identity(reminder.user_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!(user_id = %reminder.user_id, "No email on file, skipping reminder email");
                return;
            }
            Err(e) => {
                tracing::warn!(user_id = %reminder.user_id, error = %e, "Failed to load identity");
                return;
            }
        };

        let mut vars = BTreeMap::new();
        vars.insert("name", identity.display_name.clone());
        vars.insert("event_title", event.title.clone());
        vars.insert("start_datetime", event.start_datetime.to_rfc3339());
        vars.insert("option", reminder.option.to_string());
        vars.insert("link", format!("/events/{}", event.id));
        dispatch_email(
            self.mailer.as_ref(),
            &identity.email,
            EmailTemplate {
                name: REMINDER_TEMPLATE,
                vars,
            },
        )
        .await;
    }
}
