//! Notification and email gateways.
//!
//! Both are fire-and-forget: callers dispatch after their write has
//! committed and a failed delivery is logged, never returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Kind of in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ParticipantJoined,
    InvitationReceived,
    InvitationAccepted,
    InvitationRejected,
    RegistrationApproved,
    RegistrationRejected,
    AttendanceRecorded,
    MarkedAbsent,
    EventReminder,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ParticipantJoined => "participant_joined",
            NotificationKind::InvitationReceived => "invitation_received",
            NotificationKind::InvitationAccepted => "invitation_accepted",
            NotificationKind::InvitationRejected => "invitation_rejected",
            NotificationKind::RegistrationApproved => "registration_approved",
            NotificationKind::RegistrationRejected => "registration_rejected",
            NotificationKind::AttendanceRecorded => "attendance_recorded",
            NotificationKind::MarkedAbsent => "marked_absent",
            NotificationKind::EventReminder => "event_reminder",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An in-app notification ready to enqueue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub content: String,
    pub link: String,
}

impl Notification {
    /// Notification linking to an event page.
    pub fn for_event(
        recipient_id: Uuid,
        kind: NotificationKind,
        event_id: Uuid,
        content: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            kind,
            content: content.into(),
            link: format!("/events/{}", event_id),
        }
    }
}

/// Named email template and its substitution variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub name: &'static str,
    pub vars: BTreeMap<&'static str, String>,
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    Sent,
    /// Delivery failed; the caller only logs it.
    Failed(String),
    /// Nothing to do, e.g. email delivery disabled.
    Skipped,
}

#[async_trait::async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn enqueue(&self, notification: Notification) -> NotificationResult;
}

#[async_trait::async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send(&self, to: &str, template: EmailTemplate) -> NotificationResult;
}

/// Enqueues a notification and logs a failed delivery.
pub async fn dispatch(gateway: &dyn NotificationGateway, notification: Notification) {
    let recipient_id = notification.recipient_id;
    let kind = notification.kind;
    if let NotificationResult::Failed(reason) = gateway.enqueue(notification).await {
        tracing::warn!(
            recipient_id = %recipient_id,
            kind = %kind,
            error = %reason,
            "Failed to enqueue notification"
        );
    }
}

/// Sends an email and logs a failed delivery.
pub async fn dispatch_email(gateway: &dyn EmailGateway, to: &str, template: EmailTemplate) {
    let name = template.name;
    if let NotificationResult::Failed(reason) = gateway.send(to, template).await {
        tracing::warn!(template = name, error = %reason, "Failed to send email");
    }
}

/// Gateway that records everything it is given.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    notifications: Mutex<Vec<Notification>>,
    emails: Mutex<Vec<(String, EmailTemplate)>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway that records attempts but reports every one as failed.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn notifications_for(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.recipient_id == recipient_id)
            .collect()
    }

    pub fn emails(&self) -> Vec<(String, EmailTemplate)> {
        self.emails.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl NotificationGateway for RecordingGateway {
    async fn enqueue(&self, notification: Notification) -> NotificationResult {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
        if self.simulate_failure {
            return NotificationResult::Failed("Simulated failure".to_string());
        }
        NotificationResult::Sent
    }
}

#[async_trait::async_trait]
impl EmailGateway for RecordingGateway {
    async fn send(&self, to: &str, template: EmailTemplate) -> NotificationResult {
        self.emails
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((to.to_string(), template));
        if self.simulate_failure {
            return NotificationResult::Failed("Simulated failure".to_string());
        }
        NotificationResult::Sent
    }
}
