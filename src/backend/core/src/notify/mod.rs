//! Transactional-email port and detached notification dispatch.
//!
//! Status-change notifications are advisory: dispatch happens on a detached
//! task after the status write has committed, and a provider failure is
//! logged and counted but never surfaces to the caller or rolls back the
//! write.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::applications::StatusChange;
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// Messages
// ═══════════════════════════════════════════════════════════════════════════════

/// A rendered outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// A status change together with the addresses that should hear about it.
///
/// Recipients are deduplicated case-insensitively at construction, so a
/// self-submitted application notifies its applicant exactly once.
#[derive(Debug, Clone)]
pub struct StatusNotification {
    pub change: StatusChange,
    recipients: Vec<String>,
}

impl StatusNotification {
    pub fn new(change: StatusChange, recipients: impl IntoIterator<Item = String>) -> Self {
        let mut seen: Vec<String> = Vec::new();
        let mut deduped = Vec::new();
        for address in recipients {
            let key = address.trim().to_ascii_lowercase();
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            seen.push(key);
            deduped.push(address.trim().to_string());
        }
        Self {
            change,
            recipients: deduped,
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Render the notification into a sendable message.
    pub fn render(&self) -> EmailMessage {
        let change = &self.change;
        let subject = format!(
            "Your {} application is now {}",
            change.application_type.replace('_', " "),
            change.to
        );
        let mut body = format!(
            "The status of your {} application ({}) changed from {} to {}.",
            change.application_type.replace('_', " "),
            change.application_id,
            change.from,
            change.to,
        );
        if let Some(message) = &change.message {
            body.push_str("\n\nMessage from the review team:\n");
            body.push_str(message);
        }
        EmailMessage {
            to: self.recipients.clone(),
            subject,
            body,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sender port
// ═══════════════════════════════════════════════════════════════════════════════

/// Outbound email provider.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Sender used when no provider endpoint is configured: logs the message
/// and reports success.
#[derive(Debug, Default)]
pub struct LogOnlySender;

#[async_trait]
impl EmailSender for LogOnlySender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            recipients = message.to.len(),
            subject = %message.subject,
            "Email provider not configured; notification logged only"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log-only"
    }
}

/// In-memory sender that records every message. Used by tests and local
/// development.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: std::sync::Mutex<Vec<EmailMessage>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Fire-and-forget dispatcher over an [`EmailSender`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn EmailSender>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// Dispatch a status notification on a detached task and return
    /// immediately. Provider failures are logged and counted, not returned.
    pub fn dispatch(&self, notification: StatusNotification) {
        if notification.recipients().is_empty() {
            return;
        }

        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            let message = notification.render();
            let application_id = notification.change.application_id.clone();
            counter!("meridian_notifications_total").increment(1);

            match sender.send(&message).await {
                Ok(()) => {
                    info!(
                        application_id = %application_id,
                        recipients = message.to.len(),
                        provider = sender.name(),
                        "Status notification sent"
                    );
                }
                Err(error) => {
                    counter!("meridian_notification_failures_total").increment(1);
                    warn!(
                        application_id = %application_id,
                        provider = sender.name(),
                        %error,
                        "Status notification failed; status change is unaffected"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::{ApplicationId, ApplicationStatus, ServiceCategory};
    use crate::identity::UserId;
    use chrono::Utc;
    use std::time::Duration;

    fn change() -> StatusChange {
        StatusChange {
            application_id: ApplicationId::generate(),
            service_category: ServiceCategory::Loan,
            application_type: "home_loan".to_string(),
            from: ApplicationStatus::Submitted,
            to: ApplicationStatus::InReview,
            message: Some("Please upload your income proof.".to_string()),
            changed_by: UserId::generate(),
            changed_at: Utc::now(),
        }
    }

    #[test]
    fn test_recipients_deduplicated() {
        let notification = StatusNotification::new(
            change(),
            vec![
                "arun@example.com".to_string(),
                "Arun@Example.com ".to_string(),
                "priya@partner.example".to_string(),
                "".to_string(),
            ],
        );
        assert_eq!(
            notification.recipients(),
            &["arun@example.com", "priya@partner.example"]
        );
    }

    #[test]
    fn test_render_includes_transition_and_message() {
        let notification =
            StatusNotification::new(change(), vec!["arun@example.com".to_string()]);
        let message = notification.render();
        assert!(message.subject.contains("home loan"));
        assert!(message.subject.contains("In Review"));
        assert!(message.body.contains("Submitted"));
        assert!(message.body.contains("income proof"));
    }

    #[tokio::test]
    async fn test_dispatch_records_exactly_once() {
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = NotificationDispatcher::new(sender.clone());

        dispatcher.dispatch(StatusNotification::new(
            change(),
            vec!["arun@example.com".to_string()],
        ));

        // Detached task; poll briefly for completion.
        for _ in 0..50 {
            if !sender.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_skips_empty_recipient_list() {
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = NotificationDispatcher::new(sender.clone());

        dispatcher.dispatch(StatusNotification::new(change(), Vec::new()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sender.sent().is_empty());
    }
}
