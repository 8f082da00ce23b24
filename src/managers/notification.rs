//! Mail notification manager
//!
//! Sends one plain-text mail per run outcome. A failure alert replaces the
//! configured body but keeps subject, sender and recipient.

use crate::config::NotificationSpec;
use crate::error::NotifyError;
use crate::utils::mail::{Email, MailRelay, SmtpRelay};
use tracing::{info, warn};

/// Notification manager for sending run reports
pub struct Notifier {
    relay: Box<dyn MailRelay>,
}

impl Notifier {
    /// Create a notifier delivering through the configured SMTP relay
    pub fn new() -> Self {
        Self {
            relay: Box::new(SmtpRelay::new()),
        }
    }

    /// Create a notifier with a specific relay
    pub fn with_relay(relay: Box<dyn MailRelay>) -> Self {
        Self { relay }
    }

    /// Send one notification, using `override_message` as the body when given
    pub fn notify(
        &self,
        spec: &NotificationSpec,
        override_message: Option<&str>,
    ) -> Result<(), NotifyError> {
        let body = override_message.unwrap_or(&spec.body);
        let email = Email::compose(spec, body)?;

        info!("Sending email notification to {}", spec.to);
        self.relay.deliver(spec, &email)?;
        info!("Email notification sent to {}", spec.to);

        Ok(())
    }

    /// Send a notification and log any failure instead of returning it
    pub fn notify_logged(&self, spec: &NotificationSpec, override_message: Option<&str>) -> bool {
        match self.notify(spec, override_message) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send notification: {}", e);
                false
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
