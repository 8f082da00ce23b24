//! Mail relay capability used by the notifier

use crate::config::NotificationSpec;
use crate::error::NotifyError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tracing::debug;

/// A composed plain-text mail with validated addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub body: String,
}

impl Email {
    /// Compose a mail from the notification spec and a body
    pub fn compose(spec: &NotificationSpec, body: &str) -> Result<Self, NotifyError> {
        let from = parse_mailbox("from", &spec.from)?;
        let to = parse_mailbox("to", &spec.to)?;

        let email = Self {
            from,
            to,
            subject: spec.subject.clone(),
            body: body.to_string(),
        };
        // Surface header problems now rather than at delivery
        email.to_message()?;
        Ok(email)
    }

    /// Build the RFC 5322 message
    pub fn to_message(&self) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())
            .map_err(|e| NotifyError::MessageBuild(e.to_string()))
    }
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox, NotifyError> {
    value
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::MessageBuild(format!("invalid '{}' address '{}': {}", field, value, e)))
}

/// Hands composed mails to a relay
pub trait MailRelay: Send + Sync {
    fn deliver(&self, spec: &NotificationSpec, email: &Email) -> Result<(), NotifyError>;
}

/// Unauthenticated SMTP relay (typically the local MTA)
#[derive(Debug, Clone, Default)]
pub struct SmtpRelay;

impl SmtpRelay {
    pub fn new() -> Self {
        Self
    }
}

impl MailRelay for SmtpRelay {
    fn deliver(&self, spec: &NotificationSpec, email: &Email) -> Result<(), NotifyError> {
        let message = email.to_message()?;
        let relay = format!("{}:{}", spec.relay_host, spec.relay_port);

        let transport = SmtpTransport::builder_dangerous(spec.relay_host.as_str())
            .port(spec.relay_port)
            .timeout(Some(Duration::from_secs(spec.timeout_seconds)))
            .build();

        debug!("Delivering mail to {} via {}", email.to, relay);
        transport.send(&message).map_err(|e| {
            if is_connection_refused(&e) {
                NotifyError::RelayUnavailable(relay)
            } else {
                NotifyError::Delivery(e.to_string())
            }
        })?;

        Ok(())
    }
}

/// Walk the error chain looking for a refused TCP connection
fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Recording mail relay for testing
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct MockMailRelay {
        pub sent: Arc<Mutex<Vec<Email>>>,
        pub should_refuse: Arc<Mutex<bool>>,
    }

    impl MockMailRelay {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure the relay to refuse connections
        pub fn refusing(self) -> Self {
            *self.should_refuse.lock().unwrap() = true;
            self
        }

        /// Mails delivered so far (refused attempts are not recorded)
        pub fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl MailRelay for MockMailRelay {
        fn deliver(&self, spec: &NotificationSpec, email: &Email) -> Result<(), NotifyError> {
            if *self.should_refuse.lock().unwrap() {
                return Err(NotifyError::RelayUnavailable(format!(
                    "{}:{}",
                    spec.relay_host, spec.relay_port
                )));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
