//! Outbound email.
//!
//! Uses SMTP via lettre when configured. Without SMTP settings the mailer is
//! disabled and every send fails with [`EmailError::NotConfigured`]. The
//! in-process [`Outbox`] is for test harnesses and is never built from
//! configuration.

use std::sync::{Arc, Mutex, PoisonError};

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// No recipients given.
    #[error("Email has no recipients")]
    NoRecipients,

    /// SMTP settings are absent.
    #[error("Mail is not configured")]
    NotConfigured,
}

/// Sender address when no SMTP configuration exists.
const FALLBACK_FROM_ADDRESS: &str = "noreply@shoplist.local";

/// A message as handed to [`Mailer::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub body: String,
}

/// Mail sender used by account operations.
#[derive(Debug, Clone)]
pub enum Mailer {
    /// Deliver through an SMTP relay.
    Smtp(SmtpMailer),
    /// Refuse to send; messages are logged and dropped.
    Disabled,
    /// Keep messages in memory.
    Outbox(Outbox),
}

impl Mailer {
    /// Build an SMTP mailer from configuration, or a disabled mailer when SMTP
    /// is not configured.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be set up.
    pub fn from_config(config: Option<&SmtpConfig>) -> Result<Self, SmtpError> {
        match config {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config)?)),
            None => Ok(Self::Disabled),
        }
    }

    /// Address messages are sent from.
    #[must_use]
    pub fn from_address(&self) -> &str {
        match self {
            Self::Smtp(smtp) => &smtp.from_address,
            Self::Disabled | Self::Outbox(_) => FALLBACK_FROM_ADDRESS,
        }
    }

    /// Send a plain-text email.
    ///
    /// # Errors
    ///
    /// Returns error if an address is invalid, delivery fails, or the mailer
    /// is disabled.
    pub async fn send(
        &self,
        subject: &str,
        sender: &str,
        recipients: &[&str],
        body: &str,
    ) -> Result<(), EmailError> {
        if recipients.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        match self {
            Self::Smtp(smtp) => smtp.send(subject, sender, recipients, body).await,
            Self::Disabled => {
                tracing::warn!(subject = %subject, "Mail not configured, message dropped");
                Err(EmailError::NotConfigured)
            }
            Self::Outbox(outbox) => {
                outbox.push(OutgoingEmail {
                    subject: subject.to_owned(),
                    sender: sender.to_owned(),
                    recipients: recipients.iter().map(|r| (*r).to_owned()).collect(),
                    body: body.to_owned(),
                });
                tracing::info!(subject = %subject, "Email stored in outbox");
                Ok(())
            }
        }
    }
}

/// SMTP delivery through lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be set up.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_owned(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    async fn send(
        &self,
        subject: &str,
        sender: &str,
        recipients: &[&str],
        body: &str,
    ) -> Result<(), EmailError> {
        let mut builder = Message::builder().from(parse_mailbox(sender)?).subject(subject);
        for recipient in recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        let email = builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())?;

        self.transport.send(email).await?;

        tracing::info!(subject = %subject, recipients = recipients.len(), "Email sent successfully");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_owned()))
}

/// In-memory mail sink for tests.
///
/// Retains every message it is handed, so it must never back a long-running
/// server.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl Outbox {
    fn push(&self, email: OutgoingEmail) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email);
    }

    /// Messages sent so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_records_messages() {
        let outbox = Outbox::default();
        let mailer = Mailer::Outbox(outbox.clone());

        mailer
            .send("Hello", mailer.from_address(), &["a@example.com"], "body")
            .await
            .unwrap();

        let sent = outbox.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Hello");
        assert_eq!(sent[0].recipients, vec!["a@example.com".to_owned()]);
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_retains_nothing() {
        let mailer = Mailer::from_config(None).unwrap();
        assert!(matches!(mailer, Mailer::Disabled));

        for _ in 0..3 {
            assert!(matches!(
                mailer
                    .send("Hello", mailer.from_address(), &["a@example.com"], "body")
                    .await,
                Err(EmailError::NotConfigured)
            ));
        }
    }

    #[tokio::test]
    async fn test_send_requires_recipients() {
        let mailer = Mailer::from_config(None).unwrap();
        assert!(matches!(
            mailer.send("Hello", "a@example.com", &[], "body").await,
            Err(EmailError::NoRecipients)
        ));
    }

    #[test]
    fn test_parse_mailbox_rejects_garbage() {
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(EmailError::InvalidAddress(_))
        ));
    }
}
