//! SMTP-backed implementation of the outbound mail transport.

use crate::error::MailError;
use bookify_common::services::{BoxFuture, MailDelivery, NotificationService};
use bookify_config::SmtpConfig;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

/// Notification service delivering one HTML message per recipient set
/// over an authenticated STARTTLS relay.
#[derive(Clone)]
pub struct SmtpNotificationService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpNotificationService {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let credentials =
            Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            sender: config.sender.clone(),
        })
    }

    /// Probe the SMTP relay. Used at startup to surface misconfiguration
    /// early without blocking boot.
    pub async fn verify(&self) -> Result<(), MailError> {
        self.mailer.test_connection().await?;
        debug!("SMTP relay connection verified");
        Ok(())
    }

    fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
        address
            .parse()
            .map_err(|_| MailError::InvalidAddress(address.to_string()))
    }

    async fn deliver(
        &self,
        recipients: Vec<String>,
        subject: String,
        html_body: String,
    ) -> Result<MailDelivery, MailError> {
        if recipients.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(Self::parse_mailbox(&self.sender)?)
            .subject(&subject);
        for recipient in &recipients {
            builder = builder.to(Self::parse_mailbox(recipient)?);
        }

        let email = builder
            .header(ContentType::TEXT_HTML)
            .body(html_body)?;

        let response = self.mailer.send(email).await?;
        let message_id = response.message().next().map(str::to_string);
        info!(
            recipients = recipients.len(),
            subject = %subject,
            "Email delivered"
        );

        Ok(MailDelivery {
            message_id,
            recipients,
        })
    }
}

impl NotificationService for SmtpNotificationService {
    type Error = MailError;

    fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> BoxFuture<'_, MailDelivery, Self::Error> {
        let recipients = recipients.to_vec();
        let subject = subject.to_string();
        let html_body = html_body.to_string();
        Box::pin(async move { self.deliver(recipients, subject, html_body).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            sender: "Bookify <noreply@example.com>".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_recipient_set_is_rejected_before_transport() {
        let service = SmtpNotificationService::new(&config()).unwrap();
        let err = service.send(&[], "subject", "<p>body</p>").await.unwrap_err();
        assert!(matches!(err, MailError::NoRecipients));
    }

    #[tokio::test]
    async fn invalid_recipient_address_is_rejected() {
        let service = SmtpNotificationService::new(&config()).unwrap();
        let recipients = vec!["not-an-address".to_string()];
        let err = service
            .send(&recipients, "subject", "<p>body</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
    }
}
