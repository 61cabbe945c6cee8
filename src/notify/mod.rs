pub mod digest;
pub mod gmail;

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailbox;

use crate::error::AppError;
use crate::models::listing::Listing;

/// Transport that delivers one HTML mail.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, subject: &str, recipient: &Mailbox, html_body: &str)
    -> Result<(), AppError>;
}

/// Turns a batch of new listings into a digest mail for the configured recipient.
pub struct Notifier {
    sender: Arc<dyn MailSender>,
    recipient: Mailbox,
}

impl Notifier {
    pub fn new(sender: Arc<dyn MailSender>, recipient: &str) -> Result<Self, AppError> {
        Ok(Self {
            sender,
            recipient: recipient.parse()?,
        })
    }

    /// Mail a digest of `listings`. Nothing is sent for an empty batch.
    /// Delivery failures are logged and dropped, never retried.
    pub async fn notify(&self, fetcher: &str, listings: &[Listing]) {
        if listings.is_empty() {
            tracing::debug!("Fetcher '{fetcher}': no new projects to notify about");
            return;
        }

        tracing::info!(
            "Fetcher '{fetcher}': preparing digest for {} new project(s)",
            listings.len()
        );

        if let Err(e) = self.send_digest(fetcher, listings).await {
            tracing::error!("Fetcher '{fetcher}': failed to send digest: {e}");
        }
    }

    async fn send_digest(&self, fetcher: &str, listings: &[Listing]) -> Result<(), AppError> {
        let subject = digest::subject(fetcher, listings.len());
        let body = digest::render(fetcher, listings)?;
        self.sender.send(&subject, &self.recipient, &body).await?;
        tracing::info!(
            "Fetcher '{fetcher}': digest sent to {}",
            self.recipient.email
        );
        Ok(())
    }

    /// Send a short fixed message to check the mail credentials.
    pub async fn send_test_mail(&self) -> Result<(), AppError> {
        self.sender
            .send(
                "Test Email",
                &self.recipient,
                "<p>This is a test email from projectwatch.</p>",
            )
            .await?;
        tracing::info!("Test email sent to {}", self.recipient.email);
        Ok(())
    }
}
