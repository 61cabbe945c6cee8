use std::time::{Duration, Instant};

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::MailConfig;
use crate::error::AppError;
use crate::notify::MailSender;

const SMTP_RELAY: &str = "smtp.gmail.com";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Access tokens are renewed this long before Google says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Sends mail through Gmail SMTP, authenticating with XOAUTH2.
/// Access tokens come from the refresh-token grant and are cached until
/// shortly before they expire.
pub struct GmailSender {
    user: String,
    from: Mailbox,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    http: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

impl GmailSender {
    pub fn new(config: &MailConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            user: config.gmail_user.clone(),
            from: config.gmail_user.parse()?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            http,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        tracing::debug!("Refreshing Gmail OAuth2 access token");
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Mail(format!("Token refresh request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Mail(format!(
                "Token refresh returned {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Mail(format!("Failed to parse token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        let value = token.access_token;
        *cached = Some(AccessToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(value)
    }
}

#[async_trait]
impl MailSender for GmailSender {
    async fn send(
        &self,
        subject: &str,
        recipient: &Mailbox,
        html_body: &str,
    ) -> Result<(), AppError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        let access_token = self.access_token().await?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(SMTP_RELAY)?
            .credentials(Credentials::new(self.user.clone(), access_token))
            .authentication(vec![Mechanism::Xoauth2])
            .build();

        tracing::debug!("Sending mail '{subject}' via {SMTP_RELAY}");
        let response = mailer.send(message).await?;
        tracing::debug!("SMTP relay answered {}", response.code());
        Ok(())
    }
}
