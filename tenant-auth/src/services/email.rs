use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::AuthError;
use crate::config::SmtpConfig;

/// Outbound mail dispatcher used to deliver one-time codes.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, to_email: &str, subject: &str, body: &str)
        -> Result<(), AuthError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig, from_email: &str) -> Result<Self, AuthError> {
        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AuthError::Mail(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized with SMTP relay");

        Ok(Self {
            mailer,
            from_email: from_email.to_string(),
        })
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), AuthError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| AuthError::Mail(e.to_string()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| AuthError::Mail(e.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AuthError::Mail(e.to_string()))?;

        // SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AuthError::Mail(e.to_string()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(AuthError::Mail(e.to_string()))
            }
        }
    }
}

/// Dispatcher used when no SMTP relay is configured: codes stay in the store
/// and nothing is delivered.
#[derive(Clone, Default)]
pub struct DisabledEmailService;

#[async_trait]
impl EmailProvider for DisabledEmailService {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        _body: &str,
    ) -> Result<(), AuthError> {
        tracing::warn!(to = %to_email, subject = %subject, "Mail delivery disabled, skipping send");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Recording dispatcher for tests.
#[derive(Clone, Default)]
pub struct MockEmailService {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// The six-digit code carried by the most recent mail to `to_email`.
    pub fn last_code_for(&self, to_email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == to_email)
            .and_then(|m| {
                m.body
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|word| word.len() == 6)
                    .map(str::to_string)
            })
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), AuthError> {
        if self.fail {
            return Err(AuthError::Mail("mock transport unavailable".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                to: to_email.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        }
        Ok(())
    }
}
