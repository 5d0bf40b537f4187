use std::sync::Arc;

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::env::{AppConfig, SmtpConfig};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn new(to: &str, subject: &str, body: impl Into<String>) -> Self {
        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.into(),
        }
    }
}

#[rocket::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// SMTP delivery to a relay, upgraded with STARTTLS when credentials are configured.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, AppError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid MAIL_FROM address: {}", e)))?;

        // Credentials are only sent over STARTTLS; an unauthenticated relay stays plain.
        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| {
                        AppError::ExternalService(format!("Invalid SMTP relay {}: {}", config.host, e))
                    })?
                    .port(config.port)
                    .credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port),
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[rocket::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| AppError::Internal(format!("Could not build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {}", e)))?;

        Ok(())
    }
}

/// Used when no SMTP relay is configured: writes the email to the log instead.
pub struct LogMailer;

#[rocket::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        info!(to = %email.to, subject = %email.subject, "Email (not delivered, SMTP disabled)");
        Ok(())
    }
}

/// Managed state wrapping the configured mailer.
#[derive(Clone)]
pub struct MailService {
    mailer: Arc<dyn Mailer>,
}

impl MailService {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match &config.smtp {
            Some(smtp) => match SmtpMailer::new(smtp, &config.mail_from) {
                Ok(mailer) => {
                    info!(host = %smtp.host, port = smtp.port, "SMTP mailer configured");
                    Self::new(Arc::new(mailer))
                }
                Err(err) => {
                    err.log_and_record("Mailer setup");
                    Self::new(Arc::new(LogMailer))
                }
            },
            None => Self::new(Arc::new(LogMailer)),
        }
    }

    pub async fn send(&self, email: &Email) -> Result<(), AppError> {
        self.mailer.send(email).await
    }

    /// Sends and swallows failures. Notification emails never fail the request.
    #[instrument(skip(self, body))]
    pub async fn send_quietly(&self, to: &str, subject: &str, body: impl Into<String>) {
        if to.trim().is_empty() {
            warn!("Skipping email without a recipient");
            return;
        }

        let email = Email::new(to, subject, body);
        if let Err(err) = self.mailer.send(&email).await {
            err.log_and_record("Sending email");
        }
    }
}
