//! Delivery transport boundary: best-effort send of one outbound email.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;
use crate::error::TransportError;

/// One email handed to the transport: `{from, to, subject, html}`.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// The mail-transfer capability the delivery worker invokes.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError>;
}

/// SMTP implementation. The blocking lettre transport runs on the
/// blocking pool so the worker loop stays async.
pub struct SmtpMailTransport {
    host: String,
    port: u16,
    credentials: Credentials,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            credentials: Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ),
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        let message = Message::builder()
            .from(
                email
                    .from
                    .parse()
                    .map_err(|e| TransportError::Build(format!("invalid from address: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| TransportError::Build(format!("invalid to address: {e}")))?)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| TransportError::Build(e.to_string()))?;

        let mailer = SmtpTransport::relay(&self.host)
            .map_err(|e| TransportError::Send(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build();

        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| TransportError::Send(format!("send task failed: {e}")))?
            .map_err(|e| TransportError::Send(e.to_string()))?;

        Ok(())
    }
}
