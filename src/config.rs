//! Configuration, built from environment variables.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Gmail-style REST API base used when `MAILBOX_BASE_URL` is unset.
const DEFAULT_MAILBOX_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Top-level configuration for the triage service.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub oauth: OAuthConfig,
    pub mailbox_base_url: String,
    pub inference: InferenceConfig,
    pub smtp: SmtpConfig,
    /// Minimum spacing between outbound provider/inference calls.
    pub min_call_interval: Duration,
    /// Delay between drafting a reply and enqueuing it for delivery.
    pub enqueue_delay: Duration,
    /// Name of the reply work queue.
    pub queue_name: String,
    /// Delivery attempts before a job is dead-lettered.
    pub max_delivery_attempts: u32,
    /// Concurrent delivery loops (serial delivery per loop).
    pub worker_count: usize,
    /// Port for the HTTP trigger server.
    pub http_port: u16,
    /// Persona the drafted replies are written on behalf of.
    pub persona: Persona,
}

/// OAuth collaborator settings.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
}

/// Text inference service settings.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub api_key: SecretString,
}

/// Outbound SMTP settings for the delivery worker.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Fixed sender identity on every delivered reply.
    pub from_address: String,
}

/// Name and company the drafting instructions reference.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub company: String,
}

impl TriageConfig {
    /// Build config from environment variables.
    ///
    /// OAuth client, inference, and SMTP credentials are required; timing
    /// knobs and the server port fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let oauth = OAuthConfig {
            client_id: required("OAUTH_CLIENT_ID")?,
            client_secret: SecretString::from(required("OAUTH_CLIENT_SECRET")?),
            redirect_uri: required("OAUTH_REDIRECT_URI")?,
            auth_url: optional(
                "OAUTH_AUTH_URL",
                "https://accounts.google.com/o/oauth2/v2/auth",
            ),
            token_url: optional("OAUTH_TOKEN_URL", "https://oauth2.googleapis.com/token"),
        };

        let inference = InferenceConfig {
            endpoint: required("INFERENCE_ENDPOINT")?,
            api_key: SecretString::from(required("INFERENCE_API_KEY")?),
        };

        let smtp = SmtpConfig {
            host: required("SMTP_HOST")?,
            port: parsed("SMTP_PORT", 587)?,
            username: required("SMTP_USERNAME")?,
            password: SecretString::from(required("SMTP_PASSWORD")?),
            from_address: required("SMTP_FROM_ADDRESS")?,
        };

        Ok(Self {
            oauth,
            mailbox_base_url: optional("MAILBOX_BASE_URL", DEFAULT_MAILBOX_BASE_URL),
            inference,
            smtp,
            min_call_interval: Duration::from_millis(parsed("MIN_CALL_INTERVAL_MS", 2000)?),
            enqueue_delay: Duration::from_millis(parsed("ENQUEUE_DELAY_MS", 2000)?),
            queue_name: optional("REPLY_QUEUE_NAME", "emailQueue"),
            max_delivery_attempts: parsed("MAX_DELIVERY_ATTEMPTS", 3)?,
            worker_count: parsed("DELIVERY_WORKERS", 1)?,
            http_port: parsed("HTTP_PORT", 8080)?,
            persona: Persona {
                name: optional("PERSONA_NAME", "Alex"),
                company: optional("PERSONA_COMPANY", "Acme Outreach"),
            },
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_falls_back_to_default() {
        // SAFETY: no other test reads this variable concurrently.
        unsafe { std::env::remove_var("TRIAGE_TEST_UNSET") };
        assert_eq!(parsed::<u16>("TRIAGE_TEST_UNSET", 42).unwrap(), 42);
    }

    #[test]
    fn parsed_rejects_garbage() {
        // SAFETY: variable is owned by this test.
        unsafe { std::env::set_var("TRIAGE_TEST_GARBAGE", "not-a-number") };
        assert!(parsed::<u16>("TRIAGE_TEST_GARBAGE", 1).is_err());
        unsafe { std::env::remove_var("TRIAGE_TEST_GARBAGE") };
    }

    #[test]
    fn required_reports_missing_var() {
        unsafe { std::env::remove_var("TRIAGE_TEST_REQUIRED") };
        let err = required("TRIAGE_TEST_REQUIRED").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }
}
