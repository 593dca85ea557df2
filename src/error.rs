//! Error types for the triage pipeline.

/// Top-level error type for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Credential exchange errors. Fatal for the triage pass that needed them.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token exchange failed with status {status}")]
    ExchangeFailed { status: u16 },

    #[error("Token endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid consent URL: {0}")]
    InvalidUrl(String),
}

/// Failures talking to the mailbox provider or the inference service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {service}: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },
}

/// Per-message payload decoding errors. Recoverable — the message is
/// skipped, siblings keep running.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed From header: {0:?}")]
    MalformedSender(String),

    #[error("Invalid base64 in message body: {0}")]
    Body(#[from] base64::DecodeError),
}

/// Reply queue errors.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue {0} is closed")]
    Closed(String),
}

/// Delivery transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build outbound message: {0}")]
    Build(String),

    #[error("Send failed: {0}")]
    Send(String),
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
