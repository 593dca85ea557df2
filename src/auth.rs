//! OAuth collaborator boundary: consent URL and code-for-token exchange.
//!
//! The pipeline itself only ever consumes the resulting [`Credential`];
//! nothing here is persisted by the core.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::OAuthConfig;
use crate::error::AuthError;

/// Mailbox scopes requested during consent.
const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.compose",
    "https://www.googleapis.com/auth/gmail.modify",
];

/// Bearer credential handed to every pipeline call.
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A bare bearer credential with no refresh metadata.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Value for the `Authorization: Bearer` header.
    pub fn bearer(&self) -> &str {
        self.access_token.expose_secret()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges consent codes for bearer credentials.
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    pub fn new(http: reqwest::Client, config: OAuthConfig) -> Self {
        Self { http, config }
    }

    /// The consent URL the trigger endpoint redirects to.
    pub fn consent_url(&self) -> Result<String, AuthError> {
        let url = reqwest::Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("scope", &SCOPES.join(" ")),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for a [`Credential`].
    pub async fn exchange_code(&self, code: &str) -> Result<Credential, AuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::ExchangeFailed {
                status: response.status().as_u16(),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(Credential {
            access_token: SecretString::from(token.access_token),
            refresh_token: token.refresh_token.map(SecretString::from),
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs)),
        })
    }
}
