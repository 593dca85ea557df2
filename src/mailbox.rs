//! Mailbox provider client: message listing/fetching and label operations.
//!
//! Every call funnels through the shared [`RateLimiter`], so wall-clock
//! throughput is bounded by the limiter regardless of how many messages
//! are in flight.

use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::error::UpstreamError;
use crate::limiter::RateLimiter;

const SERVICE: &str = "mailbox";

/// List fetch cap per triage pass.
const LIST_MAX_RESULTS: u32 = 100;

// ── Wire types ──────────────────────────────────────────────────────

/// Provider-assigned message identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

/// Raw provider message payload, as fetched. Decoded by the parser.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub payload: MessagePayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub parts: Option<Vec<MessagePart>>,
    #[serde(default)]
    pub body: Option<PartBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(default)]
    pub body: Option<PartBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

/// A mailbox label as the provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListLabelsResponse {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Serialize)]
struct CreateLabelRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyMessageRequest<'a> {
    add_label_ids: Vec<&'a str>,
    remove_label_ids: Vec<&'a str>,
}

// ── Client ──────────────────────────────────────────────────────────

/// HTTP client for the mailbox provider API.
pub struct MailboxClient {
    http: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl MailboxClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, limiter: RateLimiter) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            limiter,
        }
    }

    /// List recent message refs for the mailbox. Failure here is fatal
    /// for the whole triage pass.
    pub async fn list_messages(
        &self,
        credential: &Credential,
    ) -> Result<Vec<MessageRef>, UpstreamError> {
        let url = format!(
            "{}/users/me/messages?maxResults={LIST_MAX_RESULTS}",
            self.base_url
        );
        let response: ListMessagesResponse = self.get_json(&url, credential).await?;
        Ok(response.messages)
    }

    /// Fetch one message's full payload.
    pub async fn get_message(
        &self,
        message_id: &str,
        credential: &Credential,
    ) -> Result<RawMessage, UpstreamError> {
        let url = format!("{}/users/me/messages/{message_id}", self.base_url);
        self.get_json(&url, credential).await
    }

    /// List all labels currently present in the mailbox.
    pub async fn list_labels(&self, credential: &Credential) -> Result<Vec<Label>, UpstreamError> {
        let url = format!("{}/users/me/labels", self.base_url);
        let response: ListLabelsResponse = self.get_json(&url, credential).await?;
        Ok(response.labels)
    }

    /// Create a label by name. The provider assigns the id.
    pub async fn create_label(
        &self,
        name: &str,
        credential: &Credential,
    ) -> Result<Label, UpstreamError> {
        let url = format!("{}/users/me/labels", self.base_url);
        let bearer = credential.bearer().to_string();
        self.limiter
            .schedule(async {
                let response = self
                    .http
                    .post(&url)
                    .bearer_auth(bearer)
                    .json(&CreateLabelRequest { name })
                    .send()
                    .await
                    .map_err(|source| UpstreamError::Http {
                        service: SERVICE,
                        source,
                    })?;
                Self::check_status(&response)?;
                response
                    .json()
                    .await
                    .map_err(|source| UpstreamError::Http {
                        service: SERVICE,
                        source,
                    })
            })
            .await
    }

    /// Swap label ids on a message: add `add`, remove `remove`.
    pub async fn modify_message(
        &self,
        message_id: &str,
        add: &[&str],
        remove: &[&str],
        credential: &Credential,
    ) -> Result<(), UpstreamError> {
        let url = format!("{}/users/me/messages/{message_id}/modify", self.base_url);
        let bearer = credential.bearer().to_string();
        let body = ModifyMessageRequest {
            add_label_ids: add.to_vec(),
            remove_label_ids: remove.to_vec(),
        };
        self.limiter
            .schedule(async {
                let response = self
                    .http
                    .post(&url)
                    .bearer_auth(bearer)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|source| UpstreamError::Http {
                        service: SERVICE,
                        source,
                    })?;
                Self::check_status(&response)?;
                Ok(())
            })
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        credential: &Credential,
    ) -> Result<T, UpstreamError> {
        let bearer = credential.bearer().to_string();
        self.limiter
            .schedule(async {
                let response = self
                    .http
                    .get(url)
                    .bearer_auth(bearer)
                    .send()
                    .await
                    .map_err(|source| UpstreamError::Http {
                        service: SERVICE,
                        source,
                    })?;
                Self::check_status(&response)?;
                response
                    .json()
                    .await
                    .map_err(|source| UpstreamError::Http {
                        service: SERVICE,
                        source,
                    })
            })
            .await
    }

    fn check_status(response: &reqwest::Response) -> Result<(), UpstreamError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::ServerGuard) -> MailboxClient {
        MailboxClient::new(
            reqwest::Client::new(),
            server.url(),
            RateLimiter::unthrottled(),
        )
    }

    #[tokio::test]
    async fn list_messages_returns_refs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/me/messages?maxResults=100")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(r#"{"messages":[{"id":"m1"},{"id":"m2"}],"resultSizeEstimate":2}"#)
            .create_async()
            .await;

        let refs = client(&server)
            .list_messages(&Credential::new("tok"))
            .await
            .unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "m1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_messages_empty_mailbox() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/me/messages?maxResults=100")
            .with_status(200)
            .with_body(r#"{"resultSizeEstimate":0}"#)
            .create_async()
            .await;

        let refs = client(&server)
            .list_messages(&Credential::new("tok"))
            .await
            .unwrap();
        assert!(refs.is_empty());
    }

    #[tokio::test]
    async fn non_2xx_becomes_upstream_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/me/messages?maxResults=100")
            .with_status(403)
            .create_async()
            .await;

        let err = client(&server)
            .list_messages(&Credential::new("tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn create_label_posts_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users/me/labels")
            .match_body(mockito::Matcher::JsonString(
                r#"{"name":"Interested"}"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"id":"Label_1","name":"Interested"}"#)
            .create_async()
            .await;

        let label = client(&server)
            .create_label("Interested", &Credential::new("tok"))
            .await
            .unwrap();
        assert_eq!(label.id, "Label_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn modify_message_sends_label_swap() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users/me/messages/m1/modify")
            .match_body(mockito::Matcher::JsonString(
                r#"{"addLabelIds":["Label_1"],"removeLabelIds":["INBOX"]}"#.into(),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client(&server)
            .modify_message("m1", &["Label_1"], &["INBOX"], &Credential::new("tok"))
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
