//! Decodes a raw provider payload into a normalized message record.
//!
//! Pure, no I/O. The only hard failure is a `From` header that does not
//! carry a bracketed address; everything else degrades to empty fields.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;

use crate::error::ParseError;
use crate::mailbox::{MessagePayload, RawMessage};

/// `"Display Name <address>"` split.
static SENDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^<]*)<([^>]*)>").expect("sender pattern is valid"));

/// Normalized message record, built once per message and read-only after.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub subject: String,
    pub body_text: String,
    /// Subject and body, space-joined. Input to the classifier.
    pub classification_context: String,
    pub from: Sender,
    pub to: Option<String>,
    pub cc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

/// Decode a raw provider payload into a [`ParsedMessage`].
pub fn parse(raw: &RawMessage) -> Result<ParsedMessage, ParseError> {
    let payload = &raw.payload;

    let subject = first_header(payload, "Subject").unwrap_or_default();
    let from_raw = first_header(payload, "From")
        .ok_or_else(|| ParseError::MalformedSender(String::new()))?;
    let from = parse_sender(&from_raw)?;
    let to = first_header(payload, "To");
    let cc = first_header(payload, "Cc");

    let body_text = extract_body(payload)?;
    let classification_context = format!("{subject} {body_text}");

    Ok(ParsedMessage {
        subject,
        body_text,
        classification_context,
        from,
        to,
        cc,
    })
}

fn first_header(payload: &MessagePayload, name: &str) -> Option<String> {
    payload
        .headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.clone())
}

fn parse_sender(raw: &str) -> Result<Sender, ParseError> {
    let captures = SENDER_PATTERN
        .captures(raw)
        .ok_or_else(|| ParseError::MalformedSender(raw.to_string()))?;
    Ok(Sender {
        name: captures[1].trim().trim_matches('"').to_string(),
        address: captures[2].trim().to_string(),
    })
}

/// Multipart: first `text/plain` part, base64-decoded; none → empty.
/// Single-part: decode `payload.body.data` directly.
fn extract_body(payload: &MessagePayload) -> Result<String, ParseError> {
    let data = match &payload.parts {
        Some(parts) => parts
            .iter()
            .find(|part| part.mime_type == "text/plain")
            .and_then(|part| part.body.as_ref())
            .and_then(|body| body.data.as_deref()),
        None => payload.body.as_ref().and_then(|body| body.data.as_deref()),
    };
    let Some(data) = data else {
        return Ok(String::new());
    };
    let bytes = BASE64.decode(data)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{Header, MessagePart, PartBody};

    fn header(name: &str, value: &str) -> Header {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }

    fn raw(headers: Vec<Header>, parts: Option<Vec<MessagePart>>, body: Option<&str>) -> RawMessage {
        RawMessage {
            payload: MessagePayload {
                headers,
                parts,
                body: body.map(|data| PartBody {
                    data: Some(data.into()),
                }),
            },
        }
    }

    fn text_part(mime_type: &str, plaintext: &str) -> MessagePart {
        MessagePart {
            mime_type: mime_type.into(),
            body: Some(PartBody {
                data: Some(BASE64.encode(plaintext)),
            }),
        }
    }

    #[test]
    fn sender_name_and_address_split() {
        let message = raw(
            vec![
                header("Subject", "Hello"),
                header("From", "\"Jane Doe\" <jane@x.com>"),
            ],
            None,
            None,
        );
        let parsed = parse(&message).unwrap();
        assert_eq!(parsed.from.name, "Jane Doe");
        assert_eq!(parsed.from.address, "jane@x.com");
    }

    #[test]
    fn unquoted_sender_name_trimmed() {
        let message = raw(
            vec![header("From", "Jane Doe <jane@x.com>")],
            None,
            None,
        );
        let parsed = parse(&message).unwrap();
        assert_eq!(
            parsed.from,
            Sender {
                name: "Jane Doe".into(),
                address: "jane@x.com".into()
            }
        );
    }

    #[test]
    fn malformed_from_is_recoverable_error() {
        let message = raw(vec![header("From", "jane@x.com")], None, None);
        let err = parse(&message).unwrap_err();
        assert!(matches!(err, ParseError::MalformedSender(_)));
    }

    #[test]
    fn missing_from_is_malformed_sender() {
        let message = raw(vec![header("Subject", "no sender")], None, None);
        assert!(matches!(
            parse(&message).unwrap_err(),
            ParseError::MalformedSender(_)
        ));
    }

    #[test]
    fn multipart_text_plain_decoded() {
        let message = raw(
            vec![header("From", "A <a@x.com>")],
            Some(vec![
                text_part("text/html", "<p>hello</p>"),
                text_part("text/plain", "hello"),
            ]),
            None,
        );
        let parsed = parse(&message).unwrap();
        assert_eq!(parsed.body_text, "hello");
    }

    #[test]
    fn multipart_without_text_plain_is_empty_body() {
        let message = raw(
            vec![header("From", "A <a@x.com>")],
            Some(vec![text_part("text/html", "<p>hello</p>")]),
            None,
        );
        let parsed = parse(&message).unwrap();
        assert_eq!(parsed.body_text, "");
    }

    #[test]
    fn single_part_body_decoded() {
        let message = raw(
            vec![header("Subject", "Hi"), header("From", "A <a@x.com>")],
            None,
            Some(&BASE64.encode("plain body")),
        );
        let parsed = parse(&message).unwrap();
        assert_eq!(parsed.body_text, "plain body");
    }

    #[test]
    fn classification_context_joins_subject_and_body() {
        let message = raw(
            vec![
                header("Subject", "Pricing question"),
                header("From", "A <a@x.com>"),
            ],
            Some(vec![text_part("text/plain", "How much does it cost?")]),
            None,
        );
        let parsed = parse(&message).unwrap();
        assert_eq!(
            parsed.classification_context,
            "Pricing question How much does it cost?"
        );
    }

    #[test]
    fn first_matching_header_wins() {
        let message = raw(
            vec![
                header("Subject", "first"),
                header("Subject", "second"),
                header("From", "A <a@x.com>"),
            ],
            None,
            None,
        );
        assert_eq!(parse(&message).unwrap().subject, "first");
    }

    #[test]
    fn to_and_cc_captured_when_present() {
        let message = raw(
            vec![
                header("From", "A <a@x.com>"),
                header("To", "me@here.com"),
                header("Cc", "boss@here.com"),
            ],
            None,
            None,
        );
        let parsed = parse(&message).unwrap();
        assert_eq!(parsed.to.as_deref(), Some("me@here.com"));
        assert_eq!(parsed.cc.as_deref(), Some("boss@here.com"));
    }

    #[test]
    fn invalid_base64_body_is_parse_error() {
        let message = raw(
            vec![header("From", "A <a@x.com>")],
            None,
            Some("!!not-base64!!"),
        );
        assert!(matches!(parse(&message).unwrap_err(), ParseError::Body(_)));
    }
}
