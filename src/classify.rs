//! Intent classification of parsed messages.
//!
//! The inference service answers with free text; the token is matched
//! case-sensitively against the fixed category set. Anything else is
//! carried as [`Classification::Unknown`] and routed to the default
//! drafting template downstream, never rejected.

use std::sync::Arc;

use tracing::debug;

use crate::error::UpstreamError;
use crate::inference::{Inference, Turn};
use crate::limiter::RateLimiter;
use crate::parser::ParsedMessage;

/// Fixed set of triage intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Interested,
    NotInterested,
    MoreInformation,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Interested,
        Category::NotInterested,
        Category::MoreInformation,
    ];

    /// Canonical name, used for mailbox labels and the classifier prompt.
    pub fn label_name(self) -> &'static str {
        match self {
            Category::Interested => "Interested",
            Category::NotInterested => "Not Interested",
            Category::MoreInformation => "More Information",
        }
    }
}

/// Classification outcome: a known category, or the service's raw token
/// when it matched nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Known(Category),
    Unknown(String),
}

impl Classification {
    /// Match a trimmed inference token against the category set.
    pub fn from_token(token: &str) -> Self {
        Category::ALL
            .iter()
            .find(|category| category.label_name() == token)
            .map_or_else(|| Classification::Unknown(token.to_string()), |c| {
                Classification::Known(*c)
            })
    }

    /// Label name to apply, if this classification maps to one.
    pub fn label_name(&self) -> Option<&str> {
        match self {
            Classification::Known(category) => Some(category.label_name()),
            Classification::Unknown(_) => None,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Known(category) => f.write_str(category.label_name()),
            Classification::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

/// Sends classification prompts through the rate limiter.
pub struct Classifier {
    inference: Arc<dyn Inference>,
    limiter: RateLimiter,
}

impl Classifier {
    pub fn new(inference: Arc<dyn Inference>, limiter: RateLimiter) -> Self {
        Self { inference, limiter }
    }

    /// Classify one parsed message into exactly one [`Classification`].
    pub async fn classify(
        &self,
        message: &ParsedMessage,
    ) -> Result<Classification, UpstreamError> {
        let prompt = build_classification_prompt(&message.classification_context);
        let answer = self
            .limiter
            .schedule(self.inference.generate(vec![Turn::user(prompt)]))
            .await?;
        let classification = Classification::from_token(answer.trim());
        debug!(token = %answer.trim(), classification = %classification, "Classified message");
        Ok(classification)
    }
}

fn build_classification_prompt(context: &str) -> String {
    let options = Category::ALL
        .iter()
        .map(|c| c.label_name())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Based on the following text, give a one word answer. Categorize the text \
         based on its content and assign a label from the given options - {options}. \
         Text is: {context}"
    )
}
