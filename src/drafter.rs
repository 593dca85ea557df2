//! Drafts reply bodies from category-specific instruction templates.

use std::sync::Arc;

use crate::classify::{Category, Classification};
use crate::config::Persona;
use crate::error::UpstreamError;
use crate::inference::{Inference, Turn};
use crate::limiter::RateLimiter;
use crate::parser::ParsedMessage;

/// Builds drafting instructions and sends them through the rate limiter.
/// The generated text is returned verbatim as the reply body.
pub struct Drafter {
    inference: Arc<dyn Inference>,
    limiter: RateLimiter,
    persona: Persona,
}

impl Drafter {
    pub fn new(inference: Arc<dyn Inference>, limiter: RateLimiter, persona: Persona) -> Self {
        Self {
            inference,
            limiter,
            persona,
        }
    }

    /// Draft a reply body for a classified message.
    pub async fn draft(
        &self,
        classification: &Classification,
        message: &ParsedMessage,
    ) -> Result<String, UpstreamError> {
        let instruction = build_instruction(classification, message, &self.persona);
        self.limiter
            .schedule(self.inference.generate(vec![Turn::user(instruction)]))
            .await
    }
}

/// Instruction template table. Unknown classifications fall back to the
/// demo-call template.
pub fn build_instruction(
    classification: &Classification,
    message: &ParsedMessage,
    persona: &Persona,
) -> String {
    let context = &message.classification_context;
    let sender = &message.from.name;
    let Persona { name, company } = persona;

    match classification {
        Classification::Known(Category::NotInterested) => format!(
            "Read {context} and write an email on behalf of {name}, {company} thanking \
             {sender} for their time and asking them if they would like to be contacted \
             in the future by {name}"
        ),
        Classification::Known(Category::MoreInformation) => format!(
            "Read {context} and write an email on behalf of {name}, {company} asking \
             {sender} if they would like more information about the product from {name}"
        ),
        Classification::Known(Category::Interested) | Classification::Unknown(_) => format!(
            "Read {context} and write an email on behalf of {name}, {company} asking \
             {sender} if they are willing to hop on to a demo call by suggesting a time \
             from {name}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Sender;

    fn persona() -> Persona {
        Persona {
            name: "Alex".into(),
            company: "Acme Outreach".into(),
        }
    }

    fn message() -> ParsedMessage {
        ParsedMessage {
            subject: "Your product".into(),
            body_text: "Tell me more".into(),
            classification_context: "Your product Tell me more".into(),
            from: Sender {
                name: "Jane Doe".into(),
                address: "jane@x.com".into(),
            },
            to: None,
            cc: None,
        }
    }

    #[test]
    fn interested_proposes_demo_call() {
        let instruction = build_instruction(
            &Classification::Known(Category::Interested),
            &message(),
            &persona(),
        );
        assert!(instruction.contains("demo call"));
        assert!(instruction.contains("Jane Doe"));
        assert!(instruction.contains("Alex"));
    }

    #[test]
    fn not_interested_asks_about_future_contact() {
        let instruction = build_instruction(
            &Classification::Known(Category::NotInterested),
            &message(),
            &persona(),
        );
        assert!(instruction.contains("future"));
        assert!(instruction.contains("thanking"));
    }

    #[test]
    fn more_information_offers_product_info() {
        let instruction = build_instruction(
            &Classification::Known(Category::MoreInformation),
            &message(),
            &persona(),
        );
        assert!(instruction.contains("more information about the product"));
    }

    #[test]
    fn unknown_falls_back_to_demo_call_template() {
        let fallback = build_instruction(
            &Classification::Unknown("Very keen".into()),
            &message(),
            &persona(),
        );
        let interested = build_instruction(
            &Classification::Known(Category::Interested),
            &message(),
            &persona(),
        );
        assert_eq!(fallback, interested);
    }

    #[test]
    fn instruction_embeds_classification_context() {
        let instruction = build_instruction(
            &Classification::Known(Category::Interested),
            &message(),
            &persona(),
        );
        assert!(instruction.contains("Your product Tell me more"));
    }
}
