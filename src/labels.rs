//! Ensures the mailbox carries the category labels and applies them.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::auth::Credential;
use crate::classify::{Category, Classification};
use crate::error::UpstreamError;
use crate::mailbox::MailboxClient;

/// Provider label id the triage pass removes from every handled message.
pub const INBOX_LABEL_ID: &str = "INBOX";

/// Category name → provider label id. Built once per pass, read-only after.
pub type LabelMap = HashMap<String, String>;

/// Result of ensuring the category labels exist.
pub struct EnsuredLabels {
    pub map: LabelMap,
    /// Per-label creation failures. Non-fatal; triage proceeds with
    /// whatever labels succeeded.
    pub failures: Vec<(String, UpstreamError)>,
}

pub struct LabelManager {
    client: Arc<MailboxClient>,
}

impl LabelManager {
    pub fn new(client: Arc<MailboxClient>) -> Self {
        Self { client }
    }

    /// Fetch current labels, create any missing category labels, and
    /// return the name → id map.
    ///
    /// Creation is idempotent: existing labels are reused, never
    /// duplicated. Individual creation failures are aggregated and do not
    /// abort the others.
    pub async fn ensure_category_labels(
        &self,
        credential: &Credential,
    ) -> Result<EnsuredLabels, UpstreamError> {
        let existing = self.client.list_labels(credential).await?;
        let mut map: LabelMap = existing
            .into_iter()
            .map(|label| (label.name, label.id))
            .collect();

        let missing: Vec<&'static str> = Category::ALL
            .iter()
            .map(|category| category.label_name())
            .filter(|name| !map.contains_key(*name))
            .collect();

        let creations = join_all(missing.iter().map(|name| async move {
            (*name, self.client.create_label(name, credential).await)
        }))
        .await;

        let mut failures = Vec::new();
        for (name, outcome) in creations {
            match outcome {
                Ok(label) => {
                    info!(label = %label.name, id = %label.id, "Created category label");
                    map.insert(label.name, label.id);
                }
                Err(e) => {
                    warn!(label = %name, error = %e, "Failed to create category label");
                    failures.push((name.to_string(), e));
                }
            }
        }

        // Keep only category entries; provider system labels stay out of
        // the map handed to the orchestrator.
        map.retain(|name, _| {
            Category::ALL
                .iter()
                .any(|category| category.label_name() == name)
        });

        Ok(EnsuredLabels { map, failures })
    }

    /// Remove the inbox label and add the category label for `classification`.
    ///
    /// Unknown classifications, and categories whose label failed to
    /// create, are logged no-ops.
    pub async fn apply(
        &self,
        message_id: &str,
        classification: &Classification,
        labels: &LabelMap,
        credential: &Credential,
    ) -> Result<(), UpstreamError> {
        let label_id = classification
            .label_name()
            .and_then(|name| labels.get(name));

        let Some(label_id) = label_id else {
            warn!(
                id = %message_id,
                classification = %classification,
                "No label mapping for classification, leaving message unlabeled"
            );
            return Ok(());
        };

        self.client
            .modify_message(message_id, &[label_id], &[INBOX_LABEL_ID], credential)
            .await?;
        info!(id = %message_id, classification = %classification, "Relabeled message");
        Ok(())
    }
}
