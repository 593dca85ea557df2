//! Triage orchestrator: one state machine per fetched message.
//!
//! Per message: fetch → parse → classify → relabel → draft → enqueue.
//! Each step except parsing is a rate-limited external call. A failure
//! at any step logs the error and abandons that message only; side
//! effects already applied (a label, say) are not reversed. Messages are
//! fanned out without a self-imposed concurrency bound — pacing comes
//! entirely from the shared rate limiter.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info};

use crate::auth::Credential;
use crate::classify::Classifier;
use crate::drafter::Drafter;
use crate::error::Error;
use crate::labels::{LabelManager, LabelMap};
use crate::mailbox::{MailboxClient, MessageRef};
use crate::parser;
use crate::queue::{ReplyJob, ReplyQueue};

/// Aggregate outcome of one triage pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Messages the pass launched a state machine for.
    pub total: usize,
    /// State machines that reached Enqueued.
    pub replied: usize,
    /// State machines abandoned by a per-message error.
    pub failed: usize,
    /// Category labels that could not be created this pass.
    pub label_failures: usize,
}

/// Handle on an in-flight pass. The triggering caller returns as soon as
/// the machines are launched; tests (and a background logger) await this
/// to observe completion.
pub struct PassHandle {
    inner: tokio::task::JoinHandle<PassSummary>,
}

impl PassHandle {
    /// Wait for every state machine in the pass to finish.
    pub async fn wait(self) -> PassSummary {
        // The supervisor task neither panics nor aborts.
        self.inner.await.unwrap_or(PassSummary {
            total: 0,
            replied: 0,
            failed: 0,
            label_failures: 0,
        })
    }
}

/// Coordinates one triage pass over a mailbox.
#[derive(Clone)]
pub struct Orchestrator {
    mailbox: Arc<MailboxClient>,
    labels: Arc<LabelManager>,
    classifier: Arc<Classifier>,
    drafter: Arc<Drafter>,
    queue: Arc<ReplyQueue>,
    /// Delay between drafting and enqueuing, to spread delivery load.
    enqueue_delay: Duration,
}

impl Orchestrator {
    pub fn new(
        mailbox: Arc<MailboxClient>,
        labels: Arc<LabelManager>,
        classifier: Arc<Classifier>,
        drafter: Arc<Drafter>,
        queue: Arc<ReplyQueue>,
        enqueue_delay: Duration,
    ) -> Self {
        Self {
            mailbox,
            labels,
            classifier,
            drafter,
            queue,
            enqueue_delay,
        }
    }

    /// List the mailbox, ensure category labels, and launch one state
    /// machine per message.
    ///
    /// Listing and label-map construction are pass-fatal; per-message
    /// failures are isolated. Returns once everything is launched.
    pub async fn launch_pass(&self, credential: Credential) -> Result<PassHandle, Error> {
        let refs = self.mailbox.list_messages(&credential).await?;
        info!(count = refs.len(), "Starting triage pass");

        let ensured = self.labels.ensure_category_labels(&credential).await?;
        let label_failures = ensured.failures.len();
        let label_map = Arc::new(ensured.map);

        let total = refs.len();
        let mut machines = JoinSet::new();
        for message_ref in refs {
            let orchestrator = self.clone();
            let credential = credential.clone();
            let label_map = Arc::clone(&label_map);
            machines.spawn(async move {
                let id = message_ref.id.clone();
                match orchestrator
                    .triage_message(message_ref, &credential, &label_map)
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        error!(id = %id, error = %e, "Triage abandoned for message");
                        false
                    }
                }
            });
        }

        let supervisor = tokio::spawn(async move {
            let mut replied = 0;
            let mut failed = 0;
            while let Some(outcome) = machines.join_next().await {
                match outcome {
                    Ok(true) => replied += 1,
                    _ => failed += 1,
                }
            }
            let summary = PassSummary {
                total,
                replied,
                failed,
                label_failures,
            };
            info!(
                total = summary.total,
                replied = summary.replied,
                failed = summary.failed,
                "Triage pass complete"
            );
            summary
        });

        Ok(PassHandle { inner: supervisor })
    }

    /// One message's state machine, terminal on success or the first
    /// recoverable failure.
    async fn triage_message(
        &self,
        message_ref: MessageRef,
        credential: &Credential,
        label_map: &LabelMap,
    ) -> Result<(), Error> {
        let raw = self.mailbox.get_message(&message_ref.id, credential).await?;
        let parsed = parser::parse(&raw)?;

        let classification = self.classifier.classify(&parsed).await?;
        info!(id = %message_ref.id, classification = %classification, "Message classified");

        self.labels
            .apply(&message_ref.id, &classification, label_map, credential)
            .await?;

        let body = self.drafter.draft(&classification, &parsed).await?;

        // Spread delivery load: burst drafting should not become burst
        // sending.
        tokio::time::sleep(self.enqueue_delay).await;

        self.queue
            .enqueue(ReplyJob {
                to: parsed.from.address,
                cc: parsed.cc,
                subject: parsed.subject,
                body,
            })
            .await?;

        Ok(())
    }
}
