//! Delivery worker: drains the reply queue and invokes the transport.
//!
//! Each worker loop handles one job at a time. The transport outcome is
//! awaited; a failed send feeds the queue's requeue/dead-letter path
//! rather than being dropped.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::queue::{QueuedJob, ReplyQueue};
use crate::transport::{MailTransport, OutboundEmail};

pub struct DeliveryWorker {
    queue: Arc<ReplyQueue>,
    transport: Arc<dyn MailTransport>,
    /// Fixed sender identity on every delivered reply.
    from_address: String,
}

impl DeliveryWorker {
    pub fn new(
        queue: Arc<ReplyQueue>,
        transport: Arc<dyn MailTransport>,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            transport,
            from_address: from_address.into(),
        }
    }

    /// Spawn `count` delivery loops sharing the queue. Default deployment
    /// runs one, so jobs deliver serially.
    pub fn spawn(self, count: usize) -> Vec<JoinHandle<()>> {
        let worker = Arc::new(self);
        (0..count.max(1))
            .map(|_| {
                let worker = Arc::clone(&worker);
                tokio::spawn(async move { worker.run().await })
            })
            .collect()
    }

    /// Loop until the queue closes and drains.
    async fn run(&self) {
        while let Some(job) = self.queue.dequeue().await {
            self.deliver(job).await;
        }
        info!(queue = %self.queue.name(), "Delivery worker stopped");
    }

    async fn deliver(&self, job: QueuedJob) {
        info!(
            job_id = %job.id,
            to = %job.details.to,
            attempt = job.attempts + 1,
            "Delivering reply"
        );

        let email = OutboundEmail {
            from: self.from_address.clone(),
            to: job.details.to.clone(),
            subject: format!("Reply to {}", job.details.subject),
            html: format!("<p>{}</p>", job.details.body),
        };

        match self.transport.send(&email).await {
            Ok(()) => info!(job_id = %job.id, to = %email.to, "Reply delivered"),
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Reply delivery failed");
                self.queue.fail(job).await;
            }
        }
    }
}
