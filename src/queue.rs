//! Reply work queue decoupling drafting (producer) from delivery
//! (consumer).
//!
//! FIFO with at-least-once semantics: a job failed by the worker is
//! requeued until its attempt budget is spent, then moved to the
//! dead-letter list instead of being discarded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::QueueError;

/// A reply ready for delivery. Owned by the queue once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyJob {
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
}

/// A queued job with its delivery bookkeeping.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: Uuid,
    pub details: ReplyJob,
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

/// Named FIFO work queue for reply jobs.
pub struct ReplyQueue {
    name: String,
    jobs: Mutex<VecDeque<QueuedJob>>,
    dead: Mutex<Vec<QueuedJob>>,
    notify: Notify,
    closed: AtomicBool,
    max_attempts: u32,
}

impl ReplyQueue {
    pub fn new(name: impl Into<String>, max_attempts: u32) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            jobs: Mutex::new(VecDeque::new()),
            dead: Mutex::new(Vec::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            max_attempts,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a job. Never blocks on delivery. Returns the job id.
    pub async fn enqueue(&self, details: ReplyJob) -> Result<Uuid, QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed(self.name.clone()));
        }
        let job = QueuedJob {
            id: Uuid::new_v4(),
            details,
            attempts: 0,
            enqueued_at: Utc::now(),
        };
        let id = job.id;
        info!(queue = %self.name, job_id = %id, to = %job.details.to, "Reply job enqueued");
        self.jobs.lock().await.push_back(job);
        self.notify.notify_one();
        Ok(id)
    }

    /// Take the next job, waiting until one is available. Returns `None`
    /// once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<QueuedJob> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(job) = self.jobs.lock().await.pop_front() {
                return Some(job);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            notified.await;
        }
    }

    /// Report a delivery failure. The job is requeued until its attempt
    /// budget is exhausted, then dead-lettered.
    pub async fn fail(&self, mut job: QueuedJob) {
        job.attempts += 1;
        if job.attempts >= self.max_attempts {
            warn!(
                queue = %self.name,
                job_id = %job.id,
                attempts = job.attempts,
                "Delivery attempts exhausted, dead-lettering job"
            );
            self.dead.lock().await.push(job);
            return;
        }
        warn!(
            queue = %self.name,
            job_id = %job.id,
            attempt = job.attempts,
            "Delivery failed, requeuing job"
        );
        self.jobs.lock().await.push_back(job);
        self.notify.notify_one();
    }

    /// Jobs that exhausted their delivery attempts.
    pub async fn dead_letters(&self) -> Vec<QueuedJob> {
        self.dead.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Stop accepting jobs and wake all consumers so they can drain and
    /// exit.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}
