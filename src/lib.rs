//! Inbox triage: classify incoming mail, relabel it, and queue drafted
//! replies for delivery.

pub mod auth;
pub mod classify;
pub mod config;
pub mod drafter;
pub mod error;
pub mod inference;
pub mod labels;
pub mod limiter;
pub mod mailbox;
pub mod parser;
pub mod pipeline;
pub mod queue;
pub mod server;
pub mod transport;
pub mod worker;
