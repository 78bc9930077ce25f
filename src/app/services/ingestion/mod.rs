//! Background ingestion of call-center exports
//!
//! This module runs decoding and validation off the caller's task and hands
//! results back in bounded batches.
//!
//! # Architecture
//!
//! - [`coordinator`] - Public state machine: start, events, callbacks, cancellation
//! - [`worker`] - Blocking decode loop and the typed messages it sends
//! - [`stats`] - Run summary and terminal outcome
//!
//! # Concurrency Model
//!
//! The worker runs on Tokio's blocking pool and talks to the coordinator only
//! through a bounded channel, so a slow consumer holds the worker back instead
//! of letting decoded rows pile up. Cancellation is cooperative and observed
//! between chunks by both sides. Rows are emitted in source order.

pub mod coordinator;
pub mod stats;
pub mod worker;

#[cfg(test)]
mod tests;

pub use crate::app::services::streaming_decoder::IngestionSource;
pub use coordinator::{CancellationHandle, IngestionCoordinator, IngestionEvent, IngestionState};
pub use stats::{IngestionOutcome, IngestionSummary};
pub use worker::WorkerMessage;
