//! Ingestion coordinator state machine
//!
//! The coordinator is the public entry point of a run. It validates the
//! source up front, hands decoding to the background worker, buffers results
//! up to the row ceiling and emits bounded batches, progress snapshots and
//! exactly one terminal event.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::time::Instant;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::stats::{IngestionOutcome, IngestionSummary};
use super::worker::{WorkerMessage, WorkerTask, spawn_worker};
use crate::app::models::{ProgressState, Record, RecordBatch, Rejection};
use crate::app::services::chunk_processor::ChunkResult;
use crate::app::services::streaming_decoder::{IngestionSource, detect_format};
use crate::config::IngestionOptions;
use crate::{Error, Result};

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl IngestionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for IngestionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Events yielded by [`IngestionCoordinator::next_event`]
#[derive(Debug)]
pub enum IngestionEvent {
    /// A chunk was processed
    Progress(ProgressState),
    /// Buffered rows reached the ceiling or input ended
    BatchReady(RecordBatch),
    /// Terminal: all input decoded and all batches emitted
    Completed(IngestionSummary),
    /// Terminal: decoding hit an unrecoverable error
    Failed(Error),
    /// Terminal: cancellation observed; unflushed rows were discarded
    Cancelled(IngestionSummary),
}

impl IngestionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed(_) | Self::Failed(_) | Self::Cancelled(_)
        )
    }
}

/// Cloneable handle that cancels a run from another task
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    token: CancellationToken,
}

impl CancellationHandle {
    /// Request cancellation; observed at the next chunk boundary
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

type ProgressCallback = Box<dyn FnMut(&ProgressState) + Send + 'static>;
type BatchCallback = Box<dyn FnMut(&RecordBatch) + Send + 'static>;

/// Outcome of waiting on the worker channel
enum Step {
    Cancelled,
    Message(Option<WorkerMessage>),
}

/// Orchestrates one ingestion run
///
/// # Example
///
/// ```rust
/// use callcenter_pipeline::{IngestionCoordinator, IngestionEvent, IngestionOptions, IngestionSource};
///
/// # async fn example() -> callcenter_pipeline::Result<()> {
/// let csv = "date,operator,duration_minutes,rating_attendance,rating_solution,pause_minutes\n\
///            15/01/2024,Ana Silva,8.5,5,4,10\n";
/// let mut coordinator = IngestionCoordinator::new(IngestionOptions::default());
/// coordinator.start(IngestionSource::from_bytes("calls.csv", csv))?;
///
/// while let Some(event) = coordinator.next_event().await {
///     if let IngestionEvent::BatchReady(batch) = event {
///         println!("{} records", batch.rows.len());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct IngestionCoordinator {
    options: IngestionOptions,
    state: IngestionState,
    token: CancellationToken,
    receiver: Option<mpsc::Receiver<WorkerMessage>>,
    worker: Option<JoinHandle<()>>,
    progress_callbacks: Vec<ProgressCallback>,
    batch_callbacks: Vec<BatchCallback>,
    pending: VecDeque<IngestionEvent>,
    summary: IngestionSummary,
    total_count: Option<usize>,
    total_bytes: Option<u64>,
    buffered_rows: Vec<Record>,
    buffered_errors: Vec<Rejection>,
    started_at: Option<Instant>,
}

impl IngestionCoordinator {
    /// Create an idle coordinator
    pub fn new(options: IngestionOptions) -> Self {
        Self {
            options,
            state: IngestionState::Idle,
            token: CancellationToken::new(),
            receiver: None,
            worker: None,
            progress_callbacks: Vec::new(),
            batch_callbacks: Vec::new(),
            pending: VecDeque::new(),
            summary: IngestionSummary::default(),
            total_count: None,
            total_bytes: None,
            buffered_rows: Vec::new(),
            buffered_errors: Vec::new(),
            started_at: None,
        }
    }

    /// Tie the run to an outer cancellation token
    ///
    /// Cancelling `parent` cancels the run; cancelling the run leaves
    /// `parent` untouched.
    pub fn with_cancellation(mut self, parent: &CancellationToken) -> Self {
        self.token = parent.child_token();
        self
    }

    /// Register a callback invoked with each progress snapshot
    pub fn on_progress<F>(&mut self, callback: F)
    where
        F: FnMut(&ProgressState) + Send + 'static,
    {
        self.progress_callbacks.push(Box::new(callback));
    }

    /// Register a callback invoked with each emitted batch
    pub fn on_batch_ready<F>(&mut self, callback: F)
    where
        F: FnMut(&RecordBatch) + Send + 'static,
    {
        self.batch_callbacks.push(Box::new(callback));
    }

    pub fn state(&self) -> IngestionState {
        self.state
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    /// Request cancellation; observed at the next chunk boundary
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Handle for cancelling from another task
    pub fn cancel_handle(&self) -> CancellationHandle {
        CancellationHandle {
            token: self.token.clone(),
        }
    }

    /// Snapshot of the run statistics so far
    pub fn summary(&self) -> IngestionSummary {
        let mut summary = self.summary.clone();
        if self.state == IngestionState::Running {
            if let Some(started_at) = self.started_at {
                summary.elapsed = started_at.elapsed();
            }
        }
        summary
    }

    /// Validate the source and start the background worker
    ///
    /// Fails fast with `UnsupportedFormat` or `SourceTooLarge` before any row
    /// is decoded; the coordinator stays idle in that case. Must be called
    /// from within a Tokio runtime.
    pub fn start(&mut self, source: IngestionSource) -> Result<()> {
        if self.state != IngestionState::Idle {
            return Err(Error::invalid_state(format!(
                "cannot start ingestion of '{}': coordinator is {}",
                source.name(),
                self.state
            )));
        }

        self.options.validate()?;

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(Error::invalid_state(
                "ingestion must be started from within a Tokio runtime",
            ));
        }

        let size_bytes = source.size_bytes()?;
        if size_bytes > self.options.max_source_bytes {
            return Err(Error::source_too_large(
                source.name(),
                size_bytes,
                self.options.max_source_bytes,
            ));
        }

        let format = detect_format(&source)?;

        info!(
            "Starting ingestion of {} ({} bytes, {})",
            source.name(),
            size_bytes,
            format
        );

        self.summary = IngestionSummary::new(source.name());
        self.summary.format = Some(format);
        self.total_bytes = Some(size_bytes);
        self.started_at = Some(Instant::now());

        let (sender, receiver) = mpsc::channel(self.options.channel_capacity);
        let task = WorkerTask {
            source,
            format,
            total_bytes: size_bytes,
            options: self.options.clone(),
            token: self.token.clone(),
        };

        self.worker = Some(spawn_worker(task, sender));
        self.receiver = Some(receiver);
        self.state = IngestionState::Running;
        Ok(())
    }

    /// Wait for the next event of the run
    ///
    /// Registered callbacks are invoked before the event is returned.
    /// Returns `None` once the terminal event has been delivered, or when
    /// the coordinator was never started.
    pub async fn next_event(&mut self) -> Option<IngestionEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                self.dispatch(&event);
                return Some(event);
            }

            if self.state != IngestionState::Running {
                return None;
            }

            let token = self.token.clone();
            let receiver = self.receiver.as_mut()?;
            let step = tokio::select! {
                biased;
                _ = token.cancelled() => Step::Cancelled,
                message = receiver.recv() => Step::Message(message),
            };

            match step {
                Step::Cancelled => self.finish_cancelled(),
                Step::Message(Some(message)) => {
                    let chunk_boundary = matches!(message, WorkerMessage::Batch(_));
                    self.handle_message(message);
                    if chunk_boundary {
                        tokio::task::yield_now().await;
                    }
                }
                Step::Message(None) => self.finish_failed(Error::worker_failed(
                    "worker stopped without reporting a terminal status",
                )),
            }
        }
    }

    /// Drive the run to its end, dispatching callbacks along the way
    pub async fn run_to_completion(&mut self) -> IngestionOutcome {
        let mut failure = None;
        while let Some(event) = self.next_event().await {
            if let IngestionEvent::Failed(error) = event {
                failure = Some(error);
            }
        }

        let summary = self.summary();
        match self.state {
            IngestionState::Completed => IngestionOutcome::Completed(summary),
            IngestionState::Cancelled => IngestionOutcome::Cancelled(summary),
            IngestionState::Failed => IngestionOutcome::Failed {
                error: failure.unwrap_or_else(|| {
                    Error::invalid_state("run failed before its outcome was awaited")
                }),
                summary,
            },
            IngestionState::Idle | IngestionState::Running => IngestionOutcome::Failed {
                error: Error::invalid_state("ingestion was never started"),
                summary,
            },
        }
    }

    /// Consume the coordinator into a stream of events
    pub fn into_stream(self) -> impl Stream<Item = IngestionEvent> + Send {
        futures::stream::unfold(self, |mut coordinator| async move {
            coordinator
                .next_event()
                .await
                .map(|event| (event, coordinator))
        })
    }

    fn handle_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Started {
                format,
                total_rows,
                total_bytes,
                missing_columns,
                mode,
            } => {
                debug!(
                    "Worker started: {} ({:?} headers, {} missing)",
                    format,
                    mode,
                    missing_columns.len()
                );
                self.summary.format = Some(format);
                self.summary.detection_mode = Some(mode);
                self.summary.missing_columns = missing_columns;
                self.total_count = total_rows;
                self.total_bytes = Some(total_bytes);
            }
            WorkerMessage::Batch(result) => self.accept_chunk(result),
            WorkerMessage::Progress {
                processed,
                bytes_read,
            } => {
                let progress = ProgressState::estimate(
                    processed,
                    self.total_count,
                    self.summary.valid_rows,
                    self.summary.rejected_rows,
                    bytes_read,
                    self.total_bytes,
                );
                self.pending.push_back(IngestionEvent::Progress(progress));
            }
            WorkerMessage::Completed { total_rows } => {
                if total_rows != self.summary.total_rows {
                    warn!(
                        "Worker reported {} rows but {} were received",
                        total_rows, self.summary.total_rows
                    );
                }
                self.finish_completed();
            }
            WorkerMessage::Failed(error) => self.finish_failed(error),
            WorkerMessage::Cancelled { processed } => {
                debug!("Worker stopped on cancellation after {} rows", processed);
                self.finish_cancelled();
            }
        }
    }

    /// Buffer a processed chunk, flushing so no batch exceeds the ceiling
    fn accept_chunk(&mut self, result: ChunkResult) {
        let incoming = result.total();
        if self.buffered_len() > 0 && self.buffered_len() + incoming > self.options.row_ceiling {
            self.flush();
        }

        self.summary.total_rows += incoming;
        self.summary.valid_rows += result.valid_rows.len();
        for rejection in &result.errors {
            self.summary
                .add_rejection(rejection, self.options.rejection_preview_limit);
        }

        self.buffered_rows.extend(result.valid_rows);
        self.buffered_errors.extend(result.errors);

        if self.buffered_len() >= self.options.row_ceiling {
            self.flush();
        }
    }

    fn buffered_len(&self) -> usize {
        self.buffered_rows.len() + self.buffered_errors.len()
    }

    /// Hand buffered rows off as a batch and clear the buffer
    fn flush(&mut self) {
        if self.buffered_len() == 0 {
            return;
        }

        let batch = RecordBatch {
            sequence: self.summary.batches_emitted,
            rows: mem::take(&mut self.buffered_rows),
            errors: mem::take(&mut self.buffered_errors),
        };
        debug!(
            "Emitting batch {} with {} rows and {} rejections",
            batch.sequence,
            batch.rows.len(),
            batch.errors.len()
        );
        self.summary.batches_emitted += 1;
        self.pending.push_back(IngestionEvent::BatchReady(batch));
    }

    fn finish_completed(&mut self) {
        self.flush();
        self.finish(IngestionState::Completed);
        info!("{}", self.summary.summary());
        self.pending
            .push_back(IngestionEvent::Completed(self.summary.clone()));
    }

    fn finish_failed(&mut self, error: Error) {
        // Rows decoded before the failure are valid data
        self.flush();
        self.finish(IngestionState::Failed);
        warn!("Ingestion of {} failed: {}", self.summary.source_name, error);
        self.pending.push_back(IngestionEvent::Failed(error));
    }

    fn finish_cancelled(&mut self) {
        let discarded = self.buffered_len();
        self.buffered_rows.clear();
        self.buffered_errors.clear();
        self.token.cancel();
        self.finish(IngestionState::Cancelled);
        info!(
            "Ingestion of {} cancelled after {} rows ({} unflushed rows discarded)",
            self.summary.source_name, self.summary.total_rows, discarded
        );
        self.pending
            .push_back(IngestionEvent::Cancelled(self.summary.clone()));
    }

    fn finish(&mut self, state: IngestionState) {
        self.state = state;
        if let Some(started_at) = self.started_at {
            self.summary.elapsed = started_at.elapsed();
        }
        // Dropping the receiver unblocks a worker waiting on a full channel
        self.receiver = None;
        self.worker = None;
    }

    fn dispatch(&mut self, event: &IngestionEvent) {
        match event {
            IngestionEvent::Progress(progress) => {
                for callback in &mut self.progress_callbacks {
                    callback(progress);
                }
            }
            IngestionEvent::BatchReady(batch) => {
                for callback in &mut self.batch_callbacks {
                    callback(batch);
                }
            }
            _ => {}
        }
    }
}

impl Drop for IngestionCoordinator {
    fn drop(&mut self) {
        if self.state == IngestionState::Running {
            self.token.cancel();
        }
    }
}

impl fmt::Debug for IngestionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionCoordinator")
            .field("state", &self.state)
            .field("options", &self.options)
            .field("source", &self.summary.source_name)
            .field("buffered", &self.buffered_len())
            .field("pending_events", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::RejectionReason;

    fn record(operator: &str) -> Record {
        Record {
            timestamp: None,
            operator_id: operator.to_string(),
            duration_minutes: 3.0,
            rating_attendance: Some(4.0),
            rating_solution: None,
            pause_minutes: 0.0,
            call_count: 1,
        }
    }

    fn running_coordinator() -> IngestionCoordinator {
        let mut coordinator = IngestionCoordinator::new(
            IngestionOptions::default()
                .with_batch_size(5)
                .with_row_ceiling(10),
        );
        coordinator.state = IngestionState::Running;
        coordinator
    }

    #[test]
    fn test_failure_flushes_buffered_rows_first() {
        let mut coordinator = running_coordinator();
        coordinator.handle_message(WorkerMessage::Batch(ChunkResult {
            valid_rows: vec![record("Ana"), record("Bruno")],
            errors: vec![Rejection::new(2, vec![], RejectionReason::UnparseableRow)],
        }));
        assert!(coordinator.pending.is_empty());

        coordinator.handle_message(WorkerMessage::Failed(Error::malformed_container(
            "calls.csv",
            "unexpected end of input",
        )));

        assert_eq!(coordinator.state(), IngestionState::Failed);
        assert_eq!(coordinator.pending.len(), 2);
        match &coordinator.pending[0] {
            IngestionEvent::BatchReady(batch) => {
                assert_eq!(batch.rows.len(), 2);
                assert_eq!(batch.errors.len(), 1);
            }
            other => panic!("expected BatchReady, got {:?}", other),
        }
        assert!(matches!(coordinator.pending[1], IngestionEvent::Failed(_)));
    }

    #[test]
    fn test_cancellation_discards_unflushed_rows() {
        let mut coordinator = running_coordinator();
        coordinator.handle_message(WorkerMessage::Batch(ChunkResult {
            valid_rows: vec![record("Ana")],
            errors: vec![],
        }));
        coordinator.handle_message(WorkerMessage::Cancelled { processed: 1 });

        assert_eq!(coordinator.state(), IngestionState::Cancelled);
        assert_eq!(coordinator.pending.len(), 1);
        assert!(matches!(coordinator.pending[0], IngestionEvent::Cancelled(_)));
        assert_eq!(coordinator.buffered_len(), 0);
    }

    #[test]
    fn test_chunk_that_would_overflow_flushes_first() {
        let mut coordinator = running_coordinator();
        for _ in 0..3 {
            coordinator.handle_message(WorkerMessage::Batch(ChunkResult {
                valid_rows: (0..4).map(|_| record("Ana")).collect(),
                errors: vec![],
            }));
        }

        // 4 + 4 fit under the ceiling of 10; the third chunk forces a flush
        assert_eq!(coordinator.pending.len(), 1);
        match &coordinator.pending[0] {
            IngestionEvent::BatchReady(batch) => assert_eq!(batch.len(), 8),
            other => panic!("expected BatchReady, got {:?}", other),
        }
        assert_eq!(coordinator.buffered_len(), 4);
    }

    #[tokio::test]
    async fn test_closed_channel_without_terminal_message_fails() {
        let mut coordinator = running_coordinator();
        let (sender, receiver) = mpsc::channel(1);
        coordinator.receiver = Some(receiver);
        drop(sender);

        match coordinator.next_event().await {
            Some(IngestionEvent::Failed(Error::WorkerFailed { .. })) => {}
            other => panic!("expected WorkerFailed, got {:?}", other),
        }
        assert!(coordinator.next_event().await.is_none());
    }
}
