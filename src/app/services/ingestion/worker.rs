//! Background decode worker
//!
//! Runs the streaming decoder and the chunk processor on a blocking thread and
//! reports to the coordinator through a bounded channel. A full channel blocks
//! the worker, which caps how far decoding can run ahead of the consumer.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::Error;
use crate::app::models::SourceFormat;
use crate::app::services::chunk_processor::{ChunkProcessor, ChunkResult};
use crate::app::services::streaming_decoder::{
    ColumnResolver, DetectionMode, IngestionSource, SemanticColumn, StreamingDecoder,
};
use crate::config::IngestionOptions;

/// Messages sent from the worker to the coordinator
#[derive(Debug)]
pub enum WorkerMessage {
    /// Header row analyzed, decoding is about to begin
    Started {
        format: SourceFormat,
        total_rows: Option<usize>,
        total_bytes: u64,
        missing_columns: Vec<SemanticColumn>,
        mode: DetectionMode,
    },
    /// One processed chunk
    Batch(ChunkResult),
    /// Rows processed and bytes consumed so far
    Progress { processed: usize, bytes_read: u64 },
    /// Input exhausted
    Completed { total_rows: usize },
    /// Unrecoverable decode error
    Failed(Error),
    /// Cancellation observed before the next chunk
    Cancelled { processed: usize },
}

/// Everything the worker needs for one run
#[derive(Debug)]
pub struct WorkerTask {
    pub source: IngestionSource,
    pub format: SourceFormat,
    pub total_bytes: u64,
    pub options: IngestionOptions,
    pub token: CancellationToken,
}

/// Spawn the worker on the blocking thread pool
pub fn spawn_worker(task: WorkerTask, sender: mpsc::Sender<WorkerMessage>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let source_name = task.source.name().to_string();
        if run_worker(task, &sender).is_none() {
            debug!("Worker for {} stopped: coordinator went away", source_name);
        }
    })
}

/// Decode loop; returns `None` if the coordinator stopped listening
fn run_worker(task: WorkerTask, sender: &mpsc::Sender<WorkerMessage>) -> Option<()> {
    let WorkerTask {
        source,
        format,
        total_bytes,
        options,
        token,
    } = task;

    let mut decoder = match StreamingDecoder::open(&source, format, &options) {
        Ok(decoder) => decoder,
        Err(error) => {
            warn!("Failed to open {}: {}", source.name(), error);
            return send(sender, WorkerMessage::Failed(error));
        }
    };

    let resolver = Arc::new(ColumnResolver::from_headers(decoder.headers()));
    let processor = ChunkProcessor::new(resolver.clone());

    send(
        sender,
        WorkerMessage::Started {
            format,
            total_rows: decoder.total_rows(),
            total_bytes,
            missing_columns: resolver.missing_required().to_vec(),
            mode: resolver.mode(),
        },
    )?;

    let pause = options.chunk_pause();
    let mut processed = 0usize;

    loop {
        if token.is_cancelled() {
            debug!("Worker observed cancellation after {} rows", processed);
            return send(sender, WorkerMessage::Cancelled { processed });
        }

        let rows = match decoder.next_chunk(options.batch_size) {
            Ok(rows) => rows,
            Err(error) => {
                warn!("Decoding {} failed after {} rows: {}", source.name(), processed, error);
                return send(sender, WorkerMessage::Failed(error));
            }
        };

        if rows.is_empty() {
            return send(sender, WorkerMessage::Completed { total_rows: processed });
        }

        let count = rows.len();
        let result = processor.process_chunk(rows, processed);
        processed += count;

        send(sender, WorkerMessage::Batch(result))?;
        send(
            sender,
            WorkerMessage::Progress {
                processed,
                bytes_read: decoder.bytes_read(),
            },
        )?;

        pause_between_chunks(pause);
    }
}

fn send(sender: &mpsc::Sender<WorkerMessage>, message: WorkerMessage) -> Option<()> {
    sender.blocking_send(message).ok()
}

fn pause_between_chunks(pause: Duration) {
    if pause.is_zero() {
        thread::yield_now();
    } else {
        thread::sleep(pause);
    }
}
