//! Chunk processing for decoded call-center rows
//!
//! Turns a chunk of raw rows into validated records and rejections. The
//! processor owns nothing but an immutable column resolver, so one instance
//! can be shared across threads working on disjoint chunks.
//!
//! # Architecture
//!
//! - [`processor`] - Row to candidate mapping, normalization and validation
//! - [`stats`] - Per-chunk results and rejection tallies
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use callcenter_pipeline::app::services::chunk_processor::ChunkProcessor;
//! use callcenter_pipeline::app::services::streaming_decoder::ColumnResolver;
//! use callcenter_pipeline::RawRow;
//!
//! let headers: Vec<String> = ["operator", "duration_minutes"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let processor = ChunkProcessor::new(Arc::new(ColumnResolver::from_headers(&headers)));
//!
//! let result = processor.process_chunk(
//!     vec![RawRow::from(vec!["Ana Silva", "8.5"]), RawRow::from(vec!["", "3"])],
//!     0,
//! );
//! assert_eq!(result.valid_rows.len(), 1);
//! assert_eq!(result.errors.len(), 1);
//! ```

pub mod processor;
pub mod stats;

#[cfg(test)]
mod tests;

pub use processor::ChunkProcessor;
pub use stats::ChunkResult;
