//! Batch loader module
//!
//! Groups records into fixed-size batches and writes each batch as one bulk
//! insert, in input order.
//!
//! # Write acknowledgment
//!
//! - `WriteAck::Acknowledged` - a failed write is returned to the caller
//! - `WriteAck::Unacknowledged` - fire-and-forget; a failed write is only
//!   traced and the pipeline carries on as if it had succeeded
//!
//! Dataset files use the unacknowledged mode for throughput. The crosswalk
//! uses acknowledged writes because every later join depends on it.

mod batch;

pub use batch::{BatchLoader, BatchStats, WriteAck};
