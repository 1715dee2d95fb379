//! On-demand consignment timelines for expanded rows.

pub mod cache;
pub mod queue;

pub use cache::{DEFAULT_TTL, DetailCache};
pub use queue::{DEFAULT_CONCURRENCY, DetailEvent, DetailQueue, DetailStatus, RequestOutcome};
