//! Pipeline entry points for ingestion.
//!
//! - `Ingestor::ingest_date`: Fetch, build, stage and promote one date
//! - `RangeRunner::run`: Ingest an inclusive date range with a fixed delay
//! - `StagingLoader::load`: Clear, insert, promote and clean up staging

pub mod ingest;
pub mod range;
pub mod staging;

pub use ingest::{IngestOptions, Ingestor};
pub use range::{DateOutcome, RangeRunner, RangeSummary};
pub use staging::{LoadOptions, LoadResult, StagingLoader};
