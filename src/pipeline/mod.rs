//! Album aggregation and pipeline orchestration

pub mod aggregator;
pub mod orchestrator;

pub use aggregator::{AlbumAggregator, AlbumBatch};
pub use orchestrator::{run, PipelineResult};
