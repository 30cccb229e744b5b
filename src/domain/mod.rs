//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the input series (`IntensityReading`, `MixReading`, `AnnualTarget`)
//! - source/sink configuration enums (`DataSource`, `OutputMode`, `SimMode`)
//! - run configuration and the saved tracker file (`TrackConfig`, `TrackerFile`)
//! - timestamp parsing shared by CSV and REST ingest (`timestamp`)

pub mod timestamp;
pub mod types;

pub use types::*;
