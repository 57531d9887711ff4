//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the time-indexed table every pipeline stage exchanges (`TimeTable`)
//! - schema column names and feed URLs
//! - the resolved run configuration (`PipelineConfig`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
