//! Input/output helpers.
//!
//! - persisted unified dataset (`dataset`)
//! - last-update state file (`state`)

pub mod dataset;
pub mod state;

pub use dataset::*;
pub use state::*;
