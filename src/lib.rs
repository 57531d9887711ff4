//! `solar-flare-forecast` library crate.
//!
//! The binary (`sfp`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the preprocessing and windowing stages can be reused by other front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod training;
