//! Numerical utilities: rolling statistics, gap repair and least squares.

pub mod gaps;
pub mod ols;
pub mod rolling;

pub use gaps::*;
pub use ols::*;
pub use rolling::*;
