//! Mathematical utilities: least squares trends and rounding/averaging helpers.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
