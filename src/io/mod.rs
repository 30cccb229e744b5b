//! Input/output helpers.
//!
//! - CSV directory ingest + validation (`ingest`)
//! - CSV append sink (`export`)
//! - goal-tracker JSON read/write (`outcome`)

pub mod export;
pub mod ingest;
pub mod outcome;

pub use export::*;
pub use ingest::*;
pub use outcome::*;
