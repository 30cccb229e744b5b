//! Net-zero goal tracker.
//!
//! Pure functions from three time series (grid intensity, generation mix,
//! annual targets) plus an evaluation instant to four indicators:
//!
//! - real-time alignment index (RAI)
//! - year-to-date carbon budget
//! - decarbonization velocity
//! - pathway projection
//!
//! Nothing in here does I/O or reads the wall clock.

pub mod clock;
pub mod engine;
pub mod error;
pub mod indicators;

pub use clock::EvalClock;
pub use engine::{compute_indicators, try_compute_indicators};
pub use error::TrackerError;
pub use indicators::{Budget, GoalTracker, Pathway, PathwayPoint, TrackerOutcome, Velocity};
