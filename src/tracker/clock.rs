//! The evaluation instant used by the goal tracker.
//!
//! Budget pacing and the "current year" target lookup depend on *when* the
//! indicators are evaluated. The tracker never reads the wall clock itself;
//! callers pass an `EvalClock`, and only the outermost front-end builds one
//! from `Utc::now()`.

use chrono::{DateTime, Datelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalClock {
    now: DateTime<Utc>,
}

impl EvalClock {
    /// Evaluate as if the current instant were `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Evaluate at the real current instant.
    pub fn system() -> Self {
        Self::at(Utc::now())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Calendar year of the evaluation instant (UTC).
    pub fn current_year(&self) -> i32 {
        self.now.year()
    }

    /// Whole days elapsed since Jan 1 00:00 UTC of the current year.
    ///
    /// `0` for any instant on Jan 1, `364`/`365` on Dec 31.
    pub fn days_elapsed(&self) -> i64 {
        i64::from(self.now.ordinal0())
    }
}
