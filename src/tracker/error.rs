use thiserror::Error;

/// Failures that abort a goal-tracker evaluation.
///
/// An indicator whose inputs are merely incomplete is omitted from the result
/// instead; that is not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("insufficient data")]
    InsufficientData,

    #[error("goal tracker computation failed: non-finite value for {0}")]
    NonFinite(&'static str),
}
