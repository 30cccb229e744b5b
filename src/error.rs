use thiserror::Error;

use crate::tracker::TrackerError;

/// Top-level error carried out of `app::run`.
///
/// Exit codes:
/// - `2` usage, configuration and local file problems
/// - `3` no usable data
/// - `4` remote, terminal and runtime failures
#[derive(Error, Clone)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::InsufficientData => AppError::new(3, err.to_string()),
            TrackerError::NonFinite(_) => AppError::new(4, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_errors_map_to_exit_codes() {
        let no_data = AppError::from(TrackerError::InsufficientData);
        assert_eq!(no_data.exit_code(), 3);
        assert_eq!(no_data.to_string(), "insufficient data");

        let bad = AppError::from(TrackerError::NonFinite("budget.ytdTons"));
        assert_eq!(bad.exit_code(), 4);
    }
}
