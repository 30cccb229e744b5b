//! Read/write goal-tracker JSON files.
//!
//! The file wraps the indicator payload with a little provenance (source, row
//! counts, evaluation instant) so a saved result can be shown later without
//! the inputs. The schema is defined by `domain::TrackerFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::TrackerFile;
use crate::error::AppError;

/// Write a tracker JSON file (pretty-printed).
pub fn write_tracker_json(path: &Path, file: &TrackerFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create tracker JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write tracker JSON: {e}")))?;
    Ok(())
}

/// Read a tracker JSON file.
pub fn read_tracker_json(path: &Path) -> Result<TrackerFile, AppError> {
    let input = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open tracker JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(input).map_err(|e| AppError::new(2, format!("Invalid tracker JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataSource;
    use crate::tracker::{GoalTracker, TrackerOutcome, Velocity};
    use chrono::{TimeZone, Utc};

    #[test]
    fn saved_outcome_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        let file = TrackerFile {
            tool: "goals".to_string(),
            source: DataSource::Csv,
            evaluated_at: Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap(),
            intensity_rows: 96,
            mix_rows: 96,
            target_rows: 6,
            outcome: TrackerOutcome::Indicators(GoalTracker {
                velocity: Some(Velocity {
                    on_track: false,
                    actual_rate: 12.0,
                    required_rate: -3.5,
                }),
                ..GoalTracker::default()
            }),
        };

        write_tracker_json(&path, &file).unwrap();
        let back = read_tracker_json(&path).unwrap();
        assert_eq!(back.outcome, file.outcome);
        assert_eq!(back.evaluated_at, file.evaluated_at);
        assert_eq!(back.source, DataSource::Csv);
    }

    #[test]
    fn garbage_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_tracker_json(&path).unwrap_err().exit_code(), 2);
        assert_eq!(read_tracker_json(&dir.path().join("missing.json")).unwrap_err().exit_code(), 2);
    }
}
