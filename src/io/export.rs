//! Append rows to CSV files.
//!
//! The simulator writes one row per series per step, so files grow over time.
//! A header is written only when the file is created.

use std::fs::OpenOptions;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;

/// Append `rows` to the CSV at `path`, creating it (and parent directories) if needed.
///
/// Empty input is a no-op and does not create the file.
pub fn append_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    if rows.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }

    let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut writer = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row to '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnualTarget, IntensityReading};
    use crate::io::ingest;
    use chrono::{TimeZone, Utc};

    #[test]
    fn header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(ingest::INTENSITY_FILE);

        let first = IntensityReading {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            co2_intensity_g_per_kwh: 210.4,
        };
        let second = IntensityReading {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap(),
            co2_intensity_g_per_kwh: 198.0,
        };
        append_rows(&path, std::slice::from_ref(&first)).unwrap();
        append_rows(&path, std::slice::from_ref(&second)).unwrap();
        append_rows::<IntensityReading>(&path, &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "timestamp,co2_intensity_g_per_kwh\n\
             2025-06-01T10:00:00+00:00,210.4\n\
             2025-06-01T10:15:00+00:00,198.0\n"
        );

        let loaded = ingest::load_snapshot(&dir.path().join("nested")).unwrap();
        assert_eq!(loaded.snapshot.intensity, vec![first, second]);
    }

    #[test]
    fn empty_input_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ingest::TARGETS_FILE);
        append_rows::<AnnualTarget>(&path, &[]).unwrap();
        assert!(!path.exists());
    }
}
