//! Debug bundle writer for inspecting tracker inputs and results.
//!
//! A bundle is a single markdown file with the evaluation context, the tail of
//! each input series, and the raw indicator JSON.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::timestamp::format_timestamp;
use crate::domain::{DataSnapshot, DataSource};
use crate::error::AppError;
use crate::tracker::{EvalClock, TrackerOutcome};

/// Rows of each series included in the bundle (most recent last).
const TAIL_ROWS: usize = 12;

pub fn write_debug_bundle(
    dir: &Path,
    source: DataSource,
    snapshot: &DataSnapshot,
    outcome: &TrackerOutcome,
    clock: &EvalClock,
) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("goals_debug_{}_{ts}.md", source.display_name()));

    let body = render_debug_bundle(source, snapshot, outcome, clock)?;
    std::fs::write(&path, body).map_err(|e| AppError::new(4, format!("Failed to write debug file: {e}")))?;

    tracing::info!(path = %path.display(), "wrote debug bundle");
    Ok(path)
}

pub fn render_debug_bundle(
    source: DataSource,
    snapshot: &DataSnapshot,
    outcome: &TrackerOutcome,
    clock: &EvalClock,
) -> Result<String, AppError> {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = render_into(&mut out, source, snapshot, clock);

    let json = serde_json::to_string_pretty(outcome)
        .map_err(|e| AppError::new(4, format!("Failed to serialize tracker outcome: {e}")))?;
    out.push_str("\n## Goal tracker\n```json\n");
    out.push_str(&json);
    out.push_str("\n```\n");
    Ok(out)
}

fn render_into(out: &mut String, source: DataSource, snapshot: &DataSnapshot, clock: &EvalClock) -> std::fmt::Result {
    writeln!(out, "# goals debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- source: {}", source.display_name())?;
    writeln!(out, "- evaluated_at: {}", format_timestamp(&clock.now()))?;
    writeln!(out, "- current_year: {}", clock.current_year())?;
    writeln!(out, "- days_elapsed: {}", clock.days_elapsed())?;
    writeln!(
        out,
        "- rows: intensity={} mix={} targets={}",
        snapshot.intensity.len(),
        snapshot.mix.len(),
        snapshot.targets.len()
    )?;

    writeln!(out, "\n## Carbon intensity (last {TAIL_ROWS})")?;
    writeln!(out, "| timestamp | g/kWh |")?;
    writeln!(out, "| - | - |")?;
    for r in tail(&snapshot.intensity) {
        writeln!(out, "| {} | {:.1} |", format_timestamp(&r.timestamp), r.co2_intensity_g_per_kwh)?;
    }

    writeln!(out, "\n## Generation mix (last {TAIL_ROWS})")?;
    writeln!(out, "| timestamp | hydro | wind | solar | nuclear | fossil | total | renewable % |")?;
    writeln!(out, "| - | - | - | - | - | - | - | - |")?;
    for m in tail(&snapshot.mix) {
        writeln!(
            out,
            "| {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {} |",
            format_timestamp(&m.timestamp),
            m.hydro_mw,
            m.wind_mw,
            m.solar_mw,
            m.nuclear_mw,
            m.fossil_mw,
            m.total_mw(),
            fmt_opt(m.derived_renewable_share_pct()),
        )?;
    }

    writeln!(out, "\n## Net-zero targets")?;
    writeln!(out, "| year | actual Mt | target Mt | alignment % |")?;
    writeln!(out, "| - | - | - | - |")?;
    for t in &snapshot.targets {
        writeln!(
            out,
            "| {} | {:.1} | {:.1} | {:.0} |",
            t.year, t.actual_emissions_mt, t.target_emissions_mt, t.alignment_pct
        )?;
    }
    Ok(())
}

fn tail<T>(rows: &[T]) -> &[T] {
    &rows[rows.len().saturating_sub(TAIL_ROWS)..]
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnualTarget, IntensityReading};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn bundle_contains_tail_and_json() {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let snapshot = DataSnapshot {
            intensity: (0..20)
                .map(|i| IntensityReading {
                    timestamp: t0 + Duration::minutes(15 * i),
                    co2_intensity_g_per_kwh: 200.0 + i as f64,
                })
                .collect(),
            mix: Vec::new(),
            targets: vec![AnnualTarget {
                year: 2025,
                actual_emissions_mt: 25.4,
                target_emissions_mt: 25.0,
                alignment_pct: 98.0,
            }],
        };
        let outcome = TrackerOutcome::Failed {
            error: "insufficient data".to_string(),
        };
        let clock = EvalClock::at(t0);

        let text = render_debug_bundle(DataSource::Csv, &snapshot, &outcome, &clock).unwrap();
        assert!(text.contains("- days_elapsed: 151"));
        assert!(!text.contains("| 207.0 |"));
        assert!(text.contains("| 208.0 |"));
        assert!(text.contains("| 2025 | 25.4 | 25.0 | 98 |"));
        assert!(text.contains(r#""error": "insufficient data""#));

        let dir = tempfile::tempdir().unwrap();
        let path = write_debug_bundle(dir.path(), DataSource::Csv, &snapshot, &outcome, &clock).unwrap();
        assert!(path.exists());
    }
}
