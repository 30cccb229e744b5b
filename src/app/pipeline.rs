//! Load, trim and evaluate: the steps shared by `goals track`, `goals summary`
//! and the dashboard.
//!
//! hosted tables or CSV dir -> newest rows per series -> goal-tracker indicators

use std::path::Path;

use crate::config::Settings;
use crate::data::SupabaseClient;
use crate::domain::{DataSnapshot, DataSource, FetchLimits, TrackConfig, TrackerFile};
use crate::error::AppError;
use crate::io::ingest::{self, IngestReport};
use crate::tracker::{EvalClock, TrackerOutcome, compute_indicators};

/// A loaded snapshot plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub source: DataSource,
    pub snapshot: DataSnapshot,
    /// Only present for CSV sources.
    pub ingest: Option<IngestReport>,
}

/// All computed outputs of a single evaluation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: LoadedData,
    pub clock: EvalClock,
    pub outcome: TrackerOutcome,
}

impl RunOutput {
    /// The result with provenance, as exported by `goals track --export`.
    pub fn tracker_file(&self) -> TrackerFile {
        TrackerFile {
            tool: "goals".to_string(),
            source: self.data.source,
            evaluated_at: self.clock.now(),
            intensity_rows: self.data.snapshot.intensity.len(),
            mix_rows: self.data.snapshot.mix.len(),
            target_rows: self.data.snapshot.targets.len(),
            outcome: self.outcome.clone(),
        }
    }
}

/// Pick the source: explicit choice, else the hosted tables when credentials exist.
pub fn resolve_source(requested: Option<DataSource>, settings: &Settings) -> DataSource {
    requested.unwrap_or(if settings.has_supabase_credentials() {
        DataSource::Supabase
    } else {
        DataSource::Csv
    })
}

/// Load the latest rows of each series from `source`.
pub fn load_data(
    source: DataSource,
    data_dir: &Path,
    limits: FetchLimits,
    settings: &Settings,
) -> Result<LoadedData, AppError> {
    let (mut snapshot, ingest) = match source {
        DataSource::Supabase => {
            let client = SupabaseClient::from_settings(settings)?;
            (client.fetch_snapshot(limits)?, None)
        }
        DataSource::Csv => {
            let loaded = ingest::load_snapshot(data_dir)?;
            (loaded.snapshot, Some(loaded.report))
        }
    };
    snapshot.retain_latest(limits);

    tracing::info!(
        source = source.display_name(),
        intensity = snapshot.intensity.len(),
        mix = snapshot.mix.len(),
        targets = snapshot.targets.len(),
        "loaded snapshot"
    );

    Ok(LoadedData {
        source,
        snapshot,
        ingest,
    })
}

/// Compute indicators for already-loaded data.
pub fn evaluate(data: LoadedData, clock: EvalClock) -> RunOutput {
    let outcome = compute_indicators(
        &data.snapshot.intensity,
        &data.snapshot.mix,
        &data.snapshot.targets,
        &clock,
    );
    RunOutput {
        data,
        clock,
        outcome,
    }
}

/// Execute the full track pipeline and return the computed outputs.
pub fn run_track(config: &TrackConfig, settings: &Settings) -> Result<RunOutput, AppError> {
    let data = load_data(config.source, &config.data_dir, config.limits, settings)?;
    let clock = config.at.map(EvalClock::at).unwrap_or_else(EvalClock::system);
    Ok(evaluate(data, clock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::{AnnualTarget, IntensityReading, MixReading, MixRecord};
    use crate::io::{INTENSITY_FILE, MIX_FILE, TARGETS_FILE, append_rows};

    fn write_fixture(dir: &Path) {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 20, 0, 0, 0).unwrap();
        let intensity: Vec<IntensityReading> = (0..10)
            .map(|i| IntensityReading {
                timestamp: t0 + Duration::days(i),
                co2_intensity_g_per_kwh: 300.0 - 30.0 * i as f64 / 9.0,
            })
            .collect();
        let mix: Vec<MixRecord> = (0..4)
            .map(|i| MixReading {
                timestamp: t0 + Duration::hours(i),
                hydro_mw: 1000.0,
                wind_mw: 1500.0,
                solar_mw: 100.0,
                nuclear_mw: 2500.0,
                fossil_mw: 1900.0,
                renewable_share_pct: 37.1,
            })
            .map(|m| MixRecord::from(&m))
            .collect();
        let targets = vec![
            AnnualTarget {
                year: 2020,
                actual_emissions_mt: 30.6,
                target_emissions_mt: 30.0,
                alignment_pct: 98.0,
            },
            AnnualTarget {
                year: 2025,
                actual_emissions_mt: 25.5,
                target_emissions_mt: 25.0,
                alignment_pct: 98.0,
            },
        ];
        append_rows(&dir.join(INTENSITY_FILE), &intensity).unwrap();
        append_rows(&dir.join(MIX_FILE), &mix).unwrap();
        append_rows(&dir.join(TARGETS_FILE), &targets).unwrap();
    }

    #[test]
    fn csv_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let config = TrackConfig {
            source: DataSource::Csv,
            data_dir: dir.path().to_path_buf(),
            limits: FetchLimits::default(),
            at: Some(Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap()),
            json: false,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export: None,
        };
        let run = run_track(&config, &Settings::default()).unwrap();

        let tracker = run.outcome.indicators().unwrap();
        assert!(tracker.alignment_index_pct.is_some());
        assert!(tracker.budget.is_some());
        assert_eq!(tracker.velocity.unwrap().actual_rate, -1216.67);
        assert_eq!(tracker.pathway.as_ref().unwrap().eta_year, 2025);

        let file = run.tracker_file();
        assert_eq!(file.intensity_rows, 10);
        assert_eq!(file.target_rows, 2);
    }

    #[test]
    fn limits_keep_newest_readings_and_earliest_targets() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let limits = FetchLimits {
            intensity: 3,
            mix: 2,
            targets: 1,
        };
        let data = load_data(DataSource::Csv, dir.path(), limits, &Settings::default()).unwrap();
        let values: Vec<f64> = data.snapshot.intensity.iter().map(|r| r.co2_intensity_g_per_kwh).collect();
        assert_eq!(values.len(), 3);
        assert_eq!(values[2], 270.0);
        assert_eq!(data.snapshot.targets.len(), 1);
        assert_eq!(data.snapshot.targets[0].year, 2020);
    }

    #[test]
    fn empty_directory_reports_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let data = load_data(DataSource::Csv, dir.path(), FetchLimits::default(), &Settings::default()).unwrap();
        let run = evaluate(data, EvalClock::at(Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap()));
        assert_eq!(run.outcome.error(), Some("insufficient data"));
    }

    #[test]
    fn source_defaults_follow_credentials() {
        let mut settings = Settings::default();
        assert_eq!(resolve_source(None, &settings), DataSource::Csv);
        settings.supabase_url = Some("https://x.supabase.co".to_string());
        settings.supabase_key = Some("k".to_string());
        assert_eq!(resolve_source(None, &settings), DataSource::Supabase);
        assert_eq!(resolve_source(Some(DataSource::Csv), &settings), DataSource::Csv);
    }
}
