//! The `goals simulate` loop: generate steps and write them to the sinks.

use std::path::PathBuf;
use std::thread;
use std::time::Duration as WallDuration;

use chrono::{DateTime, Duration, Utc};

use crate::config::Settings;
use crate::data::{OnConflict, SimStep, Simulator, SupabaseClient};
use crate::data::simulate::anchor_time;
use crate::domain::{MixRecord, OutputMode, SimMode};
use crate::error::AppError;
use crate::io::{INTENSITY_FILE, MIX_FILE, TARGETS_FILE, append_rows};

/// Resolved simulator run (CLI flags over environment settings).
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub mode: SimMode,
    pub seed: Option<u64>,
    pub output: OutputMode,
    pub wall_interval_secs: u64,
    pub step_minutes: u32,
    /// `once`: steps to generate (default 1). `continuous`: stop after this many.
    pub count: Option<usize>,
    pub csv_dir: PathBuf,
}

/// Where generated rows go.
pub struct Sinks {
    csv_dir: Option<PathBuf>,
    supabase: Option<SupabaseClient>,
}

impl Sinks {
    pub fn open(config: &SimConfig, settings: &Settings) -> Result<Self, AppError> {
        let csv_dir = config.output.writes_csv().then(|| config.csv_dir.clone());

        let supabase = if config.output.writes_supabase() {
            if settings.has_supabase_credentials() {
                Some(SupabaseClient::from_settings(settings)?)
            } else {
                tracing::warn!("SUPABASE_URL/SUPABASE_KEY not set; skipping the supabase sink");
                None
            }
        } else {
            None
        };

        Ok(Self { csv_dir, supabase })
    }

    pub fn write(&self, step: &SimStep) -> Result<(), AppError> {
        let mix = [MixRecord::from(&step.mix)];

        if let Some(dir) = &self.csv_dir {
            append_rows(&dir.join(INTENSITY_FILE), std::slice::from_ref(&step.intensity))?;
            append_rows(&dir.join(MIX_FILE), &mix)?;
            append_rows(&dir.join(TARGETS_FILE), std::slice::from_ref(&step.target))?;
        }

        if let Some(client) = &self.supabase {
            let tables = client.tables();
            client.insert_rows(&tables.intensity, std::slice::from_ref(&step.intensity), None)?;
            client.insert_rows(&tables.mix, &mix, None)?;
            client.insert_rows(
                &tables.targets,
                std::slice::from_ref(&step.target),
                Some(OnConflict { column: "year" }),
            )?;
        }
        Ok(())
    }
}

/// Run the simulator; returns the number of steps written.
pub fn run(config: &SimConfig, settings: &Settings) -> Result<usize, AppError> {
    let sinks = Sinks::open(config, settings)?;
    let mut sim = Simulator::new(config.seed);
    let anchor = anchor_time(Utc::now(), config.step_minutes)?;

    tracing::info!(
        mode = ?config.mode,
        output = ?config.output,
        step_minutes = config.step_minutes,
        "starting simulator"
    );

    match config.mode {
        SimMode::Once => run_once(&mut sim, &sinks, anchor, config),
        SimMode::Continuous => run_continuous(&mut sim, &sinks, anchor, config),
    }
}

fn run_once(sim: &mut Simulator, sinks: &Sinks, anchor: DateTime<Utc>, config: &SimConfig) -> Result<usize, AppError> {
    let count = config.count.unwrap_or(1);
    let step = Duration::minutes(i64::from(config.step_minutes));
    for i in 0..count {
        let ts = anchor + step * i as i32;
        emit(sim, sinks, ts)?;
    }
    Ok(count)
}

fn run_continuous(
    sim: &mut Simulator,
    sinks: &Sinks,
    mut ts: DateTime<Utc>,
    config: &SimConfig,
) -> Result<usize, AppError> {
    let step = Duration::minutes(i64::from(config.step_minutes));
    let wall = WallDuration::from_secs(config.wall_interval_secs);
    let mut written = 0usize;

    loop {
        emit(sim, sinks, ts)?;
        written += 1;
        if config.count.is_some_and(|limit| written >= limit) {
            return Ok(written);
        }
        thread::sleep(wall);
        ts += step;
    }
}

fn emit(sim: &mut Simulator, sinks: &Sinks, ts: DateTime<Utc>) -> Result<(), AppError> {
    let step = sim.step(ts);
    sinks.write(&step)?;
    tracing::info!(
        timestamp = %ts,
        intensity = step.intensity.co2_intensity_g_per_kwh,
        renewable_pct = step.mix.renewable_share_pct,
        year = step.target.year,
        "simulated step"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_snapshot;

    fn config(dir: &std::path::Path, mode: SimMode, count: Option<usize>) -> SimConfig {
        SimConfig {
            mode,
            seed: Some(7),
            output: OutputMode::Csv,
            wall_interval_secs: 0,
            step_minutes: 15,
            count,
            csv_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn once_writes_consecutive_steps_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let written = run(&config(dir.path(), SimMode::Once, Some(3)), &Settings::default()).unwrap();
        assert_eq!(written, 3);

        let loaded = load_snapshot(dir.path()).unwrap();
        assert!(loaded.report.row_errors.is_empty());
        let snap = loaded.snapshot;
        assert_eq!(snap.intensity.len(), 3);
        assert_eq!(snap.mix.len(), 3);
        assert_eq!(snap.targets.len(), 3);
        assert_eq!(
            snap.intensity[1].timestamp - snap.intensity[0].timestamp,
            Duration::minutes(15)
        );
    }

    #[test]
    fn repeated_target_years_load_once() {
        let dir = tempfile::tempdir().unwrap();
        run(&config(dir.path(), SimMode::Once, Some(12)), &Settings::default()).unwrap();

        let data = crate::app::pipeline::load_data(
            crate::domain::DataSource::Csv,
            dir.path(),
            crate::domain::FetchLimits::default(),
            &Settings::default(),
        )
        .unwrap();
        let years: Vec<i32> = data.snapshot.targets.iter().map(|t| t.year).collect();
        let mut unique = years.clone();
        unique.dedup();
        assert_eq!(years, unique);
        // 12 steps of 15 minutes span at most one new year.
        assert!(!years.is_empty() && years.len() <= 2);
        assert_eq!(data.snapshot.intensity.len(), 12);
    }

    #[test]
    fn continuous_stops_after_count() {
        let dir = tempfile::tempdir().unwrap();
        let written = run(&config(dir.path(), SimMode::Continuous, Some(2)), &Settings::default()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(load_snapshot(dir.path()).unwrap().snapshot.intensity.len(), 2);
    }

    #[test]
    fn supabase_sink_is_skipped_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), SimMode::Once, None);
        cfg.output = OutputMode::Supabase;
        assert_eq!(run(&cfg, &Settings::default()).unwrap(), 1);
        assert!(!dir.path().join(INTENSITY_FILE).exists());
    }
}
