//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - read from CSV files or the hosted tables
//! - fed to the goal tracker as plain snapshots
//! - exported to JSON/CSV and reloaded later

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::tracker::TrackerOutcome;

/// One sampled carbon-intensity measurement (g CO₂ per kWh generated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityReading {
    #[serde(with = "crate::domain::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub co2_intensity_g_per_kwh: f64,
}

/// One sampled snapshot of output by generation technology (MW).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixReading {
    #[serde(with = "crate::domain::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub hydro_mw: f64,
    pub wind_mw: f64,
    pub solar_mw: f64,
    pub nuclear_mw: f64,
    pub fossil_mw: f64,
    pub renewable_share_pct: f64,
}

impl MixReading {
    /// Total generation across all technologies.
    pub fn total_mw(&self) -> f64 {
        self.hydro_mw + self.wind_mw + self.solar_mw + self.nuclear_mw + self.fossil_mw
    }

    /// Hydro + wind + solar.
    pub fn renewable_mw(&self) -> f64 {
        self.hydro_mw + self.wind_mw + self.solar_mw
    }

    /// Renewable share derived from the MW columns, `None` when nothing is generated.
    pub fn derived_renewable_share_pct(&self) -> Option<f64> {
        let total = self.total_mw();
        if total > 0.0 {
            Some(100.0 * self.renewable_mw() / total)
        } else {
            None
        }
    }
}

/// Row form of a mix reading as stored in CSV files and the hosted table.
///
/// The stored schema carries the derived `total_mw` column next to the
/// per-technology values.
#[derive(Debug, Clone, Serialize)]
pub struct MixRecord {
    #[serde(with = "crate::domain::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub hydro_mw: f64,
    pub wind_mw: f64,
    pub solar_mw: f64,
    pub nuclear_mw: f64,
    pub fossil_mw: f64,
    pub total_mw: f64,
    pub renewable_share_pct: f64,
}

impl From<&MixReading> for MixRecord {
    fn from(m: &MixReading) -> Self {
        Self {
            timestamp: m.timestamp,
            hydro_mw: m.hydro_mw,
            wind_mw: m.wind_mw,
            solar_mw: m.solar_mw,
            nuclear_mw: m.nuclear_mw,
            fossil_mw: m.fossil_mw,
            total_mw: m.total_mw(),
            renewable_share_pct: m.renewable_share_pct,
        }
    }
}

/// A yearly actual-vs-target emissions pair (megatonnes CO₂).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualTarget {
    pub year: i32,
    pub actual_emissions_mt: f64,
    pub target_emissions_mt: f64,
    pub alignment_pct: f64,
}

/// The three input series, as fetched from one data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSnapshot {
    pub intensity: Vec<IntensityReading>,
    pub mix: Vec<MixReading>,
    pub targets: Vec<AnnualTarget>,
}

impl DataSnapshot {
    /// Apply the fetch limits the way the hosted queries do.
    ///
    /// Readings keep the most recent `n` rows; targets keep the earliest `n`
    /// years, one row per year (the first one stored wins). Rows end up in
    /// ascending order (timestamp / year), which every consumer expects.
    pub fn retain_latest(&mut self, limits: FetchLimits) {
        self.intensity.sort_by_key(|r| r.timestamp);
        self.mix.sort_by_key(|r| r.timestamp);
        // Stable sort, so repeated years stay in storage order.
        self.targets.sort_by_key(|t| t.year);
        self.targets.dedup_by_key(|t| t.year);

        keep_tail(&mut self.intensity, limits.intensity);
        keep_tail(&mut self.mix, limits.mix);
        self.targets.truncate(limits.targets);
    }
}

fn keep_tail<T>(rows: &mut Vec<T>, n: usize) {
    if rows.len() > n {
        rows.drain(..rows.len() - n);
    }
}

/// How many rows of each series a fetch should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub intensity: usize,
    pub mix: usize,
    pub targets: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        // One day of 15-minute samples, plus every yearly target.
        Self {
            intensity: 96,
            mix: 96,
            targets: 100,
        }
    }
}

/// Where the input series are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Hosted Postgres tables behind the Supabase REST endpoint.
    Supabase,
    /// A directory of CSV files (as written by `goals simulate`).
    Csv,
}

impl DataSource {
    pub fn display_name(self) -> &'static str {
        match self {
            DataSource::Supabase => "supabase",
            DataSource::Csv => "csv",
        }
    }
}

/// Where the simulator writes generated rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Csv,
    Supabase,
    Both,
}

impl OutputMode {
    pub fn writes_csv(self) -> bool {
        matches!(self, OutputMode::Csv | OutputMode::Both)
    }

    pub fn writes_supabase(self) -> bool {
        matches!(self, OutputMode::Supabase | OutputMode::Both)
    }
}

/// Simulator run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SimMode {
    /// Generate a fixed number of steps and exit.
    Once,
    /// Generate one step per wall-clock tick until interrupted.
    Continuous,
}

/// A full `goals track` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment settings and defaults.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub source: DataSource,
    pub data_dir: PathBuf,
    pub limits: FetchLimits,
    /// Evaluate "now" at this instant instead of the wall clock.
    pub at: Option<DateTime<Utc>>,

    pub json: bool,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export: Option<PathBuf>,
}

/// A saved goal-tracker file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerFile {
    pub tool: String,
    pub source: DataSource,
    /// The instant the indicators were evaluated at.
    pub evaluated_at: DateTime<Utc>,
    pub intensity_rows: usize,
    pub mix_rows: usize,
    pub target_rows: usize,
    pub outcome: TrackerOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mix(hour: u32, hydro: f64, fossil: f64) -> MixReading {
        MixReading {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
            hydro_mw: hydro,
            wind_mw: 0.0,
            solar_mw: 0.0,
            nuclear_mw: 0.0,
            fossil_mw: fossil,
            renewable_share_pct: 0.0,
        }
    }

    #[test]
    fn mix_totals_and_share() {
        let m = mix(0, 300.0, 100.0);
        assert!((m.total_mw() - 400.0).abs() < 1e-12);
        assert!((m.derived_renewable_share_pct().unwrap() - 75.0).abs() < 1e-12);
        assert_eq!(mix(0, 0.0, 0.0).derived_renewable_share_pct(), None);

        let record = MixRecord::from(&m);
        assert!((record.total_mw - 400.0).abs() < 1e-12);
    }

    #[test]
    fn retain_latest_keeps_newest_rows_in_order() {
        let mut snapshot = DataSnapshot {
            intensity: Vec::new(),
            mix: vec![mix(3, 1.0, 0.0), mix(1, 2.0, 0.0), mix(2, 3.0, 0.0)],
            targets: Vec::new(),
        };
        snapshot.retain_latest(FetchLimits {
            intensity: 10,
            mix: 2,
            targets: 10,
        });
        let hours: Vec<f64> = snapshot.mix.iter().map(|m| m.hydro_mw).collect();
        assert_eq!(hours, vec![3.0, 1.0]);
    }

    fn target(year: i32, actual: f64) -> AnnualTarget {
        AnnualTarget {
            year,
            actual_emissions_mt: actual,
            target_emissions_mt: 25.0,
            alignment_pct: 98.0,
        }
    }

    #[test]
    fn retain_latest_keeps_first_row_per_target_year() {
        let mut snapshot = DataSnapshot {
            targets: vec![target(2026, 25.1), target(2025, 26.0), target(2026, 25.9), target(2026, 24.8)],
            ..DataSnapshot::default()
        };
        snapshot.retain_latest(FetchLimits::default());
        let kept: Vec<(i32, f64)> = snapshot.targets.iter().map(|t| (t.year, t.actual_emissions_mt)).collect();
        assert_eq!(kept, vec![(2025, 26.0), (2026, 25.1)]);
    }

    #[test]
    fn retain_latest_keeps_earliest_target_years() {
        let mut snapshot = DataSnapshot {
            targets: (2020..=2025).rev().map(|y| target(y, 30.0)).collect(),
            ..DataSnapshot::default()
        };
        snapshot.retain_latest(FetchLimits {
            intensity: 10,
            mix: 10,
            targets: 3,
        });
        let years: Vec<i32> = snapshot.targets.iter().map(|t| t.year).collect();
        assert_eq!(years, vec![2020, 2021, 2022]);
    }
}
