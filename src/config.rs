//! Environment-driven settings.
//!
//! `Settings::from_env` loads `.env` (if present) and then reads the process
//! environment. CLI flags are merged on top by the front-ends.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::domain::OutputMode;
use crate::error::AppError;

/// Hosted table names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub intensity: String,
    pub mix: String,
    pub targets: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            intensity: "co2_intensity".to_string(),
            mix: "generation_mix".to_string(),
            targets: "netzero_alignment".to_string(),
        }
    }
}

/// Simulator pacing and output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSettings {
    pub wall_interval_secs: u64,
    pub step_minutes: u32,
    pub seed: Option<u64>,
    pub output: OutputMode,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            wall_interval_secs: 5,
            step_minutes: 15,
            seed: None,
            output: OutputMode::Csv,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub tables: TableNames,
    pub csv_dir: PathBuf,
    pub sim: SimSettings,
    pub poll_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            tables: TableNames::default(),
            csv_dir: PathBuf::from("data"),
            sim: SimSettings::default(),
            poll_interval_secs: 10,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let defaults = Settings::default();

        let tables = TableNames {
            intensity: get(&["TABLE_CO2_INTENSITY"]).unwrap_or(defaults.tables.intensity),
            mix: get(&["TABLE_GENERATION_MIX"]).unwrap_or(defaults.tables.mix),
            targets: get(&["TABLE_NETZERO_ALIGNMENT"]).unwrap_or(defaults.tables.targets),
        };

        let output = match get(&["OUTPUT_MODE"]) {
            Some(raw) => OutputMode::from_str(&raw, true).map_err(|_| {
                AppError::new(2, format!("Invalid OUTPUT_MODE '{raw}' (expected csv, supabase or both)."))
            })?,
            None => defaults.sim.output,
        };

        let sim = SimSettings {
            wall_interval_secs: parse_or(
                "SIM_WALL_INTERVAL_SECONDS",
                get(&["SIM_WALL_INTERVAL_SECONDS", "WALL_INTERVAL_SECONDS"]),
                defaults.sim.wall_interval_secs,
            )?,
            step_minutes: parse_or(
                "SIM_STEP_MINUTES",
                get(&["SIM_STEP_MINUTES", "STEP_MINUTES"]),
                defaults.sim.step_minutes,
            )?,
            seed: get(&["SIM_RANDOM_SEED"])
                .map(|raw| parse_value("SIM_RANDOM_SEED", &raw))
                .transpose()?,
            output,
        };

        if sim.step_minutes == 0 {
            return Err(AppError::new(2, "SIM_STEP_MINUTES must be at least 1."));
        }

        Ok(Self {
            supabase_url: get(&["SUPABASE_URL"]).map(|u| u.trim_end_matches('/').to_string()),
            supabase_key: get(&["SUPABASE_KEY"]),
            tables,
            csv_dir: get(&["CSV_OUTPUT_DIR"]).map(PathBuf::from).unwrap_or(defaults.csv_dir),
            sim,
            poll_interval_secs: parse_or("DASH_POLL_SECONDS", get(&["DASH_POLL_SECONDS"]), defaults.poll_interval_secs)?,
        })
    }

    pub fn has_supabase_credentials(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_key.is_some()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>()
        .map_err(|_| AppError::new(2, format!("Invalid value for {key}: '{raw}'.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AppError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert_eq!(s, Settings::default());
        assert!(!s.has_supabase_credentials());
    }

    #[test]
    fn reads_overrides_and_aliases() {
        let s = settings(&[
            ("SUPABASE_URL", "https://example.supabase.co/"),
            ("SUPABASE_KEY", "anon"),
            ("TABLE_CO2_INTENSITY", "intensity_v2"),
            ("WALL_INTERVAL_SECONDS", "2"),
            ("SIM_STEP_MINUTES", "30"),
            ("STEP_MINUTES", "60"),
            ("SIM_RANDOM_SEED", "7"),
            ("OUTPUT_MODE", "Both"),
            ("CSV_OUTPUT_DIR", "/tmp/grid"),
        ])
        .unwrap();

        assert_eq!(s.supabase_url.as_deref(), Some("https://example.supabase.co"));
        assert!(s.has_supabase_credentials());
        assert_eq!(s.tables.intensity, "intensity_v2");
        assert_eq!(s.tables.mix, "generation_mix");
        assert_eq!(s.sim.wall_interval_secs, 2);
        // The prefixed name wins over the alias.
        assert_eq!(s.sim.step_minutes, 30);
        assert_eq!(s.sim.seed, Some(7));
        assert_eq!(s.sim.output, OutputMode::Both);
        assert_eq!(s.csv_dir, PathBuf::from("/tmp/grid"));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let s = settings(&[("SUPABASE_KEY", "  "), ("SIM_RANDOM_SEED", "")]).unwrap();
        assert_eq!(s.supabase_key, None);
        assert_eq!(s.sim.seed, None);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for vars in [
            [("DASH_POLL_SECONDS", "soon")],
            [("OUTPUT_MODE", "kafka")],
            [("SIM_STEP_MINUTES", "0")],
        ] {
            let err = settings(&vars).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{err}");
        }
    }
}
