//! CSV ingest for the three grid series.
//!
//! A data directory holds up to three files, as written by `goals simulate`:
//!
//! - `co2_intensity.csv` (`timestamp, co2_intensity_g_per_kwh`)
//! - `generation_mix.csv` (`timestamp, hydro_mw, wind_mw, solar_mw, nuclear_mw, fossil_mw[, total_mw, renewable_share_pct]`)
//! - `netzero_alignment.csv` (`year, actual_emissions_mt, target_emissions_mt[, alignment_pct]`)
//!
//! Behavior:
//! - **Missing file** yields an empty series (a fresh directory is not an error)
//! - **Missing required column** is an error (exit code 2)
//! - **Bad rows** are skipped and reported, never fatal
//! - Header names are case-insensitive; unknown columns (e.g. `id`) are ignored

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::timestamp::parse_timestamp;
use crate::domain::{AnnualTarget, DataSnapshot, IntensityReading, MixReading};
use crate::error::AppError;

pub const INTENSITY_FILE: &str = "co2_intensity.csv";
pub const MIX_FILE: &str = "generation_mix.csv";
pub const TARGETS_FILE: &str = "netzero_alignment.csv";

const INTENSITY_COLUMNS: [&str; 2] = ["timestamp", "co2_intensity_g_per_kwh"];
const MIX_COLUMNS: [&str; 6] = ["timestamp", "hydro_mw", "wind_mw", "solar_mw", "nuclear_mw", "fossil_mw"];
const TARGET_COLUMNS: [&str; 3] = ["year", "actual_emissions_mt", "target_emissions_mt"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub file: &'static str,
    pub line: usize,
    pub message: String,
}

/// Per-file ingest counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: &'static str,
    pub found: bool,
    pub rows_read: usize,
    pub rows_used: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
    pub row_errors: Vec<RowError>,
}

/// Ingest output: the parsed series plus what happened along the way.
#[derive(Debug, Clone)]
pub struct IngestedSnapshot {
    pub snapshot: DataSnapshot,
    pub report: IngestReport,
}

/// Load every series found in `dir`.
pub fn load_snapshot(dir: &Path) -> Result<IngestedSnapshot, AppError> {
    let mut report = IngestReport::default();

    let intensity = load_file(dir, INTENSITY_FILE, &INTENSITY_COLUMNS, parse_intensity_row, &mut report)?;
    let mix = load_file(dir, MIX_FILE, &MIX_COLUMNS, parse_mix_row, &mut report)?;
    let targets = load_file(dir, TARGETS_FILE, &TARGET_COLUMNS, parse_target_row, &mut report)?;

    if !report.row_errors.is_empty() {
        tracing::warn!(
            skipped = report.row_errors.len(),
            dir = %dir.display(),
            "skipped malformed CSV rows"
        );
    }

    Ok(IngestedSnapshot {
        snapshot: DataSnapshot {
            intensity,
            mix,
            targets,
        },
        report,
    })
}

fn load_file<T>(
    dir: &Path,
    file_name: &'static str,
    required: &[&str],
    parse: fn(&StringRecord, &HashMap<String, usize>) -> Result<T, String>,
    report: &mut IngestReport,
) -> Result<Vec<T>, AppError> {
    let path = dir.join(file_name);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "CSV file not found; using empty series");
        report.files.push(FileReport {
            file: file_name,
            found: false,
            rows_read: 0,
            rows_used: 0,
        });
        return Ok(Vec::new());
    }

    let file = File::open(&path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_table(file, file_name, required, parse, report)
}

/// Parse one table from any reader.
fn read_table<R: Read, T>(
    source: R,
    file_name: &'static str,
    required: &[&str],
    parse: fn(&StringRecord, &HashMap<String, usize>) -> Result<T, String>,
    report: &mut IngestReport,
) -> Result<Vec<T>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers of {file_name}: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in required {
        if !header_map.contains_key(*name) {
            return Err(AppError::new(
                2,
                format!("{file_name}: missing required column `{name}`"),
            ));
        }
    }

    let mut rows = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse(&record, &header_map));
        match parsed {
            Ok(row) => rows.push(row),
            Err(message) => report.row_errors.push(RowError {
                file: file_name,
                line,
                message,
            }),
        }
    }

    report.files.push(FileReport {
        file: file_name,
        found: true,
        rows_read,
        rows_used: rows.len(),
    });
    Ok(rows)
}

fn parse_intensity_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<IntensityReading, String> {
    Ok(IntensityReading {
        timestamp: parse_timestamp(get_required(record, header_map, "timestamp")?)?,
        co2_intensity_g_per_kwh: get_f64(record, header_map, "co2_intensity_g_per_kwh")?,
    })
}

fn parse_mix_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<MixReading, String> {
    let mut reading = MixReading {
        timestamp: parse_timestamp(get_required(record, header_map, "timestamp")?)?,
        hydro_mw: get_f64(record, header_map, "hydro_mw")?,
        wind_mw: get_f64(record, header_map, "wind_mw")?,
        solar_mw: get_f64(record, header_map, "solar_mw")?,
        nuclear_mw: get_f64(record, header_map, "nuclear_mw")?,
        fossil_mw: get_f64(record, header_map, "fossil_mw")?,
        renewable_share_pct: 0.0,
    };
    reading.renewable_share_pct = parse_opt_f64(get_optional(record, header_map, "renewable_share_pct"))
        .or_else(|| reading.derived_renewable_share_pct())
        .unwrap_or(0.0);
    Ok(reading)
}

fn parse_target_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<AnnualTarget, String> {
    let raw_year = get_required(record, header_map, "year")?;
    let year = raw_year
        .parse::<i32>()
        .map_err(|_| format!("Invalid `year` value '{raw_year}'."))?;
    let actual = get_f64(record, header_map, "actual_emissions_mt")?;
    let target = get_f64(record, header_map, "target_emissions_mt")?;
    let alignment_pct = parse_opt_f64(get_optional(record, header_map, "alignment_pct")).unwrap_or_else(|| {
        if actual > 0.0 {
            (100.0 * target / actual).round()
        } else {
            0.0
        }
    });
    Ok(AnnualTarget {
        year,
        actual_emissions_mt: actual,
        target_emissions_mt: target,
        alignment_pct,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn get_f64(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Result<f64, String> {
    let raw = get_required(record, header_map, name)?;
    parse_opt_f64(Some(raw)).ok_or_else(|| format!("Missing/invalid `{name}` value '{raw}'."))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
