//! Supabase (PostgREST) integration for the three grid tables.
//!
//! Reads go through `GET /rest/v1/<table>`; the simulator writes with `POST`.
//! Update and delete are not supported.

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::{Settings, TableNames};
use crate::domain::timestamp;
use crate::domain::{AnnualTarget, DataSnapshot, FetchLimits, IntensityReading, MixReading};
use crate::error::AppError;

const REST_PATH: &str = "rest/v1";
const TIMEOUT_SECS: u64 = 30;

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    tables: TableNames,
}

/// Conflict handling for inserts into tables with a unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnConflict<'a> {
    pub column: &'a str,
}

impl SupabaseClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let (Some(url), Some(key)) = (&settings.supabase_url, &settings.supabase_key) else {
            return Err(AppError::new(
                2,
                "Missing SUPABASE_URL / SUPABASE_KEY in environment (.env).",
            ));
        };
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: url.clone(),
            api_key: key.clone(),
            tables: settings.tables.clone(),
        })
    }

    /// Fetch the latest `limits` rows of each table, ascending.
    pub fn fetch_snapshot(&self, limits: FetchLimits) -> Result<DataSnapshot, AppError> {
        let intensity = self.fetch_intensity(limits.intensity)?;
        let mix = self.fetch_mix(limits.mix)?;
        let targets = self.fetch_targets(limits.targets)?;
        tracing::info!(
            intensity = intensity.len(),
            mix = mix.len(),
            targets = targets.len(),
            "fetched supabase snapshot"
        );
        Ok(DataSnapshot {
            intensity,
            mix,
            targets,
        })
    }

    pub fn fetch_intensity(&self, limit: usize) -> Result<Vec<IntensityReading>, AppError> {
        let rows: Vec<IntensityRow> = self.select(&self.tables.intensity, "timestamp.desc", limit)?;
        let mut out = rows
            .into_iter()
            .map(IntensityRow::into_reading)
            .collect::<Result<Vec<_>, _>>()?;
        out.reverse();
        Ok(out)
    }

    pub fn fetch_mix(&self, limit: usize) -> Result<Vec<MixReading>, AppError> {
        let rows: Vec<MixRow> = self.select(&self.tables.mix, "timestamp.desc", limit)?;
        let mut out = rows
            .into_iter()
            .map(MixRow::into_reading)
            .collect::<Result<Vec<_>, _>>()?;
        out.reverse();
        Ok(out)
    }

    pub fn fetch_targets(&self, limit: usize) -> Result<Vec<AnnualTarget>, AppError> {
        let rows: Vec<TargetRow> = self.select(&self.tables.targets, "year.asc", limit)?;
        Ok(rows.into_iter().map(TargetRow::into_target).collect())
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Insert rows as a JSON array. Empty input is a no-op.
    pub fn insert_rows<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
        conflict: Option<OnConflict<'_>>,
    ) -> Result<(), AppError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut req = self
            .authorized(self.client.post(table_endpoint(&self.base_url, table)))
            .header("Prefer", prefer_header(conflict.is_some()))
            .json(rows);
        if let Some(c) = conflict {
            req = req.query(&[("on_conflict", c.column)]);
        }

        let resp = req
            .send()
            .map_err(|e| AppError::new(4, format!("Supabase insert into {table} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AppError::new(
                4,
                format!("Supabase insert into {table} failed with status {status}: {body}"),
            ));
        }

        tracing::debug!(table, rows = rows.len(), "inserted rows");
        Ok(())
    }

    fn select<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        order: &str,
        limit: usize,
    ) -> Result<Vec<T>, AppError> {
        let resp = self
            .authorized(self.client.get(table_endpoint(&self.base_url, table)))
            .query(&select_query(order, limit))
            .send()
            .map_err(|e| AppError::new(4, format!("Supabase request for {table} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AppError::new(
                4,
                format!("Supabase request for {table} failed with status {status}: {body}"),
            ));
        }

        resp.json()
            .map_err(|e| AppError::new(4, format!("Failed to parse Supabase response for {table}: {e}")))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

fn table_endpoint(base_url: &str, table: &str) -> String {
    format!("{}/{REST_PATH}/{table}", base_url.trim_end_matches('/'))
}

fn select_query(order: &str, limit: usize) -> [(&'static str, String); 3] {
    [
        ("select", "*".to_string()),
        ("order", order.to_string()),
        ("limit", limit.to_string()),
    ]
}

fn prefer_header(ignore_duplicates: bool) -> &'static str {
    if ignore_duplicates {
        "resolution=ignore-duplicates,return=minimal"
    } else {
        "return=minimal"
    }
}

// Row shapes as returned by PostgREST. Numeric columns may come back as
// `null` for rows inserted by other tools, so the derived ones are optional.

#[derive(Debug, Deserialize)]
struct IntensityRow {
    timestamp: String,
    co2_intensity_g_per_kwh: f64,
}

impl IntensityRow {
    fn into_reading(self) -> Result<IntensityReading, AppError> {
        Ok(IntensityReading {
            timestamp: parse_row_timestamp(&self.timestamp)?,
            co2_intensity_g_per_kwh: self.co2_intensity_g_per_kwh,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MixRow {
    timestamp: String,
    hydro_mw: f64,
    wind_mw: f64,
    solar_mw: f64,
    nuclear_mw: f64,
    fossil_mw: f64,
    #[serde(default)]
    renewable_share_pct: Option<f64>,
}

impl MixRow {
    fn into_reading(self) -> Result<MixReading, AppError> {
        let mut reading = MixReading {
            timestamp: parse_row_timestamp(&self.timestamp)?,
            hydro_mw: self.hydro_mw,
            wind_mw: self.wind_mw,
            solar_mw: self.solar_mw,
            nuclear_mw: self.nuclear_mw,
            fossil_mw: self.fossil_mw,
            renewable_share_pct: 0.0,
        };
        reading.renewable_share_pct = self
            .renewable_share_pct
            .or_else(|| reading.derived_renewable_share_pct())
            .unwrap_or(0.0);
        Ok(reading)
    }
}

#[derive(Debug, Deserialize)]
struct TargetRow {
    year: i32,
    actual_emissions_mt: f64,
    target_emissions_mt: f64,
    #[serde(default)]
    alignment_pct: Option<f64>,
}

impl TargetRow {
    fn into_target(self) -> AnnualTarget {
        let alignment_pct = self.alignment_pct.unwrap_or_else(|| {
            if self.actual_emissions_mt > 0.0 {
                (100.0 * self.target_emissions_mt / self.actual_emissions_mt).round()
            } else {
                0.0
            }
        });
        AnnualTarget {
            year: self.year,
            actual_emissions_mt: self.actual_emissions_mt,
            target_emissions_mt: self.target_emissions_mt,
            alignment_pct,
        }
    }
}

fn parse_row_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, AppError> {
    timestamp::parse_timestamp(raw).map_err(|e| AppError::new(4, format!("Supabase row: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            table_endpoint("https://abc.supabase.co/", "co2_intensity"),
            "https://abc.supabase.co/rest/v1/co2_intensity"
        );
    }

    #[test]
    fn select_orders_and_limits() {
        let q = select_query("timestamp.desc", 96);
        assert_eq!(q[1], ("order", "timestamp.desc".to_string()));
        assert_eq!(q[2], ("limit", "96".to_string()));
        assert_eq!(prefer_header(true), "resolution=ignore-duplicates,return=minimal");
        assert_eq!(prefer_header(false), "return=minimal");
    }

    #[test]
    fn rows_tolerate_extra_and_null_columns() {
        let json = r#"[
            {"id": 3, "timestamp": "2025-06-01T10:00:00+00:00", "hydro_mw": 900.0, "wind_mw": 1100.0,
             "solar_mw": 0.0, "nuclear_mw": 2000.0, "fossil_mw": 1000.0, "total_mw": 5000.0,
             "renewable_share_pct": null}
        ]"#;
        let rows: Vec<MixRow> = serde_json::from_str(json).unwrap();
        let reading = rows.into_iter().next().unwrap().into_reading().unwrap();
        assert!((reading.renewable_share_pct - 40.0).abs() < 1e-9);

        let targets: Vec<TargetRow> = serde_json::from_str(
            r#"[{"year": 2025, "actual_emissions_mt": 25.5, "target_emissions_mt": 25.0}]"#,
        )
        .unwrap();
        let target = targets.into_iter().next().unwrap().into_target();
        assert_eq!(target.alignment_pct, 98.0);
    }

    #[test]
    fn bad_row_timestamp_is_a_remote_error() {
        let row = IntensityRow {
            timestamp: "yesterday".to_string(),
            co2_intensity_g_per_kwh: 200.0,
        };
        assert_eq!(row.into_reading().unwrap_err().exit_code(), 4);
    }

    #[test]
    fn client_requires_credentials() {
        let err = SupabaseClient::from_settings(&Settings::default()).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }
}
