//! Reporting utilities: dataset summaries and dashboard KPIs.
//!
//! Formatting lives in `format`; this module only computes numbers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{AnnualTarget, IntensityReading, MixReading};
use crate::math::{LinearTrend, linear_trend, mean};

pub mod format;

pub use format::*;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Descriptive statistics for the intensity series.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensitySummary {
    pub count: usize,
    pub first_at: DateTime<Utc>,
    pub last_at: DateTime<Utc>,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Least-squares slope in g/kWh per day.
    pub trend_per_day: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixSummary {
    pub count: usize,
    pub mean_total_mw: f64,
    /// Mean of per-row shares computed from MW; rows with no output are skipped.
    pub mean_renewable_share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetSummary {
    pub count: usize,
    pub first_year: i32,
    pub latest_year: i32,
    pub latest_alignment_pct: f64,
}

/// Intensity against renewable share for readings taken at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RenewablesVsIntensity {
    /// `(renewable share %, g/kWh)`, in mix timestamp order.
    pub pairs: Vec<(f64, f64)>,
    /// Least-squares fit of intensity on share; `None` when all shares coincide.
    pub trend: Option<LinearTrend>,
}

/// A KPI card: the latest value and the one before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiValue {
    pub current: f64,
    pub previous: Option<f64>,
}

impl KpiValue {
    pub fn change(&self) -> Option<f64> {
        self.previous.map(|p| self.current - p)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpis {
    pub intensity: Option<KpiValue>,
    pub renewable_share_pct: Option<KpiValue>,
    pub alignment_pct: Option<KpiValue>,
}

pub fn summarize_intensity(rows: &[IntensityReading]) -> Option<IntensitySummary> {
    let first_at = rows.iter().map(|r| r.timestamp).min()?;
    let last_at = rows.iter().map(|r| r.timestamp).max()?;
    let values = rows.iter().map(|r| r.co2_intensity_g_per_kwh);

    let xs: Vec<f64> = rows
        .iter()
        .map(|r| (r.timestamp - first_at).num_seconds() as f64 / SECONDS_PER_DAY)
        .collect();
    let ys: Vec<f64> = values.clone().collect();

    Some(IntensitySummary {
        count: rows.len(),
        first_at,
        last_at,
        min: values.clone().fold(f64::INFINITY, f64::min),
        max: values.clone().fold(f64::NEG_INFINITY, f64::max),
        mean: mean(values)?,
        trend_per_day: linear_trend(&xs, &ys).map(|t| t.slope),
    })
}

pub fn summarize_mix(rows: &[MixReading]) -> Option<MixSummary> {
    let mean_total_mw = mean(rows.iter().map(MixReading::total_mw))?;
    Some(MixSummary {
        count: rows.len(),
        mean_total_mw,
        mean_renewable_share_pct: mean(rows.iter().filter_map(MixReading::derived_renewable_share_pct)),
    })
}

pub fn summarize_targets(rows: &[AnnualTarget]) -> Option<TargetSummary> {
    let first = rows.iter().min_by_key(|t| t.year)?;
    let latest = rows.iter().max_by_key(|t| t.year)?;
    Some(TargetSummary {
        count: rows.len(),
        first_year: first.year,
        latest_year: latest.year,
        latest_alignment_pct: latest.alignment_pct,
    })
}

/// Inner-join mix and intensity on timestamp and fit intensity against share.
///
/// A timestamp present several times on both sides yields every combination.
pub fn renewables_vs_intensity(mix: &[MixReading], intensity: &[IntensityReading]) -> Option<RenewablesVsIntensity> {
    let mut by_time: HashMap<DateTime<Utc>, Vec<f64>> = HashMap::new();
    for r in intensity {
        by_time.entry(r.timestamp).or_default().push(r.co2_intensity_g_per_kwh);
    }

    let mut sorted: Vec<&MixReading> = mix.iter().collect();
    sorted.sort_by_key(|m| m.timestamp);

    let pairs: Vec<(f64, f64)> = sorted
        .iter()
        .flat_map(|m| {
            by_time
                .get(&m.timestamp)
                .into_iter()
                .flatten()
                .map(move |&v| (m.renewable_share_pct, v))
        })
        .collect();
    if pairs.is_empty() {
        return None;
    }

    let xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let trend = linear_trend(&xs, &ys);
    Some(RenewablesVsIntensity { pairs, trend })
}

/// Latest and previous values for the dashboard header.
pub fn kpis(intensity: &[IntensityReading], mix: &[MixReading], targets: &[AnnualTarget]) -> Kpis {
    let mut by_time: Vec<(DateTime<Utc>, f64)> =
        intensity.iter().map(|r| (r.timestamp, r.co2_intensity_g_per_kwh)).collect();
    by_time.sort_by(|a, b| a.0.cmp(&b.0));
    let intensity_kpi = last_two(by_time.iter().map(|(_, v)| *v));

    let mut shares: Vec<(DateTime<Utc>, f64)> = mix
        .iter()
        .map(|m| (m.timestamp, m.derived_renewable_share_pct().unwrap_or(m.renewable_share_pct)))
        .collect();
    shares.sort_by(|a, b| a.0.cmp(&b.0));
    let share_kpi = last_two(shares.iter().map(|(_, v)| *v));

    let mut by_year: Vec<&AnnualTarget> = targets.iter().collect();
    by_year.sort_by_key(|t| t.year);
    let alignment_kpi = last_two(by_year.iter().map(|t| t.alignment_pct));

    Kpis {
        intensity: intensity_kpi,
        renewable_share_pct: share_kpi,
        alignment_pct: alignment_kpi,
    }
}

fn last_two<I>(values: I) -> Option<KpiValue>
where
    I: DoubleEndedIterator<Item = f64>,
{
    let mut rev = values.rev();
    let current = rev.next()?;
    Some(KpiValue {
        current,
        previous: rev.next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn reading(hours: i64, v: f64) -> IntensityReading {
        IntensityReading {
            timestamp: t0() + Duration::hours(hours),
            co2_intensity_g_per_kwh: v,
        }
    }

    fn mix(hours: i64, renewable: f64, fossil: f64) -> MixReading {
        MixReading {
            timestamp: t0() + Duration::hours(hours),
            hydro_mw: renewable,
            wind_mw: 0.0,
            solar_mw: 0.0,
            nuclear_mw: 0.0,
            fossil_mw: fossil,
            renewable_share_pct: 0.0,
        }
    }

    #[test]
    fn intensity_summary_with_trend() {
        // Falls 12 g/kWh per 12 hours, i.e. 24 per day.
        let rows = vec![reading(24, 176.0), reading(0, 200.0), reading(12, 188.0)];
        let s = summarize_intensity(&rows).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.first_at, t0());
        assert_eq!(s.min, 176.0);
        assert_eq!(s.max, 200.0);
        assert!((s.mean - 188.0).abs() < 1e-9);
        assert!((s.trend_per_day.unwrap() + 24.0).abs() < 1e-9);

        assert_eq!(summarize_intensity(&[reading(0, 1.0)]).unwrap().trend_per_day, None);
        assert!(summarize_intensity(&[]).is_none());
    }

    #[test]
    fn mix_summary_skips_idle_rows_for_share() {
        let rows = vec![mix(0, 300.0, 700.0), mix(1, 0.0, 0.0), mix(2, 500.0, 500.0)];
        let s = summarize_mix(&rows).unwrap();
        assert!((s.mean_total_mw - 2000.0 / 3.0).abs() < 1e-9);
        assert!((s.mean_renewable_share_pct.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn renewables_vs_intensity_joins_on_timestamp() {
        let shares = [20.0, 40.0, 60.0, 80.0];
        let mixes: Vec<MixReading> = shares
            .iter()
            .enumerate()
            .map(|(i, &share)| MixReading {
                renewable_share_pct: share,
                ..mix(i as i64, share, 100.0 - share)
            })
            .collect();
        // Intensity = 400 - 3 * share; the reading at hour 9 has no mix partner.
        let mut intensity: Vec<IntensityReading> = shares
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &share)| reading(i as i64, 400.0 - 3.0 * share))
            .collect();
        intensity.push(reading(9, 999.0));

        let view = renewables_vs_intensity(&mixes, &intensity).unwrap();
        assert_eq!(view.pairs, vec![(20.0, 340.0), (40.0, 280.0), (60.0, 220.0), (80.0, 160.0)]);
        let trend = view.trend.unwrap();
        assert!((trend.slope + 3.0).abs() < 1e-9);
        assert!((trend.intercept - 400.0).abs() < 1e-9);

        assert!(renewables_vs_intensity(&mixes, &[reading(9, 1.0)]).is_none());
        let single = renewables_vs_intensity(&mixes[..1], &intensity).unwrap();
        assert_eq!(single.pairs.len(), 1);
        assert_eq!(single.trend, None);
    }

    #[test]
    fn kpis_use_latest_two_values() {
        let intensity = vec![reading(2, 180.0), reading(0, 210.0), reading(1, 200.0)];
        let mixes = vec![mix(0, 250.0, 750.0)];
        let targets = vec![
            AnnualTarget {
                year: 2025,
                actual_emissions_mt: 25.5,
                target_emissions_mt: 25.0,
                alignment_pct: 98.0,
            },
            AnnualTarget {
                year: 2024,
                actual_emissions_mt: 27.0,
                target_emissions_mt: 26.0,
                alignment_pct: 96.0,
            },
        ];

        let k = kpis(&intensity, &mixes, &targets);
        let i = k.intensity.unwrap();
        assert_eq!(i.current, 180.0);
        assert_eq!(i.change(), Some(-20.0));
        let share = k.renewable_share_pct.unwrap();
        assert_eq!(share.current, 25.0);
        assert_eq!(share.change(), None);
        assert_eq!(k.alignment_pct.unwrap().change(), Some(2.0));

        assert_eq!(kpis(&[], &[], &[]), Kpis::default());
    }
}
