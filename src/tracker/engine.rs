//! Indicator formulas.
//!
//! Every indicator works on sorted copies of the caller's series:
//! - intensity and mix readings ascending by timestamp
//! - annual targets ascending by year
//!
//! The functions below are independent of each other except that the pathway
//! projection reuses the (rounded) velocity.

use std::cmp::Ordering;

use crate::domain::{AnnualTarget, IntensityReading, MixReading};
use crate::math::{mean, round_half_up, round_to};
use crate::tracker::clock::EvalClock;
use crate::tracker::error::TrackerError;
use crate::tracker::indicators::{Budget, GoalTracker, Pathway, PathwayPoint, TrackerOutcome, Velocity};

/// Assumed grid intensity in the base (earliest target) year, g/kWh.
///
/// This is a modelling placeholder, not a measured value: targets are given in
/// megatonnes, and this constant converts the target ratio into an intensity.
pub const BASE_INTENSITY_G_PER_KWH: f64 = 400.0;

/// Number of most recent intensity readings used for the velocity estimate.
pub const VELOCITY_WINDOW: usize = 7;

/// Year-end intensity as a fraction of current intensity when no target exists
/// for the current year (a 10% reduction).
pub const FALLBACK_YEAR_END_FACTOR: f64 = 0.9;

const DAYS_PER_YEAR: f64 = 365.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Evaluate all indicators, folding failures into `{"error": ...}`.
///
/// This never panics and never returns `Err`; use [`try_compute_indicators`]
/// to get the typed error.
pub fn compute_indicators(
    intensity: &[IntensityReading],
    mix: &[MixReading],
    targets: &[AnnualTarget],
    clock: &EvalClock,
) -> TrackerOutcome {
    match try_compute_indicators(intensity, mix, targets, clock) {
        Ok(tracker) => TrackerOutcome::Indicators(tracker),
        Err(err) => {
            tracing::warn!(error = %err, "goal tracker evaluation failed");
            TrackerOutcome::Failed {
                error: err.to_string(),
            }
        }
    }
}

/// Evaluate all indicators.
pub fn try_compute_indicators(
    intensity: &[IntensityReading],
    mix: &[MixReading],
    targets: &[AnnualTarget],
    clock: &EvalClock,
) -> Result<GoalTracker, TrackerError> {
    if intensity.is_empty() || mix.is_empty() {
        return Err(TrackerError::InsufficientData);
    }

    let intensity = sorted_intensity(intensity);
    let mix = sorted_mix(mix);
    let targets = sorted_targets(targets);

    let Some(latest) = intensity.last() else {
        return Err(TrackerError::InsufficientData);
    };
    let current_intensity = latest.co2_intensity_g_per_kwh;
    let current_year = clock.current_year();
    let days_elapsed = clock.days_elapsed();

    tracing::debug!(
        intensity_rows = intensity.len(),
        mix_rows = mix.len(),
        target_rows = targets.len(),
        latest_intensity = current_intensity,
        latest_at = %latest.timestamp,
        current_year,
        days_elapsed,
        "goal tracker inputs"
    );

    let target_now = targets.iter().find(|t| t.year == current_year);
    let target_base = targets.first();

    let alignment_index_pct = alignment_index(current_intensity, target_now, target_base)?;

    let budget = match target_now {
        Some(target) => Some(carbon_budget(&intensity, &mix, target, days_elapsed)?),
        None => None,
    };

    let velocity = decarbonization_velocity(&intensity, target_now, days_elapsed)?;

    let pathway = pathway_projection(current_intensity, velocity.as_ref(), &targets, current_year)?;

    Ok(GoalTracker {
        alignment_index_pct,
        budget,
        velocity,
        pathway,
    })
}

/// Real-time alignment index: this year's implied target intensity relative to
/// the current intensity, as a percentage capped at 100.
pub fn alignment_index(
    current_intensity: f64,
    target_now: Option<&AnnualTarget>,
    target_base: Option<&AnnualTarget>,
) -> Result<Option<f64>, TrackerError> {
    let (Some(now), Some(base)) = (target_now, target_base) else {
        return Ok(None);
    };
    if current_intensity == 0.0 || base.target_emissions_mt == 0.0 {
        return Ok(None);
    }

    let target_intensity =
        BASE_INTENSITY_G_PER_KWH * (now.target_emissions_mt / base.target_emissions_mt);
    let ratio_pct = 100.0 * target_intensity / current_intensity;
    ensure_finite("alignmentIndexPct", ratio_pct)?;

    Ok(Some(ratio_pct.min(100.0)))
}

/// Pro-rata annual allowance for the elapsed part of the year, in tons.
pub fn ytd_budget_tons(target_emissions_mt: f64, days_elapsed: i64) -> f64 {
    let annual_target_tons = target_emissions_mt * 1000.0;
    annual_target_tons * (days_elapsed as f64 / DAYS_PER_YEAR)
}

/// Year-to-date emissions estimate in tons.
///
/// MW × h × g/kWh gives kg; the final `/ 1000` gives tons.
pub fn ytd_emissions_tons(avg_generation_mw: f64, avg_intensity: f64, days_elapsed: i64) -> f64 {
    let hours_elapsed = days_elapsed as f64 * 24.0;
    avg_generation_mw * hours_elapsed * avg_intensity / 1000.0
}

/// Year-to-date carbon budget against the current year's target.
pub fn carbon_budget(
    intensity: &[IntensityReading],
    mix: &[MixReading],
    target_now: &AnnualTarget,
    days_elapsed: i64,
) -> Result<Budget, TrackerError> {
    let budget_tons = ytd_budget_tons(target_now.target_emissions_mt, days_elapsed);

    let avg_intensity = mean(intensity.iter().map(|r| r.co2_intensity_g_per_kwh))
        .ok_or(TrackerError::InsufficientData)?;
    let avg_generation_mw =
        mean(mix.iter().map(MixReading::total_mw)).ok_or(TrackerError::InsufficientData)?;
    let ytd_tons = ytd_emissions_tons(avg_generation_mw, avg_intensity, days_elapsed);

    // Jan 1 and zero generation leave no daily rate to pace against.
    let days_ahead = if days_elapsed == 0 || ytd_tons == 0.0 {
        0.0
    } else {
        let daily_tons = ytd_tons / days_elapsed as f64;
        (budget_tons - ytd_tons) / daily_tons
    };

    ensure_finite("budget.ytdTons", ytd_tons)?;
    ensure_finite("budget.ytdBudgetTons", budget_tons)?;
    ensure_finite("budget.daysAhead", days_ahead)?;

    Ok(Budget {
        ytd_tons: round_half_up(ytd_tons) as i64,
        ytd_budget_tons: round_half_up(budget_tons) as i64,
        days_ahead: round_half_up(days_ahead) as i64,
    })
}

/// Annualized intensity change over the last [`VELOCITY_WINDOW`] readings,
/// compared with the rate needed to reach the year-end target.
///
/// `intensity` must be sorted ascending by timestamp.
pub fn decarbonization_velocity(
    intensity: &[IntensityReading],
    target_now: Option<&AnnualTarget>,
    days_elapsed: i64,
) -> Result<Option<Velocity>, TrackerError> {
    if intensity.len() < VELOCITY_WINDOW {
        return Ok(None);
    }
    let window = &intensity[intensity.len() - VELOCITY_WINDOW..];
    let first = &window[0];
    let last = &window[VELOCITY_WINDOW - 1];

    let span_days = (last.timestamp - first.timestamp).num_milliseconds() as f64 / MILLIS_PER_DAY;
    if span_days <= 0.0 {
        return Ok(None);
    }

    let change = last.co2_intensity_g_per_kwh - first.co2_intensity_g_per_kwh;
    let actual = (change / span_days) * DAYS_PER_YEAR;

    let current = last.co2_intensity_g_per_kwh;
    let year_end_target = match target_now {
        Some(t) if t.actual_emissions_mt != 0.0 => {
            (t.target_emissions_mt / t.actual_emissions_mt) * current
        }
        _ => current * FALLBACK_YEAR_END_FACTOR,
    };

    // Dec 31 of a leap year has no days left; pace against a single day.
    let days_left = (DAYS_PER_YEAR as i64 - days_elapsed).max(1) as f64;
    let required = (current - year_end_target) * DAYS_PER_YEAR / days_left;

    ensure_finite("velocity.actualRate", actual)?;
    ensure_finite("velocity.requiredRate", required)?;

    Ok(Some(Velocity {
        // Falling intensity is negative, so a lower (more negative) rate is better.
        on_track: actual <= required,
        actual_rate: round_to(actual, 2),
        required_rate: round_to(required, 2),
    }))
}

/// Year at which intensity would reach zero if the current decline held.
///
/// `targets` must be sorted ascending by year.
pub fn pathway_projection(
    current_intensity: f64,
    velocity: Option<&Velocity>,
    targets: &[AnnualTarget],
    current_year: i32,
) -> Result<Option<Pathway>, TrackerError> {
    if targets.is_empty() {
        return Ok(None);
    }
    let Some(velocity) = velocity else {
        return Ok(None);
    };
    // Already at zero: there is nothing left to project.
    if velocity.actual_rate >= 0.0 || current_intensity == 0.0 {
        return Ok(None);
    }

    let years_to_zero = (current_intensity / velocity.actual_rate).abs();
    let eta = f64::from(current_year) + years_to_zero;
    ensure_finite("pathway.etaYear", eta)?;

    Ok(Some(Pathway {
        eta_year: round_half_up(eta) as i32,
        series: targets.iter().map(PathwayPoint::from).collect(),
    }))
}

fn ensure_finite(metric: &'static str, value: f64) -> Result<(), TrackerError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TrackerError::NonFinite(metric))
    }
}

// Ties on timestamp are broken by value so the result does not depend on
// input order.
fn sorted_intensity(rows: &[IntensityReading]) -> Vec<IntensityReading> {
    let mut out = rows.to_vec();
    out.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.co2_intensity_g_per_kwh.total_cmp(&b.co2_intensity_g_per_kwh))
    });
    out
}

fn sorted_mix(rows: &[MixReading]) -> Vec<MixReading> {
    let mut out = rows.to_vec();
    out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| mix_tiebreak(a, b)));
    out
}

fn mix_tiebreak(a: &MixReading, b: &MixReading) -> Ordering {
    let key = |m: &MixReading| [m.hydro_mw, m.wind_mw, m.solar_mw, m.nuclear_mw, m.fossil_mw];
    key(a)
        .iter()
        .zip(key(b).iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn sorted_targets(rows: &[AnnualTarget]) -> Vec<AnnualTarget> {
    let mut out = rows.to_vec();
    out.sort_by_key(|t| t.year);
    out
}
