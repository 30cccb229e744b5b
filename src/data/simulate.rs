//! Synthetic grid readings.
//!
//! Produces one intensity reading, one generation-mix reading and one yearly
//! target per simulated step. The noise is deliberately large so a live
//! dashboard visibly moves between steps.

use chrono::{DateTime, Datelike, Duration, DurationRound, Timelike, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::domain::{AnnualTarget, IntensityReading, MixReading};
use crate::error::AppError;
use crate::math::{round_half_up, round_to};

/// Nominal system output before the demand profile is applied (MW).
pub const BASE_TOTAL_MW: f64 = 7000.0;

const BASE_HYDRO_MW: f64 = 950.0;
const BASE_WIND_MW: f64 = 1800.0;
const BASE_SOLAR_DAY_MW: f64 = 150.0;
const BASE_SOLAR_NIGHT_MW: f64 = 10.0;
const BASE_NUCLEAR_MW: f64 = 2700.0;
const FOSSIL_FLOOR_MW: f64 = 1200.0;
const FOSSIL_LOAD_MW: f64 = 1600.0;

const OUTAGE_PROBABILITY: f64 = 0.15;
const OUTAGE_FACTOR: f64 = 0.3;
const PRICE_SHOCK_PROBABILITY: f64 = 0.10;
const PRICE_SHOCK_FACTOR: f64 = 0.4;

/// Intensity at ≥80% renewables (low) and ≤10% renewables (high), g/kWh.
const INTENSITY_RANGE: (f64, f64) = (100.0, 300.0);
const INTENSITY_CLAMP: (f64, f64) = (50.0, 400.0);

/// One simulated step.
#[derive(Debug, Clone, PartialEq)]
pub struct SimStep {
    pub intensity: IntensityReading,
    pub mix: MixReading,
    pub target: AnnualTarget,
}

pub struct Simulator {
    rng: StdRng,
}

impl Simulator {
    /// Seeded for reproducible runs, entropy-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn step(&mut self, ts: DateTime<Utc>) -> SimStep {
        let mix = self.simulate_mix(ts);
        let intensity = self.simulate_intensity(ts, &mix);
        let target = self.simulate_target(ts.year());
        SimStep {
            intensity,
            mix,
            target,
        }
    }

    pub fn simulate_mix(&mut self, ts: DateTime<Utc>) -> MixReading {
        let load = diurnal_profile(ts.hour(), 0.85, 1.15);

        let wind_f = self.bounded_normal(1.0, 0.8, 0.1, 3.0);
        let solar_f = self.bounded_normal(1.0, 1.0, 0.05, 4.0);
        let hydro_f = self.bounded_normal(1.0, 0.3, 0.3, 2.0);
        let outage = self.chance_factor(OUTAGE_PROBABILITY, OUTAGE_FACTOR);
        let price_shock = self.chance_factor(PRICE_SHOCK_PROBABILITY, PRICE_SHOCK_FACTOR);

        let solar_base = if (8..=18).contains(&ts.hour()) {
            BASE_SOLAR_DAY_MW
        } else {
            BASE_SOLAR_NIGHT_MW
        };

        let hydro = (BASE_HYDRO_MW * self.bounded_normal(1.0, 0.8, 0.1, 4.0) * hydro_f).max(0.0);
        let wind = (BASE_WIND_MW * self.bounded_normal(1.0, 1.2, 0.05, 5.0) * wind_f).max(0.0);
        let solar = (solar_base * self.bounded_normal(1.0, 1.5, 0.02, 6.0) * solar_f).max(0.0);
        let nuclear = (BASE_NUCLEAR_MW * self.bounded_normal(1.0, 0.5, 0.3, 3.0) * outage).max(0.0);
        let fossil = (FOSSIL_FLOOR_MW.max(FOSSIL_LOAD_MW * load)
            * self.bounded_normal(1.0, 0.8, 0.2, 4.0)
            * price_shock)
            .max(0.0);

        let raw_total = hydro + wind + solar + nuclear + fossil;
        let scale = if raw_total > 0.0 {
            BASE_TOTAL_MW * load / raw_total
        } else {
            1.0
        };

        let mut reading = MixReading {
            timestamp: ts,
            hydro_mw: round_to(hydro * scale, 1),
            wind_mw: round_to(wind * scale, 1),
            solar_mw: round_to(solar * scale, 1),
            nuclear_mw: round_to(nuclear * scale, 1),
            fossil_mw: round_to(fossil * scale, 1),
            renewable_share_pct: 0.0,
        };
        reading.renewable_share_pct = round_to(reading.derived_renewable_share_pct().unwrap_or(0.0), 1);
        reading
    }

    pub fn simulate_intensity(&mut self, ts: DateTime<Utc>, mix: &MixReading) -> IntensityReading {
        let (low, high) = INTENSITY_RANGE;
        let norm = ((80.0 - mix.renewable_share_pct) / 70.0).clamp(0.0, 1.0);
        let base = self.bounded_normal(low + norm * (high - low), 50.0, low, high);
        let variation = self.bounded_normal(1.0, 0.3, 0.5, 2.0);
        let value = (base * variation).clamp(INTENSITY_CLAMP.0, INTENSITY_CLAMP.1);
        IntensityReading {
            timestamp: ts,
            co2_intensity_g_per_kwh: round_to(value, 1),
        }
    }

    pub fn simulate_target(&mut self, year: i32) -> AnnualTarget {
        let target = target_emissions_mt(year);
        let actual = self.bounded_normal(target * 1.02, 1.0, target * 0.8, target * 1.2);
        let alignment = if actual > 0.0 {
            round_half_up(100.0 * target / actual)
        } else {
            0.0
        };
        AnnualTarget {
            year,
            actual_emissions_mt: round_to(actual, 1),
            target_emissions_mt: target,
            alignment_pct: alignment,
        }
    }

    /// A normal draw clamped to `[lo, hi]`.
    pub fn bounded_normal(&mut self, base: f64, sd: f64, lo: f64, hi: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        (base + sd * z).clamp(lo, hi)
    }

    fn chance_factor(&mut self, probability: f64, factor: f64) -> f64 {
        if self.rng.r#gen::<f64>() < probability { factor } else { 1.0 }
    }
}

/// Demand factor for an hour of day: peak at 19:00, trough at 07:00.
pub fn diurnal_profile(hour: u32, min_factor: f64, max_factor: f64) -> f64 {
    let phase = (i64::from(hour) - 19).rem_euclid(24) as f64;
    let cos_val = ((phase / 24.0 * std::f64::consts::TAU).cos() + 1.0) / 2.0;
    min_factor + (max_factor - min_factor) * cos_val
}

/// Yearly emissions target (Mt): 30 in 2020, one less per year, floor of 10.
pub fn target_emissions_mt(year: i32) -> f64 {
    f64::from((30 - (year - 2020)).max(10))
}

/// Round `now` down to the start of its `step_minutes` slot.
pub fn anchor_time(now: DateTime<Utc>, step_minutes: u32) -> Result<DateTime<Utc>, AppError> {
    if step_minutes == 0 {
        return Err(AppError::new(2, "Step minutes must be > 0."));
    }
    now.duration_trunc(Duration::minutes(i64::from(step_minutes)))
        .map_err(|e| AppError::new(2, format!("Cannot align {now} to a {step_minutes}-minute step: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn diurnal_peaks_in_the_evening() {
        assert!((diurnal_profile(19, 0.85, 1.15) - 1.15).abs() < 1e-12);
        assert!((diurnal_profile(7, 0.85, 1.15) - 0.85).abs() < 1e-12);
        for h in 0..24 {
            let f = diurnal_profile(h, 0.85, 1.15);
            assert!(f > 0.85 - 1e-12 && f < 1.15 + 1e-12, "hour {h}: {f}");
        }
    }

    #[test]
    fn targets_follow_the_schedule() {
        assert_eq!(target_emissions_mt(2020), 30.0);
        assert_eq!(target_emissions_mt(2025), 25.0);
        assert_eq!(target_emissions_mt(2030), 20.0);
        assert_eq!(target_emissions_mt(2045), 10.0);
        assert_eq!(target_emissions_mt(2060), 10.0);
    }

    #[test]
    fn same_seed_same_readings() {
        let mut a = Simulator::new(Some(42));
        let mut b = Simulator::new(Some(42));
        for h in [0, 6, 12, 18] {
            assert_eq!(a.step(ts(h)), b.step(ts(h)));
        }
    }

    #[test]
    fn readings_stay_in_range() {
        let mut sim = Simulator::new(Some(7));
        for i in 0..200 {
            let step = sim.step(ts(i % 24));
            let total = step.mix.total_mw();
            let load = diurnal_profile(i % 24, 0.85, 1.15);
            assert!((total - BASE_TOTAL_MW * load).abs() < 1.0, "total {total}");
            assert!((0.0..=100.0).contains(&step.mix.renewable_share_pct));
            assert!((50.0..=400.0).contains(&step.intensity.co2_intensity_g_per_kwh));

            let t = step.target;
            assert_eq!(t.year, 2025);
            assert!(t.actual_emissions_mt >= 19.9 && t.actual_emissions_mt <= 30.1);
            assert!((83.0..=126.0).contains(&t.alignment_pct));
        }
    }

    #[test]
    fn anchor_rounds_down_to_step() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 44, 59).unwrap();
        assert_eq!(anchor_time(now, 15).unwrap(), Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 0).unwrap());
        assert!(anchor_time(now, 0).is_err());
    }
}
