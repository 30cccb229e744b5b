//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the tracker and summary code stays free of presentation concerns
//! - output changes are localized (tests below pin the exact text)

use crate::domain::{TrackerFile, timestamp::format_timestamp};
use crate::io::ingest::IngestReport;
use crate::report::{IntensitySummary, KpiValue, Kpis, MixSummary, RenewablesVsIntensity, TargetSummary};
use crate::tracker::engine::VELOCITY_WINDOW;
use crate::tracker::{GoalTracker, TrackerOutcome};

/// Header block plus indicators for a `goals track` / `goals show` run.
pub fn format_track_report(file: &TrackerFile) -> String {
    let mut out = String::new();
    out.push_str("=== goals - Net-Zero Goal Tracker ===\n");
    out.push_str(&format!("Source: {}\n", file.source.display_name()));
    out.push_str(&format!("Evaluated at: {}\n", format_timestamp(&file.evaluated_at)));
    out.push_str(&format!(
        "Rows: intensity={} | mix={} | targets={}\n\n",
        file.intensity_rows, file.mix_rows, file.target_rows
    ));
    out.push_str(&format_goal_tracker(&file.outcome));
    out
}

/// The four indicators, one block each. Omitted indicators print `n/a` with a hint.
pub fn format_goal_tracker(outcome: &TrackerOutcome) -> String {
    let tracker: &GoalTracker = match outcome {
        TrackerOutcome::Failed { error } => return format!("Goal tracker: error: {error}\n"),
        TrackerOutcome::Indicators(t) => t,
    };

    let mut out = String::new();

    out.push_str("Alignment index (RAI):\n");
    match tracker.alignment_index_pct {
        Some(v) => out.push_str(&format!("- {v:.1}% of current-year target pace\n")),
        None => out.push_str("- n/a (needs a current-year target and a non-zero base target)\n"),
    }

    out.push_str("\nCarbon budget (year to date):\n");
    match &tracker.budget {
        Some(b) => {
            out.push_str(&format!("- emitted : {} t\n", group_thousands(b.ytd_tons)));
            out.push_str(&format!("- budget  : {} t\n", group_thousands(b.ytd_budget_tons)));
            let status = if b.days_ahead >= 0 { "ahead" } else { "behind" };
            out.push_str(&format!("- pace    : {} days {status}\n", b.days_ahead.abs()));
        }
        None => out.push_str("- n/a (no target for the current year)\n"),
    }

    out.push_str("\nDecarbonization velocity (g/kWh per year):\n");
    match &tracker.velocity {
        Some(v) => {
            out.push_str(&format!("- actual  : {:+.2}\n", v.actual_rate));
            out.push_str(&format!("- required: {:+.2}\n", v.required_rate));
            out.push_str(&format!(
                "- status  : {}\n",
                if v.on_track { "on track" } else { "off track" }
            ));
        }
        None => out.push_str(&format!(
            "- n/a (needs {VELOCITY_WINDOW} intensity readings spanning some time)\n"
        )),
    }

    out.push_str("\nPathway projection:\n");
    match &tracker.pathway {
        Some(p) => {
            out.push_str(&format!("- near-zero intensity by {}\n", p.eta_year));
            let targets: Vec<String> = p
                .series
                .iter()
                .map(|pt| format!("{}={:.1}", pt.year, pt.target_emissions_mt))
                .collect();
            out.push_str(&format!("- targets (Mt): {}\n", targets.join(", ")));
        }
        None => out.push_str("- n/a (needs falling intensity and at least one target)\n"),
    }

    out
}

/// Dataset summaries for `goals summary`.
pub fn format_summary(
    intensity: Option<&IntensitySummary>,
    mix: Option<&MixSummary>,
    targets: Option<&TargetSummary>,
) -> String {
    let mut out = String::new();

    out.push_str("Carbon intensity:\n");
    match intensity {
        Some(s) => {
            out.push_str(&format!(
                "- n={} | {} .. {}\n",
                s.count,
                format_timestamp(&s.first_at),
                format_timestamp(&s.last_at)
            ));
            out.push_str(&format!(
                "- min={:.1} max={:.1} mean={:.1} g/kWh\n",
                s.min, s.max, s.mean
            ));
            match s.trend_per_day {
                Some(slope) => out.push_str(&format!("- trend={slope:+.2} g/kWh per day\n")),
                None => out.push_str("- trend=n/a\n"),
            }
        }
        None => out.push_str("- no readings\n"),
    }

    out.push_str("\nGeneration mix:\n");
    match mix {
        Some(s) => {
            out.push_str(&format!("- n={} | mean total={:.1} MW\n", s.count, s.mean_total_mw));
            match s.mean_renewable_share_pct {
                Some(share) => out.push_str(&format!("- mean renewable share={share:.1}%\n")),
                None => out.push_str("- mean renewable share=n/a\n"),
            }
        }
        None => out.push_str("- no readings\n"),
    }

    out.push_str("\nNet-zero targets:\n");
    match targets {
        Some(s) => out.push_str(&format!(
            "- n={} | years {}..{} | latest alignment={:.0}%\n",
            s.count, s.first_year, s.latest_year, s.latest_alignment_pct
        )),
        None => out.push_str("- no targets\n"),
    }

    out
}

pub fn format_renewables_vs_intensity(view: Option<&RenewablesVsIntensity>) -> String {
    let mut out = String::from("Renewables vs CO2 intensity:\n");
    let Some(view) = view else {
        out.push_str("- no readings share a timestamp\n");
        return out;
    };
    out.push_str(&format!("- matched readings={}\n", view.pairs.len()));
    match view.trend {
        Some(t) => {
            out.push_str(&format!(
                "- intensity = {:.1} {:+.2} x share (g/kWh per %-point)\n",
                t.intercept, t.slope
            ));
            let reading = if t.slope < 0.0 {
                "more renewables, lower intensity"
            } else {
                "no decarbonization signal"
            };
            out.push_str(&format!("- {reading}\n"));
        }
        None => out.push_str("- trend=n/a (needs two distinct shares)\n"),
    }
    out
}

/// KPI cards as a single block.
pub fn format_kpis(kpis: &Kpis) -> String {
    let mut out = String::new();
    out.push_str(&format!("CO2 intensity   : {}\n", fmt_kpi(kpis.intensity, "g/kWh", 1)));
    out.push_str(&format!("Renewable share : {}\n", fmt_kpi(kpis.renewable_share_pct, "%", 1)));
    out.push_str(&format!("Alignment       : {}\n", fmt_kpi(kpis.alignment_pct, "%", 0)));
    out
}

/// Ingest counts and the first few skipped rows.
pub fn format_ingest_report(report: &IngestReport, max_errors: usize) -> String {
    let mut out = String::new();
    for f in &report.files {
        if f.found {
            out.push_str(&format!("{}: read={} used={}\n", f.file, f.rows_read, f.rows_used));
        } else {
            out.push_str(&format!("{}: not found\n", f.file));
        }
    }
    for e in report.row_errors.iter().take(max_errors) {
        out.push_str(&format!("  skipped {}:{}: {}\n", e.file, e.line, e.message));
    }
    if report.row_errors.len() > max_errors {
        out.push_str(&format!(
            "  ... and {} more skipped rows\n",
            report.row_errors.len() - max_errors
        ));
    }
    out
}

pub fn fmt_kpi(kpi: Option<KpiValue>, unit: &str, decimals: usize) -> String {
    let Some(kpi) = kpi else {
        return "n/a".to_string();
    };
    let mut s = format!("{:.*} {unit}", decimals, kpi.current);
    if let Some(change) = kpi.change() {
        s.push_str(&format!(" ({:+.*})", decimals, change));
    }
    s
}

fn group_thousands(v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if v < 0 { format!("-{out}") } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Budget, Pathway, PathwayPoint, Velocity};

    #[test]
    fn goal_tracker_golden() {
        let outcome = TrackerOutcome::Indicators(GoalTracker {
            alignment_index_pct: Some(98.765),
            budget: Some(Budget {
                ytd_tons: 21_840,
                ytd_budget_tons: 49_863,
                days_ahead: -12,
            }),
            velocity: Some(Velocity {
                on_track: true,
                actual_rate: -1216.67,
                required_rate: 89.75,
            }),
            pathway: Some(Pathway {
                eta_year: 2025,
                series: vec![
                    PathwayPoint {
                        year: 2020,
                        target_emissions_mt: 30.0,
                    },
                    PathwayPoint {
                        year: 2025,
                        target_emissions_mt: 25.0,
                    },
                ],
            }),
        });

        let expected = "\
Alignment index (RAI):
- 98.8% of current-year target pace

Carbon budget (year to date):
- emitted : 21,840 t
- budget  : 49,863 t
- pace    : 12 days behind

Decarbonization velocity (g/kWh per year):
- actual  : -1216.67
- required: +89.75
- status  : on track

Pathway projection:
- near-zero intensity by 2025
- targets (Mt): 2020=30.0, 2025=25.0
";
        assert_eq!(format_goal_tracker(&outcome), expected);
    }

    #[test]
    fn omitted_indicators_print_reasons() {
        let text = format_goal_tracker(&TrackerOutcome::Indicators(GoalTracker::default()));
        assert_eq!(text.matches("n/a (").count(), 4);
        assert!(text.contains("needs 7 intensity readings"));

        let failed = TrackerOutcome::Failed {
            error: "insufficient data".to_string(),
        };
        assert_eq!(format_goal_tracker(&failed), "Goal tracker: error: insufficient data\n");
    }

    #[test]
    fn renewables_view_golden() {
        let view = RenewablesVsIntensity {
            pairs: vec![(20.0, 340.0), (80.0, 160.0)],
            trend: Some(crate::math::LinearTrend {
                intercept: 400.0,
                slope: -3.0,
            }),
        };
        let expected = "\
Renewables vs CO2 intensity:
- matched readings=2
- intensity = 400.0 -3.00 x share (g/kWh per %-point)
- more renewables, lower intensity
";
        assert_eq!(format_renewables_vs_intensity(Some(&view)), expected);
        assert!(format_renewables_vs_intensity(None).contains("no readings share a timestamp"));
    }

    #[test]
    fn kpi_and_number_helpers() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-4_000), "-4,000");

        let kpi = KpiValue {
            current: 182.3,
            previous: Some(190.0),
        };
        assert_eq!(fmt_kpi(Some(kpi), "g/kWh", 1), "182.3 g/kWh (-7.7)");
        assert_eq!(fmt_kpi(None, "%", 0), "n/a");
    }
}
