//! Fixed-grid ASCII line plots for terminal output.
//!
//! Output is deterministic so it can be pinned in golden tests. Readings are
//! drawn as `o`, joined by `-`.

use crate::domain::IntensityReading;
use crate::tracker::PathwayPoint;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Render `(x, y)` points as a line plot with a one-line range header.
pub fn render_ascii_series(series: &[(f64, f64)], width: usize, height: usize, x_label: &str, y_unit: &str) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let finite: Vec<(f64, f64)> = series
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    let (x_min, x_max) = range(finite.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(finite.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so points overlay it.
    let mut prev = None;
    for &(x, y) in &finite {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(&mut grid, c0, r0, col, row, '-');
        }
        prev = Some((col, row));
    }
    for &(x, y) in &finite {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {x_label}=[{x_min:.2}, {x_max:.2}] | y=[{y_min:.2}, {y_max:.2}] {y_unit}\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

/// Intensity readings as `(days since first reading, g/kWh)`, in time order.
pub fn intensity_points(rows: &[IntensityReading]) -> Vec<(f64, f64)> {
    let mut sorted: Vec<&IntensityReading> = rows.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);
    let Some(first) = sorted.first().map(|r| r.timestamp) else {
        return Vec::new();
    };
    sorted
        .iter()
        .map(|r| {
            let days = (r.timestamp - first).num_seconds() as f64 / SECONDS_PER_DAY;
            (days, r.co2_intensity_g_per_kwh)
        })
        .collect()
}

/// Pathway targets as `(year, Mt)`.
pub fn target_points(series: &[PathwayPoint]) -> Vec<(f64, f64)> {
    series
        .iter()
        .map(|p| (f64::from(p.year), p.target_emissions_mt))
        .collect()
}

fn range<I: Iterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        // Flat series: centre it.
        Some((min - 0.5, max + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Top row is the maximum.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn plot_golden_snapshot_small() {
        let series = [(0.0, 300.0), (1.0, 250.0), (2.0, 200.0)];
        let plot = render_ascii_series(&series, 10, 5, "day", "g/kWh");
        let expected = "\
Plot: day=[0.00, 2.00] | y=[195.00, 305.00] g/kWh
o-
  --
    -o
      --
        -o
";
        assert_eq!(plot, expected);
    }

    #[test]
    fn empty_and_flat_series_do_not_panic() {
        let empty = render_ascii_series(&[], 10, 5, "day", "g/kWh");
        assert_eq!(empty.lines().count(), 6);

        let flat = render_ascii_series(&[(0.0, 5.0), (1.0, 5.0)], 12, 5, "year", "Mt");
        assert!(flat.lines().nth(3).unwrap().starts_with("o"));
    }

    #[test]
    fn intensity_points_are_days_since_first() {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let rows = vec![
            IntensityReading {
                timestamp: t0 + Duration::hours(36),
                co2_intensity_g_per_kwh: 180.0,
            },
            IntensityReading {
                timestamp: t0,
                co2_intensity_g_per_kwh: 200.0,
            },
        ];
        assert_eq!(intensity_points(&rows), vec![(0.0, 200.0), (1.5, 180.0)]);
    }
}
