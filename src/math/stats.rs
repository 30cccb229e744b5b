//! Small numeric helpers shared by the tracker and the reports.

/// Arithmetic mean; `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0_f64, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Round to the nearest integer, ties toward +∞.
///
/// This is the display rounding used by the dashboard (`-2.5 → -2`), which
/// differs from `f64::round` on negative ties.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Round to `decimals` places with [`round_half_up`] semantics.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    round_half_up(x * scale) / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_basic() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert!((mean([1.0, 2.0, 6.0]).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn half_up_on_ties() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_to(-1216.666_666, 2), -1216.67);
        assert_eq!(round_to(0.125, 2), 0.13);
    }
}
