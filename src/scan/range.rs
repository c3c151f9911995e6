//! Scan range helpers.

/// `points` values evenly spaced on a log10 scale from `start` to `end`
/// (both inclusive, both must be positive)
pub fn log_space(start: f64, end: f64, points: usize) -> Vec<f64> {
    lin_space(start.log10(), end.log10(), points)
        .into_iter()
        .map(|exponent| 10f64.powf(exponent))
        .collect()
}

/// `points` values evenly spaced from `start` to `end` (both inclusive)
pub fn lin_space(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
