use std::time::Duration;

/// Descriptive latency statistics. Units follow the input until `to_millis` is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p95: f64,
}

impl LatencySummary {
    /// Summary in seconds. An empty set yields all zeros.
    pub fn from_durations(durations: &[Duration]) -> Self {
        let mut secs: Vec<f64> = durations.iter().map(Duration::as_secs_f64).collect();
        if secs.is_empty() {
            return Self::default();
        }
        secs.sort_by(f64::total_cmp);

        let len = secs.len();
        let mean = secs.iter().sum::<f64>() / len as f64;
        // 95th percentile is cut point 19 of 20
        let p95 = if len > 1 {
            quantiles(&secs, 20)[18]
        } else {
            secs[0]
        };

        Self {
            mean,
            min: secs[0],
            max: secs[len - 1],
            median: median(&secs),
            p95,
        }
    }

    pub fn to_millis(self) -> Self {
        Self {
            mean: self.mean * 1000.0,
            min: self.min * 1000.0,
            max: self.max * 1000.0,
            median: self.median * 1000.0,
            p95: self.p95 * 1000.0,
        }
    }
}

/// Median of sorted data; mean of the two middle values for even lengths.
pub fn median(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 1 {
        sorted[len / 2]
    } else {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    }
}

/// `n - 1` cut points dividing sorted data into `n` intervals, using the
/// exclusive method: positions scale with `len + 1` and indices are clamped,
/// so small samples extrapolate past the extremes.
pub fn quantiles(sorted: &[f64], n: usize) -> Vec<f64> {
    let len = sorted.len();
    if n < 2 || len == 0 {
        return Vec::new();
    }
    if len == 1 {
        return vec![sorted[0]; n - 1];
    }

    let n = n as i64;
    let m = len as i64 + 1;
    (1..n)
        .map(|i| {
            let j = (i * m / n).clamp(1, len as i64 - 1);
            let delta = i * m - j * n;
            (sorted[(j - 1) as usize] * (n - delta) as f64 + sorted[j as usize] * delta as f64)
                / n as f64
        })
        .collect()
}
