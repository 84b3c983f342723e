//! Stateless numeric helpers shared by the chart, heatmap and timeline.

use chrono::{DateTime, Duration, DurationRound, NaiveDateTime, Utc};

/// Smallest and largest finite value of a series.
pub fn min_max(series: &[f64]) -> Option<(f64, f64)> {
    series
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Linear min-max ratio in `[0, 1]`. A flat range maps to the midpoint.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.5;
    }
    (value - min) / (max - min)
}

/// Pearson correlation coefficient over the common length of `a` and `b`.
///
/// r = (nΣab − ΣaΣb) / sqrt((nΣa² − (Σa)²)(nΣb² − (Σb)²))
///
/// A zero denominator (either side flat) yields 0 rather than NaN.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let n = len as f64;

    let (mut sum_a, mut sum_b, mut sum_ab, mut sum_a2, mut sum_b2) = (0.0_f64, 0.0, 0.0, 0.0, 0.0);
    for (x, y) in a[..len].iter().zip(&b[..len]) {
        sum_a += x;
        sum_b += y;
        sum_ab += x * y;
        sum_a2 += x * x;
        sum_b2 += y * y;
    }

    let var_a = n * sum_a2 - sum_a * sum_a;
    let var_b = n * sum_b2 - sum_b * sum_b;
    // Rounding leaves a residue for constant series; scale the cutoff to the magnitudes involved.
    if is_negligible(var_a, n * sum_a2) || is_negligible(var_b, n * sum_b2) {
        return 0.0;
    }

    let denominator = (var_a * var_b).sqrt();
    if !denominator.is_finite() || denominator == 0.0 {
        return 0.0;
    }

    ((n * sum_ab - sum_a * sum_b) / denominator).clamp(-1.0, 1.0)
}

fn is_negligible(variance: f64, scale: f64) -> bool {
    variance <= 1e-12 * scale.abs().max(1.0)
}

/// Floors `ts` to the start of its `minutes`-wide bucket (seconds and sub-seconds zeroed).
pub fn bucket_start(ts: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    ts.duration_trunc(Duration::minutes(minutes)).unwrap_or(ts)
}

/// Parses the backend's ISO-8601 timestamps. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
