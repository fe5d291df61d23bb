//! # Transport Downsampling Module
//!
//! Reduces an ordered recording to a bounded number of rows for plotting
//! on the client. Statistics and cycle detection always run on the full
//! series; only the copy returned for display is reduced.
//!
//! ## Key Functions
//! - `lttb_indices`: Largest-Triangle-Three-Buckets point selection
//! - `transport_rows`: Full pipeline from samples to capped rows
//!
//! LTTB keeps the point in each bucket spanning the largest triangle with
//! its neighbours, so the short rise and descent spikes survive.

use crate::sample::SensorSample;

/// Method label reported when rows were reduced
pub const LTTB_METHOD: &str = "LTTB";
/// Method label reported when every row was kept
pub const NO_METHOD: &str = "none";

/// One transport row: `[t_ms, ax, ay, az, gx, gy, gz]`
pub type Row = [f64; 7];

/// Rows prepared for transport plus how they were produced
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRows {
    pub rows: Vec<Row>,
    pub downsampled: bool,
    pub method: &'static str,
}

/// Select indices of the points to keep using LTTB
///
/// `points` are `(x, y)` pairs with ascending `x`. The first and last
/// points are always kept. With `threshold < 3` or `threshold >= len`
/// every index is returned.
pub fn lttb_indices(points: &[(f64, f64)], threshold: usize) -> Vec<usize> {
    let len = points.len();
    if threshold >= len || threshold < 3 {
        return (0..len).collect();
    }

    let bucket_size = (len - 2) as f64 / (threshold - 2) as f64;
    let mut selected = Vec::with_capacity(threshold);
    selected.push(0);
    let mut anchor = 0usize;

    for bucket in 0..threshold - 2 {
        // Average of the next bucket is the third triangle vertex
        let next_start = ((bucket + 1) as f64 * bucket_size).floor() as usize + 1;
        let next_end = (((bucket + 2) as f64 * bucket_size).floor() as usize + 1).min(len);
        let next = &points[next_start..next_end];
        let (avg_x, avg_y) = mean_point(next);

        let start = (bucket as f64 * bucket_size).floor() as usize + 1;
        let end = next_start;
        let (ax, ay) = points[anchor];

        let mut best_idx = start;
        let mut best_area = -1.0;
        for (offset, &(px, py)) in points[start..end].iter().enumerate() {
            let area = ((ax - avg_x) * (py - ay) - (ax - px) * (avg_y - ay)).abs() * 0.5;
            if area > best_area {
                best_area = area;
                best_idx = start + offset;
            }
        }

        selected.push(best_idx);
        anchor = best_idx;
    }

    selected.push(len - 1);
    selected
}

fn mean_point(points: &[(f64, f64)]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let n = points.len() as f64;
    (sx / n, sy / n)
}

fn to_row(sample: &SensorSample) -> Row {
    [
        sample.timestamp_ms() as f64,
        sample.accel_x,
        sample.accel_y,
        sample.accel_z,
        sample.gyro_x,
        sample.gyro_y,
        sample.gyro_z,
    ]
}

/// Build at most `resolution` transport rows from ordered samples
///
/// Selection runs over the vertical-acceleration channel, the same signal
/// the cycle detector uses, and keeps whole rows for the chosen indices.
pub fn transport_rows(samples: &[SensorSample], resolution: usize) -> TransportRows {
    if samples.len() <= resolution || resolution < 3 {
        if resolution < 3 && samples.len() > resolution {
            log::warn!(
                "Transport resolution {} is too small for LTTB, returning all {} rows",
                resolution,
                samples.len()
            );
        }
        return TransportRows {
            rows: samples.iter().map(to_row).collect(),
            downsampled: false,
            method: NO_METHOD,
        };
    }

    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (s.timestamp_ms() as f64, s.vertical_accel()))
        .collect();
    let indices = lttb_indices(&points, resolution);

    log::debug!(
        "Downsampled {} samples to {} rows for transport",
        samples.len(),
        indices.len()
    );

    TransportRows {
        rows: indices.into_iter().map(|i| to_row(&samples[i])).collect(),
        downsampled: true,
        method: LTTB_METHOD,
    }
}
