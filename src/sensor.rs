//! # Sensor Block Module
//!
//! Builds the `sensor` section of an analysis report: the column layout,
//! units, nominal sampling rate, full-series statistics, and the
//! bounded-resolution rows returned for plotting.
//!
//! Statistics always cover every sample. The rows may be reduced, in which
//! case `downsampled`, `method` and `original_sample_count` say how.

use crate::config::TransportConfig;
use crate::downsample::{transport_rows, Row};
use crate::sample::{Channel, SensorSample};
use crate::stats::{aggregate, SensorStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row-oriented transport layout
pub const ROW_FORMAT: &str = "rows";
/// Name of the timestamp column
pub const TIME_COLUMN: &str = "T";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorBlock {
    pub format: String,
    pub columns: Vec<String>,
    pub units: BTreeMap<String, String>,
    pub sampling_hz: f64,
    pub resolution: usize,
    pub downsampled: bool,
    pub method: String,
    pub original_sample_count: usize,
    pub stats: SensorStats,
    pub data: Vec<Row>,
}

fn columns() -> Vec<String> {
    std::iter::once(TIME_COLUMN)
        .chain(Channel::all().iter().map(|c| c.column_name()))
        .map(String::from)
        .collect()
}

fn units() -> BTreeMap<String, String> {
    let mut units = BTreeMap::new();
    units.insert(TIME_COLUMN.to_string(), "ms".to_string());
    for channel in Channel::all() {
        units.insert(channel.column_name().to_string(), channel.unit().to_string());
    }
    units
}

/// Assemble the sensor block from time-ordered samples
pub fn build_sensor_block(samples: &[SensorSample], transport: TransportConfig) -> SensorBlock {
    let stats = aggregate(samples);
    let rows = transport_rows(samples, transport.resolution);

    SensorBlock {
        format: ROW_FORMAT.to_string(),
        columns: columns(),
        units: units(),
        sampling_hz: transport.sampling_hz,
        resolution: transport.resolution,
        downsampled: rows.downsampled,
        method: rows.method.to_string(),
        original_sample_count: samples.len(),
        stats,
        data: rows.rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downsample::{LTTB_METHOD, NO_METHOD};
    use crate::sample::test_support::idealized_cycles;

    #[test]
    fn test_columns_and_units() {
        let cols = columns();
        assert_eq!(cols, vec!["T", "ax", "ay", "az", "gx", "gy", "gz"]);

        let units = units();
        assert_eq!(units.len(), 7);
        assert_eq!(units["T"], "ms");
        assert_eq!(units["ay"], "g");
        assert_eq!(units["gz"], "rad/s");
    }

    #[test]
    fn test_block_without_downsampling() {
        let samples = idealized_cycles(1);
        let transport = TransportConfig { sampling_hz: 10.0, resolution: 1000 };

        let block = build_sensor_block(&samples, transport);

        assert_eq!(block.format, "rows");
        assert_eq!(block.sampling_hz, 10.0);
        assert!(!block.downsampled);
        assert_eq!(block.method, NO_METHOD);
        assert_eq!(block.original_sample_count, samples.len());
        assert_eq!(block.data.len(), samples.len());
        assert_eq!(block.stats.ay.max, 0.8);
        assert_eq!(block.stats.ay.min, -0.6);
    }

    #[test]
    fn test_stats_use_full_series_when_downsampled() {
        let samples = idealized_cycles(5);
        let transport = TransportConfig { sampling_hz: 10.0, resolution: 20 };

        let block = build_sensor_block(&samples, transport);

        assert!(block.downsampled);
        assert_eq!(block.method, LTTB_METHOD);
        assert_eq!(block.resolution, 20);
        assert_eq!(block.data.len(), 20);
        assert_eq!(block.original_sample_count, 130);
        assert_eq!(block.stats, aggregate(&samples));
    }
}
