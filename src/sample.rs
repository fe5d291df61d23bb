//! # Sensor Sample Module
//!
//! Raw inertial readings as recorded during a sit-to-stand test, and the
//! ordering step every downstream component depends on.
//!
//! ## Key Types
//! - `SensorSample`: One timestamped accelerometer + gyroscope reading
//! - `Channel`: Identifier for each of the six sensor channels
//!
//! ## Responsibilities
//! 1. Establish ascending-timestamp order (stable, so duplicate timestamps
//!    keep their recorded relative order)
//! 2. Reject empty collections with `AnalysisError::NoData`
//! 3. Convert timestamp differences into seconds

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading from the body-worn sensor
///
/// Accelerations are in g, angular rates in rad/s. Values arrive already
/// scaled; no calibration is applied here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl SensorSample {
    /// Vertical-axis acceleration, the movement proxy for phase detection
    pub fn vertical_accel(&self) -> f64 {
        self.accel_y
    }

    /// Read the value of a single channel
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::AccX => self.accel_x,
            Channel::AccY => self.accel_y,
            Channel::AccZ => self.accel_z,
            Channel::GyroX => self.gyro_x,
            Channel::GyroY => self.gyro_y,
            Channel::GyroZ => self.gyro_z,
        }
    }

    /// Timestamp as Unix milliseconds
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Channel identifier for the six sensor axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AccX,
    AccY,
    AccZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Channel {
    /// Short column name used in the transport representation
    pub fn column_name(&self) -> &'static str {
        match self {
            Channel::AccX => "ax",
            Channel::AccY => "ay",
            Channel::AccZ => "az",
            Channel::GyroX => "gx",
            Channel::GyroY => "gy",
            Channel::GyroZ => "gz",
        }
    }

    /// Physical unit of the channel's values
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::AccX | Channel::AccY | Channel::AccZ => "g",
            Channel::GyroX | Channel::GyroY | Channel::GyroZ => "rad/s",
        }
    }

    /// All channels in column order
    pub fn all() -> [Channel; 6] {
        [
            Channel::AccX,
            Channel::AccY,
            Channel::AccZ,
            Channel::GyroX,
            Channel::GyroY,
            Channel::GyroZ,
        ]
    }
}

/// Sort samples by ascending timestamp
///
/// Uses a stable sort so samples sharing a timestamp stay in the order they
/// were recorded. An empty collection fails with `NoData` instead of
/// producing a zeroed result.
pub fn order_samples(mut samples: Vec<SensorSample>) -> Result<Vec<SensorSample>, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::NoData);
    }

    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

/// Seconds elapsed between two instants, at millisecond resolution
///
/// Negative when `to` precedes `from`.
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SensorSample;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    /// Fixed reference instant for synthetic recordings
    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 10, 30, 0).unwrap()
    }

    pub fn sample_at(offset_ms: i64, accel_y: f64) -> SensorSample {
        SensorSample {
            timestamp: t0() + Duration::milliseconds(offset_ms),
            accel_x: 0.0,
            accel_y,
            accel_z: 0.0,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
        }
    }

    /// Append `count` samples with constant vertical acceleration, 100 ms apart
    pub fn push_block(samples: &mut Vec<SensorSample>, clock_ms: &mut i64, count: usize, accel_y: f64) {
        for _ in 0..count {
            samples.push(sample_at(*clock_ms, accel_y));
            *clock_ms += 100;
        }
    }

    /// Idealized sit-to-stand repetitions: sit, rise spike, stand, descend spike, sit
    pub fn idealized_cycles(cycles: usize) -> Vec<SensorSample> {
        let mut samples = Vec::new();
        let mut clock_ms = 0;
        for _ in 0..cycles {
            push_block(&mut samples, &mut clock_ms, 5, 0.05);
            push_block(&mut samples, &mut clock_ms, 3, 0.8);
            push_block(&mut samples, &mut clock_ms, 10, 0.05);
            push_block(&mut samples, &mut clock_ms, 3, -0.6);
            push_block(&mut samples, &mut clock_ms, 5, 0.05);
        }
        samples
    }

    pub fn stationary(count: usize) -> Vec<SensorSample> {
        let mut samples = Vec::new();
        let mut clock_ms = 0;
        push_block(&mut samples, &mut clock_ms, count, 0.01);
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_order_samples_sorts_ascending() {
        let samples = vec![sample_at(300, 0.3), sample_at(100, 0.1), sample_at(200, 0.2)];

        let ordered = order_samples(samples).unwrap();

        let times: Vec<i64> = ordered.iter().map(|s| s.timestamp_ms() - t0().timestamp_millis()).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn test_order_samples_is_stable_for_duplicates() {
        let samples = vec![
            sample_at(200, 1.0),
            sample_at(100, 0.0),
            sample_at(200, 2.0),
            sample_at(200, 3.0),
        ];

        let ordered = order_samples(samples).unwrap();

        let values: Vec<f64> = ordered.iter().map(|s| s.accel_y).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_order_samples_rejects_empty() {
        assert_eq!(order_samples(Vec::new()), Err(AnalysisError::NoData));
    }

    #[test]
    fn test_elapsed_seconds() {
        let start = sample_at(0, 0.0).timestamp;
        let end = sample_at(28_500, 0.0).timestamp;
        assert!((elapsed_seconds(start, end) - 28.5).abs() < 1e-9);
        assert!((elapsed_seconds(end, start) + 28.5).abs() < 1e-9);
    }

    #[test]
    fn test_channel_names_and_units() {
        assert_eq!(Channel::AccY.column_name(), "ay");
        assert_eq!(Channel::GyroZ.column_name(), "gz");
        assert_eq!(Channel::AccX.unit(), "g");
        assert_eq!(Channel::GyroX.unit(), "rad/s");
        assert_eq!(Channel::all().len(), 6);
    }

    #[test]
    fn test_sample_deserializes_from_json() {
        let json = r#"{
            "timestamp": "2025-09-01T10:30:00.000Z",
            "accel_x": 0.123, "accel_y": -0.456, "accel_z": 0.656,
            "gyro_x": 1.234, "gyro_y": -2.345, "gyro_z": 0.789
        }"#;

        let sample: SensorSample = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(sample.timestamp, t0());
        assert_eq!(sample.value(Channel::AccY), -0.456);
        assert_eq!(sample.value(Channel::GyroZ), 0.789);
    }
}
