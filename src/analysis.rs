//! # Analysis Pipeline Module
//!
//! One call turns a complete sit-to-stand recording into a report:
//!
//! ```text
//! raw samples → ordered samples → { sensor block, cycle block } → derived block
//! ```
//!
//! Data only flows downstream. The whole pipeline is a pure function of its
//! inputs with no I/O and no shared state, so independent analyses can run
//! in parallel without coordination.

use crate::config::{Config, TransportConfig};
use crate::error::AnalysisError;
use crate::indicators::{derive_indicators, DerivedBlock};
use crate::sample::{order_samples, SensorSample};
use crate::segmentation::{detect_cycles, CycleBlock, SegmentationThresholds};
use crate::sensor::{build_sensor_block, SensorBlock};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything one analysis needs
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub samples: Vec<SensorSample>,
    pub time_init: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    /// Participant age in whole years on the test date
    pub age: u32,
}

/// Tunable parameters for an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalysisSettings {
    pub thresholds: SegmentationThresholds,
    pub transport: TransportConfig,
}

impl From<&Config> for AnalysisSettings {
    fn from(config: &Config) -> Self {
        Self {
            thresholds: config.thresholds(),
            transport: config.transport(),
        }
    }
}

/// The assembled response bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub sensor: SensorBlock,
    pub cycle: CycleBlock,
    pub derived: DerivedBlock,
}

/// Run the full pipeline on one recording
///
/// Fails with `NoData` on an empty sample collection; nothing is computed
/// in that case. Every other input produces a complete report.
pub fn analyze(request: AnalysisRequest, settings: AnalysisSettings) -> Result<AnalysisReport, AnalysisError> {
    let AnalysisRequest {
        samples,
        time_init,
        time_end,
        age,
    } = request;

    log::debug!("Analyzing {} samples", samples.len());
    let ordered = order_samples(samples)?;

    let sensor = build_sensor_block(&ordered, settings.transport);
    let cycle = detect_cycles(&ordered, settings.thresholds);
    let derived = derive_indicators(&cycle, time_init, time_end, age);

    log::info!(
        "Analysis complete: {} samples, {} valid cycles, overall {}",
        sensor.original_sample_count,
        cycle.valid_count(),
        derived.overall_classification
    );

    Ok(AnalysisReport {
        sensor,
        cycle,
        derived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{FATIGUE_INDEX, POWER_INDEX, SYMMETRY_INDEX, TOTAL_TIME};
    use crate::sample::test_support::*;
    use crate::segmentation::MAX_CYCLES;
    use chrono::Duration;

    fn request(samples: Vec<SensorSample>, seconds: i64, age: u32) -> AnalysisRequest {
        AnalysisRequest {
            samples,
            time_init: t0(),
            time_end: t0() + Duration::seconds(seconds),
            age,
        }
    }

    #[test]
    fn test_empty_samples_fail_with_no_data() {
        let result = analyze(request(Vec::new(), 10, 70), AnalysisSettings::default());
        assert_eq!(result, Err(AnalysisError::NoData));
    }

    #[test]
    fn test_stationary_recording() {
        let report = analyze(request(stationary(100), 25, 66), AnalysisSettings::default()).unwrap();

        assert_eq!(report.cycle, CycleBlock::default());
        assert_eq!(report.derived.indicator(POWER_INDEX).unwrap().value, 1.0);
        assert_eq!(report.derived.indicator(FATIGUE_INDEX).unwrap().value, 0.0);
        assert_eq!(report.derived.indicator(SYMMETRY_INDEX).unwrap().value, 0.0);
        assert_eq!(report.derived.overall_classification, "Below Average");
        assert_eq!(report.sensor.original_sample_count, 100);
    }

    #[test]
    fn test_full_recording() {
        let report = analyze(request(idealized_cycles(5), 13, 82), AnalysisSettings::default()).unwrap();

        assert_eq!(report.cycle.valid_count(), MAX_CYCLES);
        let total = report.derived.indicator(TOTAL_TIME).unwrap();
        assert_eq!(total.value, 13.0);
        assert_eq!(total.classification, "Normal");
        assert!(report.cycle.min.total_seconds <= report.cycle.avg.total_seconds);
        assert!(report.cycle.avg.total_seconds <= report.cycle.max.total_seconds);
    }

    #[test]
    fn test_shuffled_input_matches_ordered() {
        let ordered = idealized_cycles(4);
        let mut shuffled = ordered.clone();
        shuffled.rotate_left(37);

        let settings = AnalysisSettings::default();
        let a = analyze(request(ordered, 12, 70), settings).unwrap();
        let b = analyze(request(shuffled, 12, 70), settings).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            transport_resolution: 50,
            rise_threshold: 0.7,
            ..Config::default()
        };

        let settings = AnalysisSettings::from(&config);
        assert_eq!(settings.transport.resolution, 50);
        assert_eq!(settings.thresholds.rise, 0.7);

        let report = analyze(request(idealized_cycles(5), 13, 70), settings).unwrap();
        assert!(report.sensor.downsampled);
        assert_eq!(report.sensor.data.len(), 50);
        assert_eq!(report.cycle.valid_count(), 5);
    }

    #[test]
    fn test_report_serializes_three_blocks() {
        let report = analyze(request(idealized_cycles(2), 9, 70), AnalysisSettings::default()).unwrap();

        let json = serde_json::to_value(&report).expect("Failed to serialize");

        assert!(json["sensor"]["stats"]["ay"]["max"].as_f64().is_some());
        assert_eq!(json["sensor"]["method"], "none");
        assert!(json["cycle"]["c1"]["total"].as_f64().unwrap() > 0.0);
        assert_eq!(json["derived"]["patient_age_on_evaluation"], 70);
        assert_eq!(json["derived"]["indicators"].as_array().unwrap().len(), 4);
    }
}
