//! Five Times Sit-to-Stand (FTSTS) cycle analysis.
//!
//! Takes a recording of body-worn accelerometer/gyroscope samples plus the
//! test's start and end times and produces three report sections: sensor
//! statistics with plot-ready rows, per-cycle timings, and derived clinical
//! indicators with an age-adjusted overall classification.

pub mod analysis;
pub mod config;
pub mod downsample;
pub mod error;
pub mod filter_service;
pub mod indicators;
pub mod input;
pub mod sample;
pub mod segmentation;
pub mod sensor;
pub mod stats;
pub mod worker;

pub use analysis::{analyze, AnalysisReport, AnalysisRequest, AnalysisSettings};
pub use config::Config;
pub use error::{AnalysisError, ConfigError, FilterError, InputError, WorkerError};
pub use input::EvaluationInput;
pub use sample::SensorSample;
pub use worker::{analyze_async, AnalysisJob, AnalysisPool};
