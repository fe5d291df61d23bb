//! # Derived Indicator Module
//!
//! Turns detected cycles and the test bounds into the clinical indicators
//! shown on the evaluation report: total time, power, fatigue, symmetry,
//! and an age-adjusted overall classification.
//!
//! Every function here is total. Degenerate input (no valid cycles) maps
//! to a fixed fallback value rather than an error:
//! - power index: average stand time defaults to 1, so the index is 1.0
//! - fatigue index: 0 with fewer than two valid cycles
//! - symmetry index: 0 with no valid cycles

use crate::sample::elapsed_seconds;
use crate::segmentation::{CycleBlock, CycleRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tests finishing within this many seconds are classified `Normal`
pub const TOTAL_TIME_CUTOFF_SECONDS: f64 = 30.0;

// Display scale for each indicator's gauge on the client
const TOTAL_TIME_MAX_VALUE: f64 = 60.0;
const POWER_MAX_VALUE: f64 = 2.0;
const FATIGUE_MAX_VALUE: f64 = 5.0;
const SYMMETRY_MAX_VALUE: f64 = 3.0;

pub const TOTAL_TIME: &str = "total_time";
pub const POWER_INDEX: &str = "power_index";
pub const FATIGUE_INDEX: &str = "fatigue_index";
pub const SYMMETRY_INDEX: &str = "symmetry_index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeClass {
    Normal,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerClass {
    Excellent,
    Good,
    Regular,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatigueClass {
    Absent,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetryClass {
    Excellent,
    Good,
    Regular,
    Irregular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallClass {
    AboveAverage,
    Average,
    BelowAverage,
}

impl fmt::Display for TimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeClass::Normal => "Normal",
            TimeClass::Slow => "Slow",
        })
    }
}

impl fmt::Display for PowerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerClass::Excellent => "Excellent",
            PowerClass::Good => "Good",
            PowerClass::Regular => "Regular",
            PowerClass::Low => "Low",
        })
    }
}

impl fmt::Display for FatigueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FatigueClass::Absent => "Absent",
            FatigueClass::Low => "Low",
            FatigueClass::Medium => "Medium",
            FatigueClass::High => "High",
        })
    }
}

impl fmt::Display for SymmetryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymmetryClass::Excellent => "Excellent",
            SymmetryClass::Good => "Good",
            SymmetryClass::Regular => "Regular",
            SymmetryClass::Irregular => "Irregular",
        })
    }
}

impl fmt::Display for OverallClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallClass::AboveAverage => "Above Average",
            OverallClass::Average => "Average",
            OverallClass::BelowAverage => "Below Average",
        })
    }
}

/// One named indicator as reported to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedIndicator {
    pub name: String,
    pub value: f64,
    /// Upper bound for display scaling only
    pub max_value: f64,
    pub classification: String,
}

impl DerivedIndicator {
    fn new(name: &str, value: f64, max_value: f64, classification: impl fmt::Display) -> Self {
        Self {
            name: name.to_string(),
            value,
            max_value,
            classification: classification.to_string(),
        }
    }
}

/// The `derived` block of an analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedBlock {
    pub patient_age_on_evaluation: u32,
    pub indicators: Vec<DerivedIndicator>,
    pub overall_classification: String,
}

impl DerivedBlock {
    pub fn indicator(&self, name: &str) -> Option<&DerivedIndicator> {
        self.indicators.iter().find(|i| i.name == name)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean_total(cycles: &[CycleRecord]) -> f64 {
    cycles.iter().map(|c| c.total_seconds).sum::<f64>() / cycles.len() as f64
}

pub fn total_time(time_init: DateTime<Utc>, time_end: DateTime<Utc>) -> f64 {
    elapsed_seconds(time_init, time_end)
}

pub fn classify_total_time(seconds: f64) -> TimeClass {
    if seconds <= TOTAL_TIME_CUTOFF_SECONDS {
        TimeClass::Normal
    } else {
        TimeClass::Slow
    }
}

/// Reciprocal of the mean stand time over valid cycles
///
/// With no valid cycles the divisor falls back to 1, giving exactly 1.0.
/// The same fallback also covers valid cycles whose mean stand time is not
/// positive (rise and descend on one timestamp). That case is an extension
/// of the zero-cycle rule, chosen so the index never becomes infinite.
pub fn power_index(valid: &[CycleRecord]) -> f64 {
    let avg_stand = if valid.is_empty() {
        1.0
    } else {
        valid.iter().map(|c| c.stand_seconds).sum::<f64>() / valid.len() as f64
    };

    if avg_stand > 0.0 {
        1.0 / avg_stand
    } else {
        1.0
    }
}

pub fn classify_power(index: f64) -> PowerClass {
    if index > 1.5 {
        PowerClass::Excellent
    } else if index > 1.0 {
        PowerClass::Good
    } else if index > 0.5 {
        PowerClass::Regular
    } else {
        PowerClass::Low
    }
}

/// Relative slowdown of the second half of the test versus the first
///
/// Valid cycles are split at `len / 2`; the second half takes the odd
/// cycle. Scaled by 10 and rounded to two decimals.
pub fn fatigue_index(valid: &[CycleRecord]) -> f64 {
    if valid.len() < 2 {
        return 0.0;
    }

    let (first, second) = valid.split_at(valid.len() / 2);
    let mean_first = mean_total(first);
    let mean_second = mean_total(second);

    round2((mean_second - mean_first) / mean_first * 10.0)
}

pub fn classify_fatigue(index: f64) -> FatigueClass {
    if index <= 0.0 {
        FatigueClass::Absent
    } else if index < 1.0 {
        FatigueClass::Low
    } else if index < 2.0 {
        FatigueClass::Medium
    } else {
        FatigueClass::High
    }
}

/// Population standard deviation of cycle durations, rounded to two decimals
pub fn symmetry_index(valid: &[CycleRecord]) -> f64 {
    if valid.is_empty() {
        return 0.0;
    }

    let mean = mean_total(valid);
    let variance = valid
        .iter()
        .map(|c| (c.total_seconds - mean).powi(2))
        .sum::<f64>()
        / valid.len() as f64;

    round2(variance.sqrt())
}

pub fn classify_symmetry(index: f64) -> SymmetryClass {
    if index < 0.5 {
        SymmetryClass::Excellent
    } else if index < 1.0 {
        SymmetryClass::Good
    } else if index < 2.0 {
        SymmetryClass::Regular
    } else {
        SymmetryClass::Irregular
    }
}

/// Age-adjusted target repetition count
pub fn target_repetitions(age: u32) -> usize {
    match age {
        0..=70 => 14,
        71..=80 => 12,
        _ => 10,
    }
}

pub fn overall_classification(age: u32, valid_cycles: usize) -> OverallClass {
    let target = target_repetitions(age);
    if valid_cycles >= target {
        OverallClass::AboveAverage
    } else if valid_cycles >= target - 3 {
        OverallClass::Average
    } else {
        OverallClass::BelowAverage
    }
}

/// Compute every indicator for one test run
pub fn derive_indicators(
    cycles: &CycleBlock,
    time_init: DateTime<Utc>,
    time_end: DateTime<Utc>,
    age: u32,
) -> DerivedBlock {
    let valid: Vec<CycleRecord> = cycles.valid_cycles().copied().collect();

    let total = total_time(time_init, time_end);
    let power = power_index(&valid);
    let fatigue = fatigue_index(&valid);
    let symmetry = symmetry_index(&valid);
    let overall = overall_classification(age, valid.len());

    log::debug!(
        "Indicators: total {:.2}s, power {:.3}, fatigue {:.2}, symmetry {:.2}, overall {}",
        total,
        power,
        fatigue,
        symmetry,
        overall
    );

    DerivedBlock {
        patient_age_on_evaluation: age,
        indicators: vec![
            DerivedIndicator::new(TOTAL_TIME, total, TOTAL_TIME_MAX_VALUE, classify_total_time(total)),
            DerivedIndicator::new(POWER_INDEX, power, POWER_MAX_VALUE, classify_power(power)),
            DerivedIndicator::new(FATIGUE_INDEX, fatigue, FATIGUE_MAX_VALUE, classify_fatigue(fatigue)),
            DerivedIndicator::new(SYMMETRY_INDEX, symmetry, SYMMETRY_MAX_VALUE, classify_symmetry(symmetry)),
        ],
        overall_classification: overall.to_string(),
    }
}
