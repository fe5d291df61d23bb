//! # Cycle Segmentation Module
//!
//! Splits an ordered sit-to-stand recording into individual stand/sit
//! repetitions using the vertical-axis acceleration as the movement proxy.
//!
//! ## Phase Machine
//! ```text
//! Sitting ──(a > rise)──▶ StandingUp ──(|a| < stable)──▶ Standing
//!    ▲                                                      │
//!    └──(|a| < stable, emit cycle)── SittingDown ◀──(a < descend)
//! ```
//!
//! One linear pass, no look-back. Processing stops once the protocol
//! maximum of cycles has been emitted; any remaining samples are ignored.
//! A repetition still in progress when the samples run out is discarded.
//!
//! ## Output Shape
//! The result is always `MAX_CYCLES` slots. Slots with no detected cycle
//! hold a zero-valued `CycleRecord`, so a participant who never rises
//! still gets a well-formed, zero-scored block.

use crate::sample::{elapsed_seconds, SensorSample};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Repetitions in the five-times-sit-to-stand protocol
pub const MAX_CYCLES: usize = 5;

/// Acceleration thresholds (in g) driving the phase machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationThresholds {
    /// Sitting → StandingUp when vertical acceleration exceeds this
    pub rise: f64,
    /// Standing → SittingDown when vertical acceleration drops below this
    pub descend: f64,
    /// Half-width of the band around zero treated as stable
    pub stable_band: f64,
}

impl Default for SegmentationThresholds {
    fn default() -> Self {
        Self {
            rise: 0.5,
            descend: -0.3,
            stable_band: 0.1,
        }
    }
}

/// Participant phase as inferred from the proxy signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    #[default]
    Sitting,
    StandingUp,
    Standing,
    SittingDown,
}

/// Timing of one completed stand-sit repetition, in seconds
///
/// `total_seconds` runs from the cycle start to the moment the participant
/// is seated again. It is measured independently and is generally larger
/// than `stand_seconds + sit_seconds`; the residual is dwell time not
/// attributed to either movement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleRecord {
    #[serde(rename = "total")]
    pub total_seconds: f64,
    #[serde(rename = "stand")]
    pub stand_seconds: f64,
    #[serde(rename = "sit")]
    pub sit_seconds: f64,
}

impl CycleRecord {
    /// A detected cycle, as opposed to a zero-filled placeholder
    pub fn is_valid(&self) -> bool {
        self.total_seconds > 0.0
    }

    /// Time not covered by the stand and sit movements
    pub fn dwell_seconds(&self) -> f64 {
        self.total_seconds - self.stand_seconds - self.sit_seconds
    }
}

/// Fixed-length cycle slots plus per-field aggregates over valid cycles
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleBlock {
    pub cycles: [CycleRecord; MAX_CYCLES],
    pub min: CycleRecord,
    pub max: CycleRecord,
    pub avg: CycleRecord,
}

impl CycleBlock {
    fn from_slots(cycles: [CycleRecord; MAX_CYCLES]) -> Self {
        let valid: Vec<&CycleRecord> = cycles.iter().filter(|c| c.is_valid()).collect();
        Self {
            cycles,
            min: reduce_fields(&valid, f64::min),
            max: reduce_fields(&valid, f64::max),
            avg: average_fields(&valid),
        }
    }

    /// Cycles that were actually detected, in order
    pub fn valid_cycles(&self) -> impl Iterator<Item = &CycleRecord> {
        self.cycles.iter().filter(|c| c.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.valid_cycles().count()
    }
}

impl Serialize for CycleBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MAX_CYCLES + 3))?;
        for (i, cycle) in self.cycles.iter().enumerate() {
            map.serialize_entry(&format!("c{}", i + 1), cycle)?;
        }
        map.serialize_entry("min", &self.min)?;
        map.serialize_entry("max", &self.max)?;
        map.serialize_entry("avg", &self.avg)?;
        map.end()
    }
}

/// Reduce each timing field independently; zero when nothing is valid
///
/// The result is not necessarily one real cycle: the fastest stand and the
/// fastest sit may come from different repetitions.
fn reduce_fields(valid: &[&CycleRecord], pick: fn(f64, f64) -> f64) -> CycleRecord {
    let Some((first, rest)) = valid.split_first() else {
        return CycleRecord::default();
    };

    rest.iter().fold(**first, |acc, c| CycleRecord {
        total_seconds: pick(acc.total_seconds, c.total_seconds),
        stand_seconds: pick(acc.stand_seconds, c.stand_seconds),
        sit_seconds: pick(acc.sit_seconds, c.sit_seconds),
    })
}

fn average_fields(valid: &[&CycleRecord]) -> CycleRecord {
    if valid.is_empty() {
        return CycleRecord::default();
    }

    let n = valid.len() as f64;
    let sum = valid.iter().fold(CycleRecord::default(), |acc, c| CycleRecord {
        total_seconds: acc.total_seconds + c.total_seconds,
        stand_seconds: acc.stand_seconds + c.stand_seconds,
        sit_seconds: acc.sit_seconds + c.sit_seconds,
    });

    CycleRecord {
        total_seconds: sum.total_seconds / n,
        stand_seconds: sum.stand_seconds / n,
        sit_seconds: sum.sit_seconds / n,
    }
}

/// Seconds between two optional instants; 0 if either is unset
fn span(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> f64 {
    match (from, to) {
        (Some(from), Some(to)) => elapsed_seconds(from, to),
        _ => 0.0,
    }
}

/// State carried through the single pass over the samples
#[derive(Debug, Clone, Default)]
pub struct CycleDetector {
    thresholds: SegmentationThresholds,
    phase: CyclePhase,
    cycle_start: Option<DateTime<Utc>>,
    rise_start: Option<DateTime<Utc>>,
    descend_start: Option<DateTime<Utc>>,
    completed: Vec<CycleRecord>,
}

impl CycleDetector {
    pub fn new(thresholds: SegmentationThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn cycles_completed(&self) -> usize {
        self.completed.len()
    }

    pub fn is_done(&self) -> bool {
        self.completed.len() >= MAX_CYCLES
    }

    /// Feed one sample; returns the cycle it completed, if any
    pub fn process_sample(&mut self, sample: &SensorSample) -> Option<CycleRecord> {
        if self.is_done() {
            return None;
        }

        let accel = sample.vertical_accel();
        let now = sample.timestamp;
        let t = self.thresholds;

        match self.phase {
            CyclePhase::Sitting => {
                if accel > t.rise {
                    self.phase = CyclePhase::StandingUp;
                    self.rise_start = Some(now);
                    if self.cycle_start.is_none() {
                        self.cycle_start = Some(now);
                    }
                }
                None
            }
            CyclePhase::StandingUp => {
                if accel.abs() < t.stable_band {
                    self.phase = CyclePhase::Standing;
                }
                None
            }
            CyclePhase::Standing => {
                if accel < t.descend {
                    self.phase = CyclePhase::SittingDown;
                    self.descend_start = Some(now);
                }
                None
            }
            CyclePhase::SittingDown => {
                if accel.abs() < t.stable_band {
                    Some(self.complete_cycle(now))
                } else {
                    None
                }
            }
        }
    }

    fn complete_cycle(&mut self, now: DateTime<Utc>) -> CycleRecord {
        let record = CycleRecord {
            total_seconds: span(self.cycle_start, Some(now)),
            stand_seconds: span(self.rise_start, self.descend_start),
            sit_seconds: span(self.descend_start, Some(now)),
        };

        self.phase = CyclePhase::Sitting;
        self.completed.push(record);
        self.rise_start = None;
        self.descend_start = None;
        self.cycle_start = Some(now);

        log::debug!(
            "Cycle {} complete: total {:.2}s, stand {:.2}s, sit {:.2}s",
            self.completed.len(),
            record.total_seconds,
            record.stand_seconds,
            record.sit_seconds
        );

        record
    }

    /// Close the pass and pad missing slots with zero records
    ///
    /// A cycle still in progress is dropped.
    pub fn finish(self) -> CycleBlock {
        if self.phase != CyclePhase::Sitting {
            log::debug!("Discarding incomplete cycle ended in {:?}", self.phase);
        }

        let mut slots = [CycleRecord::default(); MAX_CYCLES];
        for (slot, cycle) in slots.iter_mut().zip(self.completed) {
            *slot = cycle;
        }
        CycleBlock::from_slots(slots)
    }
}

/// Detect up to `MAX_CYCLES` stand-sit cycles in time-ordered samples
pub fn detect_cycles(samples: &[SensorSample], thresholds: SegmentationThresholds) -> CycleBlock {
    let mut detector = CycleDetector::new(thresholds);

    for sample in samples {
        if detector.is_done() {
            break;
        }
        detector.process_sample(sample);
    }

    log::info!(
        "Detected {} of {} cycles",
        detector.cycles_completed(),
        MAX_CYCLES
    );

    detector.finish()
}
