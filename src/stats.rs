//! Per-axis summary statistics over a full ordered recording.

use crate::sample::{Channel, SensorSample};
use serde::{Deserialize, Serialize};

/// Min, max and mean for one channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Statistics for all six channels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorStats {
    pub ax: AxisStats,
    pub ay: AxisStats,
    pub az: AxisStats,
    pub gx: AxisStats,
    pub gy: AxisStats,
    pub gz: AxisStats,
}

impl SensorStats {
    pub fn get(&self, channel: Channel) -> &AxisStats {
        match channel {
            Channel::AccX => &self.ax,
            Channel::AccY => &self.ay,
            Channel::AccZ => &self.az,
            Channel::GyroX => &self.gx,
            Channel::GyroY => &self.gy,
            Channel::GyroZ => &self.gz,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> &mut AxisStats {
        match channel {
            Channel::AccX => &mut self.ax,
            Channel::AccY => &mut self.ay,
            Channel::AccZ => &mut self.az,
            Channel::GyroX => &mut self.gx,
            Channel::GyroY => &mut self.gy,
            Channel::GyroZ => &mut self.gz,
        }
    }
}

/// Running min/max/sum accumulator for a single channel
#[derive(Debug, Clone, Copy)]
struct RunningStats {
    min: f64,
    max: f64,
    sum: f64,
}

impl RunningStats {
    fn seed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            sum: value,
        }
    }

    fn push(self, value: f64) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
            sum: self.sum + value,
        }
    }

    fn finish(self, count: usize) -> AxisStats {
        AxisStats {
            min: self.min,
            max: self.max,
            mean: self.sum / count as f64,
        }
    }
}

/// Compute statistics for every channel in a single pass over the samples
///
/// The caller guarantees a non-empty slice (ordering already rejected empty
/// input); an empty slice yields all-zero statistics.
pub fn aggregate(samples: &[SensorSample]) -> SensorStats {
    let Some(first) = samples.first() else {
        return SensorStats::default();
    };

    let channels = Channel::all();
    let mut running = channels.map(|channel| RunningStats::seed(first.value(channel)));

    for sample in &samples[1..] {
        for (slot, channel) in running.iter_mut().zip(channels) {
            *slot = slot.push(sample.value(channel));
        }
    }

    let mut stats = SensorStats::default();
    for (slot, channel) in running.into_iter().zip(channels) {
        *stats.get_mut(channel) = slot.finish(samples.len());
    }
    stats
}
