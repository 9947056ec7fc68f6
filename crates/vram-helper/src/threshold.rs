//! Threshold hysteresis for a single monitored metric.
//!
//! Every metric keeps a marker: the last threshold a warning fired for.
//! A warning fires once the value climbs more than one step above the marker,
//! and the marker follows the value upward on a fixed step grid. When the
//! value falls more than one step below the marker, the marker drops back one
//! step per observation. It never drops below its starting point, which sits
//! one step under the configured maximum, so the first warning fires as soon
//! as the maximum is exceeded.

use derive_more::Display;

/// Monitored GPU metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Metric {
    #[display("VRAM")]
    Vram,
    #[display("temperature")]
    Temperature,
}

impl Metric {
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Vram => "MiB",
            Metric::Temperature => "°C",
        }
    }
}

/// Outcome of a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Marker unchanged.
    Steady,
    /// Value fell far enough below the marker to lower it by one step.
    Recovered { from: u64, to: u64 },
    /// Value exceeded the marker by more than a step, a warning is due.
    Raised { from: u64, to: u64 },
}

impl Transition {
    pub fn is_raised(&self) -> bool {
        matches!(self, Transition::Raised { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    floor: u64,
    step: u64,
    marker: u64,
}

impl Threshold {
    /// Creates a threshold that first fires above `max`.
    ///
    /// A zero `step` is treated as 1.
    pub fn new(max: u64, step: u64) -> Self {
        let step = step.max(1);
        let floor = max.saturating_sub(step);
        Self {
            floor,
            step,
            marker: floor,
        }
    }

    pub fn marker(&self) -> u64 {
        self.marker
    }

    pub fn floor(&self) -> u64 {
        self.floor
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Values strictly above this level fire the next warning.
    pub fn alert_level(&self) -> u64 {
        self.marker.saturating_add(self.step)
    }

    pub fn observe(&mut self, value: u64) -> Transition {
        let from = self.marker;

        if let Some(lowered) = self.marker.checked_sub(self.step) {
            if value < lowered && lowered >= self.floor {
                self.marker = lowered;
                return Transition::Recovered { from, to: lowered };
            }
        }

        if value > self.alert_level() {
            // highest grid point strictly below `value`
            let crossed = (value - self.marker).div_ceil(self.step) - 1;
            self.marker = self
                .marker
                .saturating_add(crossed.saturating_mul(self.step));
            return Transition::Raised {
                from,
                to: self.marker,
            };
        }

        Transition::Steady
    }
}
