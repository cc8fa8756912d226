//! Pulse width to distance conversion.

use core::fmt;

use crate::config::Config;
use crate::PulseWidth;

/// One-way distance in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Distance(f32);

impl Distance {
    pub fn from_cm(cm: f32) -> Self {
        Distance(cm)
    }

    /// Distance for an echo of `width`, travelling at `cm_per_us` one way.
    pub fn from_pulse(width: PulseWidth, cm_per_us: f32) -> Self {
        Distance(width.ticks() as f32 * cm_per_us)
    }

    pub fn cm(self) -> f32 {
        self.0
    }

    pub fn within(self, config: &Config) -> bool {
        self.0 >= config.min_range_cm && self.0 <= config.max_range_cm
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} cm", self.0)
    }
}
