//! Tunables for the ranging loop and the display.

use fugit::MicrosDurationU32;

/// Shortest trigger pulse the HC-SR04 datasheet accepts.
pub const MIN_TRIGGER_PULSE: MicrosDurationU32 = MicrosDurationU32::from_ticks(10);

/// Shortest cycle interval that keeps echoes of one cycle out of the next.
pub const MIN_CYCLE_INTERVAL: MicrosDurationU32 = MicrosDurationU32::from_ticks(60_000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Width of the high pulse on the trigger line.
    pub trigger_pulse: MicrosDurationU32,
    /// Longest wait for a complete echo after the trigger pulse.
    pub echo_timeout: MicrosDurationU32,
    /// How often the echo capture is polled while waiting.
    pub poll_interval: MicrosDurationU32,
    /// Rest between the end of one cycle and the next trigger.
    pub cycle_interval: MicrosDurationU32,
    pub speed_of_sound_m_s: f32,
    pub min_range_cm: f32,
    pub max_range_cm: f32,
    /// Consecutive failed cycles before the sensor is reported unavailable.
    pub unavailable_after: u8,
    pub render_period: MicrosDurationU32,
    /// Readings older than this are flagged on the display.
    pub stale_after: MicrosDurationU32,
}

impl Config {
    pub const DEFAULT: Config = Config {
        trigger_pulse: MIN_TRIGGER_PULSE,
        echo_timeout: MicrosDurationU32::from_ticks(40_000),
        poll_interval: MicrosDurationU32::from_ticks(1_000),
        cycle_interval: MicrosDurationU32::from_ticks(100_000),
        speed_of_sound_m_s: 343.0,
        min_range_cm: 2.0,
        max_range_cm: 400.0,
        unavailable_after: 10,
        render_period: MicrosDurationU32::from_ticks(50_000),
        stale_after: MicrosDurationU32::from_ticks(1_000_000),
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_pulse < MIN_TRIGGER_PULSE {
            return Err(ConfigError::TriggerPulseTooShort);
        }
        if self.cycle_interval < MIN_CYCLE_INTERVAL {
            return Err(ConfigError::CycleIntervalTooShort);
        }
        if self.echo_timeout.ticks() == 0 {
            return Err(ConfigError::ZeroEchoTimeout);
        }
        if self.poll_interval.ticks() == 0 || self.poll_interval > self.echo_timeout {
            return Err(ConfigError::PollInterval);
        }
        // NaN fails both comparisons, so these are written as negations
        if !(self.speed_of_sound_m_s > 0.0) {
            return Err(ConfigError::SpeedOfSound);
        }
        if !(self.min_range_cm >= 0.0 && self.min_range_cm < self.max_range_cm) {
            return Err(ConfigError::InvalidRange);
        }
        if self.unavailable_after == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        Ok(())
    }

    /// Half the speed of sound in centimetres per microsecond, i.e. the
    /// one-way distance covered per microsecond of echo.
    pub fn cm_per_us(&self) -> f32 {
        self.speed_of_sound_m_s * 1e-4 / 2.0
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum ConfigError {
    TriggerPulseTooShort,
    CycleIntervalTooShort,
    ZeroEchoTimeout,
    PollInterval,
    SpeedOfSound,
    InvalidRange,
    ZeroFailureThreshold,
}
