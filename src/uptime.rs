//! Uptime for the measurement log.
//!
//! The monotonic is a 32-bit microsecond counter and wraps after about 71
//! minutes. [`UptimeClock`] widens it to 64 bits, provided it sees at least
//! one instant per wrap period.

use core::fmt;

use crate::Instant;

#[derive(Debug, Default)]
pub struct UptimeClock {
    last: u32,
    wraps: u32,
}

impl UptimeClock {
    pub const fn new() -> Self {
        Self { last: 0, wraps: 0 }
    }

    pub fn extend(&mut self, now: Instant) -> Uptime {
        let ticks = now.ticks();
        if ticks < self.last {
            self.wraps = self.wraps.wrapping_add(1);
        }
        self.last = ticks;
        Uptime((u64::from(self.wraps) << 32) | u64::from(ticks))
    }
}

/// Microseconds since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Uptime(u64);

impl Uptime {
    pub const fn from_micros(us: u64) -> Self {
        Uptime(us)
    }

    pub fn as_micros(self) -> u64 {
        self.0
    }

    pub fn as_secs(self) -> u64 {
        self.0 / 1_000_000
    }

    pub fn hours(self) -> u64 {
        self.as_secs() / 3600
    }

    pub fn minutes(self) -> u8 {
        (self.as_secs() % 3600 / 60) as u8
    }

    pub fn seconds(self) -> u8 {
        (self.as_secs() % 60) as u8
    }
}

/// `hh:mm:ss`
impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}
