//! Echo edge capture.
//!
//! The echo interrupt maps the line level to an [`Edge`] and hands it to
//! [`EdgeCapture::on_edge`] together with the current instant. Everything here
//! is plain state, so the handler stays short and the logic can be driven with
//! synthetic edges.

use crate::{Instant, PulseWidth};

/// Edge seen on the echo line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// Edge implied by the line level right after a toggle event.
    pub fn from_level(high: bool) -> Self {
        if high {
            Edge::Rising
        } else {
            Edge::Falling
        }
    }
}

/// Source of echo pulse widths for the measurement loop.
pub trait EchoSource {
    /// Forget the previous cycle and accept new edges.
    fn arm(&mut self);

    /// Width of the captured echo pulse, once both edges are in.
    fn try_read(&mut self) -> Option<PulseWidth>;
}

/// Rise/fall timestamps of the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeTimestamps {
    pub rise: Option<Instant>,
    pub fall: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct EdgeCapture {
    stamps: EdgeTimestamps,
    armed: bool,
}

impl EdgeCapture {
    pub const fn new() -> Self {
        Self {
            stamps: EdgeTimestamps {
                rise: None,
                fall: None,
            },
            armed: false,
        }
    }

    pub fn arm(&mut self) {
        self.stamps = EdgeTimestamps::default();
        self.armed = true;
    }

    pub fn timestamps(&self) -> EdgeTimestamps {
        self.stamps
    }

    /// Record an edge. Called from interrupt context.
    pub fn on_edge(&mut self, edge: Edge, now: Instant) {
        if !self.armed {
            return;
        }
        match edge {
            // Duplicate rises are sensor noise, keep the first one
            Edge::Rising => {
                if self.stamps.rise.is_none() {
                    self.stamps.rise = Some(now);
                }
            }
            // Orphaned or repeated falls are ignored
            Edge::Falling => {
                if self.stamps.rise.is_some() && self.stamps.fall.is_none() {
                    self.stamps.fall = Some(now);
                }
            }
        }
    }

    /// Pulse width of a complete, ordered rise/fall pair.
    pub fn try_read(&self) -> Option<PulseWidth> {
        match self.stamps {
            EdgeTimestamps {
                rise: Some(rise),
                fall: Some(fall),
            } => fall.checked_duration_since(rise),
            _ => None,
        }
    }
}

impl EchoSource for EdgeCapture {
    fn arm(&mut self) {
        EdgeCapture::arm(self)
    }

    fn try_read(&mut self) -> Option<PulseWidth> {
        EdgeCapture::try_read(self)
    }
}
