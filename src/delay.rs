//! Busy-wait delay for the trigger pulse.

use embedded_hal::blocking::delay::DelayUs;

/// Core clock with the external HFXO enabled.
pub const CORE_MHZ: u32 = 64;

/// Spins the core for the requested time. Only meant for pulses of a few
/// microseconds; anything longer belongs on the monotonic.
#[derive(Debug, Clone, Copy)]
pub struct CycleDelay {
    cycles_per_us: u32,
}

impl CycleDelay {
    pub const fn new(core_mhz: u32) -> Self {
        Self {
            cycles_per_us: core_mhz,
        }
    }
}

impl DelayUs<u32> for CycleDelay {
    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(us.saturating_mul(self.cycles_per_us));
    }
}
