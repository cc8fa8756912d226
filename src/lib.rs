#![cfg_attr(not(test), no_std)]

pub mod capture;
pub mod config;
pub mod distance;
pub mod ranging;
pub mod render;
pub mod slot;
pub mod status;
pub mod trigger;
pub mod uptime;

#[cfg(target_arch = "arm")]
pub mod delay;
#[cfg(target_arch = "arm")]
pub mod mono;

#[cfg(target_arch = "arm")]
use defmt_rtt as _; // global logger
#[cfg(target_arch = "arm")]
use nrf52840_hal as _; // memory layout
#[cfg(target_arch = "arm")]
use panic_probe as _;

/// Tick of the 1 MHz monotonic.
pub type Instant = fugit::TimerInstantU32<1_000_000>;

/// Time between two edges of the echo line.
pub type PulseWidth = fugit::MicrosDurationU32;

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[cfg(target_arch = "arm")]
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
