#![no_std]
#![no_main]

use nrf_sonar as _; // memory layout + panic handler

// See https://crates.io/crates/defmt-test/0.3.0 for more documentation (e.g. about the 'state'
// feature)
#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};
    use embedded_hal::blocking::delay::DelayUs;
    use nrf52840_hal::{
        clocks::Clocks,
        gpio::{p0::Parts, Level, Output, Pin, PushPull},
        pac::{Peripherals, TIMER1},
    };
    use nrf_sonar::{
        config::Config,
        delay::{CycleDelay, CORE_MHZ},
        mono::MonoTimer,
        slot::MeasurementSlot,
        status::Status,
        trigger::Trigger,
        Instant,
    };
    use rtic_monotonic::Monotonic;

    struct State {
        mono: MonoTimer<TIMER1>,
        trigger: Trigger<Pin<Output<PushPull>>, CycleDelay>,
    }

    #[init]
    fn init() -> State {
        let p = Peripherals::take().unwrap();
        let _clocks = Clocks::new(p.CLOCK).enable_ext_hfosc();

        let mut mono = MonoTimer::new(p.TIMER1);
        unsafe { mono.reset() };

        let p0 = Parts::new(p.P0);
        let pin = p0.p0_03.into_push_pull_output(Level::Low).degrade();
        let trigger = Trigger::new(
            pin,
            CycleDelay::new(CORE_MHZ),
            Config::DEFAULT.trigger_pulse,
        );

        State { mono, trigger }
    }

    #[test]
    fn monotonic_counts_microseconds(state: &mut State) {
        let mut delay = CycleDelay::new(CORE_MHZ);
        let start = state.mono.now();
        delay.delay_us(1_000);
        let elapsed = state.mono.now().checked_duration_since(start).unwrap();

        assert!(elapsed.ticks() >= 1_000);
        assert!(elapsed.ticks() < 1_200, "elapsed {=u32} us", elapsed.ticks());
    }

    #[test]
    fn trigger_pulse_is_at_least_ten_us(state: &mut State) {
        let start = state.mono.now();
        state.trigger.fire();
        let elapsed = state.mono.now().checked_duration_since(start).unwrap();

        assert!(elapsed >= Config::DEFAULT.trigger_pulse);
        assert!(elapsed.ticks() < 50);
    }

    #[test]
    fn slot_hands_over_latest_measurement(state: &mut State) {
        let mut slot = MeasurementSlot::new();
        let (mut publisher, reader) = slot.split();

        let measured = state.mono.now();
        publisher.publish(42.5, measured);
        publisher.record_failure(Status::NO_ECHO, state.mono.now());

        let later = measured + fugit::MicrosDurationU32::millis(3);
        let reading = reader.read_latest_measurement(later);
        assert_eq!(reading.distance_cm, Some(42.5));
        assert_eq!(reading.age.map(|age| age.ticks()), Some(3_000));
        assert_eq!(reading.status, Status::NO_ECHO);
        assert!(reader.read().attempted_at >= Some(measured));
    }

    #[test]
    fn empty_slot_has_no_distance() {
        let mut slot = MeasurementSlot::new();
        let (_, reader) = slot.split();
        let reading = reader.read_latest_measurement(Instant::from_ticks(0));
        assert_eq!(reading.distance_cm, None);
        assert!(reading.status.is_ok());
    }
}
