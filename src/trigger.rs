//! Trigger line driver.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;
use fugit::MicrosDurationU32;

pub struct Trigger<P, D> {
    pin: P,
    delay: D,
    pulse: MicrosDurationU32,
}

impl<P, D> Trigger<P, D>
where
    P: OutputPin,
    D: DelayUs<u32>,
{
    /// Takes the trigger pin and parks it low.
    pub fn new(mut pin: P, delay: D, pulse: MicrosDurationU32) -> Self {
        pin.set_low().ok();
        Self { pin, delay, pulse }
    }

    /// Emit one trigger pulse. Blocks for the pulse width.
    pub fn fire(&mut self) {
        self.pin.set_high().ok();
        self.delay.delay_us(self.pulse.ticks());
        self.pin.set_low().ok();
    }

    pub fn pulse(&self) -> MicrosDurationU32 {
        self.pulse
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording pin and delay shared by the driver and state machine tests.

    use core::convert::Infallible;
    use std::cell::RefCell;
    use std::rc::Rc;

    use embedded_hal::blocking::delay::DelayUs;
    use embedded_hal::digital::v2::OutputPin;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Event {
        High,
        Low,
        Delay(u32),
        Arm,
        Read,
    }

    pub type Log = Rc<RefCell<Vec<Event>>>;

    pub struct Pin(pub Log);

    impl OutputPin for Pin {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().push(Event::Low);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().push(Event::High);
            Ok(())
        }
    }

    pub struct Delay(pub Log);

    impl DelayUs<u32> for Delay {
        fn delay_us(&mut self, us: u32) {
            self.0.borrow_mut().push(Event::Delay(us));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Delay, Event, Log, Pin};
    use super::*;

    fn trigger(log: &Log, pulse_us: u32) -> Trigger<Pin, Delay> {
        Trigger::new(
            Pin(log.clone()),
            Delay(log.clone()),
            MicrosDurationU32::from_ticks(pulse_us),
        )
    }

    #[test]
    fn parks_line_low_on_construction() {
        let log = Log::default();
        let _trigger = trigger(&log, 10);
        assert_eq!(*log.borrow(), [Event::Low]);
    }

    #[test]
    fn fire_emits_one_pulse() {
        let log = Log::default();
        let mut trigger = trigger(&log, 10);
        log.borrow_mut().clear();

        trigger.fire();
        assert_eq!(*log.borrow(), [Event::High, Event::Delay(10), Event::Low]);
    }

    #[test]
    fn pulse_width_follows_config() {
        let log = Log::default();
        let mut trigger = trigger(&log, 15);
        assert_eq!(trigger.pulse().ticks(), 15);
        trigger.fire();
        assert!(log.borrow().contains(&Event::Delay(15)));
    }

    #[test]
    fn release_hands_back_pin_and_delay() {
        let log = Log::default();
        let (mut pin, mut delay) = trigger(&log, 10).release();
        log.borrow_mut().clear();

        pin.set_high().unwrap();
        delay.delay_us(3);
        assert_eq!(*log.borrow(), [Event::High, Event::Delay(3)]);
    }
}
