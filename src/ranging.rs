//! Measurement cycle state machine.
//!
//! A cycle runs `Idle -> Triggered -> AwaitingEcho -> Computed -> Idle`.
//! [`Ranger::step`] advances it as far as it can without waiting and returns
//! how long the caller should sleep before the next call: the poll interval
//! while the echo is outstanding, the cycle interval once it is computed.
//! Waiting for the echo is always bounded by the echo timeout.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;
use fugit::MicrosDurationU32;

use crate::capture::EchoSource;
use crate::config::Config;
use crate::distance::Distance;
use crate::slot::Publisher;
use crate::status::{Fault, Status};
use crate::trigger::Trigger;
use crate::{Instant, PulseWidth};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Outcome {
    Valid(Distance),
    Invalid(Fault),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    Triggered,
    AwaitingEcho { since: Instant },
    Computed(Outcome),
}

/// Running totals since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Counters {
    pub cycles: u32,
    pub valid: u32,
    pub no_echo: u32,
    pub out_of_range: u32,
}

/// Tracks consecutive failures and turns a cycle outcome into a status.
#[derive(Debug, Clone)]
pub struct Health {
    unavailable_after: u8,
    failure_run: u8,
    status: Status,
    counters: Counters,
}

impl Health {
    pub fn new(unavailable_after: u8) -> Self {
        Self {
            unavailable_after,
            failure_run: 0,
            status: Status::Ok,
            counters: Counters::default(),
        }
    }

    pub fn record(&mut self, outcome: Outcome) -> Status {
        let counters = &mut self.counters;
        counters.cycles = counters.cycles.wrapping_add(1);
        self.status = match outcome {
            Outcome::Valid(_) => {
                counters.valid = counters.valid.wrapping_add(1);
                self.failure_run = 0;
                Status::Ok
            }
            Outcome::Invalid(fault) => {
                match fault {
                    Fault::NoEcho => counters.no_echo = counters.no_echo.wrapping_add(1),
                    Fault::OutOfRange => {
                        counters.out_of_range = counters.out_of_range.wrapping_add(1)
                    }
                    Fault::SensorUnavailable => {}
                }
                self.failure_run = self.failure_run.saturating_add(1);
                if self.failure_run >= self.unavailable_after {
                    Status::SENSOR_UNAVAILABLE
                } else {
                    Status::Fault(fault)
                }
            }
        };
        self.status
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn failure_run(&self) -> u8 {
        self.failure_run
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }
}

/// Summary of a finished cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Report {
    pub outcome: Outcome,
    pub status: Status,
    /// Status after the previous cycle.
    pub previous: Status,
    pub failure_run: u8,
    pub counters: Counters,
}

impl Report {
    pub fn became_unavailable(&self) -> bool {
        self.status == Status::SENSOR_UNAVAILABLE && self.previous != Status::SENSOR_UNAVAILABLE
    }

    pub fn recovered(&self) -> bool {
        self.status.is_ok() && self.previous == Status::SENSOR_UNAVAILABLE
    }
}

/// What the scheduler should do after a [`Ranger::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Echo still outstanding, step again after the delay.
    Poll(MicrosDurationU32),
    /// Cycle finished, start the next one after the delay.
    Rest(Report, MicrosDurationU32),
}

impl Step {
    pub fn delay(&self) -> MicrosDurationU32 {
        match *self {
            Step::Poll(delay) | Step::Rest(_, delay) => delay,
        }
    }
}

pub struct Ranger<P, D> {
    trigger: Trigger<P, D>,
    config: Config,
    phase: Phase,
    health: Health,
}

impl<P, D> Ranger<P, D>
where
    P: OutputPin,
    D: DelayUs<u32>,
{
    pub fn new(trigger: Trigger<P, D>, config: Config) -> Self {
        Self {
            trigger,
            health: Health::new(config.unavailable_after),
            config,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn step<E: EchoSource>(
        &mut self,
        echo: &mut E,
        publisher: &mut Publisher<'_>,
        now: Instant,
    ) -> Step {
        match self.phase {
            Phase::Idle | Phase::Computed(_) => {
                self.start(echo, now);
                Step::Poll(self.config.poll_interval)
            }
            Phase::Triggered => {
                self.phase = Phase::AwaitingEcho { since: now };
                self.poll(echo, publisher, now)
            }
            Phase::AwaitingEcho { .. } => self.poll(echo, publisher, now),
        }
    }

    fn start<E: EchoSource>(&mut self, echo: &mut E, now: Instant) {
        // Arm first, the rising edge can follow the trigger within microseconds
        echo.arm();
        self.phase = Phase::Triggered;
        self.trigger.fire();
        self.phase = Phase::AwaitingEcho { since: now };
    }

    fn poll<E: EchoSource>(
        &mut self,
        echo: &mut E,
        publisher: &mut Publisher<'_>,
        now: Instant,
    ) -> Step {
        let since = match self.phase {
            Phase::AwaitingEcho { since } => since,
            _ => now,
        };

        let outcome = match echo.try_read() {
            Some(width) => self.classify(width),
            None => {
                let waited = now
                    .checked_duration_since(since)
                    .unwrap_or(MicrosDurationU32::from_ticks(0));
                if waited < self.config.echo_timeout {
                    return Step::Poll(self.config.poll_interval);
                }
                Outcome::Invalid(Fault::NoEcho)
            }
        };

        let report = self.finish(outcome, publisher, now);
        // Resting between cycles
        self.phase = Phase::Idle;
        Step::Rest(report, self.config.cycle_interval)
    }

    fn classify(&self, width: PulseWidth) -> Outcome {
        let distance = Distance::from_pulse(width, self.config.cm_per_us());
        if distance.within(&self.config) {
            Outcome::Valid(distance)
        } else {
            Outcome::Invalid(Fault::OutOfRange)
        }
    }

    fn finish(&mut self, outcome: Outcome, publisher: &mut Publisher<'_>, now: Instant) -> Report {
        self.phase = Phase::Computed(outcome);
        let previous = self.health.status();
        let status = self.health.record(outcome);
        match outcome {
            Outcome::Valid(distance) => publisher.publish(distance.cm(), now),
            Outcome::Invalid(_) => publisher.record_failure(status, now),
        }
        Report {
            outcome,
            status,
            previous,
            failure_run: self.health.failure_run(),
            counters: self.health.counters(),
        }
    }
}
