#![cfg_attr(target_arch = "arm", no_main)]
#![cfg_attr(target_arch = "arm", no_std)]

#[cfg(target_arch = "arm")]
use nrf_sonar as _; // global logger + panicking-behavior + memory layout

#[cfg(target_arch = "arm")]
defmt::timestamp!("{=u32:us}", app::monotonics::now().ticks());

#[cfg(target_arch = "arm")]
#[rtic::app(device = nrf52840_hal::pac, peripherals = true, dispatchers = [UARTE1, SWI0_EGU0])]
mod app {
    use fugit::MicrosDurationU32;
    use nrf52840_hal::{
        clocks::Clocks,
        gpio::{p0::Parts, Input, Level, Output, Pin, PullDown, PushPull},
        gpiote::Gpiote,
        pac::{TIMER0, TWIM0},
        prelude::*,
        twim::{self, Twim},
    };
    use nrf_sonar::{
        capture::{Edge, EdgeCapture},
        config::Config,
        delay::{CycleDelay, CORE_MHZ},
        mono::MonoTimer,
        ranging::{Ranger, Step},
        render::Screen,
        slot::{MeasurementSlot, Publisher, Reader},
        trigger::Trigger,
        uptime::UptimeClock,
    };
    use ssd1306::{prelude::*, I2CDisplayInterface, Ssd1306};

    use super::{log_report, Locked};

    /// Board tunables, checked at boot.
    const CONFIG: Config = Config::DEFAULT;

    #[monotonic(binds = TIMER0, default = true)]
    type Mono = MonoTimer<TIMER0>;

    type Display = Ssd1306<
        I2CInterface<Twim<TWIM0>>,
        DisplaySize128x32,
        BufferedGraphicsMode<DisplaySize128x32>,
    >;

    #[shared]
    struct Shared {
        capture: EdgeCapture,
    }

    #[local]
    struct Local {
        echo: Pin<Input<PullDown>>,
        gpiote: Gpiote,
        ranger: Ranger<Pin<Output<PushPull>>, CycleDelay>,
        publisher: Publisher<'static>,
        uptime: UptimeClock,
        reader: Reader<'static>,
        display: Display,
        screen: Screen,
        render_period: MicrosDurationU32,
    }

    #[init(local = [slot: MeasurementSlot = MeasurementSlot::new()])]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        let _clocks = Clocks::new(ctx.device.CLOCK).enable_ext_hfosc();
        let mono = MonoTimer::new(ctx.device.TIMER0);

        let config = match CONFIG.validate() {
            Ok(()) => CONFIG,
            Err(e) => {
                defmt::error!("invalid config: {}, using defaults", e);
                Config::DEFAULT
            }
        };

        let p0 = Parts::new(ctx.device.P0);
        let echo = p0.p0_04.into_pulldown_input().degrade();
        let trigger = p0.p0_03.into_push_pull_output(Level::Low).degrade();

        let gpiote = Gpiote::new(ctx.device.GPIOTE);
        gpiote
            .channel0()
            .input_pin(&echo)
            .toggle() // Trigger on both rising and falling edges
            .enable_interrupt();

        let pins = twim::Pins {
            scl: p0.p0_27.into_floating_input().degrade(),
            sda: p0.p0_26.into_floating_input().degrade(),
        };
        let i2c = Twim::new(ctx.device.TWIM0, pins, twim::Frequency::K400);
        let mut display = Ssd1306::new(
            I2CDisplayInterface::new(i2c),
            DisplaySize128x32,
            DisplayRotation::Rotate0,
        )
        .into_buffered_graphics_mode();
        if display.init().is_err() {
            defmt::warn!("display init failed");
        }

        let trigger = Trigger::new(trigger, CycleDelay::new(CORE_MHZ), config.trigger_pulse);
        let (publisher, reader) = ctx.local.slot.split();

        defmt::info!(
            "ranging every {} ms, echo timeout {} ms",
            config.cycle_interval.to_millis(),
            config.echo_timeout.to_millis()
        );

        measure::spawn().ok();
        render::spawn().ok();

        (
            Shared {
                capture: EdgeCapture::new(),
            },
            Local {
                echo,
                gpiote,
                ranger: Ranger::new(trigger, config),
                publisher,
                uptime: UptimeClock::new(),
                reader,
                display,
                screen: Screen::new(&config),
                render_period: config.render_period,
            },
            init::Monotonics(mono),
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    #[task(binds = GPIOTE, shared = [capture], local = [gpiote, echo], priority = 3)]
    fn on_echo(mut ctx: on_echo::Context) {
        let now = monotonics::now();
        ctx.local.gpiote.reset_events();

        let edge = Edge::from_level(matches!(ctx.local.echo.is_high(), Ok(true)));
        ctx.shared.capture.lock(|capture| capture.on_edge(edge, now));
    }

    #[task(shared = [capture], local = [ranger, publisher, uptime], priority = 2)]
    fn measure(ctx: measure::Context) {
        let now = monotonics::now();
        let mut echo = Locked(ctx.shared.capture);

        let step = ctx.local.ranger.step(&mut echo, ctx.local.publisher, now);
        if let Step::Rest(report, _) = step {
            log_report(&report, ctx.local.uptime.extend(now));
        }
        measure::spawn_after(step.delay()).ok();
    }

    #[task(local = [reader, display, screen, render_period], priority = 1)]
    fn render(ctx: render::Context) {
        let reading = ctx
            .local
            .reader
            .read_latest_measurement(monotonics::now());

        let display = ctx.local.display;
        match ctx.local.screen.draw(display, &reading) {
            Ok(()) => {
                if let Err(e) = display.flush() {
                    defmt::warn!("display flush failed: {}", defmt::Debug2Format(&e));
                }
            }
            Err(e) => defmt::warn!("frame skipped: {}", defmt::Debug2Format(&e)),
        }

        render::spawn_after(*ctx.local.render_period).ok();
    }
}

/// Echo capture reached through the RTIC lock.
#[cfg(target_arch = "arm")]
struct Locked<M>(M);

#[cfg(target_arch = "arm")]
impl<M> nrf_sonar::capture::EchoSource for Locked<M>
where
    M: rtic::Mutex<T = nrf_sonar::capture::EdgeCapture>,
{
    fn arm(&mut self) {
        self.0.lock(|capture| capture.arm());
    }

    fn try_read(&mut self) -> Option<nrf_sonar::PulseWidth> {
        self.0.lock(|capture| capture.try_read())
    }
}

#[cfg(target_arch = "arm")]
fn log_report(report: &nrf_sonar::ranging::Report, uptime: nrf_sonar::uptime::Uptime) {
    use defmt::Display2Format;
    use nrf_sonar::ranging::Outcome;

    match report.outcome {
        Outcome::Valid(distance) => {
            defmt::info!("{} - {}", Display2Format(&uptime), Display2Format(&distance))
        }
        Outcome::Invalid(fault) => defmt::warn!("{} - {}", Display2Format(&uptime), fault),
    }
    if report.became_unavailable() {
        defmt::error!(
            "sensor unavailable after {=u8} failed cycles",
            report.failure_run
        );
    } else if report.recovered() {
        defmt::info!("sensor recovered");
    }
    defmt::debug!("{}", report.counters);
}

#[cfg(not(target_arch = "arm"))]
fn main() {}
