//! Distance screen for the 128x32 OLED.
//!
//! Three rows of 6x10 text: a header with the sensor status, the distance
//! value, and a `0 ... MAX` scale with a bar proportional to the distance.

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Baseline, Text},
};
use fugit::MicrosDurationU32;
use heapless::String;

use crate::config::Config;
use crate::slot::Reading;
use crate::status::Status;

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 32;

const ROW: i32 = 10;
const BAR_START: i32 = 8;
const BAR_END: i32 = 104;
const BAR_Y: i32 = 2 * ROW + 5;
const MAX_LABEL_X: i32 = 110;

pub type ValueText = String<16>;

pub struct Screen {
    max_range_cm: f32,
    stale_after: MicrosDurationU32,
    style: MonoTextStyle<'static, BinaryColor>,
}

impl Screen {
    pub fn new(config: &Config) -> Self {
        Self {
            max_range_cm: config.max_range_cm,
            stale_after: config.stale_after,
            style: MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
        }
    }

    /// Redraw the whole screen. The caller flushes it to the panel.
    pub fn draw<D>(&self, target: &mut D, reading: &Reading) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;

        self.text(target, header_text(reading), Point::zero())?;
        self.text(target, &self.value_text(reading), Point::new(0, ROW))?;
        self.text(target, "0", Point::new(0, 2 * ROW))?;
        self.text(target, "MAX", Point::new(MAX_LABEL_X, 2 * ROW))?;

        let length = self.bar(reading);
        if length > 0 {
            Line::new(
                Point::new(BAR_START, BAR_Y),
                Point::new(BAR_START + length as i32 - 1, BAR_Y),
            )
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(target)?;
        }
        Ok(())
    }

    pub fn value_text(&self, reading: &Reading) -> ValueText {
        let mut text = ValueText::new();
        match (reading.status, reading.distance_cm) {
            (Status::SENSOR_UNAVAILABLE, _) => {
                text.push_str(Status::SENSOR_UNAVAILABLE.label()).ok();
            }
            (_, Some(cm)) => {
                write!(text, "{:.1} cm", cm).ok();
                if reading.age.map_or(false, |age| age > self.stale_after) {
                    text.push('*').ok();
                }
            }
            (_, None) => {
                text.push_str("--- cm").ok();
            }
        }
        text
    }

    /// Bar length in pixels, zero when there is nothing to show.
    pub fn bar(&self, reading: &Reading) -> u32 {
        match (reading.status, reading.distance_cm) {
            (Status::SENSOR_UNAVAILABLE, _) | (_, None) => 0,
            (_, Some(cm)) => bar_length(cm, self.max_range_cm, (BAR_END - BAR_START) as u32),
        }
    }

    fn text<D>(&self, target: &mut D, text: &str, at: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        Text::with_baseline(text, at, self.style, Baseline::Top).draw(target)?;
        Ok(())
    }
}

pub fn header_text(reading: &Reading) -> &'static str {
    match reading.status {
        Status::Ok => "DISTANCE",
        status => status.label(),
    }
}

/// Pixels of a `span`-wide bar filled to `distance / max`.
pub fn bar_length(distance: f32, max: f32, span: u32) -> u32 {
    if !(distance > 0.0 && max > 0.0) {
        return 0;
    }
    let ratio = (distance / max).min(1.0);
    (ratio * span as f32) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use rstest::rstest;

    struct Frame {
        pixels: [[bool; WIDTH as usize]; HEIGHT as usize],
    }

    impl Frame {
        fn new() -> Self {
            Self {
                pixels: [[false; WIDTH as usize]; HEIGHT as usize],
            }
        }

        fn lit_in_row(&self, y: i32, from: i32, to: i32) -> usize {
            self.pixels[y as usize][from as usize..to as usize]
                .iter()
                .filter(|&&on| on)
                .count()
        }
    }

    impl OriginDimensions for Frame {
        fn size(&self) -> Size {
            Size::new(WIDTH, HEIGHT)
        }
    }

    impl DrawTarget for Frame {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                let inside = (0..WIDTH as i32).contains(&point.x)
                    && (0..HEIGHT as i32).contains(&point.y);
                if inside {
                    self.pixels[point.y as usize][point.x as usize] = color.is_on();
                }
            }
            Ok(())
        }
    }

    fn reading(distance_cm: Option<f32>, age_us: u32, status: Status) -> Reading {
        Reading {
            distance_cm,
            age: distance_cm.map(|_| MicrosDurationU32::from_ticks(age_us)),
            status,
        }
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(-3.0, 0)]
    #[case(100.0, 24)]
    #[case(200.0, 48)]
    #[case(400.0, 96)]
    #[case(650.0, 96)]
    fn bar_is_proportional(#[case] cm: f32, #[case] expected: u32) {
        assert_eq!(bar_length(cm, 400.0, 96), expected);
    }

    #[test]
    fn bar_handles_degenerate_range() {
        assert_eq!(bar_length(10.0, 0.0, 96), 0);
        assert_eq!(bar_length(f32::NAN, 400.0, 96), 0);
    }

    #[rstest]
    #[case(reading(Some(123.44), 0, Status::Ok), "123.4 cm")]
    #[case(reading(Some(17.16), 2_000_000, Status::NO_ECHO), "17.2 cm*")]
    #[case(reading(None, 0, Status::Ok), "--- cm")]
    #[case(reading(None, 0, Status::OUT_OF_RANGE), "--- cm")]
    #[case(reading(Some(50.0), 0, Status::SENSOR_UNAVAILABLE), "SENSOR N/A")]
    fn value_row(#[case] reading: Reading, #[case] expected: &str) {
        let screen = Screen::new(&Config::DEFAULT);
        assert_eq!(screen.value_text(&reading).as_str(), expected);
    }

    #[rstest]
    #[case(Status::Ok, "DISTANCE")]
    #[case(Status::NO_ECHO, "NO ECHO")]
    #[case(Status::OUT_OF_RANGE, "OUT OF RANGE")]
    #[case(Status::SENSOR_UNAVAILABLE, "SENSOR N/A")]
    fn header_row(#[case] status: Status, #[case] expected: &str) {
        assert_eq!(header_text(&reading(Some(1.0), 0, status)), expected);
    }

    #[test]
    fn draws_bar_for_reading() {
        let screen = Screen::new(&Config::DEFAULT);
        let mut frame = Frame::new();
        screen
            .draw(&mut frame, &reading(Some(200.0), 0, Status::Ok))
            .unwrap();
        assert_eq!(frame.lit_in_row(BAR_Y, BAR_START, BAR_END), 48);
        assert!(frame.pixels[BAR_Y as usize][BAR_START as usize]);
        assert!(!frame.pixels[BAR_Y as usize][(BAR_START + 48) as usize]);
        // Header text was drawn
        assert!((0..ROW).any(|y| frame.lit_in_row(y, 0, WIDTH as i32) > 0));
    }

    #[test]
    fn no_bar_without_distance() {
        let screen = Screen::new(&Config::DEFAULT);
        let mut frame = Frame::new();
        screen
            .draw(&mut frame, &reading(None, 0, Status::NO_ECHO))
            .unwrap();
        assert_eq!(frame.lit_in_row(BAR_Y, BAR_START, BAR_END), 0);
    }

    #[test]
    fn redraw_clears_previous_frame() {
        let screen = Screen::new(&Config::DEFAULT);
        let mut frame = Frame::new();
        screen
            .draw(&mut frame, &reading(Some(400.0), 0, Status::Ok))
            .unwrap();
        screen
            .draw(
                &mut frame,
                &reading(Some(40.0), 0, Status::SENSOR_UNAVAILABLE),
            )
            .unwrap();
        assert_eq!(frame.lit_in_row(BAR_Y, BAR_START, BAR_END), 0);
    }
}
