//! SSD1306 OLED status surface.
//!
//! Implements [`StatusSurface`] on a 128x64 panel in buffered graphics mode.
//! Text screens are four rows of the 6x10 font at y = 0, 10, 20, 30; the
//! readout screen puts the value in the 10x20 font under a horizontal rule.
//!
//! Draw and flush errors after bring-up are logged and dropped: a glitched
//! frame is replaced on the next refresh.

use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Baseline, Text},
};
use embedded_hal::i2c::I2c;
use log::{info, warn};
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use crate::app::ports::StatusSurface;
use crate::error::DisplayError;
use crate::pins::OLED_I2C_ADDR;

/// Rows of the four-line text screen.
const ROW_Y: [i32; 4] = [0, 10, 20, 30];
const RULE_Y: i32 = 12;
const VALUE_Y: i32 = 20;

type Panel<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

pub struct OledStatusSurface<I2C: I2c> {
    panel: Panel<I2C>,
    powered: bool,
}

impl<I2C: I2c> OledStatusSurface<I2C> {
    /// Initialise the panel at [`OLED_I2C_ADDR`] and blank it.
    pub fn new(i2c: I2C) -> Result<Self, DisplayError> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, OLED_I2C_ADDR);
        let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        panel.init().map_err(|_| DisplayError::InitFailed)?;
        panel
            .clear(BinaryColor::Off)
            .map_err(|_| DisplayError::InitFailed)?;
        panel.flush().map_err(|_| DisplayError::FlushFailed)?;
        info!("display: SSD1306 128x64 ready");
        Ok(Self {
            panel,
            powered: true,
        })
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    fn small() -> MonoTextStyle<'static, BinaryColor> {
        MonoTextStyle::new(&FONT_6X10, BinaryColor::On)
    }

    fn draw_text_screen(&mut self, lines: &[&str; 4]) -> Result<(), DisplayError> {
        self.panel
            .clear(BinaryColor::Off)
            .map_err(|_| DisplayError::FlushFailed)?;
        for (line, y) in lines.iter().zip(ROW_Y) {
            if line.is_empty() {
                continue;
            }
            Text::with_baseline(line, Point::new(0, y), Self::small(), Baseline::Top)
                .draw(&mut self.panel)
                .map_err(|_| DisplayError::FlushFailed)?;
        }
        self.panel.flush().map_err(|_| DisplayError::FlushFailed)
    }

    fn draw_readout(&mut self, header: &str, value: &str, unit: &str) -> Result<(), DisplayError> {
        self.panel
            .clear(BinaryColor::Off)
            .map_err(|_| DisplayError::FlushFailed)?;
        Text::with_baseline(header, Point::new(0, ROW_Y[0]), Self::small(), Baseline::Top)
            .draw(&mut self.panel)
            .map_err(|_| DisplayError::FlushFailed)?;
        Line::new(Point::new(0, RULE_Y), Point::new(127, RULE_Y))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.panel)
            .map_err(|_| DisplayError::FlushFailed)?;

        let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        let next = Text::with_baseline(value, Point::new(0, VALUE_Y), large, Baseline::Top)
            .draw(&mut self.panel)
            .map_err(|_| DisplayError::FlushFailed)?;
        // Unit sits on the value's baseline row, in the small font.
        Text::with_baseline(unit, Point::new(next.x, VALUE_Y + 8), Self::small(), Baseline::Top)
            .draw(&mut self.panel)
            .map_err(|_| DisplayError::FlushFailed)?;
        self.panel.flush().map_err(|_| DisplayError::FlushFailed)
    }
}

impl<I2C: I2c> StatusSurface for OledStatusSurface<I2C> {
    fn show(&mut self, lines: &[&str; 4]) {
        if let Err(e) = self.draw_text_screen(lines) {
            warn!("display: {e}");
        }
    }

    fn show_readout(&mut self, header: &str, value: &str, unit: &str) {
        if let Err(e) = self.draw_readout(header, value, unit) {
            warn!("display: {e}");
        }
    }

    fn set_powered(&mut self, on: bool) {
        match self.panel.set_display_on(on) {
            Ok(()) => self.powered = on,
            Err(_) => warn!("display: power {} failed", if on { "on" } else { "off" }),
        }
    }
}
