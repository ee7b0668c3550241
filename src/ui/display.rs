//! SSD1306 OLED status-log renderer.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use crate::config::STATUS_DISPLAY_LINES;
use crate::statuslog::{Record, StatusLog};

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Display<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    let _ = display.init();
    display.clear_buffer();
    let _ = display.flush();
    display
}

fn text_style() -> embedded_graphics::mono_font::MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

/// Scrolling line buffer: newest record at the bottom.
struct LineBuffer {
    lines: [Record; STATUS_DISPLAY_LINES],
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            lines: [const { Record::new() }; STATUS_DISPLAY_LINES],
        }
    }

    fn push(&mut self, record: Record) {
        self.lines.rotate_left(1);
        self.lines[STATUS_DISPLAY_LINES - 1] = record;
    }
}

fn redraw<I2C>(display: &mut Display<I2C>, buffer: &LineBuffer)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();
    for (row, line) in buffer.lines.iter().enumerate() {
        let y = 10 + (row as i32 * 14);
        let _ = Text::new(line.as_str(), Point::new(0, y), text_style()).draw(display);
    }
    // A failed flush only costs this frame.
    let _ = display.flush();
}

/// Render status records as they arrive. Suspends on the log's receive
/// when there is nothing new to draw.
pub async fn status_display_task<I2C>(mut display: Display<I2C>, log: &'static StatusLog) -> !
where
    I2C: embedded_hal::i2c::I2c,
{
    let mut buffer = LineBuffer::new();
    loop {
        let record = log.next().await;
        buffer.push(record);
        redraw(&mut display, &buffer);
    }
}
