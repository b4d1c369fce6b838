//! SSD1306 OLED status screen.

use core::fmt::Write;

use badge_runtime::{ButtonEvent, ConnectivityState};
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use heapless::String;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Concrete display driver, generic over the HAL's I²C peripheral.
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

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

fn state_label(state: ConnectivityState) -> &'static str {
    match state {
        ConnectivityState::Idle => "BLE off",
        ConnectivityState::Advertising => "Advertising",
        ConnectivityState::Connected => "Connected",
    }
}

fn button_label(button: ButtonEvent) -> &'static str {
    match button {
        ButtonEvent::Up => "UP",
        ButtonEvent::Down => "DOWN",
        ButtonEvent::Left => "LEFT",
        ButtonEvent::Right => "RIGHT",
        ButtonEvent::Back => "BACK",
        ButtonEvent::Enter => "ENTER",
    }
}

/// Render the status screen: badge id, radio state, last key.
pub fn draw_status<I2C>(
    display: &mut Display<I2C>,
    device_id: &str,
    state: ConnectivityState,
    last_button: Option<ButtonEvent>,
) where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::new(device_id, Point::new(0, 10), text_style()).draw(display);
    let _ = Text::new(state_label(state), Point::new(0, 24), text_style()).draw(display);

    if let Some(button) = last_button {
        let mut line: String<16> = String::new();
        let _ = write!(line, "Key: {}", button_label(button));
        let _ = Text::new(line.as_str(), Point::new(0, 38), text_style()).draw(display);
    }

    let hint = if state == ConnectivityState::Idle {
        "ENTER: radio on"
    } else {
        "ENTER: radio off"
    };
    let _ = Text::new(hint, Point::new(0, 52), text_style()).draw(display);

    let _ = display.flush();
}
