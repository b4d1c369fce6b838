//! nRF52840 bindings for the badge core.
//!
//! Everything here runs only on the target:
//!
//! - **radio**: SoftDevice-backed `RadioDriver` plus the advertising task
//! - **touch**: SPI-slave task turning controller frames into raw input
//! - **status**: status screen feature module (buttons, link, UUIDs)
//! - **display**: SSD1306 OLED rendering
//! - **fatal**: error LED blink and reset

pub mod display;
pub mod fatal;
pub mod radio;
pub mod status;
pub mod touch;

use badge_runtime::{Tick, TickSource};
use embassy_time::Instant;

/// Tick source backed by the embassy time driver (RTC1, 32.768 kHz).
///
/// The 64-bit embassy tick count is truncated; `TickSource::diff` wraps.
#[derive(Clone, Copy, Default)]
pub struct EmbassyTicks;

impl TickSource for EmbassyTicks {
    fn now(&self) -> Tick {
        Tick(Instant::now().as_ticks() as u32)
    }
}
