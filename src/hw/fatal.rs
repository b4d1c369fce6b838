//! Fatal error path: log, blink the red LED, reset.

use badge_runtime::config::{FATAL_BLINK_COUNT, FATAL_BLINK_MS};
use badge_runtime::Error;
use embassy_nrf::gpio::Output;
use embassy_time::{Duration, Timer};

/// Never returns. `error_led` is active-low.
pub async fn halt(error: Error, error_led: &mut Output<'static>) -> ! {
    defmt::error!("fatal: {}", error);

    error_led.set_high();
    for _ in 0..FATAL_BLINK_COUNT {
        error_led.toggle();
        Timer::after(Duration::from_millis(FATAL_BLINK_MS)).await;
    }

    cortex_m::peripheral::SCB::sys_reset()
}
