//! Touch controller link.
//!
//! The touch controller is the SPI master; the badge listens as SPI slave
//! and receives one `[transition, button]` frame per touch change. Frames
//! are timestamped on receipt and queued for the main loop, which does the
//! debouncing.

use badge_runtime::config::{EVENT_QUEUE_DEPTH, TOUCH_FRAME_LEN};
use badge_runtime::{CoreEvent, RawInputEvent, TickSource};
use defmt::{debug, warn};
use embassy_nrf::peripherals::SPI2;
use embassy_nrf::spis::Spis;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;

use crate::hw::EmbassyTicks;

#[embassy_executor::task]
pub async fn touch_task(
    mut spis: Spis<'static, SPI2>,
    events: Sender<'static, CriticalSectionRawMutex, CoreEvent, EVENT_QUEUE_DEPTH>,
) -> ! {
    loop {
        let mut frame = [0u8; TOUCH_FRAME_LEN];
        let len = match spis.read(&mut frame).await {
            Ok(len) => len,
            Err(e) => {
                warn!("touch: SPIS error {:?}", e);
                continue;
            }
        };

        let Some(raw) = RawInputEvent::from_frame(&frame[..len], EmbassyTicks.now()) else {
            debug!("touch: malformed frame {=[u8]:x}", &frame[..len]);
            continue;
        };

        // Never block the controller link on a slow main loop.
        if events.try_send(CoreEvent::RawInput(raw)).is_err() {
            warn!("touch: event queue full, frame dropped");
        }
    }
}
