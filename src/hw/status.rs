//! Status screen feature module.
//!
//! Marks the OLED for redraw on link changes, remembers the last button and
//! lets the user flip advertising with ENTER. It only touches its own
//! cells; requests for the core go back through the event queue.

use core::cell::Cell;

use badge_runtime::ble::{AdvUuid, ConnectivityEvent, ConnectivityHandler, UuidProvider};
use badge_runtime::config::{EVENT_QUEUE_DEPTH, MAX_UUIDS_PER_PROVIDER};
use badge_runtime::{ButtonEvent, ButtonHandler, ConsumerId, CoreEvent};
use defmt::warn;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use heapless::Vec;

/// Vendor UUID identifying a badge to the companion app, little-endian as
/// it goes on air. No GATT service is hosted under it.
const BADGE_STATUS_UUID: [u8; 16] = [
    0x3c, 0x9a, 0x52, 0x1e, 0x7b, 0x44, 0x4f, 0x8d, 0xa1, 0x06, 0xe2, 0x51, 0x00, 0xb0, 0x6d, 0x5a,
];

pub struct StatusScreen {
    last_button: Cell<Option<ButtonEvent>>,
    dirty: Cell<bool>,
    requests: Sender<'static, CriticalSectionRawMutex, CoreEvent, EVENT_QUEUE_DEPTH>,
}

impl StatusScreen {
    pub fn new(
        requests: Sender<'static, CriticalSectionRawMutex, CoreEvent, EVENT_QUEUE_DEPTH>,
    ) -> Self {
        Self {
            last_button: Cell::new(None),
            dirty: Cell::new(true),
            requests,
        }
    }

    pub fn last_button(&self) -> Option<ButtonEvent> {
        self.last_button.get()
    }

    /// Returns `true` once per change.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }
}

impl ButtonHandler for StatusScreen {
    fn consumer_id(&self) -> ConsumerId {
        ConsumerId(1)
    }

    fn on_button(&self, button: ButtonEvent) {
        self.last_button.set(Some(button));
        self.dirty.set(true);

        if button == ButtonEvent::Enter
            && self.requests.try_send(CoreEvent::ToggleAdvertising).is_err()
        {
            warn!("status: event queue full, toggle dropped");
        }
    }
}

impl ConnectivityHandler for StatusScreen {
    fn on_connectivity_event(&self, event: &ConnectivityEvent) {
        if matches!(
            event,
            ConnectivityEvent::Connected { .. } | ConnectivityEvent::Disconnected { .. }
        ) {
            self.dirty.set(true);
        }
    }
}

impl UuidProvider for StatusScreen {
    fn provide_uuids(&self, out: &mut Vec<AdvUuid, MAX_UUIDS_PER_PROVIDER>) {
        let _ = out.push(AdvUuid::Uuid128(BADGE_STATUS_UUID));
    }
}
