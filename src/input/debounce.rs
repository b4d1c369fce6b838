//! Refractory-window debounce for touch transitions.
//!
//! Any transition closer than `threshold` ticks to the last *accepted* one
//! is dropped without touching the window. Accepted "down" transitions are
//! mapped to a `ButtonEvent`; "up" transitions only move the window.

use crate::input::{ButtonEvent, RawInputEvent, TouchButton, Transition};
use crate::time::{Tick, TickSource};

pub struct DebounceFilter {
    last_accepted: Tick,
    threshold: u32,
}

impl DebounceFilter {
    /// Start a window at `now`; transitions within `threshold` ticks of it
    /// are ignored.
    pub const fn new(now: Tick, threshold: u32) -> Self {
        Self {
            last_accepted: now,
            threshold,
        }
    }

    pub fn last_accepted(&self) -> Tick {
        self.last_accepted
    }

    pub fn on_raw_event(
        &mut self,
        event: RawInputEvent,
        ticks: &impl TickSource,
    ) -> Option<ButtonEvent> {
        let elapsed = ticks.diff(event.timestamp, self.last_accepted);
        if elapsed < self.threshold {
            return None;
        }
        self.last_accepted = event.timestamp;

        if event.transition != Transition::Down {
            return None;
        }

        match TouchButton::try_from(event.button) {
            Ok(button) => Some(button.into()),
            Err(_code) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("touch: unmapped button code {=u8}", _code);
                None
            }
        }
    }
}
