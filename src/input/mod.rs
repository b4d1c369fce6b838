//! Touch input subsystem - raw transitions to discrete button presses.
//!
//! The capacitive touch controller is an SPI master; the badge is the SPI
//! slave and receives one 2-byte frame per touch transition:
//! `[transition, button]`.
//!
//! ## Components
//!
//! - **Debounce**: refractory-window filter, raw frame → `ButtonEvent`
//! - **Controls**: bounded registry of button consumers, ordered fan-out

pub mod controls;
pub mod debounce;

use crate::config::TOUCH_FRAME_LEN;
use crate::time::Tick;

/// Discrete button presses delivered to feature modules (after debouncing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    Up,
    Down,
    Left,
    Right,
    Back,
    Enter,
}

/// Touch pad codes as sent by the touch controller.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchButton {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    Back = 4,
    Enter = 5,
}

impl TryFrom<u8> for TouchButton {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        match code {
            0 => Ok(TouchButton::Up),
            1 => Ok(TouchButton::Down),
            2 => Ok(TouchButton::Left),
            3 => Ok(TouchButton::Right),
            4 => Ok(TouchButton::Back),
            5 => Ok(TouchButton::Enter),
            other => Err(other),
        }
    }
}

impl From<TouchButton> for ButtonEvent {
    fn from(button: TouchButton) -> Self {
        match button {
            TouchButton::Up => ButtonEvent::Up,
            TouchButton::Down => ButtonEvent::Down,
            TouchButton::Left => ButtonEvent::Left,
            TouchButton::Right => ButtonEvent::Right,
            TouchButton::Back => ButtonEvent::Back,
            TouchButton::Enter => ButtonEvent::Enter,
        }
    }
}

/// Finger down / finger up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    Down,
    Up,
}

impl TryFrom<u8> for Transition {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        match code {
            0 => Ok(Transition::Down),
            1 => Ok(Transition::Up),
            other => Err(other),
        }
    }
}

/// One transition reported by the touch controller.
///
/// `button` stays a raw code: mapping happens in the debounce filter, where
/// unknown codes are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawInputEvent {
    pub button: u8,
    pub transition: Transition,
    pub timestamp: Tick,
}

impl RawInputEvent {
    /// Parse a `[transition, button]` SPI frame captured at `timestamp`.
    ///
    /// Returns `None` for short frames or an unknown transition byte.
    pub fn from_frame(frame: &[u8], timestamp: Tick) -> Option<Self> {
        if frame.len() < TOUCH_FRAME_LEN {
            return None;
        }
        let transition = Transition::try_from(frame[0]).ok()?;
        Some(Self {
            button: frame[1],
            transition,
            timestamp,
        })
    }
}

/// Stable identity of a consumer, used where registrations de-duplicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsumerId(pub u8);

/// A feature module interested in button presses.
///
/// Handlers run synchronously in the main loop and must return in bounded
/// time; they keep their own state behind `Cell`/`RefCell`.
pub trait ButtonHandler {
    /// Identity used to ignore repeated registrations of the same handler.
    fn consumer_id(&self) -> ConsumerId;

    fn on_button(&self, button: ButtonEvent);
}
