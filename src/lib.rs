//! Event dispatch and BLE connectivity core of the badge firmware.
//!
//! Everything in this library is hardware-independent: the radio stack and
//! the tick counter are reached through traits, so the whole core runs on
//! the host.
//!
//! Usage: `cargo test --lib` (unit tests) or `cargo test` (plus
//! `tests/integration.rs`).
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and is only built with `--features embedded`.

#![cfg_attr(not(test), no_std)]

pub mod badge;
pub mod ble;
pub mod config;
pub mod device_id;
pub mod error;
pub mod input;
pub mod registry;
pub mod time;

pub use badge::{Badge, CoreEvent};
pub use ble::connectivity::ConnectivityState;
pub use error::{DriverError, Error, RegistryKind};
pub use input::{ButtonEvent, ButtonHandler, ConsumerId, RawInputEvent};
pub use time::{Tick, TickSource};
