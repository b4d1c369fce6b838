//! Application-wide constants and compile-time configuration.
//!
//! Registry capacities, timing parameters, and BLE protocol constants
//! live here so they can be tuned in one place.

// Registries

/// Maximum number of connectivity event handlers.
pub const MAX_CONNECTIVITY_HANDLERS: usize = 8;

/// Maximum number of advertising UUID providers.
pub const MAX_UUID_PROVIDERS: usize = 8;

/// Maximum number of button handlers.
pub const MAX_BUTTON_HANDLERS: usize = 8;

// Advertising payload

/// Hard cap on service UUIDs in one advertising payload.
pub const MAX_ADV_UUIDS: usize = 16;

/// Identifiers a single provider may contribute per rebuild.
pub const MAX_UUIDS_PER_PROVIDER: usize = 4;

/// AD flags: LE General Discoverable Mode, BR/EDR not supported.
pub const ADV_FLAGS_LE_ONLY_GENERAL_DISC: u8 = 0x06;

/// Legacy advertising data limit (bytes).
pub const ADV_DATA_MAX_LEN: usize = 31;

/// Advertising interval (in 0.625 ms units). 1945 = 1216 ms.
pub const ADV_INTERVAL: u32 = 1945;

// GAP

/// Preferred connection interval range (in 1.25 ms units).
/// 16 = 20 ms, 32 = 40 ms.
pub const BLE_CONN_INTERVAL_MIN: u16 = 16;
pub const BLE_CONN_INTERVAL_MAX: u16 = 32;

/// BLE slave latency (number of connection events the badge can skip).
pub const BLE_SLAVE_LATENCY: u16 = 5;

/// BLE supervision timeout (in 10 ms units). 30 = 300 ms.
pub const BLE_SUP_TIMEOUT: u16 = 30;

/// GAP appearance "Unknown".
pub const BLE_APPEARANCE_UNKNOWN: u16 = 0;

/// Maximum length of the GAP device name / device identifier.
pub const DEVICE_ID_MAX_LEN: usize = 16;

// Security policy

/// Pairing procedure timeout (seconds).
pub const SEC_TIMEOUT_SECS: u8 = 30;

/// Encryption key size bounds (bytes).
pub const SEC_MIN_KEY_SIZE: u8 = 7;
pub const SEC_MAX_KEY_SIZE: u8 = 16;

// Touch input

/// Debounce window in RTC ticks (32.768 kHz). 3000 ticks ≈ 92 ms.
pub const DEBOUNCE_TICKS: u32 = 3000;

/// Size of one frame from the touch controller: [transition, button].
pub const TOUCH_FRAME_LEN: usize = 2;

// Event queue

/// Depth of the interrupt → main loop event queue.
pub const EVENT_QUEUE_DEPTH: usize = 12;

// GPIO pin assignments (badge PCB)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.
//
//   Touch SPIS MOSI    → P0.12
//   Touch SPIS MISO    → P0.13
//   Touch SPIS SCK     → P0.14
//   Touch SPIS CSN     → P0.15
//   I²C SDA            → P0.26
//   I²C SCL            → P0.27
//   Link LED (green)   → P0.28 (active-low)
//   Error LED (red)    → P0.29 (active-low)

/// Number of error LED blinks before the fatal handler resets the chip.
pub const FATAL_BLINK_COUNT: u8 = 10;

/// Error LED blink half-period (ms).
pub const FATAL_BLINK_MS: u64 = 500;
