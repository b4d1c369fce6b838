//! Bluetooth Low Energy connectivity core.
//!
//! The badge runs the Nordic SoftDevice in **Peripheral** role. This module
//! owns everything above the stack:
//!
//! 1. **Payload composer** - collects service UUIDs from registered feature
//!    modules into one bounded advertising payload.
//! 2. **Connectivity state machine** - advertising on/off, connect and
//!    disconnect bookkeeping, the fixed security policy, fan-out of raw
//!    connectivity events to registered handlers.
//! 3. **AD encoder** - turns a payload into on-air AD structures for the
//!    SoftDevice binding.
//!
//! The stack itself is reached through the `RadioDriver` trait.

pub mod ad_encoder;
pub mod adv_payload;
pub mod connectivity;

use crate::config;
use crate::error::DriverError;
use adv_payload::AdvertisingPayload;
use heapless::Vec;

/// SoftDevice connection handle.
pub type ConnHandle = u16;

/// A service identifier advertised by a feature module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvUuid {
    /// 16-bit UUID on the Bluetooth SIG base.
    Uuid16(u16),
    /// Full vendor-specific UUID, little-endian byte order.
    Uuid128([u8; 16]),
}

/// IO capabilities announced during pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoCapabilities {
    DisplayOnly,
    DisplayYesNo,
    KeyboardOnly,
    None,
    KeyboardDisplay,
}

/// Pairing parameters exchanged on a security-parameters request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityParams {
    /// Pairing timeout (seconds).
    pub timeout: u8,
    pub bond: bool,
    pub mitm: bool,
    pub io_caps: IoCapabilities,
    pub oob: bool,
    pub min_key_size: u8,
    pub max_key_size: u8,
}

impl SecurityParams {
    /// The badge's fixed answer to every pairing request: just-works
    /// encryption, no MITM protection, no bonding.
    pub const BADGE_POLICY: SecurityParams = SecurityParams {
        timeout: config::SEC_TIMEOUT_SECS,
        bond: false,
        mitm: false,
        io_caps: IoCapabilities::None,
        oob: false,
        min_key_size: config::SEC_MIN_KEY_SIZE,
        max_key_size: config::SEC_MAX_KEY_SIZE,
    };
}

/// Raw connectivity events from the radio stack.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityEvent {
    /// A central connected.
    Connected { conn: ConnHandle },
    /// The link was closed (`reason` is the HCI status code).
    Disconnected { conn: ConnHandle, reason: u8 },
    /// The peer started pairing and wants our parameters.
    SecParamsRequest {
        conn: ConnHandle,
        peer: SecurityParams,
    },
    /// The peer wants stored keys to re-encrypt the link.
    SecInfoRequest { conn: ConnHandle },
    /// No persisted system attributes (CCCDs) for this link.
    SysAttrMissing { conn: ConnHandle },
    /// Any other stack event, passed through to handlers untouched.
    Other { conn: ConnHandle, id: u16 },
}

/// GAP parameters pushed once at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GapConfig {
    pub appearance: u16,
    /// Connection interval range (1.25 ms units).
    pub min_conn_interval: u16,
    pub max_conn_interval: u16,
    pub slave_latency: u16,
    /// Supervision timeout (10 ms units).
    pub conn_sup_timeout: u16,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            appearance: config::BLE_APPEARANCE_UNKNOWN,
            min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
            max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
            slave_latency: config::BLE_SLAVE_LATENCY,
            conn_sup_timeout: config::BLE_SUP_TIMEOUT,
        }
    }
}

/// Connectable undirected advertising, any peer, never times out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvParams {
    /// Interval in 0.625 ms units.
    pub interval: u32,
    /// Advertising timeout in seconds, `None` = forever.
    pub timeout: Option<u16>,
}

impl Default for AdvParams {
    fn default() -> Self {
        Self {
            interval: config::ADV_INTERVAL,
            timeout: None,
        }
    }
}

/// The radio stack as seen by the connectivity core.
///
/// Every call is non-blocking. An `Err` is a driver failure and is treated
/// as fatal by the caller.
pub trait RadioDriver {
    /// Set device name, appearance and preferred connection parameters.
    fn configure_gap(&mut self, device_name: &str, gap: &GapConfig) -> Result<(), DriverError>;

    fn set_adv_payload(&mut self, payload: &AdvertisingPayload) -> Result<(), DriverError>;

    fn start_advertising(&mut self, params: &AdvParams) -> Result<(), DriverError>;

    fn stop_advertising(&mut self) -> Result<(), DriverError>;

    fn reply_sec_params(
        &mut self,
        conn: ConnHandle,
        params: &SecurityParams,
    ) -> Result<(), DriverError>;

    /// Answer a security-info request with "no keys stored".
    fn reply_sec_info(&mut self, conn: ConnHandle) -> Result<(), DriverError>;

    /// Answer a missing system-attributes notification with an empty set.
    fn reply_sys_attrs(&mut self, conn: ConnHandle) -> Result<(), DriverError>;

    /// Drive the "peer connected" indicator.
    fn indicate_link(&mut self, connected: bool);
}

/// A feature module interested in raw connectivity events.
pub trait ConnectivityHandler {
    fn on_connectivity_event(&self, event: &ConnectivityEvent);
}

/// A feature module contributing service UUIDs to the advertising payload.
pub trait UuidProvider {
    /// Push up to `MAX_UUIDS_PER_PROVIDER` identifiers into `out`.
    fn provide_uuids(&self, out: &mut Vec<AdvUuid, { config::MAX_UUIDS_PER_PROVIDER }>);
}
