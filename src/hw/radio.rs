//! SoftDevice S140 binding for the connectivity core.
//!
//! The core drives the radio synchronously from the main loop, while the
//! SoftDevice advertising API is async. `SoftdeviceRadio` therefore posts
//! start/stop commands to `advertising_task`, which owns the advertiser and
//! the live connection and reports link changes back as `CoreEvent`s.
//!
//! nrf-softdevice answers pairing requests itself through a
//! `SecurityHandler`; `BadgeSecurity` gives it the same fixed policy the
//! core uses, so the `reply_*` calls only log.

use badge_runtime::ble::ad_encoder;
use badge_runtime::ble::adv_payload::AdvertisingPayload;
use badge_runtime::ble::{
    AdvParams, ConnHandle, ConnectivityEvent, GapConfig, IoCapabilities as PolicyIoCaps,
    RadioDriver, SecurityParams,
};
use badge_runtime::config::{ADV_DATA_MAX_LEN, EVENT_QUEUE_DEPTH};
use badge_runtime::{CoreEvent, DriverError};
use defmt::{debug, error, info};
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{peripheral, Connection, EncryptionInfo, MasterId, SecurityMode};
use nrf_softdevice::{raw, Softdevice};

/// Depth of the main loop → advertising task command channel.
pub const ADV_COMMAND_DEPTH: usize = 4;

/// How often a live link is checked for disconnection.
const LINK_POLL_MS: u64 = 100;

/// nrf-softdevice does not surface the HCI disconnect reason.
const REASON_UNREPORTED: u8 = 0xFF;

pub type AdvCommands = Channel<CriticalSectionRawMutex, AdvCommand, ADV_COMMAND_DEPTH>;

type EventSender = Sender<'static, CriticalSectionRawMutex, CoreEvent, EVENT_QUEUE_DEPTH>;

/// Encoded advertising data, ready for the SoftDevice.
#[derive(Clone, Copy)]
pub struct AdvFrame {
    data: [u8; ADV_DATA_MAX_LEN],
    len: usize,
}

impl AdvFrame {
    pub const fn empty() -> Self {
        Self {
            data: [0; ADV_DATA_MAX_LEN],
            len: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

#[derive(Clone, Copy)]
pub enum AdvCommand {
    Start(AdvFrame, AdvParams),
    Stop,
}

pub struct SoftdeviceRadio {
    frame: AdvFrame,
    commands: Sender<'static, CriticalSectionRawMutex, AdvCommand, ADV_COMMAND_DEPTH>,
    link_led: Output<'static>,
}

impl SoftdeviceRadio {
    /// `link_led` is active-low and starts off.
    pub fn new(
        commands: Sender<'static, CriticalSectionRawMutex, AdvCommand, ADV_COMMAND_DEPTH>,
        link_led: Output<'static>,
    ) -> Self {
        Self {
            frame: AdvFrame::empty(),
            commands,
            link_led,
        }
    }

    fn post(&self, command: AdvCommand) -> Result<(), DriverError> {
        self.commands
            .try_send(command)
            .map_err(|_| DriverError::Busy)
    }
}

fn check(ret: u32) -> Result<(), DriverError> {
    if ret == raw::NRF_SUCCESS {
        Ok(())
    } else {
        Err(DriverError::Raw(ret))
    }
}

impl RadioDriver for SoftdeviceRadio {
    fn configure_gap(&mut self, device_name: &str, gap: &GapConfig) -> Result<(), DriverError> {
        // Open link, no protection required to read the name.
        let open = raw::ble_gap_conn_sec_mode_t {
            _bitfield_1: raw::ble_gap_conn_sec_mode_t::new_bitfield_1(1, 1),
        };
        let ppcp = raw::ble_gap_conn_params_t {
            min_conn_interval: gap.min_conn_interval,
            max_conn_interval: gap.max_conn_interval,
            slave_latency: gap.slave_latency,
            conn_sup_timeout: gap.conn_sup_timeout,
        };

        // SAFETY: the SoftDevice is enabled before the core is initialized and
        // copies every argument before returning.
        unsafe {
            check(raw::sd_ble_gap_device_name_set(
                &open,
                device_name.as_ptr(),
                device_name.len() as u16,
            ))?;
            check(raw::sd_ble_gap_appearance_set(gap.appearance))?;
            check(raw::sd_ble_gap_ppcp_set(&ppcp))?;
        }
        info!("radio: GAP name {=str}", device_name);
        Ok(())
    }

    fn set_adv_payload(&mut self, payload: &AdvertisingPayload) -> Result<(), DriverError> {
        let mut frame = AdvFrame::empty();
        frame.len = ad_encoder::encode(payload, &mut frame.data)?;
        self.frame = frame;
        debug!("radio: adv data {=[u8]:x}", self.frame.as_bytes());
        Ok(())
    }

    fn start_advertising(&mut self, params: &AdvParams) -> Result<(), DriverError> {
        self.post(AdvCommand::Start(self.frame, *params))
    }

    fn stop_advertising(&mut self) -> Result<(), DriverError> {
        self.post(AdvCommand::Stop)
    }

    fn reply_sec_params(
        &mut self,
        conn: ConnHandle,
        params: &SecurityParams,
    ) -> Result<(), DriverError> {
        debug!(
            "radio: conn {=u16} pairing policy bond={=bool} mitm={=bool}",
            conn, params.bond, params.mitm
        );
        Ok(())
    }

    fn reply_sec_info(&mut self, conn: ConnHandle) -> Result<(), DriverError> {
        debug!("radio: conn {=u16} no keys stored", conn);
        Ok(())
    }

    fn reply_sys_attrs(&mut self, conn: ConnHandle) -> Result<(), DriverError> {
        debug!("radio: conn {=u16} no system attributes", conn);
        Ok(())
    }

    fn indicate_link(&mut self, connected: bool) {
        if connected {
            self.link_led.set_low();
        } else {
            self.link_led.set_high();
        }
    }
}

/// Hands `SecurityParams::BADGE_POLICY` to the SoftDevice: just-works, no
/// bonding, nothing stored.
struct BadgeSecurity;

impl SecurityHandler for BadgeSecurity {
    fn io_capabilities(&self) -> IoCapabilities {
        match SecurityParams::BADGE_POLICY.io_caps {
            PolicyIoCaps::DisplayOnly => IoCapabilities::DisplayOnly,
            PolicyIoCaps::DisplayYesNo => IoCapabilities::DisplayYesNo,
            PolicyIoCaps::KeyboardOnly => IoCapabilities::KeyboardOnly,
            PolicyIoCaps::KeyboardDisplay => IoCapabilities::KeyboardDisplay,
            PolicyIoCaps::None => IoCapabilities::None,
        }
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        SecurityParams::BADGE_POLICY.bond
    }

    fn get_key(&self, _conn: &Connection, _master_id: MasterId) -> Option<EncryptionInfo> {
        None
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        info!("radio: security mode {}", mode);
    }
}

static SECURITY: BadgeSecurity = BadgeSecurity;

/// Owns the advertiser and the peer link.
///
/// Waits for a `Start`, advertises until a central connects or a new
/// command arrives, then holds the link until it drops. A `Start` received
/// while linked is remembered and applied once the link is gone.
#[embassy_executor::task]
pub async fn advertising_task(
    sd: &'static Softdevice,
    commands: Receiver<'static, CriticalSectionRawMutex, AdvCommand, ADV_COMMAND_DEPTH>,
    events: EventSender,
) -> ! {
    let mut pending: Option<(AdvFrame, AdvParams)> = None;

    loop {
        let (frame, params) = match pending.take() {
            Some(start) => start,
            None => match commands.receive().await {
                AdvCommand::Start(frame, params) => (frame, params),
                AdvCommand::Stop => continue,
            },
        };

        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: frame.as_bytes(),
            scan_data: &[],
        };
        let config = peripheral::Config {
            interval: params.interval,
            timeout: params.timeout,
            ..Default::default()
        };

        info!("radio: advertising");
        let advertise = peripheral::advertise_pairable(sd, adv, &config, &SECURITY);
        let conn = match select(advertise, commands.receive()).await {
            Either::First(Ok(conn)) => conn,
            Either::First(Err(e)) => {
                error!("radio: advertising failed: {:?}", e);
                events.send(CoreEvent::DriverFault(advertise_fault(e))).await;
                continue;
            }
            Either::Second(AdvCommand::Start(frame, params)) => {
                pending = Some((frame, params));
                continue;
            }
            Either::Second(AdvCommand::Stop) => {
                info!("radio: advertising stopped");
                continue;
            }
        };

        let Some(handle) = conn.handle() else {
            continue;
        };
        events
            .send(CoreEvent::Connectivity(ConnectivityEvent::Connected { conn: handle }))
            .await;

        pending = hold_link(&conn, &commands).await;

        events
            .send(CoreEvent::Connectivity(ConnectivityEvent::Disconnected {
                conn: handle,
                reason: REASON_UNREPORTED,
            }))
            .await;
    }
}

/// Advertising runs without a timeout, so every end other than a
/// connection is a fault.
fn advertise_fault(e: peripheral::AdvertiseError) -> DriverError {
    match e {
        peripheral::AdvertiseError::Raw(r) => DriverError::Raw(r as u32),
        _ => DriverError::InvalidState,
    }
}

/// Keep `conn` alive until the peer goes away. Returns the last `Start`
/// received meanwhile, unless a later `Stop` cancelled it.
async fn hold_link(
    conn: &Connection,
    commands: &Receiver<'static, CriticalSectionRawMutex, AdvCommand, ADV_COMMAND_DEPTH>,
) -> Option<(AdvFrame, AdvParams)> {
    let mut pending = None;
    loop {
        match select(Timer::after(Duration::from_millis(LINK_POLL_MS)), commands.receive()).await {
            Either::First(()) => {
                if conn.handle().is_none() {
                    return pending;
                }
            }
            Either::Second(AdvCommand::Start(frame, params)) => pending = Some((frame, params)),
            Either::Second(AdvCommand::Stop) => pending = None,
        }
    }
}
