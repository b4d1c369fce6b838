//! Connectivity state machine and connectivity event fan-out.
//!
//! ```text
//!   Idle ──init / toggle on──▶ Advertising ──connect──▶ Connected
//!    ▲                            ▲   │                    │
//!    └────────toggle off──────────┼───┘                    │
//!    ▲                            └──────disconnect────────┤
//!    └──────────────toggle off─────────────────────────────┘
//! ```
//!
//! Every raw event is first fanned out to the registered handlers, then
//! handled here. Driver failures are returned to the caller, which must
//! treat them as fatal.

use crate::ble::adv_payload::{AdvertisingPayload, PayloadComposer};
use crate::ble::{
    AdvParams, ConnectivityEvent, ConnectivityHandler, GapConfig, RadioDriver,
    SecurityParams, UuidProvider,
};
use crate::config::MAX_CONNECTIVITY_HANDLERS;
use crate::error::{Error, RegistryKind};
use crate::registry::Registry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityState {
    /// Not advertising: never initialized, or toggled off.
    Idle,
    /// Broadcasting, no peer.
    Advertising,
    /// One active peer link.
    Connected,
}

pub struct Connectivity<'a, R: RadioDriver> {
    radio: R,
    state: ConnectivityState,
    initialized: bool,
    /// A peer link is up, whatever the advertising mode.
    link_up: bool,
    handlers: Registry<&'a dyn ConnectivityHandler, MAX_CONNECTIVITY_HANDLERS>,
    composer: PayloadComposer<'a>,
    payload: AdvertisingPayload,
    adv_params: AdvParams,
}

impl<'a, R: RadioDriver> Connectivity<'a, R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            state: ConnectivityState::Idle,
            initialized: false,
            link_up: false,
            handlers: Registry::new(RegistryKind::Connectivity),
            composer: PayloadComposer::new(),
            payload: AdvertisingPayload::new(),
            adv_params: AdvParams::default(),
        }
    }

    /// Configure GAP, build the first payload and start advertising.
    pub fn init(&mut self, device_name: &str) -> Result<(), Error> {
        if self.initialized {
            return Ok(());
        }

        self.radio.configure_gap(device_name, &GapConfig::default())?;
        self.payload = self.composer.rebuild();
        self.radio.set_adv_payload(&self.payload)?;
        self.radio.start_advertising(&self.adv_params)?;

        self.initialized = true;
        self.set_state(ConnectivityState::Advertising);
        Ok(())
    }

    /// Handlers are not de-duplicated: registering twice means two calls
    /// per event.
    pub fn register_handler(&mut self, handler: &'a dyn ConnectivityHandler) -> Result<(), Error> {
        self.handlers.register(handler)
    }

    /// Add a UUID provider. After `init` the payload is rebuilt and pushed
    /// immediately; a running advertiser is stopped and restarted around it.
    pub fn register_uuid_provider(&mut self, provider: &'a dyn UuidProvider) -> Result<(), Error> {
        self.composer.register(provider)?;
        if !self.initialized {
            return Ok(());
        }

        let advertising = self.state == ConnectivityState::Advertising;
        if advertising {
            self.stop_advertising_quietly();
        }
        self.payload = self.composer.rebuild();
        self.radio.set_adv_payload(&self.payload)?;
        if advertising {
            self.radio.start_advertising(&self.adv_params)?;
        }
        Ok(())
    }

    /// Flip advertising on/off. Returns the new enabled state.
    ///
    /// Not idempotent: two toggles restore the mode but cost two real radio
    /// state changes. The payload is not rebuilt when turning on. Turning
    /// on while a peer is still linked returns to `Connected`; advertising
    /// resumes when that link drops.
    pub fn toggle(&mut self) -> Result<bool, Error> {
        if !self.initialized {
            #[cfg(feature = "defmt")]
            defmt::warn!("ble: toggle before init ignored");
            return Ok(false);
        }

        match self.state {
            ConnectivityState::Idle if self.link_up => {
                self.set_state(ConnectivityState::Connected);
            }
            ConnectivityState::Idle => {
                self.radio.start_advertising(&self.adv_params)?;
                self.set_state(ConnectivityState::Advertising);
            }
            ConnectivityState::Advertising | ConnectivityState::Connected => {
                self.stop_advertising_quietly();
                self.set_state(ConnectivityState::Idle);
            }
        }
        Ok(self.is_enabled())
    }

    /// Entry point for raw stack events.
    pub fn on_event(&mut self, event: &ConnectivityEvent) -> Result<(), Error> {
        for handler in self.handlers.iter() {
            handler.on_connectivity_event(event);
        }

        match *event {
            ConnectivityEvent::Connected { conn: _conn } => {
                #[cfg(feature = "defmt")]
                defmt::info!("ble: connected (conn {=u16})", _conn);
                self.link_up = true;
                self.radio.indicate_link(true);
                self.set_state(ConnectivityState::Connected);
            }
            ConnectivityEvent::Disconnected { conn: _conn, reason: _reason } => {
                #[cfg(feature = "defmt")]
                defmt::info!("ble: disconnected (conn {=u16}, reason {=u8:#x})", _conn, _reason);
                self.link_up = false;
                self.radio.indicate_link(false);
                if self.state == ConnectivityState::Connected {
                    self.radio.start_advertising(&self.adv_params)?;
                    self.set_state(ConnectivityState::Advertising);
                }
            }
            ConnectivityEvent::SecParamsRequest { conn, .. } => {
                // The peer's proposal is deliberately ignored.
                self.radio
                    .reply_sec_params(conn, &SecurityParams::BADGE_POLICY)?;
            }
            ConnectivityEvent::SecInfoRequest { conn } => {
                if self.is_enabled() {
                    self.radio.reply_sec_info(conn)?;
                }
            }
            ConnectivityEvent::SysAttrMissing { conn } => {
                if self.is_enabled() {
                    self.radio.reply_sys_attrs(conn)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state != ConnectivityState::Idle
    }

    /// The payload currently loaded into the radio.
    pub fn payload(&self) -> &AdvertisingPayload {
        &self.payload
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Stopping an advertiser that is already stopped is harmless, so the
    /// result is only logged.
    fn stop_advertising_quietly(&mut self) {
        if let Err(_e) = self.radio.stop_advertising() {
            #[cfg(feature = "defmt")]
            defmt::debug!("ble: adv stop ignored: {}", _e);
        }
    }

    fn set_state(&mut self, next: ConnectivityState) {
        if next != self.state {
            #[cfg(feature = "defmt")]
            defmt::debug!("ble: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::{AdvUuid, ConnHandle, IoCapabilities};
    use crate::config::MAX_UUIDS_PER_PROVIDER;
    use crate::error::DriverError;
    use core::cell::{Cell, RefCell};
    use heapless::Vec;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Call {
        Gap,
        Payload(usize),
        Start,
        Stop,
        SecParams(ConnHandle, SecurityParams),
        SecInfo(ConnHandle),
        SysAttrs(ConnHandle),
        Link(bool),
    }

    #[derive(Default)]
    struct MockRadio {
        calls: Vec<Call, 64>,
        fail_start: bool,
        fail_stop: bool,
    }

    impl MockRadio {
        fn take(&mut self) -> Vec<Call, 64> {
            core::mem::take(&mut self.calls)
        }
    }

    impl RadioDriver for MockRadio {
        fn configure_gap(&mut self, _name: &str, _gap: &GapConfig) -> Result<(), DriverError> {
            self.calls.push(Call::Gap).unwrap();
            Ok(())
        }

        fn set_adv_payload(&mut self, payload: &AdvertisingPayload) -> Result<(), DriverError> {
            self.calls.push(Call::Payload(payload.len())).unwrap();
            Ok(())
        }

        fn start_advertising(&mut self, _params: &AdvParams) -> Result<(), DriverError> {
            if self.fail_start {
                return Err(DriverError::Raw(8));
            }
            self.calls.push(Call::Start).unwrap();
            Ok(())
        }

        fn stop_advertising(&mut self) -> Result<(), DriverError> {
            self.calls.push(Call::Stop).unwrap();
            if self.fail_stop {
                return Err(DriverError::InvalidState);
            }
            Ok(())
        }

        fn reply_sec_params(
            &mut self,
            conn: ConnHandle,
            params: &SecurityParams,
        ) -> Result<(), DriverError> {
            self.calls.push(Call::SecParams(conn, *params)).unwrap();
            Ok(())
        }

        fn reply_sec_info(&mut self, conn: ConnHandle) -> Result<(), DriverError> {
            self.calls.push(Call::SecInfo(conn)).unwrap();
            Ok(())
        }

        fn reply_sys_attrs(&mut self, conn: ConnHandle) -> Result<(), DriverError> {
            self.calls.push(Call::SysAttrs(conn)).unwrap();
            Ok(())
        }

        fn indicate_link(&mut self, connected: bool) {
            self.calls.push(Call::Link(connected)).unwrap();
        }
    }

    struct Two;

    impl UuidProvider for Two {
        fn provide_uuids(&self, out: &mut Vec<AdvUuid, MAX_UUIDS_PER_PROVIDER>) {
            let _ = out.push(AdvUuid::Uuid16(0x180A));
            let _ = out.push(AdvUuid::Uuid16(0x180F));
        }
    }

    struct Counter<'c> {
        seen: &'c Cell<u32>,
        order: &'c RefCell<Vec<u8, 8>>,
        tag: u8,
    }

    impl ConnectivityHandler for Counter<'_> {
        fn on_connectivity_event(&self, _event: &ConnectivityEvent) {
            self.seen.set(self.seen.get() + 1);
            self.order.borrow_mut().push(self.tag).unwrap();
        }
    }

    fn started() -> Connectivity<'static, MockRadio> {
        let mut c = Connectivity::new(MockRadio::default());
        c.init("NSEC1234").unwrap();
        c.radio_mut().take();
        c
    }

    const PEER: SecurityParams = SecurityParams {
        timeout: 5,
        bond: true,
        mitm: true,
        io_caps: IoCapabilities::KeyboardDisplay,
        oob: true,
        min_key_size: 16,
        max_key_size: 16,
    };

    #[test]
    fn init_builds_payload_and_starts_advertising() {
        let mut c = Connectivity::new(MockRadio::default());
        assert_eq!(c.state(), ConnectivityState::Idle);
        c.init("NSEC1234").unwrap();
        assert_eq!(c.state(), ConnectivityState::Advertising);
        assert_eq!(
            c.radio.calls.as_slice(),
            &[Call::Gap, Call::Payload(0), Call::Start]
        );
        assert_eq!(c.payload().flags(), 0x06);

        // Second init is a no-op.
        c.radio_mut().take();
        c.init("NSEC1234").unwrap();
        assert!(c.radio.calls.is_empty());
    }

    #[test]
    fn toggle_flips_and_reports_enabled_state() {
        let mut c = started();
        assert_eq!(c.toggle(), Ok(false));
        assert_eq!(c.state(), ConnectivityState::Idle);
        assert_eq!(c.toggle(), Ok(true));
        assert_eq!(c.state(), ConnectivityState::Advertising);
        // Two real radio changes, and no payload rebuild on the way back up.
        assert_eq!(c.radio.calls.as_slice(), &[Call::Stop, Call::Start]);
    }

    #[test]
    fn toggle_before_init_does_nothing() {
        let mut c = Connectivity::new(MockRadio::default());
        assert_eq!(c.toggle(), Ok(false));
        assert!(c.radio.calls.is_empty());
        assert_eq!(c.state(), ConnectivityState::Idle);
    }

    #[test]
    fn toggle_off_ignores_stop_failure() {
        let mut c = started();
        c.radio_mut().fail_stop = true;
        assert_eq!(c.toggle(), Ok(false));
        assert_eq!(c.state(), ConnectivityState::Idle);
    }

    #[test]
    fn connect_then_disconnect_restarts_advertising() {
        let mut c = started();
        c.on_event(&ConnectivityEvent::Connected { conn: 1 }).unwrap();
        assert_eq!(c.state(), ConnectivityState::Connected);

        c.on_event(&ConnectivityEvent::Disconnected { conn: 1, reason: 0x13 })
            .unwrap();
        assert_eq!(c.state(), ConnectivityState::Advertising);
        assert_eq!(
            c.radio.calls.as_slice(),
            &[Call::Link(true), Call::Link(false), Call::Start]
        );
    }

    #[test]
    fn disconnect_after_toggle_off_stays_idle() {
        let mut c = started();
        c.on_event(&ConnectivityEvent::Connected { conn: 1 }).unwrap();
        assert_eq!(c.toggle(), Ok(false));
        c.radio_mut().take();

        c.on_event(&ConnectivityEvent::Disconnected { conn: 1, reason: 0x16 })
            .unwrap();
        assert_eq!(c.state(), ConnectivityState::Idle);
        assert_eq!(c.radio.calls.as_slice(), &[Call::Link(false)]);
    }

    #[test]
    fn toggle_cycle_while_linked_then_disconnect_restarts() {
        let mut c = started();
        c.on_event(&ConnectivityEvent::Connected { conn: 2 }).unwrap();
        c.radio_mut().take();

        assert_eq!(c.toggle(), Ok(false));
        assert_eq!(c.toggle(), Ok(true));
        assert_eq!(c.state(), ConnectivityState::Connected);
        assert_eq!(c.radio.calls.as_slice(), &[Call::Stop]);
        c.radio_mut().take();

        c.on_event(&ConnectivityEvent::Disconnected { conn: 2, reason: 0x13 })
            .unwrap();
        assert_eq!(c.state(), ConnectivityState::Advertising);
        assert_eq!(c.radio.calls.as_slice(), &[Call::Link(false), Call::Start]);
    }

    #[test]
    fn restart_failure_after_disconnect_is_fatal() {
        let mut c = started();
        c.on_event(&ConnectivityEvent::Connected { conn: 1 }).unwrap();
        c.radio_mut().fail_start = true;
        let err = c
            .on_event(&ConnectivityEvent::Disconnected { conn: 1, reason: 0x08 })
            .unwrap_err();
        assert_eq!(err, Error::Driver(DriverError::Raw(8)));
        assert!(err.is_fatal());
    }

    #[test]
    fn sec_params_reply_uses_fixed_policy_in_every_state() {
        let mut c = Connectivity::new(MockRadio::default());
        c.on_event(&ConnectivityEvent::SecParamsRequest { conn: 0, peer: PEER })
            .unwrap();
        assert_eq!(
            c.radio.calls.as_slice(),
            &[Call::SecParams(0, SecurityParams::BADGE_POLICY)]
        );

        let mut c = started();
        c.on_event(&ConnectivityEvent::SecParamsRequest { conn: 2, peer: PEER })
            .unwrap();
        c.toggle().unwrap();
        c.radio_mut().take();
        c.on_event(&ConnectivityEvent::SecParamsRequest { conn: 3, peer: PEER })
            .unwrap();
        assert_eq!(
            c.radio.calls.as_slice(),
            &[Call::SecParams(3, SecurityParams::BADGE_POLICY)]
        );
    }

    #[test]
    fn sec_info_and_sys_attrs_answered_only_when_enabled() {
        let mut c = started();
        c.on_event(&ConnectivityEvent::SecInfoRequest { conn: 4 }).unwrap();
        c.on_event(&ConnectivityEvent::SysAttrMissing { conn: 4 }).unwrap();
        assert_eq!(
            c.radio_mut().take().as_slice(),
            &[Call::SecInfo(4), Call::SysAttrs(4)]
        );

        c.toggle().unwrap();
        c.radio_mut().take();
        c.on_event(&ConnectivityEvent::SecInfoRequest { conn: 4 }).unwrap();
        c.on_event(&ConnectivityEvent::SysAttrMissing { conn: 4 }).unwrap();
        assert!(c.radio.calls.is_empty());
    }

    #[test]
    fn provider_registration_restarts_advertising_with_new_payload() {
        let two = Two;
        let mut c = Connectivity::new(MockRadio::default());
        c.init("NSEC1234").unwrap();
        c.radio_mut().take();

        c.register_uuid_provider(&two).unwrap();
        assert_eq!(c.payload().len(), 2);
        assert_eq!(
            c.radio.calls.as_slice(),
            &[Call::Stop, Call::Payload(2), Call::Start]
        );
        assert_eq!(c.state(), ConnectivityState::Advertising);
    }

    #[test]
    fn provider_registration_while_idle_pushes_payload_only() {
        let two = Two;
        let mut c = Connectivity::new(MockRadio::default());
        c.init("NSEC1234").unwrap();
        c.toggle().unwrap();
        c.radio_mut().take();

        c.register_uuid_provider(&two).unwrap();
        assert_eq!(c.radio.calls.as_slice(), &[Call::Payload(2)]);
        assert_eq!(c.state(), ConnectivityState::Idle);
    }

    #[test]
    fn provider_registration_before_init_touches_no_radio() {
        let two = Two;
        let mut c = Connectivity::new(MockRadio::default());
        c.register_uuid_provider(&two).unwrap();
        assert!(c.radio.calls.is_empty());
        c.init("NSEC1234").unwrap();
        assert_eq!(c.payload().len(), 2);
    }

    #[test]
    fn handlers_see_every_event_in_order_including_duplicates() {
        let seen = Cell::new(0);
        let order = RefCell::new(Vec::new());
        let a = Counter { seen: &seen, order: &order, tag: 1 };
        let b = Counter { seen: &seen, order: &order, tag: 2 };
        let mut c = Connectivity::new(MockRadio::default());
        c.register_handler(&a).unwrap();
        c.register_handler(&b).unwrap();
        c.register_handler(&a).unwrap();

        c.on_event(&ConnectivityEvent::Other { conn: 0, id: 0x55 }).unwrap();
        assert_eq!(seen.get(), 3);
        assert_eq!(order.borrow().as_slice(), &[1, 2, 1]);
    }

    #[test]
    fn handler_registry_overflow_is_reported() {
        let seen = Cell::new(0);
        let order = RefCell::new(Vec::new());
        let a = Counter { seen: &seen, order: &order, tag: 0 };
        let mut c = Connectivity::new(MockRadio::default());
        for _ in 0..MAX_CONNECTIVITY_HANDLERS {
            c.register_handler(&a).unwrap();
        }
        assert_eq!(
            c.register_handler(&a),
            Err(Error::RegistryFull(RegistryKind::Connectivity))
        );
    }
}
