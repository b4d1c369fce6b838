//! Top-level runtime context.
//!
//! `Badge` owns every registry, the connectivity state and the debounce
//! window. Interrupt-side producers never touch it directly: they push a
//! `CoreEvent` into a bounded queue, and the main loop (the single owner)
//! drains that queue through `process` / `drain`.

use crate::ble::adv_payload::AdvertisingPayload;
use crate::ble::connectivity::{Connectivity, ConnectivityState};
use crate::ble::{ConnectivityEvent, ConnectivityHandler, RadioDriver, UuidProvider};
use crate::config::DEBOUNCE_TICKS;
use crate::error::{DriverError, Error};
use crate::input::controls::Controls;
use crate::input::debounce::DebounceFilter;
use crate::input::{ButtonEvent, ButtonHandler, RawInputEvent};
use crate::time::TickSource;
use heapless::spsc::Consumer;

/// Work items handed from interrupt context to the main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoreEvent {
    /// A frame from the touch controller.
    RawInput(RawInputEvent),
    /// An event from the radio stack.
    Connectivity(ConnectivityEvent),
    /// A feature module asked for advertising to be flipped.
    ToggleAdvertising,
    /// The radio task hit an error outside any core call.
    DriverFault(DriverError),
}

pub struct Badge<'a, R: RadioDriver, T: TickSource> {
    connectivity: Connectivity<'a, R>,
    controls: Controls<'a>,
    debounce: DebounceFilter,
    ticks: T,
}

impl<'a, R: RadioDriver, T: TickSource> Badge<'a, R, T> {
    /// The debounce window opens at construction time.
    pub fn new(radio: R, ticks: T) -> Self {
        let now = ticks.now();
        Self {
            connectivity: Connectivity::new(radio),
            controls: Controls::new(),
            debounce: DebounceFilter::new(now, DEBOUNCE_TICKS),
            ticks,
        }
    }

    /// Bring the radio up under `device_id` and start advertising.
    pub fn init(&mut self, device_id: &str) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::info!("badge: init as {=str}", device_id);
        self.connectivity.init(device_id)
    }

    pub fn register_connectivity_handler(
        &mut self,
        handler: &'a dyn ConnectivityHandler,
    ) -> Result<(), Error> {
        self.connectivity.register_handler(handler)
    }

    pub fn register_uuid_provider(&mut self, provider: &'a dyn UuidProvider) -> Result<(), Error> {
        self.connectivity.register_uuid_provider(provider)
    }

    pub fn register_button_handler(&mut self, handler: &'a dyn ButtonHandler) -> Result<(), Error> {
        self.controls.register(handler)
    }

    /// Returns `true` if advertising is now enabled.
    pub fn toggle_advertising(&mut self) -> Result<bool, Error> {
        self.connectivity.toggle()
    }

    /// Debounce one raw transition and fan the resulting press out.
    pub fn dispatch_raw_input(&mut self, raw: RawInputEvent) -> Option<ButtonEvent> {
        let button = self.debounce.on_raw_event(raw, &self.ticks)?;
        self.controls.dispatch(button);
        Some(button)
    }

    pub fn notify_connectivity_event(&mut self, event: ConnectivityEvent) -> Result<(), Error> {
        self.connectivity.on_event(&event)
    }

    pub fn process(&mut self, event: CoreEvent) -> Result<(), Error> {
        match event {
            CoreEvent::RawInput(raw) => {
                self.dispatch_raw_input(raw);
                Ok(())
            }
            CoreEvent::Connectivity(ev) => self.notify_connectivity_event(ev),
            CoreEvent::ToggleAdvertising => self.toggle_advertising().map(|_| ()),
            CoreEvent::DriverFault(e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("badge: radio task fault {}", e);
                Err(Error::Driver(e))
            }
        }
    }

    /// Process queued events in FIFO order. Stops at the first error and
    /// leaves the rest queued. Returns how many events were processed.
    pub fn drain<const N: usize>(
        &mut self,
        queue: &mut Consumer<'_, CoreEvent, N>,
    ) -> Result<usize, Error> {
        let mut processed = 0;
        while let Some(event) = queue.dequeue() {
            self.process(event)?;
            processed += 1;
        }
        Ok(processed)
    }

    pub fn state(&self) -> ConnectivityState {
        self.connectivity.state()
    }

    pub fn is_advertising_enabled(&self) -> bool {
        self.connectivity.is_enabled()
    }

    pub fn payload(&self) -> &AdvertisingPayload {
        self.connectivity.payload()
    }

    pub fn radio_mut(&mut self) -> &mut R {
        self.connectivity.radio_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::{AdvParams, ConnHandle, GapConfig, SecurityParams};
    use crate::input::{ConsumerId, Transition};
    use crate::time::Tick;
    use core::cell::{Cell, RefCell};
    use heapless::spsc::Queue;
    use heapless::Vec;

    #[derive(Default)]
    struct Radio {
        starts: u32,
        stops: u32,
        fail_start: bool,
    }

    impl RadioDriver for Radio {
        fn configure_gap(&mut self, _: &str, _: &GapConfig) -> Result<(), DriverError> {
            Ok(())
        }
        fn set_adv_payload(&mut self, _: &AdvertisingPayload) -> Result<(), DriverError> {
            Ok(())
        }
        fn start_advertising(&mut self, _: &AdvParams) -> Result<(), DriverError> {
            if self.fail_start {
                return Err(DriverError::InvalidState);
            }
            self.starts += 1;
            Ok(())
        }
        fn stop_advertising(&mut self) -> Result<(), DriverError> {
            self.stops += 1;
            Ok(())
        }
        fn reply_sec_params(&mut self, _: ConnHandle, _: &SecurityParams) -> Result<(), DriverError> {
            Ok(())
        }
        fn reply_sec_info(&mut self, _: ConnHandle) -> Result<(), DriverError> {
            Ok(())
        }
        fn reply_sys_attrs(&mut self, _: ConnHandle) -> Result<(), DriverError> {
            Ok(())
        }
        fn indicate_link(&mut self, _: bool) {}
    }

    struct Clock(Cell<u32>);

    impl TickSource for Clock {
        fn now(&self) -> Tick {
            Tick(self.0.get())
        }
    }

    struct Menu {
        presses: RefCell<Vec<ButtonEvent, 8>>,
    }

    impl ButtonHandler for Menu {
        fn consumer_id(&self) -> ConsumerId {
            ConsumerId(1)
        }
        fn on_button(&self, button: ButtonEvent) {
            self.presses.borrow_mut().push(button).unwrap();
        }
    }

    fn press(button: u8, at: u32) -> CoreEvent {
        CoreEvent::RawInput(RawInputEvent {
            button,
            transition: Transition::Down,
            timestamp: Tick(at),
        })
    }

    #[test]
    fn raw_input_reaches_button_handlers() {
        let menu = Menu { presses: RefCell::new(Vec::new()) };
        let mut badge = Badge::new(Radio::default(), Clock(Cell::new(0)));
        badge.register_button_handler(&menu).unwrap();

        badge.process(press(5, 4000)).unwrap();
        badge.process(press(0, 4001)).unwrap();

        assert_eq!(menu.presses.borrow().as_slice(), &[ButtonEvent::Enter]);
    }

    #[test]
    fn drain_processes_queue_in_order() {
        let menu = Menu { presses: RefCell::new(Vec::new()) };
        let mut badge = Badge::new(Radio::default(), Clock(Cell::new(0)));
        badge.register_button_handler(&menu).unwrap();
        badge.init("NSEC0001").unwrap();

        let mut queue: Queue<CoreEvent, 8> = Queue::new();
        let (mut tx, mut rx) = queue.split();
        tx.enqueue(press(0, 3000)).unwrap();
        tx.enqueue(press(1, 6000)).unwrap();
        tx.enqueue(CoreEvent::ToggleAdvertising).unwrap();

        assert_eq!(badge.drain(&mut rx), Ok(3));
        assert_eq!(
            menu.presses.borrow().as_slice(),
            &[ButtonEvent::Up, ButtonEvent::Down]
        );
        assert!(!badge.is_advertising_enabled());
        assert_eq!(badge.drain(&mut rx), Ok(0));
    }

    #[test]
    fn drain_stops_at_fatal_error_and_keeps_the_rest() {
        let mut badge = Badge::new(Radio::default(), Clock(Cell::new(0)));
        badge.init("NSEC0001").unwrap();
        badge.toggle_advertising().unwrap();
        badge.radio_mut().fail_start = true;

        let mut queue: Queue<CoreEvent, 8> = Queue::new();
        let (mut tx, mut rx) = queue.split();
        tx.enqueue(CoreEvent::ToggleAdvertising).unwrap();
        tx.enqueue(press(0, 9000)).unwrap();

        let err = badge.drain(&mut rx).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn radio_task_fault_is_fatal_and_halts_drain() {
        let mut badge = Badge::new(Radio::default(), Clock(Cell::new(0)));
        badge.init("NSEC0001").unwrap();

        let mut queue: Queue<CoreEvent, 8> = Queue::new();
        let (mut tx, mut rx) = queue.split();
        tx.enqueue(CoreEvent::DriverFault(DriverError::Raw(0x12)))
            .unwrap();
        tx.enqueue(CoreEvent::ToggleAdvertising).unwrap();

        let err = badge.drain(&mut rx).unwrap_err();
        assert_eq!(err, Error::Driver(DriverError::Raw(0x12)));
        assert!(err.is_fatal());
        assert_eq!(rx.len(), 1);
        assert!(badge.is_advertising_enabled());
    }

    #[test]
    fn debounce_window_opens_at_construction() {
        let menu = Menu { presses: RefCell::new(Vec::new()) };
        let mut badge = Badge::new(Radio::default(), Clock(Cell::new(10_000)));
        badge.register_button_handler(&menu).unwrap();

        assert_eq!(
            badge.dispatch_raw_input(RawInputEvent {
                button: 2,
                transition: Transition::Down,
                timestamp: Tick(12_000),
            }),
            None
        );
        assert_eq!(
            badge.dispatch_raw_input(RawInputEvent {
                button: 2,
                transition: Transition::Down,
                timestamp: Tick(13_000),
            }),
            Some(ButtonEvent::Left)
        );
    }
}
