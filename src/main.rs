//! Badge firmware entry point (nRF52840 + SoftDevice S140).
//!
//! Task layout:
//!
//! - `softdevice_task`: runs the SoftDevice event loop
//! - `advertising_task`: advertiser and peer link, reports link changes
//! - `touch_task`: SPI-slave frames from the touch controller
//! - main loop: sole owner of the `Badge`, drains `EVENTS` and redraws
//!   the status screen
//!
//! Build: `cargo build --release --features embedded`

#![no_std]
#![no_main]

mod hw;

use badge_runtime::config::EVENT_QUEUE_DEPTH;
use badge_runtime::device_id::format_device_id;
use badge_runtime::{Badge, CoreEvent, Error};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::{bind_interrupts, peripherals, spis, twim};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use hw::radio::{advertising_task, AdvCommands, SoftdeviceRadio};
use hw::status::StatusScreen;
use hw::touch::touch_task;
use hw::EmbassyTicks;

bind_interrupts!(struct Irqs {
    SPIM2_SPIS2_SPI2 => spis::InterruptHandler<peripherals::SPI2>;
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// Producers → main loop.
static EVENTS: Channel<CriticalSectionRawMutex, CoreEvent, EVENT_QUEUE_DEPTH> = Channel::new();

/// Main loop → advertising task.
static ADV_COMMANDS: AdvCommands = Channel::new();

type BadgeContext = Badge<'static, SoftdeviceRadio, EmbassyTicks>;

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        ..Default::default()
    }
}

/// Register the feature modules, then bring the radio up.
fn bring_up(
    badge: &mut BadgeContext,
    status: &'static StatusScreen,
    device_id: &str,
) -> Result<(), Error> {
    badge.register_button_handler(status)?;
    badge.register_connectivity_handler(status)?;
    badge.register_uuid_provider(status)?;
    badge.init(device_id)
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("badge starting");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);
    interrupt::SPIM2_SPIS2_SPI2.set_priority(Priority::P3);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);

    let link_led = Output::new(p.P0_28, Level::High, OutputDrive::Standard);
    let mut error_led = Output::new(p.P0_29, Level::High, OutputDrive::Standard);

    let device_id = format_device_id(embassy_nrf::pac::FICR.deviceid(1).read());
    info!("device id {=str}", device_id.as_str());

    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let mut display = hw::display::init(i2c);

    let sd: &'static Softdevice = Softdevice::enable(&softdevice_config());
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(advertising_task(
        sd,
        ADV_COMMANDS.receiver(),
        EVENTS.sender()
    )));

    let spis = spis::Spis::new(
        p.SPI2,
        Irqs,
        p.P0_15, // CSN
        p.P0_14, // SCK
        p.P0_13, // MISO
        p.P0_12, // MOSI
        spis::Config::default(),
    );
    unwrap!(spawner.spawn(touch_task(spis, EVENTS.sender())));

    static STATUS: StaticCell<StatusScreen> = StaticCell::new();
    let status: &'static StatusScreen = STATUS.init(StatusScreen::new(EVENTS.sender()));

    let radio = SoftdeviceRadio::new(ADV_COMMANDS.sender(), link_led);
    let mut badge: BadgeContext = Badge::new(radio, EmbassyTicks);
    if let Err(e) = bring_up(&mut badge, status, device_id.as_str()) {
        hw::fatal::halt(e, &mut error_led).await;
    }

    let mut shown_state = badge.state();
    hw::display::draw_status(&mut display, device_id.as_str(), shown_state, None);

    loop {
        let event = EVENTS.receive().await;
        if let Err(e) = badge.process(event) {
            hw::fatal::halt(e, &mut error_led).await;
        }

        let state = badge.state();
        if status.take_dirty() || state != shown_state {
            shown_state = state;
            hw::display::draw_status(
                &mut display,
                device_id.as_str(),
                state,
                status.last_button(),
            );
        }
    }
}
