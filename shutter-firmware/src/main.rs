//! Shutter controller firmware
//!
//! Main firmware binary for RP2040-based shutter controllers. Opens and
//! closes a motorized shutter on a daily schedule, journals every action to
//! flash and takes manual commands over a serial console.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use shutter_core::config::{EventCode, ShutterConfig};
use shutter_core::device::Device;
use shutter_core::journal::MountOutcome;
use shutter_core::motor::MotorController;
use shutter_drivers::motor::HBridgeMotor;
use shutter_drivers::watchdog::gated::DEFAULT_TIMEOUT_MS;
use shutter_drivers::watchdog::JumperGatedWatchdog;
use shutter_hal::{ByteStorage, EhInput, EhOutput};
use shutter_hal_rp2040::{Rp2040BlockStorage, Rp2040Clock, Rp2040Watchdog};

use crate::sink::DefmtSink;

mod channels;
mod sink;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Watchdog behind its enable jumper
pub type ShutterWatchdog = JumperGatedWatchdog<EhInput<Input<'static>>, Rp2040Watchdog>;

/// Device context with the board's capabilities
pub type ShutterDevice =
    Device<Rp2040BlockStorage<'static>, Rp2040Clock<'static>, ShutterWatchdog, DefmtSink>;

/// Device context shared between tasks
pub type DeviceMutex = Mutex<CriticalSectionRawMutex, ShutterDevice>;

/// Motor on the H-bridge pins
pub type Motor = MotorController<HBridgeMotor<EhOutput<Output<'static>>, EhOutput<Output<'static>>>>;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static DEVICE: StaticCell<DeviceMutex> = StaticCell::new();
static MOTOR: StaticCell<Motor> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Shutter firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = ShutterConfig::default();
    let storage = Rp2040BlockStorage::new(p.FLASH, p.DMA_CH0);
    if let Err(e) = config.validate(storage.capacity()) {
        defmt::panic!("Invalid configuration: {}", e);
    }

    // H-bridge: GP18 drives open, GP19 drives close
    let motor = MOTOR.init(MotorController::new(HBridgeMotor::new(
        EhOutput::new(Output::new(p.PIN_18, Level::Low)),
        EhOutput::new(Output::new(p.PIN_19, Level::Low)),
    )));

    // Watchdog enable jumper on GP28, pulled down; bridge to 3V3 to arm
    let watchdog = JumperGatedWatchdog::new(
        EhInput::new(Input::new(p.PIN_28, Pull::Down)),
        Rp2040Watchdog::new(p.WATCHDOG),
        DEFAULT_TIMEOUT_MS,
    );

    let clock = Rp2040Clock::new(p.RTC);

    let (mut dev, outcome) =
        match Device::mount(storage, clock, watchdog, DefmtSink::new(config), config).await {
            Ok(mounted) => mounted,
            Err(e) => defmt::panic!("Journal mount failed: {}", e),
        };
    match outcome {
        MountOutcome::Resumed => info!("Journal resumed at frame {}", dev.journal().cursor()),
        MountOutcome::Recovered => warn!("No journal end marker, started a new journal"),
    }

    dev.record(EventCode::BOARD_INIT).await;

    let store = dev.settings();
    match store.ensure_initialized(&mut dev).await {
        Ok(true) => info!("First boot, default schedules written"),
        Ok(false) => {}
        Err(e) => error!("Settings initialization failed: {}", e),
    }

    let device = DEVICE.init(Mutex::new(dev));

    // Console on UART0: GP0 TX, GP1 RX, 115200 baud
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, TX_BUF.init([0; 64]), RX_BUF.init([0; 64]));
    let (_tx, rx) = uart.split();
    info!("Console UART initialized");

    spawner.spawn(tasks::scheduler_task(device, motor)).unwrap();
    spawner.spawn(tasks::control_task(device, motor)).unwrap();
    spawner.spawn(tasks::console_task(rx)).unwrap();

    info!("All tasks spawned, firmware running");
}
