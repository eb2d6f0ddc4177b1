//! Sprout - Beam-Break Counter Firmware
//!
//! Main firmware binary for STM32F103 "Blue Pill" boards. Counts debounced
//! beam interruptions on three IR sensor channels and shows the counts on a
//! 128x32 SSD1306 OLED.
//!
//! There is no executor: one foreground loop owns the I2C bus and refreshes
//! the display, while EXTI interrupts feed edges to the counter through the
//! interrupt dispatcher.

#![no_std]
#![no_main]

use core::cell::Cell;

use cortex_m_rt::entry;
use critical_section::Mutex;
use defmt::*;
use embassy_stm32::interrupt;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use sprout_core::config::{CHANNEL_COUNT, SENSOR_IRQ_PRIORITY};
use sprout_core::{
    BusTransactor, ChannelId, EventCounter, EventObserver, InterruptDispatcher, SensorInput,
};
use sprout_display::Display;
use sprout_hal::{Clock, DelayMs, OutputPin};
use sprout_hal_stm32f1::exti::{self, Edge};
use sprout_hal_stm32f1::i2c::driver_config;
use sprout_hal_stm32f1::{BlockingBus, SensorPin, StatusLed, SystemClock};

mod board;
mod fault;

/// Main loop poll period
const POLL_MS: u32 = 10;

/// Per-address timeout for the boot-time bus scan
const SCAN_TIMEOUT_MS: u32 = 2;

type Sensors = SensorInput<'static, SystemClock, SensorPin, CHANNEL_COUNT>;

/// Event counters, written from EXTI handlers
static COUNTER: EventCounter<CHANNEL_COUNT> = EventCounter::new(board::COUNTER);

// Boot-time allocations that interrupt handlers reference
static SENSORS: StaticCell<Sensors> = StaticCell::new();
static DISPATCHER_CELL: StaticCell<InterruptDispatcher<'static>> = StaticCell::new();

/// Dispatcher seen by the EXTI vectors, published once setup is complete
static DISPATCHER: Mutex<Cell<Option<&'static InterruptDispatcher<'static>>>> =
    Mutex::new(Cell::new(None));

/// Logs every accepted edge
struct EdgeTrace;

impl EventObserver for EdgeTrace {
    fn on_event(&self, channel: ChannelId, level: bool) {
        trace!("Edge on channel {}, level {}", channel, level);
    }
}

static EDGE_TRACE: EdgeTrace = EdgeTrace;

/// Main entry point
#[entry]
fn main() -> ! {
    info!("Sprout counter firmware starting...");

    let p = embassy_stm32::init(Default::default());
    let mut clock = SystemClock;
    info!("Peripherals initialized");

    let mut led = StatusLed::new(board::status_led!(p), board::STATUS_LED_INVERTED);

    // Inputs own pin mode and pull-up; they must outlive the sensor readers
    let _inputs = board::sensor_inputs!(p);

    // ========== Sensor interrupts ==========
    let sensors: &'static Sensors = SENSORS.init(
        SensorInput::new(
            &COUNTER,
            clock,
            board::SENSOR_LINES,
            board::SENSOR_PINS.map(SensorPin::new),
        )
        .with_observer(&EDGE_TRACE),
    );

    let dispatcher = DISPATCHER_CELL.init(InterruptDispatcher::new());
    if let Err(e) = sensors.register(dispatcher, SENSOR_IRQ_PRIORITY) {
        error!("Failed to bind sensor lines: {:?}", e);
        fault::blink_forever(&mut led, &mut clock);
    }
    let dispatcher: &'static InterruptDispatcher<'static> = dispatcher;
    critical_section::with(|cs| DISPATCHER.borrow(cs).set(Some(dispatcher)));

    for pin in board::SENSOR_PINS {
        let line = match exti::configure_line(pin, Edge::Falling) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to route {:?} to EXTI: {:?}", pin, e);
                fault::blink_forever(&mut led, &mut clock);
            }
        };
        let priority = dispatcher
            .binding(line)
            .map_or(SENSOR_IRQ_PRIORITY, |b| b.priority);
        if let Err(e) = exti::enable_line_interrupt(line, priority) {
            error!("Failed to enable EXTI{}: {:?}", line, e);
            fault::blink_forever(&mut led, &mut clock);
        }
    }
    info!(
        "Counting on EXTI lines {} (debounce {} ms)",
        board::SENSOR_LINES,
        COUNTER.debounce_ms()
    );

    // ========== I2C and display ==========
    let i2c = board::i2c_bus!(p, driver_config(&board::I2C, board::BUS_TIMEOUT_MS));
    let mut bus = BusTransactor::new(BlockingBus::new(
        i2c,
        board::I2C,
        board::BUS_TIMEOUT_MS,
    ));
    let mut display = Display::new(board::DISPLAY);

    match bus.init(board::I2C) {
        Ok(()) => {
            info!(
                "I2C{} ready at {} Hz",
                board::I2C.instance,
                board::I2C.effective_frequency()
            );

            match bus.scan(SCAN_TIMEOUT_MS) {
                Ok(found) => info!("I2C devices: {=[u8]:#x}", found.as_slice()),
                Err(e) => warn!("I2C scan failed: {:?}", e),
            }

            if display.init(&mut bus) {
                info!("OLED initialized at {:#x}", board::DISPLAY.address.get());
                display.write_version_banner(&mut bus);
            } else {
                warn!(
                    "No display at {:#x}, continuing without it",
                    board::DISPLAY.address.get()
                );
            }
        }
        Err(e) => {
            // Counting does not depend on the bus
            error!("I2C init failed: {:?}, display disabled", e);
        }
    }

    // ========== Main loop ==========
    info!("Entering main loop");
    let mut last_refresh = clock.now_ms();
    let mut last_total = 0u32;

    loop {
        let now = clock.now_ms();
        if now.wrapping_sub(last_refresh) >= board::DISPLAY.refresh_interval_ms {
            last_refresh = now;
            led.toggle();

            let snapshot = COUNTER.snapshot();
            if snapshot.total() != last_total {
                last_total = snapshot.total();
                info!("Counts {} (total {})", snapshot.counts, last_total);
            }

            if display.is_ready() {
                match display.show_counts(&mut bus, &snapshot) {
                    Ok(true) => trace!("Display refreshed"),
                    Ok(false) => {}
                    Err(e) => warn!(
                        "Display refresh failed: {:?} ({})",
                        e,
                        display.last_report()
                    ),
                }
            }
        }

        clock.delay_ms(POLL_MS);
    }
}

/// Read and clear the pending lines of one vector, then dispatch them
fn on_exti(mask: u32) {
    let pending = exti::take_pending(mask);
    let dispatcher = critical_section::with(|cs| DISPATCHER.borrow(cs).get());
    if let Some(dispatcher) = dispatcher {
        dispatcher.dispatch_pending(pending);
    }
}

#[interrupt]
fn EXTI0() {
    on_exti(exti::vector_mask(0));
}

#[interrupt]
fn EXTI1() {
    on_exti(exti::vector_mask(1));
}

#[interrupt]
fn EXTI2() {
    on_exti(exti::vector_mask(2));
}

#[interrupt]
fn EXTI3() {
    on_exti(exti::vector_mask(3));
}

#[interrupt]
fn EXTI4() {
    on_exti(exti::vector_mask(4));
}

#[interrupt]
fn EXTI9_5() {
    on_exti(exti::vector_mask(5));
}

#[interrupt]
fn EXTI15_10() {
    on_exti(exti::vector_mask(10));
}
