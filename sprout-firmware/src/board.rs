//! Board description
//!
//! Constants and pin macros generated from `board.toml` by the build script,
//! plus the typed configuration built from them.

use sprout_core::config::{CounterConfig, DeviceAddress, DisplayConfig, CHANNEL_COUNT};
use sprout_hal::{I2cConfig, PinId, Port};

include!(concat!(env!("OUT_DIR"), "/board_config.rs"));

pub(crate) use {i2c_bus, sensor_inputs, status_led};

/// Counter settings
pub const COUNTER: CounterConfig = CounterConfig {
    debounce_ms: DEBOUNCE_MS,
};

/// Display link settings
pub const DISPLAY: DisplayConfig = DisplayConfig {
    address: match DeviceAddress::new(DISPLAY_ADDRESS) {
        Some(address) => address,
        None => panic!("display address out of range"),
    },
    chunk_timeout_ms: CHUNK_TIMEOUT_MS,
    final_timeout_ms: FINAL_TIMEOUT_MS,
    refresh_interval_ms: REFRESH_INTERVAL_MS,
};

/// Per-transfer limit the I2C driver is built with
///
/// The longest timeout any display transfer asks for.
pub const BUS_TIMEOUT_MS: u32 = if CHUNK_TIMEOUT_MS > FINAL_TIMEOUT_MS {
    CHUNK_TIMEOUT_MS
} else {
    FINAL_TIMEOUT_MS
};

// The build script emits one pin per channel
const _: () = assert!(SENSOR_PINS.len() == CHANNEL_COUNT);
