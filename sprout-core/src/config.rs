//! Configuration types
//!
//! Board-agnostic configuration values. The firmware builds these from its
//! build-time validated `board.toml`; the defaults below match the reference
//! Blue Pill wiring.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sprout_hal::{I2cConfig, PinId, Port};

/// Number of sensor channels on the reference board
pub const CHANNEL_COUNT: usize = 3;

/// Default minimum spacing between accepted edges on one channel
pub const DEFAULT_DEBOUNCE_MS: u32 = 3;

/// Interrupt priority for sensor lines (lower number = more urgent)
///
/// Kept behind the timebase so sensor bursts cannot starve it.
pub const SENSOR_IRQ_PRIORITY: u8 = 10;

/// Highest valid 7-bit bus address
pub const MAX_ADDRESS_7BIT: u8 = 0x7F;

/// Event counter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CounterConfig {
    /// Debounce window in milliseconds
    pub debounce_ms: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// 7-bit I2C device address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// Usual SSD1306 address (SA0 low)
    pub const SSD1306_PRIMARY: Self = Self(0x3C);

    /// SSD1306 address with SA0 strapped high
    pub const SSD1306_ALTERNATE: Self = Self(0x3D);

    /// Create an address, rejecting anything outside 7 bits
    pub const fn new(addr: u8) -> Option<Self> {
        if addr > MAX_ADDRESS_7BIT {
            None
        } else {
            Some(Self(addr))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Display link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Controller address
    pub address: DeviceAddress,
    /// Timeout for flushes forced by a full transfer buffer
    pub chunk_timeout_ms: u32,
    /// Timeout for the flush that closes a transfer
    pub final_timeout_ms: u32,
    /// Period of the status refresh in the main loop
    pub refresh_interval_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            address: DeviceAddress::SSD1306_PRIMARY,
            chunk_timeout_ms: 10,
            final_timeout_ms: 20,
            refresh_interval_ms: 500,
        }
    }
}

/// I2C1 on PB6 (SCL) / PB7 (SDA) at 400 kHz, no remap
pub const BLUE_PILL_I2C1: I2cConfig = I2cConfig {
    instance: 1,
    frequency: I2cConfig::FAST_HZ,
    scl: PinId::new(Port::B, 6),
    sda: PinId::new(Port::B, 7),
    remap: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_address_range() {
        assert_eq!(DeviceAddress::new(0x3C), Some(DeviceAddress::SSD1306_PRIMARY));
        assert_eq!(DeviceAddress::new(0x7F).map(DeviceAddress::get), Some(0x7F));
        assert_eq!(DeviceAddress::new(0x80), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(CounterConfig::default().debounce_ms, 3);
        let display = DisplayConfig::default();
        assert_eq!(display.address.get(), 0x3C);
        assert_eq!(display.chunk_timeout_ms, 10);
        assert_eq!(display.final_timeout_ms, 20);
    }
}
