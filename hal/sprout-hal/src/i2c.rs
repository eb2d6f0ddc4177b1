//! I2C bus abstractions
//!
//! Provides the raw master-mode transfer trait that chip-specific HALs
//! implement. Argument validation and readiness tracking live one layer up,
//! in `sprout_core::bus::BusTransactor`.

use crate::gpio::PinId;

/// Low-level fault reported by a peripheral transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cFault {
    /// Bus held by another transfer or master
    Busy,
    /// Transfer did not complete within the timeout
    Timeout,
    /// Address or data byte not acknowledged
    Nack,
    /// Arbitration lost
    ArbitrationLost,
    /// Misplaced start/stop condition
    Bus,
    /// Data overrun
    Overrun,
    /// Anything the peripheral driver cannot classify
    Other,
}

/// I2C bus master
///
/// Every transfer carries a caller-supplied timeout in milliseconds. Addresses
/// are 7-bit; implementations shift them into the wire format themselves.
pub trait I2cPeripheral {
    /// Apply clock and pin configuration to the peripheral
    ///
    /// Called once per (re-)initialization after the configuration has been
    /// validated.
    fn configure(&mut self, config: &I2cConfig) -> Result<(), I2cFault>;

    /// Write data to a device at the given address
    fn write(&mut self, address: u8, data: &[u8], timeout_ms: u32) -> Result<(), I2cFault>;

    /// Read data from a device at the given address
    fn read(&mut self, address: u8, buf: &mut [u8], timeout_ms: u32) -> Result<(), I2cFault>;

    /// Longest per-call timeout this peripheral can enforce, in milliseconds
    ///
    /// Transfers asking for more are rejected before they reach the bus.
    fn max_timeout_ms(&self) -> u32 {
        u32::MAX
    }

    /// Check whether a device acknowledges its address
    ///
    /// The default issues an address-only write.
    fn probe(&mut self, address: u8, timeout_ms: u32) -> Result<(), I2cFault> {
        self.write(address, &[], timeout_ms)
    }
}

/// I2C configuration
///
/// `instance` is the raw peripheral selector (1 = I2C1, 2 = I2C2) so a bad
/// board description can be rejected at init rather than at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct I2cConfig {
    /// Peripheral selector
    pub instance: u8,
    /// Clock frequency in Hz; 0 selects the fast-mode default
    pub frequency: u32,
    /// Clock pin
    pub scl: PinId,
    /// Data pin
    pub sda: PinId,
    /// Route I2C1 to its alternate pins (PB8/PB9); ignored for I2C2
    pub remap: bool,
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD_HZ: u32 = 100_000;

    /// Fast mode (400 kHz)
    pub const FAST_HZ: u32 = 400_000;

    /// Frequency to program, substituting fast mode for 0
    pub const fn effective_frequency(&self) -> u32 {
        if self.frequency == 0 {
            Self::FAST_HZ
        } else {
            self.frequency
        }
    }
}
