//! Blocking I2C master for STM32F1
//!
//! Wraps the embassy-stm32 blocking I2C driver behind
//! [`sprout_hal::I2cPeripheral`].
//!
//! Pins and clock are fixed when the embassy driver is created, so
//! [`configure`](I2cPeripheral::configure) only accepts the configuration
//! the driver was built with.
//!
//! The embassy driver aborts any transfer that runs past the single timeout
//! it was built with. That timeout is sized to the longest one the firmware
//! asks for and reported through
//! [`max_timeout_ms`](I2cPeripheral::max_timeout_ms), so longer requests are
//! refused before they start. The outcome of every transfer is the driver's
//! own: a transfer the device acknowledged is never turned into a failure.

use embassy_stm32::i2c::{self, Error as I2cError, I2c};
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_time::Duration;
use sprout_hal::{I2cConfig, I2cFault, I2cPeripheral};

/// Build the embassy driver configuration for a bus configuration
///
/// `timeout_ms` becomes the driver's per-transfer limit.
pub fn driver_config(config: &I2cConfig, timeout_ms: u32) -> i2c::Config {
    let mut cfg = i2c::Config::default();
    cfg.frequency = Hertz(config.effective_frequency());
    cfg.timeout = Duration::from_millis(timeout_ms as u64);
    cfg
}

/// Map an embassy I2C error to the board-agnostic fault kind
pub fn map_error(e: I2cError) -> I2cFault {
    match e {
        I2cError::Bus => I2cFault::Bus,
        I2cError::Arbitration => I2cFault::ArbitrationLost,
        I2cError::Nack => I2cFault::Nack,
        I2cError::Timeout => I2cFault::Timeout,
        I2cError::Overrun => I2cFault::Overrun,
        _ => I2cFault::Other,
    }
}

/// Blocking I2C bus on an embassy driver
pub struct BlockingBus<'d> {
    i2c: I2c<'d, Blocking>,
    /// Configuration the driver was created with
    built_with: I2cConfig,
    /// Timeout the driver was created with
    timeout_ms: u32,
}

impl<'d> BlockingBus<'d> {
    /// Wrap a driver created with `driver_config(&config, timeout_ms)`
    pub fn new(i2c: I2c<'d, Blocking>, config: I2cConfig, timeout_ms: u32) -> Self {
        Self {
            i2c,
            built_with: config,
            timeout_ms,
        }
    }
}

impl I2cPeripheral for BlockingBus<'_> {
    fn configure(&mut self, config: &I2cConfig) -> Result<(), I2cFault> {
        let same_pins = config.instance == self.built_with.instance
            && config.scl == self.built_with.scl
            && config.sda == self.built_with.sda
            && config.remap == self.built_with.remap;
        let same_clock =
            config.effective_frequency() == self.built_with.effective_frequency();

        if same_pins && same_clock {
            Ok(())
        } else {
            Err(I2cFault::Other)
        }
    }

    fn max_timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    // The driver bounds every transfer by `self.timeout_ms`; callers never
    // ask for more because the transactor checks `max_timeout_ms` first.
    fn write(&mut self, address: u8, data: &[u8], _timeout_ms: u32) -> Result<(), I2cFault> {
        self.i2c.blocking_write(address, data).map_err(map_error)
    }

    fn read(&mut self, address: u8, buf: &mut [u8], _timeout_ms: u32) -> Result<(), I2cFault> {
        self.i2c.blocking_read(address, buf).map_err(map_error)
    }
}
