//! Blocking I2C transactions
//!
//! [`BusTransactor`] wraps a raw [`I2cPeripheral`] with readiness tracking,
//! argument validation and error mapping. Every entry point checks the
//! handle and the address before any bus activity, and every transfer takes
//! an explicit timeout. There are no automatic retries except in
//! [`probe`](BusTransactor::probe), whose contract is to retry.
//!
//! Transfers block, so the transactor is owned by the main loop and never
//! placed in storage reachable from interrupt handlers.

use heapless::Vec;
use sprout_hal::{I2cConfig, I2cPeripheral, PinId, Port};

use crate::config::MAX_ADDRESS_7BIT;
use crate::error::BusError;

/// Slowest clock the bus driver accepts
pub const MIN_FREQUENCY_HZ: u32 = 10_000;

/// First and last non-reserved 7-bit addresses, probed by [`BusTransactor::scan`]
pub const SCAN_FIRST: u8 = 0x08;
pub const SCAN_LAST: u8 = 0x77;

/// Addresses that answered a scan
pub type ScanResult = Vec<u8, { (SCAN_LAST - SCAN_FIRST + 1) as usize }>;

/// Check a configuration against the STM32F1 pin map
///
/// I2C1 lives on PB6/PB7, or PB8/PB9 when remapped. I2C2 has a single
/// mapping on PB10/PB11.
pub fn validate_config(config: &I2cConfig) -> Result<(), BusError> {
    let (scl, sda) = match (config.instance, config.remap) {
        (1, false) => (6, 7),
        (1, true) => (8, 9),
        (2, _) => (10, 11),
        _ => return Err(BusError::InvalidParam),
    };

    if config.scl != PinId::new(Port::B, scl) || config.sda != PinId::new(Port::B, sda) {
        return Err(BusError::InvalidParam);
    }

    let freq = config.effective_frequency();
    if !(MIN_FREQUENCY_HZ..=I2cConfig::FAST_HZ).contains(&freq) {
        return Err(BusError::InvalidParam);
    }

    Ok(())
}

/// I2C bus handle
pub struct BusTransactor<P> {
    peripheral: P,
    /// Configuration in effect; `Some` only after a successful init
    active: Option<I2cConfig>,
}

impl<P: I2cPeripheral> BusTransactor<P> {
    /// Wrap a peripheral; the handle starts out not ready
    pub fn new(peripheral: P) -> Self {
        Self {
            peripheral,
            active: None,
        }
    }

    /// Validate the configuration and bring the peripheral up
    ///
    /// Re-initializing drops the previous handle first, so a failed re-init
    /// leaves the bus not ready.
    pub fn init(&mut self, config: I2cConfig) -> Result<(), BusError> {
        self.active = None;
        validate_config(&config)?;
        self.peripheral.configure(&config)?;
        self.active = Some(config);
        Ok(())
    }

    /// Whether init has succeeded
    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    /// Configuration in effect, if ready
    pub fn config(&self) -> Option<&I2cConfig> {
        self.active.as_ref()
    }

    /// Raw peripheral access for advanced callers, absent until ready
    pub fn peripheral_mut(&mut self) -> Option<&mut P> {
        if self.is_ready() {
            Some(&mut self.peripheral)
        } else {
            None
        }
    }

    fn check(&self, address: u8, timeout_ms: u32) -> Result<(), BusError> {
        if !self.is_ready() {
            return Err(BusError::NotReady);
        }
        if address > MAX_ADDRESS_7BIT || timeout_ms > self.peripheral.max_timeout_ms() {
            return Err(BusError::InvalidParam);
        }
        Ok(())
    }

    /// Write `data` to a device
    pub fn write(&mut self, address: u8, data: &[u8], timeout_ms: u32) -> Result<(), BusError> {
        self.check(address, timeout_ms)?;
        self.peripheral.write(address, data, timeout_ms)?;
        Ok(())
    }

    /// Fill `buf` from a device
    pub fn read(&mut self, address: u8, buf: &mut [u8], timeout_ms: u32) -> Result<(), BusError> {
        self.check(address, timeout_ms)?;
        self.peripheral.read(address, buf, timeout_ms)?;
        Ok(())
    }

    /// Write, then read, as two transfers
    ///
    /// If the write phase fails the read phase is skipped and the write's
    /// error is returned as is. Empty phases are skipped.
    pub fn write_then_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError> {
        self.check(address, timeout_ms)?;
        if !write.is_empty() {
            self.peripheral.write(address, write, timeout_ms)?;
        }
        if !read.is_empty() {
            self.peripheral.read(address, read, timeout_ms)?;
        }
        Ok(())
    }

    /// Check whether a device answers, trying up to `attempts` times
    ///
    /// Zero attempts is treated as one. Stops at the first success and
    /// otherwise returns the last attempt's error.
    pub fn probe(&mut self, address: u8, attempts: u8, timeout_ms: u32) -> Result<(), BusError> {
        self.check(address, timeout_ms)?;

        let mut result = Ok(());
        for _ in 0..attempts.max(1) {
            result = self.peripheral.probe(address, timeout_ms).map_err(BusError::from);
            if result.is_ok() {
                break;
            }
        }
        result
    }

    /// Probe every non-reserved address once
    pub fn scan(&mut self, timeout_ms: u32) -> Result<ScanResult, BusError> {
        self.check(SCAN_FIRST, timeout_ms)?;

        let mut found = ScanResult::new();
        for address in SCAN_FIRST..=SCAN_LAST {
            if self.peripheral.probe(address, timeout_ms).is_ok() {
                // Capacity covers the whole scanned range
                let _ = found.push(address);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BLUE_PILL_I2C1;
    use heapless::Deque;
    use sprout_hal::I2cFault;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Configure,
        Write(u8, usize),
        Read(u8, usize),
        Probe(u8),
    }

    /// Records every peripheral call and replays scripted results
    #[derive(Default)]
    struct MockI2c {
        ops: Vec<Op, 256>,
        script: Deque<Result<(), I2cFault>, 16>,
        responders: Vec<u8, 8>,
        /// Enforceable timeout limit; zero means unlimited
        max_timeout: u32,
    }

    impl MockI2c {
        fn fail_next(&mut self, fault: I2cFault) {
            self.script.push_back(Err(fault)).unwrap();
        }

        fn next(&mut self) -> Result<(), I2cFault> {
            self.script.pop_front().unwrap_or(Ok(()))
        }
    }

    impl I2cPeripheral for MockI2c {
        fn max_timeout_ms(&self) -> u32 {
            if self.max_timeout == 0 {
                u32::MAX
            } else {
                self.max_timeout
            }
        }

        fn configure(&mut self, _config: &I2cConfig) -> Result<(), I2cFault> {
            self.ops.push(Op::Configure).unwrap();
            self.next()
        }

        fn write(&mut self, address: u8, data: &[u8], _timeout_ms: u32) -> Result<(), I2cFault> {
            self.ops.push(Op::Write(address, data.len())).unwrap();
            self.next()
        }

        fn read(&mut self, address: u8, buf: &mut [u8], _timeout_ms: u32) -> Result<(), I2cFault> {
            self.ops.push(Op::Read(address, buf.len())).unwrap();
            buf.fill(0xA5);
            self.next()
        }

        fn probe(&mut self, address: u8, _timeout_ms: u32) -> Result<(), I2cFault> {
            self.ops.push(Op::Probe(address)).unwrap();
            if !self.responders.is_empty() {
                return if self.responders.contains(&address) {
                    Ok(())
                } else {
                    Err(I2cFault::Nack)
                };
            }
            self.next()
        }
    }

    fn ready_bus() -> BusTransactor<MockI2c> {
        let mut bus = BusTransactor::new(MockI2c::default());
        bus.init(BLUE_PILL_I2C1).unwrap();
        bus.peripheral.ops.clear();
        bus
    }

    #[test]
    fn test_not_ready_before_init() {
        let mut bus = BusTransactor::new(MockI2c::default());
        assert!(!bus.is_ready());
        assert_eq!(bus.write(0x3C, &[1, 2, 3, 4], 10), Err(BusError::NotReady));
        assert_eq!(bus.read(0x3C, &mut [0; 2], 10), Err(BusError::NotReady));
        assert_eq!(bus.probe(0x3C, 3, 10), Err(BusError::NotReady));
        assert!(bus.peripheral_mut().is_none());
        assert!(bus.peripheral.ops.is_empty());
    }

    #[test]
    fn test_init_validates_config() {
        let mut bus = BusTransactor::new(MockI2c::default());

        let bad_instance = I2cConfig {
            instance: 3,
            ..BLUE_PILL_I2C1
        };
        assert_eq!(bus.init(bad_instance), Err(BusError::InvalidParam));

        let wrong_pins = I2cConfig {
            remap: true,
            ..BLUE_PILL_I2C1
        };
        assert_eq!(bus.init(wrong_pins), Err(BusError::InvalidParam));

        let too_fast = I2cConfig {
            frequency: 1_000_000,
            ..BLUE_PILL_I2C1
        };
        assert_eq!(bus.init(too_fast), Err(BusError::InvalidParam));

        // Nothing reached the hardware
        assert!(bus.peripheral.ops.is_empty());
        assert!(!bus.is_ready());
    }

    #[test]
    fn test_init_accepts_alternate_mappings() {
        let mut bus = BusTransactor::new(MockI2c::default());

        let remapped = I2cConfig {
            remap: true,
            scl: PinId::new(Port::B, 8),
            sda: PinId::new(Port::B, 9),
            frequency: 0,
            ..BLUE_PILL_I2C1
        };
        assert_eq!(bus.init(remapped), Ok(()));
        assert_eq!(bus.config().map(I2cConfig::effective_frequency), Some(400_000));

        let i2c2 = I2cConfig {
            instance: 2,
            scl: PinId::new(Port::B, 10),
            sda: PinId::new(Port::B, 11),
            frequency: I2cConfig::STANDARD_HZ,
            remap: false,
        };
        assert_eq!(bus.init(i2c2), Ok(()));
    }

    #[test]
    fn test_init_hardware_failure_is_mapped() {
        let mut bus = BusTransactor::new(MockI2c::default());
        bus.peripheral.fail_next(I2cFault::Bus);
        assert_eq!(
            bus.init(BLUE_PILL_I2C1),
            Err(BusError::LowLevel(I2cFault::Bus))
        );
        assert!(!bus.is_ready());
    }

    #[test]
    fn test_failed_reinit_clears_ready() {
        let mut bus = ready_bus();
        let bad = I2cConfig {
            instance: 0,
            ..BLUE_PILL_I2C1
        };
        assert_eq!(bus.init(bad), Err(BusError::InvalidParam));
        assert_eq!(bus.write(0x3C, &[0], 10), Err(BusError::NotReady));
    }

    #[test]
    fn test_address_out_of_range_never_touches_bus() {
        let mut bus = ready_bus();
        assert_eq!(bus.write(0x80, &[1], 10), Err(BusError::InvalidParam));
        assert_eq!(bus.read(0xFF, &mut [0; 1], 10), Err(BusError::InvalidParam));
        assert_eq!(
            bus.write_then_read(0x80, &[1], &mut [0; 1], 10),
            Err(BusError::InvalidParam)
        );
        assert_eq!(bus.probe(0x80, 1, 10), Err(BusError::InvalidParam));
        assert!(bus.peripheral.ops.is_empty());
    }

    #[test]
    fn test_transfer_outcomes_mapped() {
        let mut bus = ready_bus();
        assert_eq!(bus.write(0x3C, &[1, 2, 3, 4], 10), Ok(()));

        bus.peripheral.fail_next(I2cFault::Busy);
        assert_eq!(bus.write(0x3C, &[1], 10), Err(BusError::Busy));

        bus.peripheral.fail_next(I2cFault::Timeout);
        assert_eq!(bus.read(0x3C, &mut [0; 4], 10), Err(BusError::Timeout));

        bus.peripheral.fail_next(I2cFault::Nack);
        assert_eq!(
            bus.write(0x3C, &[1], 10),
            Err(BusError::LowLevel(I2cFault::Nack))
        );

        assert_eq!(
            bus.peripheral.ops.as_slice(),
            &[
                Op::Write(0x3C, 4),
                Op::Write(0x3C, 1),
                Op::Read(0x3C, 4),
                Op::Write(0x3C, 1)
            ]
        );
    }

    #[test]
    fn test_write_then_read() {
        let mut bus = ready_bus();
        let mut buf = [0u8; 2];
        assert_eq!(bus.write_then_read(0x50, &[0x10], &mut buf, 10), Ok(()));
        assert_eq!(buf, [0xA5, 0xA5]);
        assert_eq!(
            bus.peripheral.ops.as_slice(),
            &[Op::Write(0x50, 1), Op::Read(0x50, 2)]
        );
    }

    #[test]
    fn test_write_then_read_skips_read_on_write_failure() {
        let mut bus = ready_bus();
        bus.peripheral.fail_next(I2cFault::Timeout);

        let mut buf = [0u8; 2];
        assert_eq!(
            bus.write_then_read(0x50, &[0x10], &mut buf, 10),
            Err(BusError::Timeout)
        );
        assert_eq!(bus.peripheral.ops.as_slice(), &[Op::Write(0x50, 1)]);
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn test_write_then_read_skips_empty_phases() {
        let mut bus = ready_bus();
        assert_eq!(bus.write_then_read(0x50, &[], &mut [0; 3], 10), Ok(()));
        assert_eq!(bus.write_then_read(0x50, &[7], &mut [], 10), Ok(()));
        assert_eq!(
            bus.peripheral.ops.as_slice(),
            &[Op::Read(0x50, 3), Op::Write(0x50, 1)]
        );
    }

    #[test]
    fn test_probe_retries_until_success() {
        let mut bus = ready_bus();
        bus.peripheral.fail_next(I2cFault::Nack);
        bus.peripheral.fail_next(I2cFault::Nack);

        assert_eq!(bus.probe(0x3C, 5, 10), Ok(()));
        assert_eq!(bus.peripheral.ops.len(), 3);
    }

    #[test]
    fn test_probe_returns_last_failure() {
        let mut bus = ready_bus();
        bus.peripheral.fail_next(I2cFault::Nack);
        bus.peripheral.fail_next(I2cFault::Busy);

        assert_eq!(bus.probe(0x3C, 2, 10), Err(BusError::Busy));
        assert_eq!(bus.peripheral.ops.len(), 2);
    }

    #[test]
    fn test_probe_zero_attempts_tries_once() {
        let mut bus = ready_bus();
        bus.peripheral.fail_next(I2cFault::Nack);
        assert_eq!(
            bus.probe(0x3C, 0, 10),
            Err(BusError::LowLevel(I2cFault::Nack))
        );
        assert_eq!(bus.peripheral.ops.as_slice(), &[Op::Probe(0x3C)]);
    }

    #[test]
    fn test_scan() {
        let mut bus = ready_bus();
        bus.peripheral.responders.extend_from_slice(&[0x3C, 0x50]).unwrap();

        let found = bus.scan(5).unwrap();
        assert_eq!(found.as_slice(), &[0x3C, 0x50]);
        assert_eq!(bus.peripheral.ops.len(), 112);
    }

    #[test]
    fn test_timeout_beyond_peripheral_limit_rejected() {
        let mut bus = BusTransactor::new(MockI2c {
            max_timeout: 20,
            ..Default::default()
        });
        bus.init(BLUE_PILL_I2C1).unwrap();
        bus.peripheral.ops.clear();

        let mut buf = [0u8; 2];
        assert_eq!(bus.write(0x3C, &[1], 21), Err(BusError::InvalidParam));
        assert_eq!(bus.read(0x3C, &mut buf, 50), Err(BusError::InvalidParam));
        assert_eq!(
            bus.write_then_read(0x3C, &[1], &mut buf, 21),
            Err(BusError::InvalidParam)
        );
        assert_eq!(bus.probe(0x3C, 3, 100), Err(BusError::InvalidParam));
        assert_eq!(bus.scan(21), Err(BusError::InvalidParam));
        assert!(bus.peripheral.ops.is_empty());

        assert_eq!(bus.write(0x3C, &[1], 20), Ok(()));
        assert_eq!(bus.peripheral.ops.as_slice(), &[Op::Write(0x3C, 1)]);
    }
}
