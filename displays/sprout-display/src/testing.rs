//! Mock I2C peripheral shared by the display tests

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use sprout_core::config::BLUE_PILL_I2C1;
use sprout_core::BusTransactor;
use sprout_hal::{I2cConfig, I2cFault, I2cPeripheral};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub address: u8,
    pub data: Vec<u8>,
    pub timeout_ms: u32,
}

/// Records writes and probes, replays scripted faults
#[derive(Default)]
pub struct MockI2c {
    pub writes: Vec<Write>,
    pub probes: Vec<u8>,
    pub absent: bool,
    script: VecDeque<I2cFault>,
}

impl MockI2c {
    pub fn fail_next(&mut self, fault: I2cFault) {
        self.script.push_back(fault);
    }

    fn next(&mut self) -> Result<(), I2cFault> {
        self.script.pop_front().map_or(Ok(()), Err)
    }
}

impl I2cPeripheral for MockI2c {
    fn configure(&mut self, _config: &I2cConfig) -> Result<(), I2cFault> {
        Ok(())
    }

    fn write(&mut self, address: u8, data: &[u8], timeout_ms: u32) -> Result<(), I2cFault> {
        self.writes.push(Write {
            address,
            data: data.to_vec(),
            timeout_ms,
        });
        self.next()
    }

    fn read(&mut self, _address: u8, buf: &mut [u8], _timeout_ms: u32) -> Result<(), I2cFault> {
        buf.fill(0);
        self.next()
    }

    fn probe(&mut self, address: u8, _timeout_ms: u32) -> Result<(), I2cFault> {
        self.probes.push(address);
        if self.absent {
            Err(I2cFault::Nack)
        } else {
            Ok(())
        }
    }
}

/// Bus initialized on the Blue Pill I2C1 pins
pub fn ready_bus() -> BusTransactor<MockI2c> {
    let mut bus = BusTransactor::new(MockI2c::default());
    bus.init(BLUE_PILL_I2C1).unwrap();
    bus
}
