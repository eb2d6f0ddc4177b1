//! Buffered byte transport between the panel driver and the I2C bus
//!
//! The panel driver speaks a narrow callback contract: start a transfer,
//! hand over bytes, end the transfer. [`DisplayByteBridge`] collects those
//! bytes in a fixed buffer and turns them into bounded bus writes to the
//! display address.
//!
//! ```text
//!   Idle --start--> TransferActive --bytes--> (append, flush when full)
//!    ^                    |
//!    +-------end----------+  (flush remainder)
//! ```
//!
//! A buffer is only flushed when it is full and another byte arrives, or at
//! transfer end, so a transfer of `n` bytes produces `ceil(n / CAP)` writes
//! in order, each at most `CAP` bytes long.

use heapless::Vec;
use sprout_core::config::{DeviceAddress, DisplayConfig};
use sprout_core::{BusError, BusTransactor};
use sprout_hal::I2cPeripheral;

use crate::error::DisplayError;

/// Default transfer buffer size, matching the I2C peripheral FIFO budget
pub const DEFAULT_CAPACITY: usize = 32;

/// Byte sink used by the panel driver
pub trait ByteTransport {
    type Error;

    /// Begin a logical transfer
    fn start_transfer(&mut self);

    /// Append bytes to the current transfer
    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Finish the current transfer, flushing anything still buffered
    fn end_transfer(&mut self) -> Result<(), Self::Error>;

    /// Send `data` as one complete transfer
    fn transfer(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.start_transfer();
        let sent = self.send(data);
        let ended = self.end_transfer();
        sent.and(ended)
    }
}

/// Bridge state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeState {
    Idle,
    TransferActive,
}

/// Outcome of the current or most recent transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferReport {
    /// Bus writes issued
    pub flushes: u16,
    /// First failed write, if any
    pub first_failure: Option<BusError>,
}

/// Fixed-buffer adapter from the byte contract to bus writes
pub struct DisplayByteBridge<const CAP: usize = DEFAULT_CAPACITY> {
    address: DeviceAddress,
    chunk_timeout_ms: u32,
    final_timeout_ms: u32,
    buffer: Vec<u8, CAP>,
    state: BridgeState,
    report: TransferReport,
}

impl<const CAP: usize> DisplayByteBridge<CAP> {
    /// A zero-capacity buffer could never make progress
    const NONZERO_CAPACITY: () = assert!(CAP > 0, "bridge capacity must be non-zero");

    pub fn new(config: &DisplayConfig) -> Self {
        let () = Self::NONZERO_CAPACITY;
        Self {
            address: config.address,
            chunk_timeout_ms: config.chunk_timeout_ms,
            final_timeout_ms: config.final_timeout_ms,
            buffer: Vec::new(),
            state: BridgeState::Idle,
            report: TransferReport::default(),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Report for the current or most recent transfer
    pub fn report(&self) -> TransferReport {
        self.report
    }

    /// Bytes waiting to be flushed
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Start a transfer, discarding anything left from a previous one
    pub fn on_transfer_start(&mut self) {
        self.buffer.clear();
        self.report = TransferReport::default();
        self.state = BridgeState::TransferActive;
    }

    /// Append bytes, flushing full buffers with the chunk timeout
    ///
    /// A failed flush does not stop the transfer: the remaining bytes are
    /// still buffered and written. The first failure of this call is
    /// returned.
    pub fn on_bytes<P: I2cPeripheral>(
        &mut self,
        bus: &mut BusTransactor<P>,
        data: &[u8],
    ) -> Result<(), DisplayError> {
        if self.state != BridgeState::TransferActive {
            return Err(DisplayError::NotActive);
        }

        let mut result = Ok(());
        let mut rest = data;
        while !rest.is_empty() {
            if self.buffer.is_full() {
                let flushed = self.flush(bus, self.chunk_timeout_ms);
                if result.is_ok() {
                    result = flushed;
                }
            }

            let take = (CAP - self.buffer.len()).min(rest.len());
            let (head, tail) = rest.split_at(take);
            // Cannot fail: `take` fits the remaining capacity
            let _ = self.buffer.extend_from_slice(head);
            rest = tail;
        }

        result.map_err(DisplayError::from)
    }

    /// Flush the remainder with the final timeout and go idle
    pub fn on_transfer_end<P: I2cPeripheral>(
        &mut self,
        bus: &mut BusTransactor<P>,
    ) -> Result<(), DisplayError> {
        if self.state != BridgeState::TransferActive {
            return Err(DisplayError::NotActive);
        }

        let result = self.flush(bus, self.final_timeout_ms);
        self.state = BridgeState::Idle;
        result.map_err(DisplayError::from)
    }

    /// Borrow the bus for a run of transfers
    pub fn session<'b, P: I2cPeripheral>(
        &'b mut self,
        bus: &'b mut BusTransactor<P>,
    ) -> BridgeSession<'b, P, CAP> {
        BridgeSession { bridge: self, bus }
    }

    fn flush<P: I2cPeripheral>(
        &mut self,
        bus: &mut BusTransactor<P>,
        timeout_ms: u32,
    ) -> Result<(), BusError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let result = bus.write(self.address.get(), &self.buffer, timeout_ms);
        self.buffer.clear();
        self.report.flushes = self.report.flushes.saturating_add(1);
        if let Err(e) = result {
            self.report.first_failure.get_or_insert(e);
        }
        result
    }
}

/// A bridge paired with the bus it writes to
///
/// Lives only as long as a draw call; the bus goes back to its owner
/// afterwards.
pub struct BridgeSession<'b, P, const CAP: usize> {
    bridge: &'b mut DisplayByteBridge<CAP>,
    bus: &'b mut BusTransactor<P>,
}

impl<P: I2cPeripheral, const CAP: usize> ByteTransport for BridgeSession<'_, P, CAP> {
    type Error = DisplayError;

    fn start_transfer(&mut self) {
        self.bridge.on_transfer_start();
    }

    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.bridge.on_bytes(self.bus, data)
    }

    fn end_transfer(&mut self) -> Result<(), Self::Error> {
        self.bridge.on_transfer_end(self.bus)
    }
}
