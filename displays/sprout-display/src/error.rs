//! Display errors

use sprout_core::BusError;

/// Display path errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Display not initialized, or the bus behind it is down
    NotReady,
    /// Bytes or transfer end delivered outside a transfer
    NotActive,
    /// A flush to the panel failed
    Bus(BusError),
}

impl From<BusError> for DisplayError {
    fn from(e: BusError) -> Self {
        DisplayError::Bus(e)
    }
}
