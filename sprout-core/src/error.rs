//! Error types shared by the counting and bus layers

use sprout_hal::I2cFault;

/// Outcome of a failed bus transaction or bus initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Bad arguments or configuration, rejected before touching hardware
    InvalidParam,
    /// The bus handle has not been initialized
    NotReady,
    /// Bus held by another transfer
    Busy,
    /// Transfer did not finish within the caller's timeout
    Timeout,
    /// Fault below this layer (NACK, arbitration, overrun, ...)
    LowLevel(I2cFault),
}

impl From<I2cFault> for BusError {
    fn from(fault: I2cFault) -> Self {
        match fault {
            I2cFault::Busy => BusError::Busy,
            I2cFault::Timeout => BusError::Timeout,
            other => BusError::LowLevel(other),
        }
    }
}

/// Interrupt line registration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// Line id outside the dispatcher's table
    InvalidLine,
    /// A handler is already bound; unbind it first
    AlreadyBound,
}

/// Channel id outside the counter table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidChannel;
