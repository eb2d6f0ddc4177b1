//! Board-agnostic core logic for the Sprout counter firmware
//!
//! This crate contains the parts of the firmware that do not depend on a
//! specific chip:
//!
//! - Interrupt line dispatch table
//! - Debounced per-channel event counters
//! - Sensor input glue between the two
//! - Validated, timeout-bounded I2C transactions
//! - Configuration and error types

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod counter;
pub mod dispatch;
pub mod error;
pub mod sensor;

pub use bus::BusTransactor;
pub use counter::{ChannelId, CountSnapshot, EdgeOutcome, EventCounter};
pub use dispatch::{InterruptBinding, InterruptDispatcher, LineHandler};
pub use error::{BusError, DispatchError, InvalidChannel};
pub use sensor::{EventObserver, SensorInput};
