//! Sprout Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the counter logic is
//! written against. Chip-specific crates (currently STM32F1) implement them,
//! and host tests substitute mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (sprout-firmware)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  sprout-core / sprout-display           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  sprout-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  sprout-hal-  │
//!             │    stm32f1    │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`i2c::I2cPeripheral`] - Timeout-bounded I2C master transfers
//! - [`clock::Clock`], [`clock::DelayMs`] - Millisecond timebase and delays

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use clock::{Clock, DelayMs};
pub use gpio::{InputPin, OutputPin, PinId, Port};
pub use i2c::{I2cConfig, I2cFault, I2cPeripheral};
