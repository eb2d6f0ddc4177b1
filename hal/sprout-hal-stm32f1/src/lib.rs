//! STM32F1-specific HAL for the Sprout firmware
//!
//! This crate provides STM32F1 implementations of the `sprout-hal` traits.
//! It supports:
//!
//! - STM32F103C8 (Blue Pill)
//! - STM32F103CB
//!
//! # Features
//!
//! - `stm32f103c8` - Enable support for STM32F103C8T6
//! - `stm32f103cb` - Enable support for STM32F103CBT6
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! Peripherals are still created through embassy-stm32 in the firmware; the
//! wrappers here adapt them to the board-agnostic traits. EXTI lines are
//! driven at register level so the firmware owns the interrupt vectors and
//! can route them through its own dispatcher.

#![no_std]

pub mod clock;
pub mod exti;
pub mod gpio;
pub mod i2c;

pub use clock::SystemClock;
pub use exti::Edge;
pub use gpio::{SensorPin, StatusLed};
pub use i2c::BlockingBus;
