//! Status display for Sprout
//!
//! This crate provides:
//! - `DisplayByteBridge`, which turns the panel driver's byte stream into
//!   bounded I2C writes
//! - `Ssd1306`, a 128x32 framebuffer that embedded-graphics draws into
//! - `StatusScreen`, the text layout for the counter status
//! - `Display`, the facade the firmware talks to
//!
//! # Architecture
//!
//! ```text
//!  Display ──draw──> Ssd1306 framebuffer
//!     │                   │ start / bytes / end
//!     │                   v
//!     └──borrows──> DisplayByteBridge ──write──> BusTransactor
//! ```
//!
//! The bus is owned by the firmware main loop and lent to the display per
//! call, so no display path can run from interrupt context.

#![no_std]

pub mod bridge;
pub mod display;
pub mod error;
pub mod panel;
pub mod screen;

#[cfg(test)]
mod testing;

// Re-export key types
pub use bridge::{BridgeState, ByteTransport, DisplayByteBridge, TransferReport};
pub use display::Display;
pub use error::DisplayError;
pub use panel::Ssd1306;
pub use screen::{StatusScreen, SCREEN_COLS, SCREEN_ROWS};
