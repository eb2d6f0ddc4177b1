//! Status display facade
//!
//! Ties the panel framebuffer, the byte bridge and the status screen
//! together. The facade never owns the bus: every call that touches the
//! panel borrows the [`BusTransactor`] from the main loop for its duration.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use sprout_core::config::DisplayConfig;
use sprout_core::{BusTransactor, CountSnapshot};
use sprout_hal::I2cPeripheral;

use crate::bridge::{DisplayByteBridge, TransferReport};
use crate::error::DisplayError;
use crate::panel::Ssd1306;
use crate::screen::{self, StatusScreen};

/// Probe attempts before giving up on the panel
const PROBE_ATTEMPTS: u8 = 3;

/// Banner shown after boot
pub const BANNER_TITLE: &str = "SPROUT COUNTER";
pub const BANNER_VERSION: &str = "FIRMWARE VERSION V1.0";

/// SSD1306 status display
pub struct Display {
    config: DisplayConfig,
    panel: Ssd1306,
    bridge: DisplayByteBridge,
    screen: StatusScreen,
    ready: bool,
}

impl Display {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            panel: Ssd1306::new(),
            bridge: DisplayByteBridge::new(&config),
            screen: StatusScreen::new(),
            ready: false,
        }
    }

    /// Bring the panel up
    ///
    /// Requires an initialized bus. Probes the panel address, sends the
    /// power-up sequence and blanks the screen. Returns whether the panel is
    /// usable.
    pub fn init<P: I2cPeripheral>(&mut self, bus: &mut BusTransactor<P>) -> bool {
        self.ready = false;
        if !bus.is_ready() {
            return false;
        }

        let address = self.config.address.get();
        if bus
            .probe(address, PROBE_ATTEMPTS, self.config.chunk_timeout_ms)
            .is_err()
        {
            return false;
        }

        self.panel.clear_buffer();
        let mut session = self.bridge.session(bus);
        let result = self
            .panel
            .init(&mut session)
            .and_then(|()| self.panel.flush(&mut session));

        self.ready = result.is_ok();
        self.screen.mark_dirty();
        self.ready
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Clear the framebuffer
    pub fn clear(&mut self) {
        self.panel.clear_buffer();
    }

    /// Draw text into the framebuffer, baseline at `y`
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str) {
        screen::draw_text(&mut self.panel, x, y, text);
    }

    /// Push the framebuffer to the panel
    pub fn send<P: I2cPeripheral>(
        &mut self,
        bus: &mut BusTransactor<P>,
    ) -> Result<(), DisplayError> {
        if !self.ready {
            return Err(DisplayError::NotReady);
        }
        let mut session = self.bridge.session(bus);
        self.panel.flush(&mut session)
    }

    /// Replace the screen with one line of text
    ///
    /// Transfer failures are dropped; [`last_report`](Self::last_report)
    /// shows what happened on the bus.
    pub fn write_text<P: I2cPeripheral>(
        &mut self,
        bus: &mut BusTransactor<P>,
        x: i32,
        y: i32,
        text: &str,
    ) {
        if !self.ready {
            return;
        }
        self.clear();
        self.draw_text(x, y, text);
        let _ = self.send(bus);
        // The next status refresh must repaint over this text
        self.screen.mark_dirty();
    }

    /// Show the product name and firmware version
    pub fn write_version_banner<P: I2cPeripheral>(&mut self, bus: &mut BusTransactor<P>) {
        if !self.ready {
            return;
        }
        self.clear();
        self.draw_text(0, 10, BANNER_TITLE);
        self.draw_text(0, 28, BANNER_VERSION);
        let _ = self.send(bus);
        self.screen.mark_dirty();
    }

    /// Render the counters if they changed since the last frame
    ///
    /// Returns whether a frame was sent.
    pub fn show_counts<P: I2cPeripheral, const N: usize>(
        &mut self,
        bus: &mut BusTransactor<P>,
        snapshot: &CountSnapshot<N>,
    ) -> Result<bool, DisplayError> {
        if !self.ready {
            return Err(DisplayError::NotReady);
        }

        self.screen.set_counts(snapshot);
        if !self.screen.is_dirty() {
            return Ok(false);
        }

        // Only the framebuffer is touched here; it cannot fail
        let _ = self.panel.clear(BinaryColor::Off);
        self.screen.render(&mut self.panel);
        self.send(bus)?;
        self.screen.mark_clean();
        Ok(true)
    }

    /// Bus outcome of the most recent transfer
    pub fn last_report(&self) -> TransferReport {
        self.bridge.report()
    }

    /// Raw panel access, absent until init succeeds
    pub fn raw(&mut self) -> Option<&mut Ssd1306> {
        if self.ready {
            Some(&mut self.panel)
        } else {
            None
        }
    }
}
