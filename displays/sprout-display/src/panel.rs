//! SSD1306 OLED panel driver
//!
//! Driver for 128x32 SSD1306-based OLED displays. Keeps a page-organized
//! framebuffer that embedded-graphics draws into, and uploads it through a
//! [`ByteTransport`]. Every transfer starts with the SSD1306 control byte
//! (0x00 for commands, 0x40 for data) and stays within one transfer buffer,
//! since the controller expects a fresh control byte after each bus start.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::bridge::ByteTransport;

/// Display dimensions
pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 32;
const PAGES: usize = HEIGHT / 8;

/// Data bytes per upload transfer, leaving room for the control byte
pub const DATA_CHUNK: usize = 16;

/// Control byte prefixes
const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

/// SSD1306 commands
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const RESUME_RAM: u8 = 0xA4;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_COLUMN_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
    pub const DEACTIVATE_SCROLL: u8 = 0x2E;
}

/// Power-up sequence for a 128x32 module with the internal charge pump
const INIT_SEQUENCE: &[u8] = &[
    cmd::DISPLAY_OFF,
    cmd::SET_CLOCK_DIV,
    0x80,
    cmd::SET_MUX_RATIO,
    (HEIGHT - 1) as u8,
    cmd::SET_DISPLAY_OFFSET,
    0x00,
    cmd::SET_START_LINE,
    cmd::SET_CHARGE_PUMP,
    0x14,
    cmd::SET_MEMORY_MODE,
    0x00, // horizontal addressing
    cmd::SET_SEG_REMAP,
    cmd::SET_COM_SCAN_DEC,
    cmd::SET_COM_PINS,
    0x02, // sequential COM, required for 32 rows
    cmd::SET_CONTRAST,
    0x8F,
    cmd::SET_PRECHARGE,
    0xF1,
    cmd::SET_VCOM_DETECT,
    0x40,
    cmd::DEACTIVATE_SCROLL,
    cmd::RESUME_RAM,
    cmd::SET_NORMAL,
    cmd::DISPLAY_ON,
];

/// SSD1306 framebuffer and command encoder
pub struct Ssd1306 {
    /// Frame buffer (1 bit per pixel, LSB at the top of each page)
    buffer: [[u8; WIDTH]; PAGES],
}

impl Default for Ssd1306 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ssd1306 {
    pub const fn new() -> Self {
        Self {
            buffer: [[0; WIDTH]; PAGES],
        }
    }

    /// Send the power-up sequence
    pub fn init<T: ByteTransport>(&self, transport: &mut T) -> Result<(), T::Error> {
        self.commands(transport, INIT_SEQUENCE)
    }

    /// Send one or more commands as a single transfer
    pub fn commands<T: ByteTransport>(
        &self,
        transport: &mut T,
        commands: &[u8],
    ) -> Result<(), T::Error> {
        transport.start_transfer();
        let sent = transport
            .send(&[CONTROL_COMMAND])
            .and_then(|()| transport.send(commands));
        let ended = transport.end_transfer();
        sent.and(ended)
    }

    /// Clear the frame buffer
    pub fn clear_buffer(&mut self) {
        for page in self.buffer.iter_mut() {
            page.fill(0);
        }
    }

    /// Read back one pixel
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        self.buffer[y / 8][x] & (1 << (y % 8)) != 0
    }

    fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let byte = &mut self.buffer[y / 8][x];
        if on {
            *byte |= 1 << (y % 8);
        } else {
            *byte &= !(1 << (y % 8));
        }
    }

    /// Upload the whole frame buffer
    ///
    /// Resets the column and page window, then streams the pages in
    /// [`DATA_CHUNK`] sized data transfers. Stops at the first failure.
    pub fn flush<T: ByteTransport>(&self, transport: &mut T) -> Result<(), T::Error> {
        self.commands(
            transport,
            &[
                cmd::SET_COLUMN_ADDR,
                0,
                (WIDTH - 1) as u8,
                cmd::SET_PAGE_ADDR,
                0,
                (PAGES - 1) as u8,
            ],
        )?;

        for page in &self.buffer {
            for chunk in page.chunks(DATA_CHUNK) {
                transport.start_transfer();
                let sent = transport
                    .send(&[CONTROL_DATA])
                    .and_then(|()| transport.send(chunk));
                let ended = transport.end_transfer();
                sent.and(ended)?;
            }
        }

        Ok(())
    }
}

impl DrawTarget for Ssd1306 {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= WIDTH as i32 || point.y >= HEIGHT as i32 {
                continue;
            }
            self.set_pixel(point.x as usize, point.y as usize, color.is_on());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        for page in self.buffer.iter_mut() {
            page.fill(fill);
        }
        Ok(())
    }
}

impl OriginDimensions for Ssd1306 {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    /// Collects transfers as whole byte strings
    #[derive(Default)]
    struct Capture {
        transfers: Vec<Vec<u8>>,
        fail_after: Option<usize>,
    }

    impl ByteTransport for Capture {
        type Error = ();

        fn start_transfer(&mut self) {
            self.transfers.push(Vec::new());
        }

        fn send(&mut self, data: &[u8]) -> Result<(), ()> {
            if let Some(current) = self.transfers.last_mut() {
                current.extend_from_slice(data);
            }
            Ok(())
        }

        fn end_transfer(&mut self) -> Result<(), ()> {
            match self.fail_after {
                Some(n) if self.transfers.len() > n => Err(()),
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn test_init_is_one_command_transfer() {
        let panel = Ssd1306::new();
        let mut capture = Capture::default();
        panel.init(&mut capture).unwrap();

        assert_eq!(capture.transfers.len(), 1);
        let t = &capture.transfers[0];
        assert_eq!(t[0], CONTROL_COMMAND);
        assert_eq!(&t[1..], INIT_SEQUENCE);
        assert_eq!(&t[1..6], &[0xAE, 0xD5, 0x80, 0xA8, 0x1F]);
        assert_eq!(t.last(), Some(&0xAF));
        assert!(t.len() <= 32);
    }

    #[test]
    fn test_flush_layout() {
        let mut panel = Ssd1306::new();
        panel.buffer[0][0] = 0x11;
        panel.buffer[3][127] = 0x22;

        let mut capture = Capture::default();
        panel.flush(&mut capture).unwrap();

        let transfers = &capture.transfers;
        assert_eq!(transfers.len(), 1 + PAGES * WIDTH / DATA_CHUNK);
        assert_eq!(
            transfers[0].as_slice(),
            &[CONTROL_COMMAND, 0x21, 0, 127, 0x22, 0, 3]
        );
        assert!(transfers[1..]
            .iter()
            .all(|t| t[0] == CONTROL_DATA && t.len() == DATA_CHUNK + 1));
        assert_eq!(transfers[1][1], 0x11);
        assert_eq!(transfers.last().and_then(|t| t.last()), Some(&0x22));
    }

    #[test]
    fn test_flush_stops_at_first_failure() {
        let panel = Ssd1306::new();
        let mut capture = Capture {
            fail_after: Some(2),
            ..Default::default()
        };
        assert_eq!(panel.flush(&mut capture), Err(()));
        assert_eq!(capture.transfers.len(), 3);
    }

    #[test]
    fn test_draw_target_pixels() {
        let mut panel = Ssd1306::new();
        Pixel(Point::new(3, 9), BinaryColor::On)
            .draw(&mut panel)
            .unwrap();
        Pixel(Point::new(200, 9), BinaryColor::On)
            .draw(&mut panel)
            .unwrap();

        assert!(panel.pixel(3, 9));
        assert_eq!(panel.buffer[1][3], 0b10);
        assert!(!panel.pixel(4, 9));

        panel.clear_buffer();
        assert!(!panel.pixel(3, 9));
    }
}
