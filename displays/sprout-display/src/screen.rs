//! Status screen buffer
//!
//! Text lines shown on the 128x32 panel, with a dirty flag so the main loop
//! only pushes a frame when the content changed.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;
use sprout_core::CountSnapshot;

/// Number of text rows that fit with the 6x10 font
pub const SCREEN_ROWS: usize = 3;

/// Characters per row with the 6x10 font
pub const SCREEN_COLS: usize = 21;

/// Rows available to channel counts; the last row is kept for the total
const CHANNEL_ROWS: usize = SCREEN_ROWS - 1;

/// Baseline of the first row, in pixels
const FIRST_BASELINE: i32 = 10;

/// Distance between row baselines
const ROW_PITCH: i32 = 10;

/// Draw one string with the status font, baseline at `y`
pub fn draw_text<D>(target: &mut D, x: i32, y: i32, text: &str)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    // Framebuffer targets do not fail
    let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Alphabetic).draw(target);
}

/// Whether `field` can be appended to `row` after a separating space
fn fits(row: &str, field: &str) -> bool {
    let sep = usize::from(!row.is_empty());
    row.len() + sep + field.len() <= SCREEN_COLS
}

/// Character screen
#[derive(Clone)]
pub struct StatusScreen {
    lines: [String<SCREEN_COLS>; SCREEN_ROWS],
    dirty: bool,
}

impl Default for StatusScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusScreen {
    pub fn new() -> Self {
        Self {
            lines: core::array::from_fn(|_| String::new()),
            dirty: true,
        }
    }

    /// Set the content of a row, truncating to the row width
    ///
    /// Marks the screen dirty only if the text changed.
    pub fn set_line(&mut self, row: usize, text: &str) {
        let Some(line) = self.lines.get_mut(row) else {
            return;
        };

        let end = text
            .char_indices()
            .nth(SCREEN_COLS)
            .map_or(text.len(), |(i, _)| i);
        let text = &text[..end];

        if line.as_str() != text {
            line.clear();
            let _ = line.push_str(text);
            self.dirty = true;
        }
    }

    pub fn get_line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(|s| s.as_str())
    }

    /// Lay out per-channel counts and their total
    ///
    /// Channel fields fill the rows above the total and wrap to the next
    /// row when they no longer fit. A number is never cut short: a field
    /// that cannot be placed whole shows as `X:*`. The total goes on the
    /// row after the last channel row.
    pub fn set_counts<const N: usize>(&mut self, snapshot: &CountSnapshot<N>) {
        let mut rows: [String<SCREEN_COLS>; SCREEN_ROWS] =
            core::array::from_fn(|_| String::new());
        let mut row = 0;

        for (i, count) in snapshot.counts.iter().enumerate() {
            let label = (b'A' + i as u8) as char;
            let mut field: String<16> = String::new();
            let _ = write!(field, "{}:{}", label, count);

            if !fits(&rows[row], &field) && !rows[row].is_empty() && row + 1 < CHANNEL_ROWS {
                row += 1;
            }
            if !fits(&rows[row], &field) {
                field.clear();
                let _ = write!(field, "{}:*", label);
            }
            if fits(&rows[row], &field) {
                if !rows[row].is_empty() {
                    let _ = rows[row].push(' ');
                }
                let _ = rows[row].push_str(&field);
            }
        }

        let total_row = if rows[row].is_empty() { row } else { row + 1 };
        let _ = write!(rows[total_row], "TOTAL {}", snapshot.total());

        for (i, text) in rows.iter().enumerate() {
            self.set_line(i, text);
        }
    }

    /// Draw every row into a target
    pub fn render<D>(&self, target: &mut D)
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let mut y = FIRST_BASELINE;
        for line in &self.lines {
            if !line.is_empty() {
                draw_text(target, 0, y, line);
            }
            y += ROW_PITCH;
        }
    }

    /// Check if screen needs redrawing
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark screen as clean (after rendering)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Mark screen as dirty (needs redraw)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusScreen {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Screen[");
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                defmt::write!(f, ", ");
            }
            defmt::write!(f, "{}", line.as_str());
        }
        defmt::write!(f, "]");
    }
}
