//! Millisecond timebase backed by the embassy time driver

use embassy_time::{block_for, Duration, Instant};
use sprout_hal::{Clock, DelayMs};

/// System tick clock
///
/// Safe to read from interrupt context. The millisecond count is truncated
/// to `u32` and wraps after about 49.7 days.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

impl DelayMs for SystemClock {
    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}
