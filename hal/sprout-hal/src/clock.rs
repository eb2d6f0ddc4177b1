//! Timebase abstractions
//!
//! The counter debounces against a free-running millisecond tick, and the
//! main loop paces itself with blocking delays. Both are traits so host
//! tests can drive time by hand instead of spinning.

/// Monotonic millisecond clock
///
/// The value wraps at `u32::MAX` (about 49.7 days); consumers must compare
/// timestamps with wrapping arithmetic.
pub trait Clock {
    /// Milliseconds since boot, wrapping
    fn now_ms(&self) -> u32;
}

/// Blocking millisecond delay
pub trait DelayMs {
    /// Block for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
