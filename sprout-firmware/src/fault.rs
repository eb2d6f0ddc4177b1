//! Unrecoverable failure handling

use defmt::*;
use sprout_hal::{DelayMs, OutputPin};

/// Half period of the fault blink (10 Hz)
const BLINK_HALF_PERIOD_MS: u32 = 50;

/// Blink the status LED forever
///
/// Used when the firmware cannot count at all. Interrupts stay enabled, so
/// the debug probe can still read logs.
pub fn blink_forever<L, D>(led: &mut L, delay: &mut D) -> !
where
    L: OutputPin,
    D: DelayMs,
{
    error!("Unrecoverable failure, entering fault blink");
    loop {
        led.toggle();
        delay.delay_ms(BLINK_HALF_PERIOD_MS);
    }
}
