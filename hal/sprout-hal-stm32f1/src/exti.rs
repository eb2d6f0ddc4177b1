//! External interrupt line control for STM32F1
//!
//! Register-level EXTI setup. The firmware defines the `EXTIn` vectors
//! itself and hands the pending lines to its dispatcher, so this module
//! only routes pins to lines, selects edges, and reads and clears the
//! pending register.

use embassy_stm32::interrupt::{Interrupt, InterruptExt, Priority};
use embassy_stm32::pac;
use embassy_stm32::pac::exti::regs::Lines;
use sprout_hal::PinId;

use crate::gpio::port_index;

/// Number of GPIO-backed EXTI lines
pub const LINES: u8 = 16;

/// STM32F1 implements the top 4 bits of each NVIC priority byte
const PRIORITY_SHIFT: u8 = 4;

/// Trigger edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// EXTI setup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtiError {
    /// Pin number has no EXTI line
    InvalidLine,
}

/// Route a pin to its EXTI line and unmask it
///
/// The line number is the pin index, so `PA0` and `PB0` share line 0 and
/// only one of them can be routed at a time. Any stale pending flag is
/// cleared before the line is unmasked.
pub fn configure_line(pin: PinId, edge: Edge) -> Result<u8, ExtiError> {
    if !pin.is_valid() {
        return Err(ExtiError::InvalidLine);
    }
    let line = pin.index as usize;
    let (rising, falling) = match edge {
        Edge::Rising => (true, false),
        Edge::Falling => (false, true),
        Edge::Both => (true, true),
    };

    critical_section::with(|_| {
        pac::RCC.apb2enr().modify(|w| w.set_afioen(true));
        pac::AFIO
            .exticr(line / 4)
            .modify(|w| w.set_exti(line % 4, port_index(pin.port)));

        pac::EXTI.rtsr(0).modify(|w| w.set_line(line, rising));
        pac::EXTI.ftsr(0).modify(|w| w.set_line(line, falling));

        let mut stale = Lines(0);
        stale.set_line(line, true);
        pac::EXTI.pr(0).write_value(stale);

        pac::EXTI.imr(0).modify(|w| w.set_line(line, true));
    });

    Ok(pin.index)
}

/// Read and clear the pending flags among `mask`
///
/// Called at the start of an EXTI vector. Clearing first means an edge
/// arriving while its handler runs re-pends the vector instead of being
/// lost.
pub fn take_pending(mask: u32) -> u32 {
    let pending = pac::EXTI.pr(0).read().0 & mask;
    if pending != 0 {
        // Write-one-to-clear; zero bits leave other lines alone
        pac::EXTI.pr(0).write_value(Lines(pending));
    }
    pending
}

/// Pending mask covered by a line's interrupt vector
///
/// Lines 0-4 have their own vectors; 5-9 and 10-15 share one each.
pub const fn vector_mask(line: u8) -> u32 {
    match line {
        0..=4 => 1 << line,
        5..=9 => 0x0000_03E0,
        10..=15 => 0x0000_FC00,
        _ => 0,
    }
}

/// Interrupt vector serving a line
pub fn line_interrupt(line: u8) -> Option<Interrupt> {
    let irq = match line {
        0 => Interrupt::EXTI0,
        1 => Interrupt::EXTI1,
        2 => Interrupt::EXTI2,
        3 => Interrupt::EXTI3,
        4 => Interrupt::EXTI4,
        5..=9 => Interrupt::EXTI9_5,
        10..=15 => Interrupt::EXTI15_10,
        _ => return None,
    };
    Some(irq)
}

/// Convert a 0-15 priority level (lower is more urgent) to an NVIC priority
pub fn nvic_priority(level: u8) -> Priority {
    Priority::from(level.min(15) << PRIORITY_SHIFT)
}

/// Set a line's vector priority and enable it in the NVIC
///
/// Must be called only once the dispatcher that serves the vector is
/// published, since the vector may fire immediately.
pub fn enable_line_interrupt(line: u8, level: u8) -> Result<(), ExtiError> {
    let irq = line_interrupt(line).ok_or(ExtiError::InvalidLine)?;
    irq.set_priority(nvic_priority(level));
    // SAFETY: the firmware defines a handler for every EXTI vector it
    // enables, and enabling happens after the handler's state is in place.
    unsafe { irq.enable() };
    Ok(())
}

