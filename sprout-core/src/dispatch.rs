//! External interrupt demultiplexing
//!
//! The platform's interrupt vectors know only which hardware line fired. The
//! dispatcher owns a fixed table from line to handler, filled once during
//! boot and read-only afterwards, so interrupt code does a single indexed
//! lookup and never allocates or blocks.

use crate::error::DispatchError;

/// Number of external interrupt lines on the STM32F1 EXTI controller
pub const EXTI_LINES: usize = 16;

/// Handler invoked from interrupt context
///
/// Implementations must return quickly and must not block or issue bus
/// transfers. They are called through a shared reference, possibly from
/// nested interrupts, hence the `Sync` bound.
pub trait LineHandler: Sync {
    fn on_interrupt(&self, line: u8);
}

/// One line's registration
#[derive(Clone, Copy)]
pub struct InterruptBinding<'a> {
    /// Hardware line id
    pub line: u8,
    /// Interrupt priority requested for the line
    pub priority: u8,
    handler: &'a dyn LineHandler,
}

impl core::fmt::Debug for InterruptBinding<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InterruptBinding")
            .field("line", &self.line)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Line-to-handler table
pub struct InterruptDispatcher<'a, const LINES: usize = EXTI_LINES> {
    bindings: [Option<InterruptBinding<'a>>; LINES],
}

impl<const LINES: usize> Default for InterruptDispatcher<'_, LINES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const LINES: usize> InterruptDispatcher<'a, LINES> {
    /// Create a dispatcher with no bindings
    pub const fn new() -> Self {
        Self {
            bindings: [None; LINES],
        }
    }

    /// Bind a handler to a line
    ///
    /// Rebinding requires an explicit [`unbind`](Self::unbind) so a stray
    /// second registration cannot silently replace the first.
    pub fn register(
        &mut self,
        line: u8,
        priority: u8,
        handler: &'a dyn LineHandler,
    ) -> Result<(), DispatchError> {
        let slot = self
            .bindings
            .get_mut(line as usize)
            .ok_or(DispatchError::InvalidLine)?;

        if slot.is_some() {
            return Err(DispatchError::AlreadyBound);
        }

        *slot = Some(InterruptBinding {
            line,
            priority,
            handler,
        });
        Ok(())
    }

    /// Remove a line's binding
    ///
    /// Returns true if a handler was bound.
    pub fn unbind(&mut self, line: u8) -> bool {
        self.bindings
            .get_mut(line as usize)
            .and_then(Option::take)
            .is_some()
    }

    /// Look up a line's binding
    pub fn binding(&self, line: u8) -> Option<InterruptBinding<'a>> {
        self.bindings.get(line as usize).copied().flatten()
    }

    /// Iterate over all bound lines in ascending order
    pub fn bindings(&self) -> impl Iterator<Item = &InterruptBinding<'a>> {
        self.bindings.iter().flatten()
    }

    /// Route one line to its handler
    ///
    /// Lines outside the table or without a binding are ignored; the
    /// hardware may report lines this firmware does not own.
    pub fn dispatch(&self, line: u8) {
        if let Some(Some(binding)) = self.bindings.get(line as usize) {
            binding.handler.on_interrupt(line);
        }
    }

    /// Route every line set in a pending bitmask, lowest line first
    ///
    /// Used by shared vectors (EXTI9_5, EXTI15_10) that only learn which
    /// lines fired by reading the pending register.
    pub fn dispatch_pending(&self, pending: u32) {
        let mut bits = pending;
        while bits != 0 {
            let line = bits.trailing_zeros() as u8;
            bits &= bits - 1;
            self.dispatch(line);
        }
    }
}
