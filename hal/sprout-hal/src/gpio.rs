//! GPIO pin abstractions
//!
//! Provides traits for digital input and output pins that can be implemented
//! by chip-specific HALs, plus a plain pin identifier used by configuration.

/// GPIO port letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    A,
    B,
    C,
    D,
}

/// A physical pin, e.g. `PB6`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinId {
    pub port: Port,
    /// Pin number within the port (0-15)
    pub index: u8,
}

impl PinId {
    pub const fn new(port: Port, index: u8) -> Self {
        Self { port, index }
    }

    /// Whether the pin number exists on a 16-pin port
    pub const fn is_valid(&self) -> bool {
        self.index < 16
    }

    /// Parse a pin string such as `"PB6"`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let rest = s.strip_prefix('P')?;
        let mut chars = rest.chars();
        let port = match chars.next()? {
            'A' => Port::A,
            'B' => Port::B,
            'C' => Port::C,
            'D' => Port::D,
            _ => return None,
        };
        let index: u8 = chars.as_str().parse().ok()?;
        let pin = Self::new(port, index);
        pin.is_valid().then_some(pin)
    }
}

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// Digital input pin
///
/// Takes `&self` so a pin can be sampled from interrupt context through a
/// shared reference.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}
