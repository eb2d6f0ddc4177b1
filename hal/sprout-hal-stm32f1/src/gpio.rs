//! GPIO wrappers for STM32F1
//!
//! Adapts embassy-stm32 pins to the `sprout-hal` pin traits.

use embassy_stm32::gpio::Output;
use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals::Idr;
use sprout_hal::{InputPin, OutputPin, PinId, Port};

/// Port number as used by the AFIO EXTI selectors
pub const fn port_index(port: Port) -> u8 {
    match port {
        Port::A => 0,
        Port::B => 1,
        Port::C => 2,
        Port::D => 3,
    }
}

fn port_block(port: Port) -> pac::gpio::Gpio {
    match port {
        Port::A => pac::GPIOA,
        Port::B => pac::GPIOB,
        Port::C => pac::GPIOC,
        Port::D => pac::GPIOD,
    }
}

/// Beam-break sensor input
///
/// Reads the input data register directly so it can be shared with
/// interrupt handlers. Pin mode and pull are owned by an embassy `Input`
/// that must stay alive as long as this reader is used.
#[derive(Clone, Copy)]
pub struct SensorPin {
    block: pac::gpio::Gpio,
    index: usize,
}

impl SensorPin {
    pub fn new(pin: PinId) -> Self {
        Self {
            block: port_block(pin.port),
            index: pin.index as usize,
        }
    }
}

impl InputPin for SensorPin {
    fn is_high(&self) -> bool {
        self.block.idr().read().idr(self.index) != Idr::LOW
    }
}

/// Status LED
///
/// The Blue Pill LED on PC13 is active low; `inverted` hides that from
/// callers.
pub struct StatusLed<'d> {
    pin: Output<'d>,
    inverted: bool,
}

impl<'d> StatusLed<'d> {
    pub fn new(pin: Output<'d>, inverted: bool) -> Self {
        Self { pin, inverted }
    }
}

impl OutputPin for StatusLed<'_> {
    fn set_high(&mut self) {
        if self.inverted {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }

    fn set_low(&mut self) {
        if self.inverted {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }

    fn toggle(&mut self) {
        self.pin.toggle();
    }
}
