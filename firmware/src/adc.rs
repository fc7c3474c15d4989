//! On-demand sampling of the one analog input.
//!
//! One conversion per bus transaction, started at the address-ACK
//! point while the bus clock is held. The completion interrupt is the
//! only reader of the data register.

#![allow(unused_unsafe)]

use crate::{hw::mcu, mutex::LazyMainInit};

#[allow(non_snake_case)]
pub struct Dp {
    pub ADC: mcu::ADC,
}

// SAFETY: Is initialized in main() before interrupts are enabled.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

/// VCC reference, single-ended on ADC2 (PB4).
const ADMUX_INPUT: u8 = 0x02;

const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;
const ADIF: u8 = 1 << 4;
const ADIE: u8 = 1 << 3;
/// Prescaler /8: 125 kHz ADC clock from the 1 MHz core clock.
const ADPS_DIV_8: u8 = 0x03;

/// Enable the converter and start one conversion with the completion
/// interrupt armed. While a conversion is already running the ADSC
/// write is ignored by the hardware, so repeated starts are no-ops.
pub fn start() {
    // SAFETY: All ADMUX bits are valid to write.
    DP.ADC.admux().write(|w| unsafe { w.bits(ADMUX_INPUT) });
    // SAFETY: All ADCSRA bits are valid to write.
    DP.ADC
        .adcsra()
        .write(|w| unsafe { w.bits(ADEN | ADSC | ADIF | ADIE | ADPS_DIV_8) });
}

/// Read the 10-bit conversion result.
pub fn read() -> u16 {
    DP.ADC.adc().read().bits()
}

/// Turn the converter off again.
pub fn shutdown() {
    DP.ADC.adcsra().reset();
}

// vim: ts=4 sw=4 expandtab
