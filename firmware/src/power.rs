//! Sleep mode selection and peripheral power gating.
//!
//! The device spends its life asleep. Power-down is the default; the
//! USI start and overflow events are driven by the external bus clock
//! and wake the core from it. Only the conversion window needs the
//! lighter ADC noise reduction mode, because the ADC completion
//! interrupt requires internal clocking.

use crate::{
    hw::mcu,
    mutex::{LazyMainInit, MainInitCtx},
};

#[allow(non_snake_case)]
pub struct Dp {
    pub CPU: mcu::CPU,
    pub AC: mcu::AC,
}

// SAFETY: Is initialized in main() before interrupts are enabled.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

/// One-time power configuration: gate off everything that is never
/// clocked. Both timers stay off for good, the ADC until a
/// transaction needs it. The USI stays powered. The analog
/// comparator is never used.
pub fn setup(_c: &MainInitCtx) {
    DP.CPU.prr().write(|w| {
        w.prtim1().set_bit()
            .prtim0().set_bit()
            .pradc().set_bit()
    });
    DP.AC.acsr().write(|w| w.acd().set_bit());
    deep_sleep();
}

/// Select power-down sleep. Only external events wake the core.
pub fn deep_sleep() {
    DP.CPU.mcucr().write(|w| w.se().set_bit().sm().pdown());
}

/// Select ADC noise reduction sleep for the conversion window.
pub fn light_sleep() {
    DP.CPU.mcucr().write(|w| w.se().set_bit().sm().adc());
}

/// Power the ADC domain up. Paired with [adc_off] around each
/// conversion.
pub fn adc_on() {
    DP.CPU.prr().modify(|_, w| w.pradc().clear_bit());
}

/// Power the ADC domain back down.
pub fn adc_off() {
    DP.CPU.prr().modify(|_, w| w.pradc().set_bit());
}

// vim: ts=4 sw=4 expandtab
