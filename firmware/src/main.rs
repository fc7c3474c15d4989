//! Two-wire (I2C) slave serving one ADC reading.
//!
//! ```text
//!                     ATtiny85
//!                   +----------+
//!          RESET -- | 1      8 | -- VCC
//!            PB3 -- | 2      7 | -- PB2/SCL \
//! INPUT --> ADC2 -- | 3      6 | -- PB1     | two-wire bus
//!            GND -- | 4      5 | -- PB0/SDA /
//!                   +----------+
//! ```
//!
//! Everything happens in the three interrupt handlers (USI start
//! condition, USI counter overflow, ADC conversion complete). The
//! foreground loop only sleeps.

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

mod adc;
mod bus;
mod hw;
mod mutex;
mod power;
mod system;

use crate::{
    hw::{Peripherals, interrupt},
    mutex::{MainInitCtx, unwrap_option},
};

#[avr_device::entry]
fn main() -> ! {
    let dp = unwrap_option(Peripherals::take());

    // SAFETY: We are at the beginning of main() with interrupts
    //         disabled. This runs exactly once.
    let ctx = unsafe { MainInitCtx::new() };

    bus::DP.init(
        &ctx,
        bus::Dp {
            USI: dp.USI,
            PORTB: dp.PORTB,
        },
    );
    adc::DP.init(&ctx, adc::Dp { ADC: dp.ADC });
    power::DP.init(
        &ctx,
        power::Dp {
            CPU: dp.CPU,
            AC: dp.AC,
        },
    );

    power::setup(&ctx);
    bus::setup(&ctx);

    // SAFETY: All LazyMainInit statics have been initialized above.
    unsafe { interrupt::enable() };

    loop {
        avr_device::asm::sleep();
    }
}

// vim: ts=4 sw=4 expandtab
