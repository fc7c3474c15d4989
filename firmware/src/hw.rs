pub use attiny::{self as mcu, Peripherals};
pub use avr_device::attiny85 as attiny;
pub use avr_device::interrupt::{self, Mutex};

use crate::mutex::IrqCtx;

macro_rules! define_isr {
    ($name:ident, $handler:path) => {
        #[avr_device::interrupt(attiny85)]
        fn $name() {
            // SAFETY: We are inside of an interrupt handler.
            // Therefore, it is safe to construct an `IrqCtx`.
            let c = unsafe { IrqCtx::new() };
            $handler(&c);
        }
    };
}

define_isr!(USI_START, crate::system::irq_handler_usi_start);
define_isr!(USI_OVF, crate::system::irq_handler_usi_ovf);
define_isr!(ADC, crate::system::irq_handler_adc);

// vim: ts=4 sw=4 expandtab
