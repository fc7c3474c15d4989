//! USI two-wire transceiver, slave side.
//!
//! PB0 is SDA, PB2 is SCL. The USI runs in two-wire mode on the
//! external bus clock. Holding the bus clock low (clock stretching)
//! is done by the hardware: SCL stays held after a START, and after
//! a counter overflow too once the overflow-hold mode is selected,
//! until the corresponding flag is written back.

#![allow(unused_unsafe)]

use crate::{
    hw::mcu,
    mutex::{LazyMainInit, MainInitCtx},
};

#[allow(non_snake_case)]
pub struct Dp {
    pub USI: mcu::USI,
    pub PORTB: mcu::PORTB,
}

// SAFETY: Is initialized in main() before interrupts are enabled.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

const USISIE: u8 = 1 << 7;
const USIOIE: u8 = 1 << 6;
const USIWM1: u8 = 1 << 5;
const USIWM0: u8 = 1 << 4;
const USICS1: u8 = 1 << 3;

/// Two-wire mode, START condition interrupt, external clock.
/// SCL is held low on a START until the start flag is cleared.
const USICR_WAIT_START: u8 = USISIE | USIWM1 | USICS1;

/// Same, plus the counter overflow interrupt and the overflow hold:
/// SCL is also held low on a counter overflow until the overflow
/// flag is cleared. Stays in effect for the rest of the transaction.
const USICR_TRANSFER: u8 = USISIE | USIOIE | USIWM1 | USIWM0 | USICS1;

/// Counter start value for a single-bit transfer (two clock edges).
const COUNT_1_BIT: u8 = 16 - 2;
/// Counter start value for a full byte (sixteen clock edges).
const COUNT_8_BITS: u8 = 0;

fn usicr_write(value: u8) {
    // SAFETY: All USICR bits are valid to write.
    DP.USI.usicr().write(|w| unsafe { w.bits(value) });
}

fn sda_input() {
    DP.PORTB.ddrb().modify(|_, w| w.pb0().clear_bit());
}

fn sda_output() {
    DP.PORTB.ddrb().modify(|_, w| w.pb0().set_bit());
}

/// Clear the overflow condition and preload the counter. Writing the
/// overflow flag also releases a held SCL. The start flag is left
/// alone so a concurrent START is not lost.
fn rearm_counter(count: u8) {
    DP.USI.usisr().write(|w| {
        w.usioif().set_bit()
            .usipf().set_bit()
            .usidc().set_bit()
            .usicnt().set(count)
    });
}

/// Clear all flags, including the start flag, and reset the counter.
/// Releases every hold the hardware currently has on SCL.
fn reset_flags() {
    DP.USI.usisr().write(|w| {
        w.usisif().set_bit()
            .usioif().set_bit()
            .usipf().set_bit()
            .usidc().set_bit()
            .usicnt().set(0)
    });
}

/// One-time pin setup. SCL is a driven-high output; the two-wire USI
/// mode turns it into an open-collector line that the hardware may
/// hold low. SDA starts out released.
pub fn setup(_c: &MainInitCtx) {
    DP.PORTB
        .portb()
        .modify(|_, w| w.pb0().set_bit().pb2().set_bit());
    DP.PORTB
        .ddrb()
        .modify(|_, w| w.pb0().clear_bit().pb2().set_bit());
    listen();
}

/// Release the bus and wait for a START condition.
pub fn listen() {
    sda_input();
    usicr_write(USICR_WAIT_START);
    reset_flags();
}

/// A START interrupt fired. Wait for the edge to resolve: either SCL
/// falls (a real transaction begins) or SDA rises again (it was a
/// STOP). Bounded by the master's own next edge.
///
/// Returns true if the bus went back to idle (STOP).
pub fn settle_start() -> bool {
    loop {
        let pinb = DP.PORTB.pinb().read();
        if pinb.pb0().bit_is_set() {
            return true;
        }
        if pinb.pb2().bit_is_clear() {
            return false;
        }
    }
}

/// Arm an 8-bit receive for the address byte and enable the
/// overflow-hold mode for the rest of the transaction.
pub fn recv_addr() {
    sda_input();
    usicr_write(USICR_TRANSFER);
    reset_flags();
}

/// Drive SDA low for one bit to acknowledge the address byte.
pub fn send_ack() {
    DP.USI.usidr().write(|w| w.set(0));
    sda_output();
    rearm_counter(COUNT_1_BIT);
}

/// Shift out one byte.
pub fn send_byte(data: u8) {
    DP.USI.usidr().write(|w| w.set(data));
    sda_output();
    rearm_counter(COUNT_8_BITS);
}

/// Arm a 1-bit receive for the master's ACK/NACK.
pub fn recv_ack() {
    DP.USI.usidr().write(|w| w.set(0));
    sda_input();
    rearm_counter(COUNT_1_BIT);
}

/// Did a STOP condition occur since the last rearm?
pub fn stop_seen() -> bool {
    DP.USI.usisr().read().usipf().bit_is_set()
}

/// Buffered copy of the last received byte.
pub fn rx_byte() -> u8 {
    DP.USI.usibr().read().bits()
}

/// Raw shift register, for inspecting a received ACK/NACK bit.
pub fn shift_reg() -> u8 {
    DP.USI.usidr().read().bits()
}

// vim: ts=4 sw=4 expandtab
