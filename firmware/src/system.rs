//! Interrupt handlers and the mapping from protocol actions to
//! hardware.
//!
//! The protocol state lives in `twiadc-core` as a pure state machine.
//! Each handler feeds it one event and executes the returned action.
//! Handlers run to completion and never nest, so a plain get /
//! transition / set on the shared cell is sufficient.

use crate::{adc, bus, hw::Mutex, mutex::IrqCtx, power};
use core::cell::Cell;
use twiadc_core::{Action, Slave};

static SLAVE: Mutex<Cell<Slave>> = Mutex::new(Cell::new(Slave::new()));

fn dispatch(c: &IrqCtx, f: impl FnOnce(&mut Slave) -> Action) {
    let cell = SLAVE.borrow(c.cs());
    let mut slave = cell.get();
    let action = f(&mut slave);
    cell.set(slave);
    apply(action);
}

fn apply(action: Action) {
    match action {
        Action::Idle => bus::listen(),
        Action::RecvAddr => bus::recv_addr(),
        Action::SendAddrAck => bus::send_ack(),
        Action::Sample => {
            power::adc_on();
            adc::start();
            power::light_sleep();
            // The overflow flag is deliberately not cleared here: it
            // keeps SCL held for the whole conversion. The overflow
            // interrupt re-fires in this state until the conversion
            // result arms the first byte; restarting a running
            // conversion is a no-op and the ADC vector outranks
            // USI_OVF, so the completion handler always gets through.
        }
        Action::SendByte(data) => bus::send_byte(data),
        Action::RecvDataAck => bus::recv_ack(),
    }
}

/// USI start condition interrupt.
pub fn irq_handler_usi_start(c: &IrqCtx) {
    let stopped = bus::settle_start();
    dispatch(c, |slave| slave.bus_start(stopped));
}

/// USI counter overflow interrupt.
pub fn irq_handler_usi_ovf(c: &IrqCtx) {
    let stop = bus::stop_seen();
    let rx = bus::rx_byte();
    let ack = bus::shift_reg();
    dispatch(c, |slave| slave.bus_overflow(stop, rx, ack));
}

/// ADC conversion complete interrupt.
pub fn irq_handler_adc(c: &IrqCtx) {
    let raw = adc::read();
    adc::shutdown();
    power::adc_off();
    power::deep_sleep();
    dispatch(c, |slave| slave.sample_ready(raw));
}

// vim: ts=4 sw=4 expandtab
