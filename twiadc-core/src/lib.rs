//! Protocol core of a two-wire (I2C) slave that serves one analog reading.
//!
//! This crate is hardware-free. The firmware feeds the three hardware
//! events (START edge resolved, shift register overflow, conversion
//! complete) into [Slave] and executes the returned [Action] on the
//! peripherals. All transitions are plain functions of (state, event),
//! so the whole protocol runs on the host under `cargo test`.

#![no_std]

/// Number of result bytes per sample. High byte first.
pub const N_RESULT_BYTES: usize = 2;

/// Fixed 7-bit device address.
pub const DEVICE_ADDR: u8 = 0x41;

/// Address byte that claims this device: address plus the read bit.
/// Only the read direction is serviced.
pub const READ_HEADER: u8 = (DEVICE_ADDR << 1) | 1;

/// Phase of the bus transaction.
///
/// `WaitStart` doubles as the defensive fallback: every framing error,
/// address mismatch and NACK lands here and releases the bus.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    /// Bus idle, START detector armed.
    WaitStart,
    /// Receiving the address byte.
    RecvAddr,
    /// ACK bit for the address is shifting out, or the conversion is
    /// running with SCL held low. The conversion result moves us on.
    AddrAck,
    /// Shifting out one result byte.
    SendData,
    /// Receiving the master's ACK/NACK bit for the last byte.
    RecvDataAck,
}

/// Side effect requested by a transition.
///
/// The firmware maps these 1:1 onto the USI, ADC and sleep controller.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
    /// Release the bus and arm the START detector. Deep sleep.
    Idle,
    /// Arm an 8-bit receive for the address byte.
    RecvAddr,
    /// Drive the data line low for one bit to ACK the address.
    SendAddrAck,
    /// Keep SCL held low and run one conversion. Light sleep,
    /// sampler power domain on. Repeats of this action while the
    /// conversion runs must be no-ops.
    Sample,
    /// Shift out the given byte.
    SendByte(u8),
    /// Arm a 1-bit receive for the master's ACK/NACK.
    RecvDataAck,
}

/// The complete persistent state of the device.
#[derive(Copy, Clone)]
pub struct Slave {
    state: State,
    cursor: u8,
    result: [u8; N_RESULT_BYTES],
}

impl Slave {
    pub const fn new() -> Self {
        Self {
            state: State::WaitStart,
            cursor: 0,
            result: [0; N_RESULT_BYTES],
        }
    }

    /// A START edge has been resolved.
    ///
    /// `stopped` is true if the bus returned to idle right after the
    /// edge, i.e. what looked like a START was actually a STOP.
    pub fn bus_start(&mut self, stopped: bool) -> Action {
        if stopped {
            self.to_idle()
        } else {
            self.state = State::RecvAddr;
            Action::RecvAddr
        }
    }

    /// The shift register has transferred a full unit (byte or ACK bit).
    ///
    /// `stop` is the framing detector's STOP flag sampled on entry.
    /// `rx` is the buffered received byte and `ack` the raw shift
    /// register; a nonzero `ack` is a NACK when an ACK bit was expected.
    pub fn bus_overflow(&mut self, stop: bool, rx: u8, ack: u8) -> Action {
        // STOP always wins, regardless of state.
        if stop {
            return self.to_idle();
        }
        match self.state {
            State::RecvAddr => {
                if rx == READ_HEADER {
                    self.state = State::AddrAck;
                    Action::SendAddrAck
                } else {
                    // Some other device may claim the address.
                    // Drop out of the transaction silently.
                    self.to_idle()
                }
            }
            State::AddrAck => {
                // The ACK bit is on the bus and SCL is now held low.
                // The state does not advance here; sample_ready() does
                // that once the conversion result is in.
                Action::Sample
            }
            State::SendData => {
                self.state = State::RecvDataAck;
                Action::RecvDataAck
            }
            State::RecvDataAck => {
                if ack == 0 {
                    // ACK: the master wants another byte.
                    self.state = State::SendData;
                    Action::SendByte(self.next_byte())
                } else {
                    // NACK: the master is done.
                    self.to_idle()
                }
            }
            // Overflow while idle. Rearm the START detector.
            State::WaitStart => self.to_idle(),
        }
    }

    /// The conversion finished. Store the sample and start transmitting.
    pub fn sample_ready(&mut self, raw: u16) -> Action {
        self.result = raw.to_be_bytes();
        self.cursor = 0;
        self.state = State::SendData;
        Action::SendByte(self.next_byte())
    }

    /// Next byte to transmit. Past the end of the result every byte
    /// is zero, for a master that keeps reading.
    fn next_byte(&mut self) -> u8 {
        let index = self.cursor as usize;
        if index < N_RESULT_BYTES {
            self.cursor += 1;
            self.result[index]
        } else {
            0x00
        }
    }

    fn to_idle(&mut self) -> Action {
        self.state = State::WaitStart;
        Action::Idle
    }
}

impl Default for Slave {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Drive a transaction up to the point where the conversion result
    /// is pending: START, matching address, address ACK shifted out.
    fn start_read(slave: &mut Slave) {
        assert_eq!(slave.bus_start(false), Action::RecvAddr);
        assert_eq!(slave.bus_overflow(false, READ_HEADER, 0), Action::SendAddrAck);
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::Sample);
    }

    #[test]
    fn test_read_header() {
        // 0x41 ('A'), read bit set.
        assert_eq!(READ_HEADER, 0x83);
    }

    #[test]
    fn test_address_mismatch_releases_bus() {
        for header in 0..=0xFF_u8 {
            if header == READ_HEADER {
                continue;
            }
            let mut slave = Slave::new();
            assert_eq!(slave.bus_start(false), Action::RecvAddr);
            // Foreign address, or our address in the write direction:
            // no ACK, no further participation.
            assert_eq!(slave.bus_overflow(false, header, 0), Action::Idle);
            assert_eq!(slave.bus_overflow(false, 0, 0), Action::Idle);
        }
    }

    #[test]
    fn test_start_followed_by_stop_stays_idle() {
        let mut slave = Slave::new();
        assert_eq!(slave.bus_start(true), Action::Idle);
        // Still serviceable afterwards.
        assert_eq!(slave.bus_start(false), Action::RecvAddr);
    }

    #[test]
    fn test_full_read_transaction() {
        // The example from the datasheet-style walkthrough:
        // sample 0x0237, master ACKs the first byte, NACKs the second.
        let mut slave = Slave::new();
        start_read(&mut slave);
        assert_eq!(slave.sample_ready(0x0237), Action::SendByte(0x02));
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::RecvDataAck);
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::SendByte(0x37));
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::RecvDataAck);
        // NACK ends the transaction.
        assert_eq!(slave.bus_overflow(false, 0, 1), Action::Idle);
    }

    #[test]
    fn test_nack_after_first_byte() {
        let mut slave = Slave::new();
        start_read(&mut slave);
        assert_eq!(slave.sample_ready(0x03FF), Action::SendByte(0x03));
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::RecvDataAck);
        assert_eq!(slave.bus_overflow(false, 0, 0xFF), Action::Idle);

        // Repeating the transaction with an unchanged reading yields
        // the same bytes again.
        start_read(&mut slave);
        assert_eq!(slave.sample_ready(0x03FF), Action::SendByte(0x03));
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::RecvDataAck);
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::SendByte(0xFF));
    }

    #[test]
    fn test_over_read_pads_with_zeros() {
        let mut slave = Slave::new();
        start_read(&mut slave);
        assert_eq!(slave.sample_ready(0x0155), Action::SendByte(0x01));
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::RecvDataAck);
        assert_eq!(slave.bus_overflow(false, 0, 0), Action::SendByte(0x55));
        // A master that keeps ACKing gets zeros, indefinitely.
        for _ in 0..100 {
            assert_eq!(slave.bus_overflow(false, 0, 0), Action::RecvDataAck);
            assert_eq!(slave.bus_overflow(false, 0, 0), Action::SendByte(0x00));
        }
    }

    #[test]
    fn test_stop_resets_every_phase() {
        // STOP after the address byte.
        let mut slave = Slave::new();
        assert_eq!(slave.bus_start(false), Action::RecvAddr);
        assert_eq!(slave.bus_overflow(true, READ_HEADER, 0), Action::Idle);
        assert_eq!(slave.bus_start(false), Action::RecvAddr);

        // STOP while the conversion is pending.
        let mut slave = Slave::new();
        start_read(&mut slave);
        assert_eq!(slave.bus_overflow(true, 0, 0), Action::Idle);
        assert_eq!(slave.bus_start(false), Action::RecvAddr);

        // STOP in the middle of the byte stream.
        let mut slave = Slave::new();
        start_read(&mut slave);
        assert_eq!(slave.sample_ready(0x0042), Action::SendByte(0x00));
        assert_eq!(slave.bus_overflow(true, 0, 0), Action::Idle);
        assert_eq!(slave.bus_start(false), Action::RecvAddr);
    }

    #[test]
    fn test_sample_requested_once_per_transaction() {
        let mut slave = Slave::new();

        assert_eq!(slave.bus_start(false), Action::RecvAddr);
        let actions = [
            slave.bus_overflow(false, READ_HEADER, 0),
            slave.bus_overflow(false, 0, 0),
            slave.sample_ready(0x0200),
            slave.bus_overflow(false, 0, 0),
            slave.bus_overflow(false, 0, 0),
            slave.bus_overflow(false, 0, 0),
            slave.bus_overflow(false, 0, 1),
        ];
        let samples = actions.iter().filter(|&&a| a == Action::Sample).count();
        assert_eq!(samples, 1);
    }

    #[test]
    fn test_repeated_start_resyncs() {
        // A master that restarts mid-transaction is serviced from the
        // address phase again, whatever state we were parked in.
        let mut slave = Slave::new();
        start_read(&mut slave);
        assert_eq!(slave.bus_start(false), Action::RecvAddr);
        assert_eq!(slave.bus_overflow(false, READ_HEADER, 0), Action::SendAddrAck);
    }
}

// vim: ts=4 sw=4 expandtab
