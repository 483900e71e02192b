//! # NEC protocol
//!
//! Pulse-distance encoding used by most consumer IR remotes. A frame is a
//! 9 ms leader burst, a 4.5 ms space, 32 data bits and a trailing stop burst.
//! Every data bit is a 560 µs burst followed by a short (bit 0) or long
//! (bit 1) space. Holding a button is signalled by repeat codes sent every
//! 110 ms.
//!
//! All durations are in microseconds, i.e. ticks of the 1 MHz phase timers.
mod table;

pub use table::{Entry, TimingTable};

/// Leader burst
pub const LEADER_PULSE_US: u32 = 9_000;
/// Space after the leader burst
pub const LEADER_IDLE_US: u32 = 4_500;
/// Burst of every data bit and of the stop marker
pub const DATA_PULSE_US: u32 = 560;
/// Space after a `0` bit (1.12 ms bit period)
pub const BIT0_IDLE_US: u32 = 1_120 - DATA_PULSE_US;
/// Space after a `1` bit (2.25 ms bit period)
pub const BIT1_IDLE_US: u32 = 2_250 - DATA_PULSE_US;
/// Distance between the starts of consecutive frames / repeat codes
pub const REPEAT_INTERVAL_US: u32 = 110_000;
/// Repeat code burst
pub const REPEAT_PULSE_US: u32 = 9_000;
/// Space after the repeat code burst
pub const REPEAT_IDLE_US: u32 = 2_250;

/// Carrier frequency in Hz
pub const CARRIER_FREQ_HZ: u32 = 38_000;
/// Carrier duty cycle in percent
pub const CARRIER_DUTY_PERCENT: u8 = 25;

/// Entries of a frame without repeats: leader, 32 data bits, stop
pub const BASE_FRAME_LEN: usize = 34;
/// Entries appended by every repeat code: repeat burst, terminator
pub const REPEAT_LEN: usize = 2;
/// Repeat codes a [`NecTable`] has room for
pub const MAX_REPEATS: usize = 8;

/// Table capacity needed for up to `max_repeats` repeat codes
pub const fn table_capacity(max_repeats: usize) -> usize {
    BASE_FRAME_LEN + REPEAT_LEN * max_repeats
}

/// Timing table sized for [`MAX_REPEATS`]
pub type NecTable = TimingTable<{ table_capacity(MAX_REPEATS) }>;

/// Address/command pair of one remote button
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NecCommand {
    /// 16-bit (extended) address, sent LSB first
    pub address: u16,
    /// Command byte, sent LSB first and followed by its complement
    pub command: u8,
}

impl NecCommand {
    pub const fn new(address: u16, command: u8) -> Self {
        NecCommand { address, command }
    }
}
