//! Transmitter errors
use core::fmt;

/// Transmitter error
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The timer kernel clock is not a whole multiple of the 1 MHz tick
    TimerClock(u32),
    /// The carrier frequency cannot be produced from the timer kernel clock
    CarrierFrequency(u32),
    /// `transmit` was called before the transmitter was installed
    NotInitialized,
    /// A transmission is already in flight
    Busy,
    /// The request needs more timing entries than the table holds
    TableOverflow { required: usize, capacity: usize },
    /// Playback was started on a table without a leading pulse
    EmptyTable,
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TimerClock(hz) => write!(f, "timer clock {} Hz is not a multiple of 1 MHz", hz),
            Error::CarrierFrequency(hz) => write!(f, "cannot synthesize a {} Hz carrier", hz),
            Error::NotInitialized => f.write_str("transmitter not initialized"),
            Error::Busy => f.write_str("transmission already in progress"),
            Error::TableOverflow { required, capacity } => write!(
                f,
                "timing table overflow: {} entries required, capacity {}",
                required, capacity
            ),
            Error::EmptyTable => f.write_str("timing table has no leading pulse"),
        }
    }
}
