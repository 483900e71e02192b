#![no_std]

extern crate void;

pub extern crate cortex_m;
pub extern crate embedded_hal as hal;
pub extern crate nb;
#[cfg(feature = "device-selected")]
pub extern crate stm32g0;

#[cfg(feature = "stm32g070")]
pub use stm32g0::stm32g070 as stm32;

#[cfg(feature = "stm32g071")]
pub use stm32g0::stm32g071 as stm32;

#[cfg(feature = "stm32g081")]
pub use stm32g0::stm32g081 as stm32;

#[cfg(all(feature = "rt", feature = "device-selected"))]
pub use crate::stm32::interrupt;

#[macro_use]
mod log;

pub mod config;
pub mod error;
pub mod nec;
pub mod playback;
pub mod prelude;
pub mod remote;
pub mod time;
pub mod timer;
pub mod transmitter;

#[cfg(feature = "device-selected")]
pub mod carrier;
#[cfg(feature = "device-selected")]
pub mod delay;
#[cfg(feature = "device-selected")]
pub mod rcc;

pub use crate::error::{Error, Result};
pub use crate::nec::{NecCommand, NecTable, TimingTable};
pub use crate::transmitter::{SharedTransmitter, Transmitter};

#[cfg(feature = "device-selected")]
pub use crate::transmitter::init_transmitter;

#[cfg(feature = "device-selected")]
mod sealed {
    pub trait Sealed {}
}
#[cfg(feature = "device-selected")]
pub(crate) use sealed::Sealed;
