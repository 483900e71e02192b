pub use hal::delay::DelayNs as _;

pub use crate::playback::Carrier as _;
pub use crate::playback::PhaseTimer as _;
pub use crate::remote::Classifier as _;
pub use crate::time::ExtU32 as _;
pub use crate::time::RateExtU32 as _;

#[cfg(feature = "device-selected")]
pub use crate::delay::DelayExt as _;
#[cfg(feature = "device-selected")]
pub use crate::rcc::RccExt as _;
