//! Provides log output based on `defmt`
//!
//! With the `defmt` feature enabled the macros in this module forward to the
//! matching `defmt` macros, so the application has to link a global logger
//! (for example `defmt-rtt`). Without the feature they expand to nothing but
//! still borrow their arguments, which keeps call sites warning free.
//!
//! Interrupt handlers in this crate never log: a `defmt` transport blocks for
//! as long as the host takes to drain it, which would stretch NEC timings.

macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::info!($fmt $(, $arg)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($(&$arg),*);
        }
    };
}

macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::warn!($fmt $(, $arg)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($(&$arg),*);
        }
    };
}
