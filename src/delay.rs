//! Delays
use core::cmp;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use embedded_hal::delay::DelayNs;

use crate::rcc::Rcc;
use crate::time::Hertz;

/// System timer (SysTick) as a blocking delay provider
///
/// Used by the main loop to poll for the end of a transmission while the
/// phase timers keep running in interrupt context.
pub struct Delay {
    clk: Hertz,
    syst: SYST,
}

/// Extension trait that turns SysTick into a [`Delay`]
pub trait DelayExt {
    fn delay(self, rcc: &Rcc) -> Delay;
}

impl DelayExt for SYST {
    fn delay(self, rcc: &Rcc) -> Delay {
        Delay::new(self, rcc)
    }
}

impl Delay {
    /// Configures the system timer (SysTick) as a delay provider
    pub fn new(mut syst: SYST, rcc: &Rcc) -> Self {
        syst.set_clock_source(SystClkSource::Core);
        Delay {
            syst,
            clk: rcc.clocks.ahb_clk,
        }
    }

    fn delay_cycles(&mut self, mut cycles: u64) {
        while cycles > 0 {
            let reload = cmp::min(cycles, 0x00ff_ffff) as u32;
            cycles -= reload as u64;
            self.syst.set_reload(reload);
            self.syst.clear_current();
            self.syst.enable_counter();
            while !self.syst.has_wrapped() {}
            self.syst.disable_counter();
        }
    }

    /// Releases the system timer (SysTick) resource
    pub fn release(self) -> SYST {
        self.syst
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.clk.raw() as u64).div_ceil(1_000_000_000);
        self.delay_cycles(cycles);
    }

    fn delay_us(&mut self, us: u32) {
        let cycles = us as u64 * (self.clk.raw() / 1_000_000) as u64;
        self.delay_cycles(cycles);
    }

    fn delay_ms(&mut self, ms: u32) {
        let cycles = ms as u64 * (self.clk.raw() / 1_000) as u64;
        self.delay_cycles(cycles);
    }
}
