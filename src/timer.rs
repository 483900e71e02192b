//! # Phase timers
//!
//! General purpose timers prescaled to one tick per microsecond and driven
//! by their update interrupt. The counters are 16 bits wide, so an interval
//! longer than 65 536 µs (the gap before a repeat code) is split into
//! several nearly equal hardware periods; only the last one completes
//! [`PhaseTimer::wait`]. The counter keeps running across those periods,
//! only the auto-reload value changes.
use void::Void;

use crate::playback::PhaseTimer;
use crate::time::next_period;

pub(crate) mod private {
    pub trait TimerCore {
        /// Sets the prescaler and URS, and latches them without an interrupt
        fn init(&mut self, psc: u16);

        /// Restarts the counter for a period of `ticks`
        fn start(&mut self, ticks: u32);

        /// Sets the length of the period that has just begun, without
        /// touching the running counter
        fn set_period(&mut self, ticks: u32);

        fn pause(&mut self);

        fn listen(&mut self);

        fn unlisten(&mut self);

        fn has_elapsed(&self) -> bool;

        fn clear_irq(&mut self);
    }
}

/// One-shot microsecond timer
pub struct MicrosTimer<TIM> {
    tim: TIM,
    remaining: u32,
}

impl<TIM: private::TimerCore> PhaseTimer for MicrosTimer<TIM> {
    fn arm(&mut self, micros: u32) {
        let ticks = micros.max(1);
        let period = next_period(ticks);
        self.remaining = ticks - period;
        self.tim.start(period);
    }

    fn disarm(&mut self) {
        self.tim.pause();
        self.tim.clear_irq();
        self.remaining = 0;
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if !self.tim.has_elapsed() {
            return Err(nb::Error::WouldBlock);
        }
        self.tim.clear_irq();
        if self.remaining == 0 {
            return Ok(());
        }
        // The update event already reloaded the counter; restarting it here
        // would add the interrupt latency to the interval
        let period = next_period(self.remaining);
        self.remaining -= period;
        self.tim.set_period(period);
        Err(nb::Error::WouldBlock)
    }
}

#[cfg(feature = "device-selected")]
mod device {
    use cortex_m::peripheral::NVIC;

    use super::{private, MicrosTimer};
    use crate::error::{Error, Result};
    use crate::rcc::{Enable, Rcc, Reset};
    use crate::stm32::{Interrupt, TIM14, TIM16, TIM17, TIM3};
    use crate::time::tick_prescaler;

    /// Timers that can measure phases
    pub trait Instance: private::TimerCore + Enable + Reset {
        /// Update interrupt of the timer
        const IRQ: Interrupt;
    }

    macro_rules! timers {
        ($($TIM:ident,)+) => {
            $(
                impl private::TimerCore for $TIM {
                    fn init(&mut self, psc: u16) {
                        // URS keeps the forced update below from raising UIF
                        self.cr1().modify(|_, w| w.cen().clear_bit().urs().set_bit());
                        self.psc().write(|w| unsafe { w.bits(psc as u32) });
                        self.egr().write(|w| w.ug().set_bit());
                        self.sr().modify(|_, w| w.uif().clear_bit());
                    }

                    fn start(&mut self, ticks: u32) {
                        self.cr1().modify(|_, w| w.cen().clear_bit());
                        self.arr().write(|w| unsafe { w.bits(ticks - 1) });
                        self.egr().write(|w| w.ug().set_bit());
                        self.cnt().reset();
                        self.sr().modify(|_, w| w.uif().clear_bit());
                        self.cr1().modify(|_, w| w.cen().set_bit());
                    }

                    fn set_period(&mut self, ticks: u32) {
                        // ARPE is clear, so the new reload value applies to
                        // the current period
                        self.arr().write(|w| unsafe { w.bits(ticks - 1) });
                    }

                    fn pause(&mut self) {
                        self.cr1().modify(|_, w| w.cen().clear_bit());
                    }

                    fn listen(&mut self) {
                        self.dier().write(|w| w.uie().set_bit());
                    }

                    fn unlisten(&mut self) {
                        self.dier().write(|w| w.uie().clear_bit());
                    }

                    fn has_elapsed(&self) -> bool {
                        self.sr().read().uif().bit_is_set()
                    }

                    fn clear_irq(&mut self) {
                        self.sr().modify(|_, w| w.uif().clear_bit());
                    }
                }

                impl Instance for $TIM {
                    const IRQ: Interrupt = Interrupt::$TIM;
                }
            )+
        }
    }

    timers! {
        TIM3,
        TIM14,
        TIM16,
        TIM17,
    }

    impl<TIM: Instance> MicrosTimer<TIM> {
        /// Prescales `tim` to 1 MHz and unmasks its update interrupt
        ///
        /// Fails with [`Error::TimerClock`] unless the timer kernel clock is a
        /// whole number of megahertz.
        pub fn new(mut tim: TIM, rcc: &mut Rcc) -> Result<Self> {
            let clk = rcc.clocks.apb_tim_clk;
            let psc = tick_prescaler(clk).ok_or(Error::TimerClock(clk.raw()))?;

            TIM::enable(rcc);
            TIM::reset(rcc);
            tim.init(psc);
            tim.listen();
            unsafe { NVIC::unmask(TIM::IRQ) };

            Ok(MicrosTimer { tim, remaining: 0 })
        }

        /// Releases the TIM peripheral
        pub fn release(mut self) -> TIM {
            NVIC::mask(TIM::IRQ);
            self.tim.pause();
            self.tim.unlisten();
            self.tim.clear_irq();
            self.tim
        }
    }
}

#[cfg(feature = "device-selected")]
pub use device::Instance;

#[cfg(test)]
mod tests {
    use super::private::TimerCore;
    use super::*;
    use crate::time::MAX_PERIOD_TICKS;

    /// Up-counter that only moves from one update event to the next
    #[derive(Default)]
    struct Counter {
        now: u64,
        period: u32,
        running: bool,
        uif: bool,
        restarts: u32,
    }

    impl Counter {
        fn update(&mut self) {
            assert!(self.running);
            assert!(self.period <= MAX_PERIOD_TICKS);
            self.now += self.period as u64;
            self.uif = true;
        }
    }

    impl TimerCore for Counter {
        fn init(&mut self, _psc: u16) {}

        fn start(&mut self, ticks: u32) {
            self.period = ticks;
            self.running = true;
            self.uif = false;
            self.restarts += 1;
        }

        fn set_period(&mut self, ticks: u32) {
            self.period = ticks;
        }

        fn pause(&mut self) {
            self.running = false;
        }

        fn listen(&mut self) {}

        fn unlisten(&mut self) {}

        fn has_elapsed(&self) -> bool {
            self.uif
        }

        fn clear_irq(&mut self) {
            self.uif = false;
        }
    }

    fn timer() -> MicrosTimer<Counter> {
        MicrosTimer {
            tim: Counter::default(),
            remaining: 0,
        }
    }

    #[test]
    fn short_interval_takes_one_update() {
        let mut timer = timer();
        timer.arm(560);
        assert!(timer.wait().is_err());
        timer.tim.update();
        assert!(timer.wait().is_ok());
        assert_eq!(timer.tim.now, 560);
    }

    #[test]
    fn long_interval_keeps_the_counter_running() {
        let mut timer = timer();
        timer.arm(98_190);

        let mut updates = 0;
        loop {
            timer.tim.update();
            updates += 1;
            if timer.wait().is_ok() {
                break;
            }
        }
        assert_eq!(updates, 2);
        assert_eq!(timer.tim.now, 98_190);
        assert_eq!(timer.tim.restarts, 1);
    }

    #[test]
    fn disarm_stops_a_chunked_interval() {
        let mut timer = timer();
        timer.arm(200_000);
        timer.tim.update();
        assert!(timer.wait().is_err());
        timer.disarm();
        assert!(!timer.tim.running);
        assert!(timer.wait().is_err());

        timer.arm(1_000);
        timer.tim.update();
        assert!(timer.wait().is_ok());
        assert_eq!(timer.tim.restarts, 2);
    }
}
