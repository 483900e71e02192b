//! # Carrier output
//!
//! Channel 1 of TIM14, TIM16 or TIM17 runs as a free-running PWM at the
//! carrier frequency. Switching the carrier only changes the output compare
//! mode between PWM mode 1 and "forced inactive", so the counter keeps its
//! period and the pin never glitches high while the carrier is off.
use crate::config::Config;
use crate::error::{Error, Result};
use crate::playback::Carrier;
use crate::rcc::{Enable, Rcc, Reset};
use crate::stm32::{GPIOA, GPIOB, TIM14, TIM16, TIM17};
use crate::time::period_settings;

/// OC1M: forced inactive level
const OCM_FORCE_INACTIVE: u8 = 0b100;
/// OC1M: PWM mode 1, active while CNT < CCR1
const OCM_PWM1: u8 = 0b110;

pub(crate) mod private {
    pub trait CarrierCore {
        /// Programs the period and duty, leaves the output forced inactive
        /// and starts the counter
        fn init(&mut self, psc: u16, arr: u16, ccr: u16);

        fn output_on(&mut self);

        fn output_off(&mut self);

        fn halt(&mut self);
    }
}

/// Timers with a channel 1 output that can carry the modulation
pub trait Instance: private::CarrierCore + Enable + Reset {}

macro_rules! carrier_timers {
    ($($TIM:ident $(: $moe:ident)?,)+) => {
        $(
            impl private::CarrierCore for $TIM {
                fn init(&mut self, psc: u16, arr: u16, ccr: u16) {
                    self.cr1().modify(|_, w| w.cen().clear_bit());
                    self.psc().write(|w| unsafe { w.bits(psc as u32) });
                    self.arr().write(|w| unsafe { w.bits(arr as u32) });
                    self.ccr1().write(|w| unsafe { w.bits(ccr as u32) });
                    self.ccmr1_output()
                        .modify(|_, w| unsafe { w.oc1pe().set_bit().oc1m().bits(OCM_FORCE_INACTIVE) });
                    self.ccer().modify(|_, w| w.cc1e().set_bit());
                    $(
                        self.bdtr().modify(|_, w| w.$moe().set_bit());
                    )?
                    self.egr().write(|w| w.ug().set_bit());
                    self.cr1().modify(|_, w| w.cen().set_bit());
                }

                fn output_on(&mut self) {
                    // Every burst opens with a full high phase
                    self.cnt().reset();
                    self.ccmr1_output()
                        .modify(|_, w| unsafe { w.oc1m().bits(OCM_PWM1) });
                }

                fn output_off(&mut self) {
                    self.ccmr1_output()
                        .modify(|_, w| unsafe { w.oc1m().bits(OCM_FORCE_INACTIVE) });
                }

                fn halt(&mut self) {
                    self.cr1().modify(|_, w| w.cen().clear_bit());
                    self.ccer().modify(|_, w| w.cc1e().clear_bit());
                }
            }

            impl Instance for $TIM {}
        )+
    }
}

carrier_timers! {
    TIM14,
    TIM16: moe,
    TIM17: moe,
}

/// Pins that can route channel 1 of `TIM` to the IR LED driver
pub trait CarrierPin<TIM>: crate::Sealed {
    /// Switches the pin to the timer's alternate function
    fn setup(&self);
}

macro_rules! carrier_pins {
    ($($PIN:ident: ($GPIOX:ident, $i:expr, [$($TIM:ident => $af:expr),+]),)+) => {
        $(
            #[doc = concat!("Pin ", stringify!($PIN), " as a carrier output")]
            pub struct $PIN {
                _0: (),
            }

            impl $PIN {
                /// Claims the pin; the port is borrowed mutably to prove ownership
                pub fn new(_port: &mut $GPIOX, rcc: &mut Rcc) -> Self {
                    $GPIOX::enable(rcc);
                    $PIN { _0: () }
                }

                fn set_alt_mode(&self, af: u32) {
                    let offset = 2 * $i;
                    let offset2 = 4 * ($i % 8);
                    unsafe {
                        let gpio = &(*$GPIOX::ptr());
                        if $i < 8 {
                            gpio.afrl().modify(|r, w| {
                                w.bits((r.bits() & !(0b1111 << offset2)) | (af << offset2))
                            });
                        } else {
                            gpio.afrh().modify(|r, w| {
                                w.bits((r.bits() & !(0b1111 << offset2)) | (af << offset2))
                            });
                        }
                        gpio.moder().modify(|r, w| {
                            w.bits((r.bits() & !(0b11 << offset)) | (0b10 << offset))
                        });
                    }
                }
            }

            impl crate::Sealed for $PIN {}

            $(
                impl CarrierPin<$TIM> for $PIN {
                    fn setup(&self) {
                        self.set_alt_mode($af);
                    }
                }
            )+
        )+
    };
}

carrier_pins! {
    PA4: (GPIOA, 4, [TIM14 => 4]),
    PA6: (GPIOA, 6, [TIM16 => 5]),
    PA7: (GPIOA, 7, [TIM14 => 4, TIM17 => 5]),
    PB1: (GPIOB, 1, [TIM14 => 0]),
    PB8: (GPIOB, 8, [TIM16 => 2]),
    PB9: (GPIOB, 9, [TIM17 => 2]),
}

/// PWM carrier on channel 1 of `TIM`
pub struct PwmCarrier<TIM> {
    tim: TIM,
}

impl<TIM: Instance> PwmCarrier<TIM> {
    /// Sets up the carrier at the configured frequency and duty, initially off
    ///
    /// Fails with [`Error::CarrierFrequency`] when the frequency is zero or
    /// above half the timer kernel clock.
    pub fn new<PIN>(mut tim: TIM, pin: PIN, config: &Config, rcc: &mut Rcc) -> Result<Self>
    where
        PIN: CarrierPin<TIM>,
    {
        let freq = config.carrier_freq();
        let (psc, arr) = period_settings(freq, rcc.clocks.apb_tim_clk)
            .ok_or(Error::CarrierFrequency(freq.raw()))?;

        TIM::enable(rcc);
        TIM::reset(rcc);
        tim.init(psc, arr, config.compare_value(arr));
        pin.setup();

        Ok(PwmCarrier { tim })
    }

    /// Stops the counter and releases the TIM peripheral
    pub fn release(mut self) -> TIM {
        self.tim.halt();
        self.tim
    }
}

impl<TIM: Instance> Carrier for PwmCarrier<TIM> {
    fn start(&mut self) {
        self.tim.output_on();
    }

    fn stop(&mut self) {
        self.tim.output_off();
    }
}
