//! Reset and clock control, limited to what the transmitter needs: the
//! system clock from HSI16 or the PLL, and clock gating of the timers and
//! GPIO ports it uses.
use crate::stm32::{rcc, FLASH, RCC};
use crate::time::Hertz;

mod config;
mod enable;

pub use config::*;

/// HSI speed
pub const HSI_FREQ: u32 = 16_000_000;

/// Clock frequencies
#[derive(Clone, Copy, Debug)]
pub struct Clocks {
    /// System frequency
    pub sys_clk: Hertz,
    /// AHB frequency, also clocks the core and SysTick
    pub ahb_clk: Hertz,
    /// APB frequency
    pub apb_clk: Hertz,
    /// APB timers frequency
    pub apb_tim_clk: Hertz,
}

impl Default for Clocks {
    fn default() -> Clocks {
        let hsi = Hertz::from_raw(HSI_FREQ);
        Clocks {
            sys_clk: hsi,
            ahb_clk: hsi,
            apb_clk: hsi,
            apb_tim_clk: hsi,
        }
    }
}

/// Constrained RCC peripheral
pub struct Rcc {
    /// Clock configuration
    pub clocks: Clocks,
    pub(crate) rb: RCC,
}

impl core::ops::Deref for Rcc {
    type Target = RCC;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.rb
    }
}

impl Rcc {
    /// Apply clock configuration
    pub fn freeze(self, rcc_cfg: Config) -> Self {
        let (sys_freq, sw_bits) = match rcc_cfg.sys_mux {
            SysClockSrc::PLL => (self.config_pll(rcc_cfg.pll_cfg), 0b010),
            SysClockSrc::HSI(prs) => {
                self.enable_hsi();
                let (freq, div_bits) = match prs {
                    Prescaler::Div2 => (HSI_FREQ / 2, 0b001),
                    Prescaler::Div4 => (HSI_FREQ / 4, 0b010),
                    Prescaler::Div8 => (HSI_FREQ / 8, 0b011),
                    Prescaler::Div16 => (HSI_FREQ / 16, 0b100),
                    Prescaler::Div32 => (HSI_FREQ / 32, 0b101),
                    Prescaler::Div64 => (HSI_FREQ / 64, 0b110),
                    Prescaler::Div128 => (HSI_FREQ / 128, 0b111),
                    Prescaler::NotDivided => (HSI_FREQ, 0b000),
                };
                self.cr().modify(|_, w| unsafe { w.hsidiv().bits(div_bits) });
                (freq, 0b000)
            }
        };

        let (ahb_freq, ahb_psc_bits) = match rcc_cfg.ahb_psc {
            Prescaler::Div2 => (sys_freq / 2, 0b1000),
            Prescaler::Div4 => (sys_freq / 4, 0b1001),
            Prescaler::Div8 => (sys_freq / 8, 0b1010),
            Prescaler::Div16 => (sys_freq / 16, 0b1011),
            Prescaler::Div64 => (sys_freq / 64, 0b1100),
            Prescaler::Div128 => (sys_freq / 128, 0b1101),
            _ => (sys_freq, 0b0000),
        };
        // The timers run at twice the APB clock whenever APB is divided
        let (apb_freq, apb_tim_freq, apb_psc_bits) = match rcc_cfg.apb_psc {
            Prescaler::Div2 => (ahb_freq / 2, ahb_freq, 0b100),
            Prescaler::Div4 => (ahb_freq / 4, ahb_freq / 2, 0b101),
            Prescaler::Div8 => (ahb_freq / 8, ahb_freq / 4, 0b110),
            Prescaler::Div16 => (ahb_freq / 16, ahb_freq / 8, 0b111),
            _ => (ahb_freq, ahb_freq, 0b000),
        };

        unsafe {
            // Adjust flash wait states
            let flash = &(*FLASH::ptr());
            flash.acr().modify(|_, w| {
                w.latency().bits(if sys_freq <= 24_000_000 {
                    0b000
                } else if sys_freq <= 48_000_000 {
                    0b001
                } else {
                    0b010
                })
            });
        }

        self.cfgr().modify(|_, w| unsafe {
            w.hpre()
                .bits(ahb_psc_bits)
                .ppre()
                .bits(apb_psc_bits)
                .sw()
                .bits(sw_bits)
        });

        while self.cfgr().read().sws().bits() != sw_bits {}

        Rcc {
            rb: self.rb,
            clocks: Clocks {
                sys_clk: Hertz::from_raw(sys_freq),
                ahb_clk: Hertz::from_raw(ahb_freq),
                apb_clk: Hertz::from_raw(apb_freq),
                apb_tim_clk: Hertz::from_raw(apb_tim_freq),
            },
        }
    }

    fn config_pll(&self, pll_cfg: PllConfig) -> u32 {
        assert!(pll_cfg.m > 0 && pll_cfg.m <= 8);
        assert!(pll_cfg.r > 1 && pll_cfg.r <= 8);

        // Disable PLL
        self.cr().modify(|_, w| w.pllon().clear_bit());
        while self.cr().read().pllrdy().bit_is_set() {}

        self.enable_hsi();

        let pll_freq = HSI_FREQ / (pll_cfg.m as u32) * (pll_cfg.n as u32);
        self.pllcfgr().write(move |w| unsafe {
            w.pllsrc()
                .bits(0b10)
                .pllm()
                .bits(pll_cfg.m - 1)
                .plln()
                .bits(pll_cfg.n)
                .pllr()
                .bits(pll_cfg.r - 1)
                .pllren()
                .set_bit()
        });

        // Enable PLL
        self.cr().modify(|_, w| w.pllon().set_bit());
        while self.cr().read().pllrdy().bit_is_clear() {}

        pll_freq / (pll_cfg.r as u32)
    }

    pub(crate) fn enable_hsi(&self) {
        self.cr().modify(|_, w| w.hsion().set_bit());
        while self.cr().read().hsirdy().bit_is_clear() {}
    }
}

/// Extension trait that constrains the `RCC` peripheral
pub trait RccExt {
    /// Constrains the `RCC` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Rcc;
    /// Constrains the `RCC` peripheral and apply clock configuration
    fn freeze(self, rcc_cfg: Config) -> Rcc;
}

impl RccExt for RCC {
    fn constrain(self) -> Rcc {
        Rcc {
            rb: self,
            clocks: Clocks::default(),
        }
    }

    fn freeze(self, rcc_cfg: Config) -> Rcc {
        self.constrain().freeze(rcc_cfg)
    }
}

/// Bus associated to peripheral
pub trait RccBus: crate::Sealed {
    /// Bus type;
    type Bus;
}

/// Enable/disable peripheral
pub trait Enable: RccBus {
    /// Enables peripheral
    fn enable(rcc: &mut Rcc);

    /// Disables peripheral
    fn disable(rcc: &mut Rcc);
}

/// Reset peripheral
pub trait Reset: RccBus {
    /// Resets peripheral
    fn reset(rcc: &mut Rcc);
}

use crate::stm32::rcc::RegisterBlock as RccRB;

macro_rules! bus_struct {
    ($($busX:ident => ($EN:ident, $en:ident, $RST:ident, $rst:ident, $doc:literal),)+) => {
        $(
            #[doc = $doc]
            pub struct $busX {
                _0: (),
            }

            impl $busX {
                #[inline(always)]
                fn enr(rcc: &RccRB) -> &rcc::$EN {
                    rcc.$en()
                }
                #[inline(always)]
                fn rstr(rcc: &RccRB) -> &rcc::$RST {
                    rcc.$rst()
                }
            }
        )+
    };
}

bus_struct! {
    APB1 => (APBENR1, apbenr1, APBRSTR1, apbrstr1, "Advanced Peripheral Bus 1 (APB1) registers"),
    APB2 => (APBENR2, apbenr2, APBRSTR2, apbrstr2, "Advanced Peripheral Bus 2 (APB2) registers"),
    IOP => (IOPENR, iopenr, IOPRSTR, ioprstr, "Input-Output Peripheral Bus (IOP) registers"),
}
