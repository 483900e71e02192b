/// Prescaler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prescaler {
    NotDivided,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

/// System clock mux source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysClockSrc {
    PLL,
    HSI(Prescaler),
}

/// PLL divider
pub type PLLDiv = u8;

/// PLL multiplier
pub type PLLMul = u8;

/// PLL config, HSI16 in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllConfig {
    pub m: PLLDiv,
    pub n: PLLMul,
    pub r: PLLDiv,
}

impl Default for PllConfig {
    /// 16 MHz / 1 * 8 / 2 = 64 MHz
    fn default() -> PllConfig {
        PllConfig { m: 1, n: 8, r: 2 }
    }
}

impl PllConfig {
    pub fn with_hsi(m: PLLDiv, n: PLLMul, r: PLLDiv) -> PllConfig {
        PllConfig { m, n, r }
    }
}

/// Clocks configutation
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) sys_mux: SysClockSrc,
    pub(crate) pll_cfg: PllConfig,
    pub(crate) ahb_psc: Prescaler,
    pub(crate) apb_psc: Prescaler,
}

impl Config {
    pub fn new(mux: SysClockSrc) -> Self {
        Config::default().clock_src(mux)
    }

    pub fn pll() -> Self {
        Config::default().clock_src(SysClockSrc::PLL)
    }

    pub fn hsi(psc: Prescaler) -> Self {
        Config::default().clock_src(SysClockSrc::HSI(psc))
    }

    pub fn clock_src(mut self, mux: SysClockSrc) -> Self {
        self.sys_mux = mux;
        self
    }

    pub fn pll_cfg(mut self, cfg: PllConfig) -> Self {
        self.pll_cfg = cfg;
        self
    }

    pub fn ahb_psc(mut self, psc: Prescaler) -> Self {
        self.ahb_psc = psc;
        self
    }

    pub fn apb_psc(mut self, psc: Prescaler) -> Self {
        self.apb_psc = psc;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            sys_mux: SysClockSrc::HSI(Prescaler::NotDivided),
            pll_cfg: PllConfig::default(),
            ahb_psc: Prescaler::NotDivided,
            apb_psc: Prescaler::NotDivided,
        }
    }
}
