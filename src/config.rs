//! Transmitter configuration
use crate::nec::{CARRIER_DUTY_PERCENT, CARRIER_FREQ_HZ};
use crate::time::Hertz;

/// Carrier settings; the defaults are what NEC receivers expect
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    carrier_freq: Hertz,
    duty_percent: u8,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn carrier_freq(&self) -> Hertz {
        self.carrier_freq
    }

    pub fn duty_percent(&self) -> u8 {
        self.duty_percent
    }

    /// Sets the carrier frequency
    pub fn with_carrier_freq(mut self, freq: Hertz) -> Self {
        self.carrier_freq = freq;
        self
    }

    /// Sets the share of every carrier period the output is high, capped at 100
    pub fn with_duty_percent(mut self, percent: u8) -> Self {
        self.duty_percent = percent.min(100);
        self
    }

    /// Compare value giving the configured duty cycle on a timer counting up to `max`
    pub fn compare_value(&self, max: u16) -> u16 {
        let period = u32::from(max) + 1;
        let duty = period * u32::from(self.duty_percent) / 100;
        duty.min(u32::from(u16::MAX)) as u16
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            carrier_freq: Hertz::from_raw(CARRIER_FREQ_HZ),
            duty_percent: CARRIER_DUTY_PERCENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_nec_carrier() {
        let cfg = Config::new();
        assert_eq!(cfg.carrier_freq().raw(), 38_000);
        assert_eq!(cfg.duty_percent(), 25);
    }

    #[test]
    fn compare_value_follows_duty() {
        let cfg = Config::default();
        assert_eq!(cfg.compare_value(1683), 421);
        assert_eq!(cfg.with_duty_percent(50).compare_value(99), 50);
        assert_eq!(cfg.with_duty_percent(250).duty_percent(), 100);
        assert_eq!(cfg.with_duty_percent(100).compare_value(u16::MAX), u16::MAX);
    }
}
