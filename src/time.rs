//! Time units
pub use fugit::{ExtU32, HertzU32 as Hertz, RateExtU32};

/// Tick rate of the phase timers; every timing table entry is counted in these ticks
pub const TICK: Hertz = Hertz::from_raw(1_000_000);

/// Prescaler that divides `clk` down to exactly one [`TICK`] per count
pub fn tick_prescaler(clk: Hertz) -> Option<u16> {
    let ratio = clk.raw() / TICK.raw();
    if ratio == 0 || clk.raw() % TICK.raw() != 0 {
        return None;
    }
    u16::try_from(ratio - 1).ok()
}

/// Prescaler and auto-reload values that make a timer clocked by `clk`
/// overflow at `freq`, or `None` when `freq` is out of range
pub fn period_settings(freq: Hertz, clk: Hertz) -> Option<(u16, u16)> {
    if freq.raw() == 0 || freq.raw() > clk.raw() / 2 {
        return None;
    }
    let ratio = clk.raw() / freq.raw();
    let psc = (ratio - 1) / 0xffff;
    let arr = ratio / (psc + 1) - 1;
    Some((u16::try_from(psc).ok()?, u16::try_from(arr).ok()?))
}

/// Longest interval one period of a 16-bit counter can measure, in ticks
pub const MAX_PERIOD_TICKS: u32 = 0x1_0000;

/// Length of the next counter period for an interval with `remaining` ticks
/// left; long intervals are cut into nearly equal periods
pub fn next_period(remaining: u32) -> u32 {
    let remaining = remaining.max(1);
    remaining / remaining.div_ceil(MAX_PERIOD_TICKS)
}
