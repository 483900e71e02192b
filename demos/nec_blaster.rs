//! Presses the power button of a Gorilla fan every two seconds.
//!
//! IR LED driver on PB9 (TIM17 CH1), TIM16 times the bursts, TIM3 the spaces.
#![deny(warnings)]
#![no_main]
#![no_std]

extern crate cortex_m;
extern crate cortex_m_rt as rt;
extern crate panic_probe;
extern crate stm32g0xx_nec as nec;

use nec::carrier::{PwmCarrier, PB9};
use nec::config::Config;
use nec::nec::{table_capacity, MAX_REPEATS};
use nec::prelude::*;
use nec::rcc;
use nec::remote::{FanCodes, REPEAT_COUNT};
use nec::stm32::{self, interrupt, TIM16, TIM17, TIM3};
use nec::timer::MicrosTimer;
use nec::SharedTransmitter;
use rt::entry;

type IrTx = SharedTransmitter<
    MicrosTimer<TIM16>,
    MicrosTimer<TIM3>,
    PwmCarrier<TIM17>,
    { table_capacity(MAX_REPEATS) },
>;

static IR: IrTx = SharedTransmitter::new();

#[entry]
fn main() -> ! {
    let dp = stm32::Peripherals::take().expect("cannot take peripherals");
    let cp = cortex_m::Peripherals::take().expect("cannot take core peripherals");
    let mut rcc = dp.RCC.freeze(rcc::Config::pll());

    let mut gpiob = dp.GPIOB;
    let ir_pin = PB9::new(&mut gpiob, &mut rcc);
    nec::init_transmitter(
        &IR,
        dp.TIM16,
        dp.TIM3,
        dp.TIM17,
        ir_pin,
        &Config::default(),
        &mut rcc,
    )
    .expect("failed to set up the IR transmitter");

    let mut delay = cp.SYST.delay(&rcc);
    loop {
        IR.transmit_command(FanCodes::GORILLA.power, REPEAT_COUNT, &mut delay)
            .expect("failed to send IR command");
        delay.delay_ms(2_000);
    }
}

#[interrupt]
fn TIM16() {
    IR.on_pulse_timer();
}

#[interrupt]
fn TIM3() {
    IR.on_idle_timer();
}
