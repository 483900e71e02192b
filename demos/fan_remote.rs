//! Voice-controlled fan remote.
//!
//! A scripted classifier stands in for the keyword model, so the board walks
//! through "wakeword, on", "wakeword, faster", "wakeword, off" once per second
//! and sends the matching Gorilla fan buttons from PA7 (TIM14 CH1).
#![deny(warnings)]
#![no_main]
#![no_std]

extern crate cortex_m;
extern crate cortex_m_rt as rt;
extern crate stm32g0xx_nec as nec;

use defmt_rtt as _;
use panic_probe as _;

use nec::carrier::{PwmCarrier, PA7};
use nec::config::Config;
use nec::nec::{table_capacity, MAX_REPEATS};
use nec::prelude::*;
use nec::rcc;
use nec::remote::{FanCodes, FanController, SpeechCommand, REPEAT_COUNT};
use nec::stm32::{self, interrupt, TIM14, TIM16, TIM17};
use nec::timer::MicrosTimer;
use nec::SharedTransmitter;
use rt::entry;

type IrTx = SharedTransmitter<
    MicrosTimer<TIM16>,
    MicrosTimer<TIM17>,
    PwmCarrier<TIM14>,
    { table_capacity(MAX_REPEATS) },
>;

static IR: IrTx = SharedTransmitter::new();

const SCRIPT: [SpeechCommand; 6] = [
    SpeechCommand::Wakeword,
    SpeechCommand::On,
    SpeechCommand::Wakeword,
    SpeechCommand::Up,
    SpeechCommand::Wakeword,
    SpeechCommand::Off,
];

#[entry]
fn main() -> ! {
    let dp = stm32::Peripherals::take().expect("cannot take peripherals");
    let cp = cortex_m::Peripherals::take().expect("cannot take core peripherals");
    let mut rcc = dp.RCC.freeze(rcc::Config::pll());

    let mut gpioa = dp.GPIOA;
    let ir_pin = PA7::new(&mut gpioa, &mut rcc);
    nec::init_transmitter(
        &IR,
        dp.TIM16,
        dp.TIM17,
        dp.TIM14,
        ir_pin,
        &Config::default(),
        &mut rcc,
    )
    .expect("failed to set up the IR transmitter");

    let mut delay = cp.SYST.delay(&rcc);
    let mut fan = FanController::new(FanCodes::GORILLA);
    let mut script = SCRIPT.iter().map(|cmd| cmd.id()).cycle();
    let mut classifier = move |_: &[i16]| script.next().unwrap_or(0);
    // Microphone samples would land here
    let frame = [0i16; 64];

    loop {
        if let Some(button) = fan.on_frame(&mut classifier, &frame) {
            if let Err(err) = IR.transmit_command(button, REPEAT_COUNT, &mut delay) {
                defmt::warn!("IR send failed: {}", err);
            }
        }
        if fan.is_armed() {
            defmt::info!("wakeword heard, waiting for a command");
        }
        delay.delay_ms(1_000);
    }
}

#[interrupt]
fn TIM16() {
    IR.on_pulse_timer();
}

#[interrupt]
fn TIM17() {
    IR.on_idle_timer();
}
