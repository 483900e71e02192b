//! # NEC transmitter
//!
//! [`Transmitter`] ties a [`TimingTable`] to a [`Playback`] engine: `send`
//! encodes a request and starts the burst train, the two `on_*_timer`
//! methods are the bodies of the timer interrupt handlers.
//!
//! Firmware normally keeps the transmitter in a [`SharedTransmitter`]
//! `static`, so that the main loop and both interrupt handlers can reach it:
//!
//! ```ignore
//! static IR: SharedTransmitter<MicrosTimer<TIM16>, MicrosTimer<TIM3>, PwmCarrier<TIM17>, 42> =
//!     SharedTransmitter::new();
//!
//! #[interrupt]
//! fn TIM16() {
//!     IR.on_pulse_timer();
//! }
//!
//! #[interrupt]
//! fn TIM3() {
//!     IR.on_idle_timer();
//! }
//! ```
use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

use crate::error::{Error, Result};
use crate::nec::{NecCommand, TimingTable};
use crate::playback::{Carrier, PhaseTimer, Playback, PlaybackState};

/// Timing table plus the engine that plays it
pub struct Transmitter<'a, P, I, C, const N: usize> {
    table: TimingTable<N>,
    playback: Playback<'a, P, I, C>,
}

impl<'a, P, I, C, const N: usize> Transmitter<'a, P, I, C, N>
where
    P: PhaseTimer,
    I: PhaseTimer,
    C: Carrier,
{
    pub fn new(pulse_timer: P, idle_timer: I, carrier: C, state: &'a PlaybackState) -> Self {
        Transmitter {
            table: TimingTable::new(),
            playback: Playback::new(pulse_timer, idle_timer, carrier, state),
        }
    }

    /// Encodes `address`/`command` with `repeats` repeat codes and starts sending
    ///
    /// Returns as soon as the first burst is on the air. A request made while
    /// another one is still playing is refused with [`Error::Busy`] and does
    /// not disturb it.
    pub fn send(&mut self, address: u16, command: u8, repeats: usize) -> Result<()> {
        // The interrupt handlers read the table until the state goes idle
        if self.is_busy() {
            return Err(Error::Busy);
        }
        self.table.rebuild(address, command, repeats)?;
        self.playback.start(self.table.as_slice())
    }

    pub fn send_command(&mut self, cmd: NecCommand, repeats: usize) -> Result<()> {
        self.send(cmd.address, cmd.command, repeats)
    }

    /// Body of the pulse timer interrupt handler
    pub fn on_pulse_timer(&mut self) {
        self.playback.on_pulse_timer(self.table.as_slice());
    }

    /// Body of the idle timer interrupt handler
    pub fn on_idle_timer(&mut self) {
        self.playback.on_idle_timer(self.table.as_slice());
    }

    pub fn state(&self) -> &'a PlaybackState {
        self.playback.state()
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    /// Timings of the most recent request
    pub fn table(&self) -> &TimingTable<N> {
        &self.table
    }

    /// Releases the timers and the carrier
    pub fn release(self) -> (P, I, C) {
        self.playback.release()
    }
}

/// [`Transmitter`] that can live in a `static`
///
/// The transmitter itself sits behind a critical-section mutex; the playback
/// state stays outside of it, so [`SharedTransmitter::transmit`] can wait for
/// completion without masking the timer interrupts.
pub struct SharedTransmitter<P, I, C, const N: usize> {
    state: PlaybackState,
    inner: Mutex<RefCell<Option<Transmitter<'static, P, I, C, N>>>>,
}

impl<P, I, C, const N: usize> SharedTransmitter<P, I, C, N> {
    pub const fn new() -> Self {
        SharedTransmitter {
            state: PlaybackState::new(),
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }
}

impl<P, I, C, const N: usize> SharedTransmitter<P, I, C, N>
where
    P: PhaseTimer,
    I: PhaseTimer,
    C: Carrier,
{
    /// Hands the timers and the carrier over to the shared transmitter
    pub fn install(&'static self, pulse_timer: P, idle_timer: I, carrier: C) {
        let transmitter = Transmitter::new(pulse_timer, idle_timer, carrier, &self.state);
        critical_section::with(|cs| {
            self.inner.borrow(cs).replace(Some(transmitter));
        });
    }

    /// Takes the transmitter back out, e.g. to release the peripherals
    ///
    /// Refused with [`Error::Busy`] while a frame is on the air, since the
    /// interrupt handlers would have nothing left to finish it with.
    pub fn uninstall(&self) -> Result<Transmitter<'static, P, I, C, N>> {
        critical_section::with(|cs| {
            if self.state.is_busy() {
                return Err(Error::Busy);
            }
            self.inner.borrow(cs).take().ok_or(Error::NotInitialized)
        })
    }

    /// Starts sending without waiting for completion
    pub fn send(&self, address: u16, command: u8, repeats: usize) -> Result<()> {
        critical_section::with(|cs| match self.inner.borrow(cs).borrow_mut().as_mut() {
            Some(transmitter) => transmitter.send(address, command, repeats),
            None => Err(Error::NotInitialized),
        })
    }

    pub fn send_command(&self, cmd: NecCommand, repeats: usize) -> Result<()> {
        self.send(cmd.address, cmd.command, repeats)
    }

    /// Sends `address`/`command` with `repeats` repeat codes and blocks until done
    pub fn transmit<D: DelayNs>(
        &self,
        address: u16,
        command: u8,
        repeats: usize,
        delay: &mut D,
    ) -> Result<()> {
        info!(
            "NEC TX address={=u16:#x} command={=u8:#x} repeats={=usize}",
            address,
            command,
            repeats
        );
        if let Err(err) = self.send(address, command, repeats) {
            warn!("NEC TX refused: {}", err);
            return Err(err);
        }
        self.state.wait(delay);
        info!("NEC TX complete");
        Ok(())
    }

    pub fn transmit_command<D: DelayNs>(
        &self,
        cmd: NecCommand,
        repeats: usize,
        delay: &mut D,
    ) -> Result<()> {
        self.transmit(cmd.address, cmd.command, repeats, delay)
    }

    /// Call from the pulse timer interrupt handler
    pub fn on_pulse_timer(&self) {
        critical_section::with(|cs| {
            if let Some(transmitter) = self.inner.borrow(cs).borrow_mut().as_mut() {
                transmitter.on_pulse_timer();
            }
        });
    }

    /// Call from the idle timer interrupt handler
    pub fn on_idle_timer(&self) {
        critical_section::with(|cs| {
            if let Some(transmitter) = self.inner.borrow(cs).borrow_mut().as_mut() {
                transmitter.on_idle_timer();
            }
        });
    }
}

impl<P, I, C, const N: usize> Default for SharedTransmitter<P, I, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "device-selected")]
mod device {
    use super::SharedTransmitter;
    use crate::carrier::{self, CarrierPin, PwmCarrier};
    use crate::config::Config;
    use crate::error::Result;
    use crate::rcc::Rcc;
    use crate::timer::{self, MicrosTimer};

    /// Brings up the phase timers and the carrier and installs them in `shared`
    ///
    /// `pulse_tim` and `idle_tim` tick at 1 MHz and get their update
    /// interrupts enabled and unmasked; the application routes those
    /// interrupts to [`SharedTransmitter::on_pulse_timer`] and
    /// [`SharedTransmitter::on_idle_timer`]. An error leaves the transmitter
    /// uninstalled and should be treated as fatal.
    pub fn init_transmitter<PT, IT, CT, PIN, const N: usize>(
        shared: &'static SharedTransmitter<MicrosTimer<PT>, MicrosTimer<IT>, PwmCarrier<CT>, N>,
        pulse_tim: PT,
        idle_tim: IT,
        carrier_tim: CT,
        pin: PIN,
        config: &Config,
        rcc: &mut Rcc,
    ) -> Result<()>
    where
        PT: timer::Instance,
        IT: timer::Instance,
        CT: carrier::Instance,
        PIN: CarrierPin<CT>,
    {
        let carrier = PwmCarrier::new(carrier_tim, pin, config, rcc)?;
        let pulse_timer = MicrosTimer::new(pulse_tim, rcc)?;
        let idle_timer = MicrosTimer::new(idle_tim, rcc)?;

        shared.install(pulse_timer, idle_timer, carrier);
        info!(
            "NEC transmitter ready: carrier {=u32} Hz, {=u8}% duty",
            config.carrier_freq().raw(),
            config.duty_percent()
        );
        Ok(())
    }
}

#[cfg(feature = "device-selected")]
pub use device::init_transmitter;
