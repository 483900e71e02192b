//! # Pulse/idle playback
//!
//! Walks a timing table with two one-shot timers. The pulse timer measures
//! how long the carrier stays on, the idle timer how long it stays off; their
//! expiry interrupts hand over to each other until an entry with no silence
//! (or no burst) ends the transmission.
//!
//! ```text
//!   start ──► Pulsing ──pulse expired, idle > 0──► Silent
//!                ▲                                   │
//!                └─────idle expired, pulse > 0───────┘
//!   Pulsing ──idle == 0──► Idle ◄──pulse == 0── Silent
//! ```
//!
//! The only state shared with the thread that requested the transmission is
//! [`PlaybackState`]: a phase and a cursor, each a single atomic word that is
//! written by exactly one context at a time.
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use embedded_hal::delay::DelayNs;
use void::Void;

use crate::error::{Error, Result};
use crate::nec::Entry;

/// Sleep between two looks at the busy flag while waiting for completion
pub const POLL_INTERVAL_MS: u32 = 10;

/// One-shot timer counting 1 µs ticks
pub trait PhaseTimer {
    /// Starts a single countdown of `micros` ticks, replacing any running one
    fn arm(&mut self, micros: u32);

    /// Stops the countdown and drops a pending expiry
    fn disarm(&mut self);

    /// Acknowledges the timer interrupt
    ///
    /// Returns `WouldBlock` while the armed interval has not fully elapsed;
    /// timers that split long intervals into several hardware periods report
    /// the intermediate interrupts this way.
    fn wait(&mut self) -> nb::Result<(), Void>;
}

/// Modulated output that can be switched on and off
pub trait Carrier {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Playback phase
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Nothing in flight
    Idle = 0,
    /// Carrier on, pulse timer running
    Pulsing = 1,
    /// Carrier off, idle timer running
    Silent = 2,
}

impl Phase {
    const fn from_bits(bits: u8) -> Phase {
        match bits {
            1 => Phase::Pulsing,
            2 => Phase::Silent,
            _ => Phase::Idle,
        }
    }
}

/// Progress of the current transmission, shared with interrupt context
///
/// Only [`Playback`] moves it forward. Everybody else can observe it, which
/// is all the requesting thread needs to wait for completion.
#[derive(Debug)]
pub struct PlaybackState {
    phase: AtomicU8,
    cursor: AtomicUsize,
}

impl PlaybackState {
    pub const fn new() -> Self {
        PlaybackState {
            phase: AtomicU8::new(Phase::Idle as u8),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_bits(self.phase.load(Ordering::Acquire))
    }

    /// `true` from `start` until the last entry has been played
    pub fn is_busy(&self) -> bool {
        self.phase() != Phase::Idle
    }

    /// Index of the entry being played
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Sleeps in [`POLL_INTERVAL_MS`] steps until the transmission is over
    pub fn wait<D: DelayNs>(&self, delay: &mut D) {
        while self.is_busy() {
            delay.delay_ms(POLL_INTERVAL_MS);
        }
    }

    fn begin(&self) -> Result<()> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        self.cursor.store(0, Ordering::Release);
        self.enter(Phase::Pulsing);
        Ok(())
    }

    fn advance(&self) {
        // Single writer: load + store cannot race, and works without CAS on thumbv6m
        let next = self.cursor.load(Ordering::Relaxed).wrapping_add(1);
        self.cursor.store(next, Ordering::Release);
    }

    fn enter(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn complete(&self) {
        self.enter(Phase::Idle);
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-phase playback engine
pub struct Playback<'a, P, I, C> {
    pulse_timer: P,
    idle_timer: I,
    carrier: C,
    state: &'a PlaybackState,
}

impl<'a, P, I, C> Playback<'a, P, I, C>
where
    P: PhaseTimer,
    I: PhaseTimer,
    C: Carrier,
{
    pub fn new(pulse_timer: P, idle_timer: I, carrier: C, state: &'a PlaybackState) -> Self {
        Playback {
            pulse_timer,
            idle_timer,
            carrier,
            state,
        }
    }

    pub fn state(&self) -> &'a PlaybackState {
        self.state
    }

    /// Starts playing `entries` from the first burst
    ///
    /// `entries` must stay unchanged until the state reports idle again.
    pub fn start(&mut self, entries: &[Entry]) -> Result<()> {
        let first = match entries.first() {
            Some(entry) if entry.pulse_us > 0 => *entry,
            _ => return Err(Error::EmptyTable),
        };
        self.state.begin()?;
        self.pulse_timer.arm(first.pulse_us);
        self.carrier.start();
        Ok(())
    }

    /// Pulse timer interrupt
    pub fn on_pulse_timer(&mut self, entries: &[Entry]) {
        if self.pulse_timer.wait().is_err() {
            return;
        }
        if self.state.phase() != Phase::Pulsing {
            self.pulse_timer.disarm();
            return;
        }

        self.carrier.stop();
        self.pulse_timer.disarm();

        let cursor = self.state.cursor();
        match entries.get(cursor) {
            Some(entry) if entry.idle_us > 0 => {
                self.idle_timer.arm(entry.idle_us);
                self.state.advance();
                self.state.enter(Phase::Silent);
            }
            _ => self.finish(),
        }
    }

    /// Idle timer interrupt
    pub fn on_idle_timer(&mut self, entries: &[Entry]) {
        if self.idle_timer.wait().is_err() {
            return;
        }
        if self.state.phase() != Phase::Silent {
            self.idle_timer.disarm();
            return;
        }

        self.idle_timer.disarm();

        let cursor = self.state.cursor();
        match entries.get(cursor) {
            Some(entry) if entry.pulse_us > 0 => {
                self.pulse_timer.arm(entry.pulse_us);
                self.carrier.start();
                self.state.enter(Phase::Pulsing);
            }
            _ => self.finish(),
        }
    }

    fn finish(&mut self) {
        self.carrier.stop();
        self.pulse_timer.disarm();
        self.idle_timer.disarm();
        self.state.complete();
    }

    /// Releases the timers and the carrier
    pub fn release(self) -> (P, I, C) {
        (self.pulse_timer, self.idle_timer, self.carrier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct Bench {
        pulse: Cell<Option<u32>>,
        idle: Cell<Option<u32>>,
        carrier: Cell<bool>,
        overlaps: Cell<u32>,
    }

    struct Timer<'a> {
        bench: &'a Bench,
        is_pulse: bool,
        // intermediate interrupts left before the armed interval is over
        wraps: Cell<u32>,
        wraps_per_arm: u32,
    }

    impl<'a> Timer<'a> {
        fn new(bench: &'a Bench, is_pulse: bool, wraps_per_arm: u32) -> Self {
            Timer {
                bench,
                is_pulse,
                wraps: Cell::new(0),
                wraps_per_arm,
            }
        }

        fn slots(&self) -> (&Cell<Option<u32>>, &Cell<Option<u32>>) {
            if self.is_pulse {
                (&self.bench.pulse, &self.bench.idle)
            } else {
                (&self.bench.idle, &self.bench.pulse)
            }
        }
    }

    impl PhaseTimer for Timer<'_> {
        fn arm(&mut self, micros: u32) {
            let (mine, other) = self.slots();
            if other.get().is_some() {
                self.bench.overlaps.set(self.bench.overlaps.get() + 1);
            }
            mine.set(Some(micros));
            self.wraps.set(self.wraps_per_arm);
        }

        fn disarm(&mut self) {
            self.slots().0.set(None);
        }

        fn wait(&mut self) -> nb::Result<(), Void> {
            match self.wraps.get() {
                0 => Ok(()),
                n => {
                    self.wraps.set(n - 1);
                    Err(nb::Error::WouldBlock)
                }
            }
        }
    }

    struct Led<'a>(&'a Bench);

    impl Carrier for Led<'_> {
        fn start(&mut self) {
            self.0.carrier.set(true);
        }

        fn stop(&mut self) {
            self.0.carrier.set(false);
        }
    }

    fn engine<'a>(
        bench: &'a Bench,
        state: &'a PlaybackState,
        wraps: u32,
    ) -> Playback<'a, Timer<'a>, Timer<'a>, Led<'a>> {
        Playback::new(
            Timer::new(bench, true, wraps),
            Timer::new(bench, false, wraps),
            Led(bench),
            state,
        )
    }

    const TABLE: [Entry; 3] = [
        Entry::new(9_000, 4_500),
        Entry::new(560, 1_690),
        Entry::new(560, 0),
    ];

    #[test]
    fn walks_the_table_and_completes() {
        let bench = Bench::default();
        let state = PlaybackState::new();
        let mut playback = engine(&bench, &state, 0);

        assert_eq!(state.phase(), Phase::Idle);
        playback.start(&TABLE).unwrap();
        assert_eq!(state.phase(), Phase::Pulsing);
        assert_eq!(bench.pulse.get(), Some(9_000));
        assert!(bench.carrier.get());

        playback.on_pulse_timer(&TABLE);
        assert_eq!(state.phase(), Phase::Silent);
        assert_eq!(state.cursor(), 1);
        assert_eq!(bench.idle.get(), Some(4_500));
        assert!(!bench.carrier.get());

        playback.on_idle_timer(&TABLE);
        assert_eq!(state.phase(), Phase::Pulsing);
        assert_eq!(bench.pulse.get(), Some(560));
        assert!(bench.carrier.get());

        playback.on_pulse_timer(&TABLE);
        assert_eq!(bench.idle.get(), Some(1_690));
        playback.on_idle_timer(&TABLE);
        assert_eq!(state.cursor(), 2);

        playback.on_pulse_timer(&TABLE);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.is_busy());
        assert!(!bench.carrier.get());
        assert_eq!(bench.pulse.get(), None);
        assert_eq!(bench.idle.get(), None);
        assert_eq!(bench.overlaps.get(), 0);
    }

    #[test]
    fn start_while_busy_is_refused() {
        let bench = Bench::default();
        let state = PlaybackState::new();
        let mut playback = engine(&bench, &state, 0);

        playback.start(&TABLE).unwrap();
        playback.on_pulse_timer(&TABLE);
        assert_eq!(playback.start(&TABLE), Err(Error::Busy));
        // the transmission in flight is untouched
        assert_eq!(state.phase(), Phase::Silent);
        assert_eq!(state.cursor(), 1);
        assert_eq!(bench.idle.get(), Some(4_500));
    }

    #[test]
    fn empty_tables_do_not_start() {
        let bench = Bench::default();
        let state = PlaybackState::new();
        let mut playback = engine(&bench, &state, 0);

        assert_eq!(playback.start(&[]), Err(Error::EmptyTable));
        assert_eq!(playback.start(&[Entry::new(0, 500)]), Err(Error::EmptyTable));
        assert!(!state.is_busy());
        assert!(!bench.carrier.get());
    }

    #[test]
    fn zero_pulse_after_silence_ends_playback() {
        let bench = Bench::default();
        let state = PlaybackState::new();
        let mut playback = engine(&bench, &state, 0);
        let table = [Entry::new(560, 560), Entry::new(0, 0)];

        playback.start(&table).unwrap();
        playback.on_pulse_timer(&table);
        assert!(state.is_busy());
        playback.on_idle_timer(&table);
        assert!(!state.is_busy());
        assert!(!bench.carrier.get());
    }

    #[test]
    fn intermediate_interrupts_are_ignored() {
        let bench = Bench::default();
        let state = PlaybackState::new();
        let mut playback = engine(&bench, &state, 2);

        playback.start(&TABLE).unwrap();
        playback.on_pulse_timer(&TABLE);
        playback.on_pulse_timer(&TABLE);
        assert_eq!(state.phase(), Phase::Pulsing);
        assert!(bench.carrier.get());
        playback.on_pulse_timer(&TABLE);
        assert_eq!(state.phase(), Phase::Silent);
    }

    #[test]
    fn stray_interrupts_do_not_move_the_cursor() {
        let bench = Bench::default();
        let state = PlaybackState::new();
        let mut playback = engine(&bench, &state, 0);

        playback.on_idle_timer(&TABLE);
        playback.on_pulse_timer(&TABLE);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.cursor(), 0);

        playback.start(&TABLE).unwrap();
        playback.on_idle_timer(&TABLE);
        assert_eq!(state.phase(), Phase::Pulsing);
        assert_eq!(state.cursor(), 0);
        assert_eq!(bench.pulse.get(), Some(9_000));
    }
}
