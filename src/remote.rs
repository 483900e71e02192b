//! # Voice-controlled fan remote
//!
//! Maps the output of a keyword classifier onto NEC buttons of a ceiling /
//! tower fan remote. Commands only go out after the wakeword has been heard;
//! the wakeword latch is cleared by the first command that produces a
//! transmission.
use crate::nec::NecCommand;

/// Samples per classified audio frame (one second at 16 kHz)
pub const FRAME_LEN: usize = 16_000;
/// Audio sample rate the classifier expects
pub const SAMPLE_RATE_HZ: u32 = 16_000;
/// Repeat codes sent after every command
pub const REPEAT_COUNT: usize = 1;

/// Keyword recognizer producing one command id per audio frame
pub trait Classifier {
    fn classify(&mut self, frame: &[i16]) -> i16;
}

impl<F> Classifier for F
where
    F: FnMut(&[i16]) -> i16,
{
    fn classify(&mut self, frame: &[i16]) -> i16 {
        self(frame)
    }
}

/// Keywords the classifier knows about
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum SpeechCommand {
    Wakeword = 101,
    On = 201,
    Off = 202,
    Up = 203,
    Down = 204,
}

impl SpeechCommand {
    /// Maps a classifier id; ids of other keywords or of noise give `None`
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            101 => Some(SpeechCommand::Wakeword),
            201 => Some(SpeechCommand::On),
            202 => Some(SpeechCommand::Off),
            203 => Some(SpeechCommand::Up),
            204 => Some(SpeechCommand::Down),
            _ => None,
        }
    }

    pub fn id(self) -> i16 {
        self as i16
    }
}

/// Buttons of one fan remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanCodes {
    pub power: NecCommand,
    pub light: NecCommand,
    pub speed_up: NecCommand,
    pub speed_down: NecCommand,
    pub boost: NecCommand,
    pub timer: NecCommand,
    pub sleep: NecCommand,
}

impl FanCodes {
    /// Gorilla BLDC fan remote
    pub const GORILLA: FanCodes = FanCodes {
        power: NecCommand::new(0xF300, 0x91),
        light: NecCommand::new(0xF300, 0x97),
        speed_up: NecCommand::new(0xF300, 0x94),
        speed_down: NecCommand::new(0xF300, 0x95),
        boost: NecCommand::new(0xF300, 0x8F),
        timer: NecCommand::new(0xF300, 0x96),
        sleep: NecCommand::new(0xF300, 0x8E),
    };
}

/// Tracks the wakeword latch and the fan's power state
#[derive(Debug, Clone)]
pub struct FanController {
    codes: FanCodes,
    armed: bool,
    power_on: bool,
}

impl FanController {
    pub fn new(codes: FanCodes) -> Self {
        FanController {
            codes,
            armed: false,
            power_on: false,
        }
    }

    /// `true` between a wakeword and the command that consumes it
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Last power state this controller switched the fan to
    pub fn is_power_on(&self) -> bool {
        self.power_on
    }

    pub fn codes(&self) -> &FanCodes {
        &self.codes
    }

    /// Button to press for `command`, if any
    ///
    /// "on" and "off" both press the power toggle, but only when the fan is
    /// believed to be in the opposite state.
    pub fn dispatch(&mut self, command: SpeechCommand) -> Option<NecCommand> {
        let button = match command {
            SpeechCommand::Wakeword => {
                self.armed = true;
                return None;
            }
            _ if !self.armed => return None,
            SpeechCommand::On if !self.power_on => {
                self.power_on = true;
                self.codes.power
            }
            SpeechCommand::Off if self.power_on => {
                self.power_on = false;
                self.codes.power
            }
            SpeechCommand::Up => self.codes.speed_up,
            SpeechCommand::Down => self.codes.speed_down,
            SpeechCommand::On | SpeechCommand::Off => return None,
        };
        self.armed = false;
        Some(button)
    }

    /// Classifies one audio frame and dispatches the result
    pub fn on_frame<C: Classifier>(&mut self, classifier: &mut C, frame: &[i16]) -> Option<NecCommand> {
        let id = classifier.classify(frame);
        let command = SpeechCommand::from_id(id)?;
        info!("heard {}", command);
        self.dispatch(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FanController {
        FanController::new(FanCodes::GORILLA)
    }

    #[test]
    fn commands_need_the_wakeword() {
        let mut fan = controller();
        assert_eq!(fan.dispatch(SpeechCommand::On), None);
        assert_eq!(fan.dispatch(SpeechCommand::Up), None);
        assert!(!fan.is_power_on());

        assert_eq!(fan.dispatch(SpeechCommand::Wakeword), None);
        assert!(fan.is_armed());
        assert_eq!(fan.dispatch(SpeechCommand::On), Some(FanCodes::GORILLA.power));
        assert!(fan.is_power_on());
        assert!(!fan.is_armed());
        assert_eq!(fan.dispatch(SpeechCommand::Up), None);
    }

    #[test]
    fn power_toggle_tracks_state() {
        let mut fan = controller();
        fan.dispatch(SpeechCommand::Wakeword);
        // already off: "off" keeps the latch and sends nothing
        assert_eq!(fan.dispatch(SpeechCommand::Off), None);
        assert!(fan.is_armed());
        assert_eq!(fan.dispatch(SpeechCommand::On), Some(FanCodes::GORILLA.power));

        fan.dispatch(SpeechCommand::Wakeword);
        assert_eq!(fan.dispatch(SpeechCommand::On), None);
        assert_eq!(fan.dispatch(SpeechCommand::Off), Some(FanCodes::GORILLA.power));
        assert!(!fan.is_power_on());
    }

    #[test]
    fn speed_commands() {
        let mut fan = controller();
        fan.dispatch(SpeechCommand::Wakeword);
        assert_eq!(fan.dispatch(SpeechCommand::Up), Some(NecCommand::new(0xF300, 0x94)));
        fan.dispatch(SpeechCommand::Wakeword);
        assert_eq!(fan.dispatch(SpeechCommand::Down), Some(NecCommand::new(0xF300, 0x95)));
        assert!(!fan.is_armed());
    }

    #[test]
    fn frames_go_through_the_classifier() {
        let mut fan = controller();
        let frame = [0i16; 32];
        let mut ids = [101i16, 7, 203].into_iter();
        let mut classifier = |_: &[i16]| ids.next().unwrap_or(0);

        assert_eq!(fan.on_frame(&mut classifier, &frame), None);
        assert!(fan.is_armed());
        // unknown ids leave the latch alone
        assert_eq!(fan.on_frame(&mut classifier, &frame), None);
        assert!(fan.is_armed());
        assert_eq!(
            fan.on_frame(&mut classifier, &frame),
            Some(FanCodes::GORILLA.speed_up)
        );
    }

    #[test]
    fn ids_round_trip() {
        for id in [101, 201, 202, 203, 204] {
            assert_eq!(SpeechCommand::from_id(id).map(SpeechCommand::id), Some(id));
        }
        assert_eq!(SpeechCommand::from_id(0), None);
    }
}
