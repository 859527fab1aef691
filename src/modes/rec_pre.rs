//! Rec / pre-roll mode state machine

use serde::{Deserialize, Serialize};

/// Precount button; Preroll and Autopunch follow
pub const REC_PRE_NOTE_FIRST: u8 = 0x56;

pub const REC_PRE_NOTE_LAST: u8 = 0x58;

/// Recording aid modes, one per button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecPreMode {
    #[default]
    Off = -1,
    Precount = 0,
    Preroll = 1,
    Autopunch = 2,
}

impl RecPreMode {
    pub fn from_offset(offset: u8) -> Option<Self> {
        match offset {
            0 => Some(RecPreMode::Precount),
            1 => Some(RecPreMode::Preroll),
            2 => Some(RecPreMode::Autopunch),
            _ => None,
        }
    }

    /// Note that selects this mode, `None` for `Off`
    pub fn note(self) -> Option<u8> {
        match self {
            RecPreMode::Off => None,
            mode => Some(REC_PRE_NOTE_FIRST + mode as u8),
        }
    }
}

/// Momentary rec/pre-roll selection: the last press wins, and a release only
/// clears the mode it belongs to
#[derive(Debug, Clone, Default)]
pub struct RecPreMachine {
    current: RecPreMode,
}

impl RecPreMachine {
    pub fn current(&self) -> RecPreMode {
        self.current
    }

    pub fn handles(note: u8) -> bool {
        (REC_PRE_NOTE_FIRST..=REC_PRE_NOTE_LAST).contains(&note)
    }

    /// Feed a note from the rec/pre row and return the resulting mode
    ///
    /// Callers report the result on every message, changed or not.
    pub fn on_note(&mut self, note: u8, velocity: u8) -> RecPreMode {
        let Some(mode) = note
            .checked_sub(REC_PRE_NOTE_FIRST)
            .and_then(RecPreMode::from_offset)
        else {
            return self.current;
        };

        if velocity > 0 {
            self.current = mode;
        } else if self.current == mode {
            self.current = RecPreMode::Off;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_release_does_not_clobber() {
        let mut machine = RecPreMachine::default();
        assert_eq!(machine.on_note(0x57, 127), RecPreMode::Preroll);
        assert_eq!(machine.on_note(0x56, 0), RecPreMode::Preroll);
        assert_eq!(machine.on_note(0x57, 0), RecPreMode::Off);
    }

    #[test]
    fn test_last_press_wins() {
        let mut machine = RecPreMachine::default();
        machine.on_note(0x56, 127);
        assert_eq!(machine.on_note(0x58, 127), RecPreMode::Autopunch);
        // Releasing the first key no longer matters
        assert_eq!(machine.on_note(0x56, 0), RecPreMode::Autopunch);
    }

    #[test]
    fn test_mode_notes() {
        assert_eq!(RecPreMode::Off.note(), None);
        assert_eq!(RecPreMode::Precount.note(), Some(0x56));
        assert_eq!(RecPreMode::Autopunch.note(), Some(0x58));
    }
}
