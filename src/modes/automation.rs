//! Automation mode state machine

use serde::{Deserialize, Serialize};

/// First note of the automation button row (Off / Read)
pub const AUTOMATION_NOTE_FIRST: u8 = 0x4A;

/// Last note of the automation button row (Write)
pub const AUTOMATION_NOTE_LAST: u8 = 0x4D;

/// DAW automation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationMode {
    #[default]
    Off = 0,
    Read = 1,
    Touch = 2,
    Latch = 3,
    Write = 4,
}

impl AutomationMode {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(AutomationMode::Off),
            1 => Some(AutomationMode::Read),
            2 => Some(AutomationMode::Touch),
            3 => Some(AutomationMode::Latch),
            4 => Some(AutomationMode::Write),
            _ => None,
        }
    }
}

/// Tracks the current automation mode from button presses
#[derive(Debug, Clone, Default)]
pub struct AutomationMachine {
    current: AutomationMode,
}

impl AutomationMachine {
    pub fn current(&self) -> AutomationMode {
        self.current
    }

    pub fn handles(note: u8) -> bool {
        (AUTOMATION_NOTE_FIRST..=AUTOMATION_NOTE_LAST).contains(&note)
    }

    /// Feed a note from the automation row; returns the new mode if it changed
    ///
    /// The first note forces `Off`. The remaining notes map through
    /// `note - first + 1`, so `Read` is only ever the initial/default state.
    /// Releases never change the mode.
    pub fn on_note(&mut self, note: u8, velocity: u8) -> Option<AutomationMode> {
        if !Self::handles(note) || velocity == 0 {
            return None;
        }

        let next = if note == AUTOMATION_NOTE_FIRST {
            AutomationMode::Off
        } else {
            AutomationMode::from_index(note - AUTOMATION_NOTE_FIRST + 1)?
        };

        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}
