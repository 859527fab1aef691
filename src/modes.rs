//! Transport and surface mode state machines
//!
//! Small process-lifetime machines driven by dedicated note ranges: automation
//! mode, rec/pre-roll mode, the held user-page set, plus the fader and button
//! mode selections the UI layer switches between.

mod automation;
mod button_mode;
mod rec_pre;
mod user_page;

pub use automation::{AutomationMachine, AutomationMode};
pub use button_mode::{ButtonModeLayers, ChannelFaderMode};
pub use rec_pre::{RecPreMachine, RecPreMode};
pub use user_page::UserPageSet;

/// All mode scalars, owned by the bridge context
#[derive(Debug, Clone)]
pub struct ModeState {
    pub automation: AutomationMachine,
    pub rec_pre: RecPreMachine,
    pub user_pages: UserPageSet,
    pub fader_mode: ChannelFaderMode,
    pub button_mode: ButtonModeLayers,
}

impl ModeState {
    pub fn new(max_user_pages: usize) -> Self {
        Self {
            automation: AutomationMachine::default(),
            rec_pre: RecPreMachine::default(),
            user_pages: UserPageSet::new(max_user_pages),
            fader_mode: ChannelFaderMode::default(),
            button_mode: ButtonModeLayers::default(),
        }
    }

    /// Switch the channel fader mode, returning the new mode if it changed
    pub fn set_fader_mode(&mut self, mode: ChannelFaderMode) -> Option<ChannelFaderMode> {
        if self.fader_mode == mode {
            return None;
        }
        self.fader_mode = mode;
        Some(mode)
    }
}
