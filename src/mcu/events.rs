//! Events emitted towards the host

use serde::Serialize;
use std::fmt;

use crate::mixer::PropertyType;
use crate::modes::{AutomationMode, ChannelFaderMode, RecPreMode};

/// Something the surface (or the mode machines) reported
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    UserButtonChanged {
        channel: usize,
        value: u8,
        label: String,
    },
    /// Plain command button with no decoded meaning
    CommandNoteReceived { note: u8, velocity: u8 },
    /// Fire-and-forget command on the high channels
    OneWayCommandNoteReceived { channel: u8, note: u8, velocity: u8 },
    ActiveUserPagesReceived { count: u8 },
    AutomationModeChanged { mode: AutomationMode },
    RecPreModeChanged { mode: RecPreMode },
    /// Effective user page, 0 when none is held
    UserPageChanged { page: u8 },
    FocusDeviceChanged { text: String },
    FunctionKeyChanged { key_id: u8, text: String },
    ChannelFaderModeChanged { mode: ChannelFaderMode },
    ButtonModeChanged { mode: PropertyType },
}

impl fmt::Display for SurfaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceEvent::UserButtonChanged {
                channel,
                value,
                label,
            } => write!(f, "UserButton ch={} value={} label='{}'", channel, value, label),
            SurfaceEvent::CommandNoteReceived { note, velocity } => {
                write!(f, "Command note=0x{:02X} vel={}", note, velocity)
            }
            SurfaceEvent::OneWayCommandNoteReceived {
                channel,
                note,
                velocity,
            } => write!(
                f,
                "OneWayCommand ch={} note=0x{:02X} vel={}",
                channel, note, velocity
            ),
            SurfaceEvent::ActiveUserPagesReceived { count } => {
                write!(f, "ActiveUserPages count={}", count)
            }
            SurfaceEvent::AutomationModeChanged { mode } => write!(f, "Automation {:?}", mode),
            SurfaceEvent::RecPreModeChanged { mode } => write!(f, "RecPre {:?}", mode),
            SurfaceEvent::UserPageChanged { page } => write!(f, "UserPage {}", page),
            SurfaceEvent::FocusDeviceChanged { text } => write!(f, "FocusDevice '{}'", text),
            SurfaceEvent::FunctionKeyChanged { key_id, text } => {
                write!(f, "FunctionKey {} '{}'", key_id, text)
            }
            SurfaceEvent::ChannelFaderModeChanged { mode } => write!(f, "FaderMode {:?}", mode),
            SurfaceEvent::ButtonModeChanged { mode } => write!(f, "ButtonMode {}", mode),
        }
    }
}
