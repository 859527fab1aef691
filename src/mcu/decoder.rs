//! McuDecoder - inbound surface traffic to registry mutations and events
//!
//! Malformed or unrecognised input is dropped without error; at most a trace
//! line is logged.

use std::sync::Arc;
use tracing::{debug, trace};

use super::events::SurfaceEvent;
use super::{
    ACTIVE_USER_PAGES_CC, ONE_WAY_COMMAND_CHANNEL, SYSEX_CHANNEL_TEXT, SYSEX_FOCUS_DEVICE,
    SYSEX_FUNCTION_KEY, SYSEX_PREFIX,
};
use crate::context::BridgeContext;
use crate::midi::MidiMessage;
use crate::mixer::{ChangeKind, PropertyType};
use crate::modes::{AutomationMachine, RecPreMachine};

/// Stateless decoder over a shared [`BridgeContext`]
///
/// One decoder per input port; calls for a given port must be made in arrival
/// order.
#[derive(Clone)]
pub struct McuDecoder {
    ctx: Arc<BridgeContext>,
}

impl McuDecoder {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.ctx
    }

    /// Apply one message and return the events it produced
    pub fn handle(&self, message: &MidiMessage) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();

        match *message {
            MidiMessage::PitchBend { channel, value } => self.pitch_bend(channel, value),
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => self.note(channel, note, velocity, &mut events),
            MidiMessage::NoteOff { channel, note, .. } => self.note(channel, note, 0, &mut events),
            MidiMessage::ControlChange { cc, value, .. } if cc == ACTIVE_USER_PAGES_CC => {
                events.push(SurfaceEvent::ActiveUserPagesReceived { count: value });
            }
            MidiMessage::SysEx { ref data } => self.sysex(data, &mut events),
            _ => trace!("Ignoring {}", message),
        }

        for event in &events {
            debug!("Surface event: {}", event);
        }
        events
    }

    fn pitch_bend(&self, channel: u8, value: u16) {
        let index = channel as usize;
        if index > self.ctx.layout().last_channel_index() {
            trace!("Pitch bend on unmapped channel {}", channel);
            return;
        }

        let normalized = f64::from(value.min(16383)) / 16383.0;
        if self
            .ctx
            .registry()
            .update(index, |c| c.value = normalized)
            .is_some()
        {
            self.ctx.coalescer().schedule(ChangeKind::Value);
        }
    }

    fn note(&self, channel: u8, note: u8, velocity: u8, events: &mut Vec<SurfaceEvent>) {
        if channel >= ONE_WAY_COMMAND_CHANNEL {
            events.push(SurfaceEvent::OneWayCommandNoteReceived {
                channel,
                note,
                velocity,
            });
            return;
        }
        if channel != 0 {
            trace!("Ignoring note 0x{:02X} on channel {}", note, channel);
            return;
        }

        if let Some((property, index)) = self.property_for(note) {
            let on = velocity > 0;
            if self
                .ctx
                .registry()
                .update(index, |c| c.set_property(property, on))
                .is_some()
            {
                self.ctx.coalescer().schedule(ChangeKind::Data);
            }
            return;
        }

        let layout = *self.ctx.layout();

        if let Some(index) = layout.user_button_index(note) {
            self.user_button(index, velocity, events);
        } else if AutomationMachine::handles(note) {
            let changed = self.ctx.with_modes(|m| m.automation.on_note(note, velocity));
            if let Some(mode) = changed {
                events.push(SurfaceEvent::AutomationModeChanged { mode });
            }
        } else if RecPreMachine::handles(note) {
            let mode = self.ctx.with_modes(|m| m.rec_pre.on_note(note, velocity));
            events.push(SurfaceEvent::CommandNoteReceived { note, velocity });
            events.push(SurfaceEvent::RecPreModeChanged { mode });
        } else if let Some(index) = layout.user_page_index(note) {
            let changed = self
                .ctx
                .with_modes(|m| m.user_pages.set_held(index, velocity > 0));
            if let Some(page) = changed {
                events.push(SurfaceEvent::UserPageChanged { page });
            }
        } else {
            events.push(SurfaceEvent::CommandNoteReceived { note, velocity });
        }
    }

    /// First property type, in declaration order, whose row contains `note`
    fn property_for(&self, note: u8) -> Option<(PropertyType, usize)> {
        let width = self.ctx.layout().channel_count;
        PropertyType::ALL.into_iter().find_map(|property| {
            let index = note.checked_sub(property.midi_base())? as usize;
            (index <= width).then_some((property, index))
        })
    }

    fn user_button(&self, index: usize, velocity: u8, events: &mut Vec<SurfaceEvent>) {
        let label = self.ctx.registry().update(index, |c| {
            let changed = c.user_value != velocity;
            c.user_value = velocity;
            (changed, c.user_label.clone())
        });

        if let Some((changed, label)) = label {
            if changed {
                self.ctx.coalescer().schedule(ChangeKind::Data);
            }
            events.push(SurfaceEvent::UserButtonChanged {
                channel: index,
                value: velocity,
                label,
            });
        }
    }

    fn sysex(&self, data: &[u8], events: &mut Vec<SurfaceEvent>) {
        if data.len() < 5 || data[..3] != SYSEX_PREFIX {
            trace!("Ignoring foreign SysEx ({} bytes)", data.len());
            return;
        }

        match data[4] {
            SYSEX_CHANNEL_TEXT if data.len() > 6 => {
                let offset = data[5] as usize;
                let text = String::from_utf8_lossy(&data[6..]).into_owned();
                self.channel_text(offset / 4, offset % 4, text, events);
            }
            SYSEX_FOCUS_DEVICE if data.len() > 5 => {
                let text = String::from_utf8_lossy(&data[5..]).into_owned();
                events.push(SurfaceEvent::FocusDeviceChanged { text });
            }
            SYSEX_FUNCTION_KEY if data.len() > 5 => {
                let key_id = data[5];
                let text = String::from_utf8_lossy(data.get(6..).unwrap_or_default()).into_owned();
                events.push(SurfaceEvent::FunctionKeyChanged { key_id, text });
            }
            other => trace!("Ignoring SysEx sub-type 0x{:02X} ({} bytes)", other, data.len()),
        }
    }

    fn channel_text(&self, index: usize, field: usize, text: String, events: &mut Vec<SurfaceEvent>) {
        let registry = self.ctx.registry();
        let updated = registry.update(index, |c| match field {
            0 => {
                c.label = text;
                (ChangeKind::Data, None)
            }
            1 => {
                c.value_text = text;
                (ChangeKind::Value, None)
            }
            2 => {
                c.description = text;
                (ChangeKind::Data, None)
            }
            _ => {
                c.user_label = text;
                let button = SurfaceEvent::UserButtonChanged {
                    channel: index,
                    value: c.user_value,
                    label: c.user_label.clone(),
                };
                (ChangeKind::Data, Some(button))
            }
        });

        match updated {
            Some((kind, button)) => {
                self.ctx.coalescer().schedule(kind);
                events.extend(button);
            }
            None => trace!("Text for unknown channel {}", index),
        }
    }
}
