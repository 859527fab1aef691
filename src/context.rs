//! BridgeContext - shared state built once at startup
//!
//! Owns the channel registry, the change coalescer, the mode machines and the
//! settings engine. The decoder and the host both work through it; nothing in
//! the crate is a process-wide static.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::mcu::{ProtocolLayout, SurfaceEvent};
use crate::mixer::{ChangeCoalescer, ChannelRegistry, PropertyType};
use crate::modes::{ChannelFaderMode, ModeState};
use crate::settings::{plugin_name_from_focus, ResolvedParam, SettingsEngine};

pub struct BridgeContext {
    layout: ProtocolLayout,
    registry: ChannelRegistry,
    coalescer: Arc<ChangeCoalescer>,
    modes: Mutex<ModeState>,
    settings: Arc<SettingsEngine>,
    focus_device: Mutex<String>,
}

impl BridgeContext {
    pub fn new(
        layout: ProtocolLayout,
        coalescer: Arc<ChangeCoalescer>,
        settings: Arc<SettingsEngine>,
    ) -> Self {
        Self {
            layout,
            registry: ChannelRegistry::new(layout.channel_count),
            coalescer,
            modes: Mutex::new(ModeState::new(layout.max_user_pages)),
            settings,
            focus_device: Mutex::new(String::new()),
        }
    }

    pub fn layout(&self) -> &ProtocolLayout {
        &self.layout
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn coalescer(&self) -> &Arc<ChangeCoalescer> {
        &self.coalescer
    }

    pub fn settings(&self) -> &Arc<SettingsEngine> {
        &self.settings
    }

    /// Run `f` with the mode machines locked
    pub fn with_modes<R>(&self, f: impl FnOnce(&mut ModeState) -> R) -> R {
        f(&mut self.modes.lock())
    }

    /// Copy of the current mode state
    pub fn modes(&self) -> ModeState {
        self.modes.lock().clone()
    }

    pub fn current_user_page(&self) -> u8 {
        self.modes.lock().user_pages.current()
    }

    /// Switch what the channel faders control
    pub fn set_fader_mode(&self, mode: ChannelFaderMode) -> Option<SurfaceEvent> {
        self.with_modes(|modes| modes.set_fader_mode(mode))
            .map(|mode| SurfaceEvent::ChannelFaderModeChanged { mode })
    }

    /// Tap a button-mode key
    pub fn latch_button_mode(&self, mode: PropertyType) -> Option<SurfaceEvent> {
        self.with_modes(|modes| modes.button_mode.latch(mode))
            .map(|mode| SurfaceEvent::ButtonModeChanged { mode })
    }

    /// Press and hold a button-mode key
    pub fn hold_button_mode(&self, mode: PropertyType) -> Option<SurfaceEvent> {
        self.with_modes(|modes| modes.button_mode.hold(mode))
            .map(|mode| SurfaceEvent::ButtonModeChanged { mode })
    }

    pub fn release_button_mode(&self, mode: PropertyType) -> Option<SurfaceEvent> {
        self.with_modes(|modes| modes.button_mode.release(mode))
            .map(|mode| SurfaceEvent::ButtonModeChanged { mode })
    }

    /// Remember the focused device from a focus announcement
    ///
    /// Returns the settings device key derived from it.
    pub fn set_focus(&self, text: &str) -> String {
        let device = plugin_name_from_focus(text).to_string();
        debug!("Focus device: '{}'", device);
        *self.focus_device.lock() = device.clone();
        device
    }

    pub fn focus_device(&self) -> String {
        self.focus_device.lock().clone()
    }

    /// Resolve a parameter of the focused device on the current user page
    pub fn resolve_focused(
        &self,
        parameter: &str,
        is_user: bool,
        button_index: usize,
    ) -> ResolvedParam {
        let device = self.focus_device();
        self.settings.resolve(
            &device,
            parameter,
            is_user,
            button_index,
            self.current_user_page(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ParamSetting, ParamSource, SettingsDocument};

    fn context() -> BridgeContext {
        BridgeContext::new(
            ProtocolLayout::default(),
            Arc::new(ChangeCoalescer::default()),
            Arc::new(SettingsEngine::from_document(SettingsDocument::default())),
        )
    }

    #[test]
    fn test_registry_sized_from_layout() {
        let ctx = context();
        assert_eq!(ctx.registry().len(), 10);
        assert_eq!(ctx.modes().user_pages.max_pages(), 6);
    }

    #[test]
    fn test_mode_events_only_on_change() {
        let ctx = context();
        assert_eq!(ctx.set_fader_mode(ChannelFaderMode::Volume), None);
        assert_eq!(
            ctx.set_fader_mode(ChannelFaderMode::Pan),
            Some(SurfaceEvent::ChannelFaderModeChanged {
                mode: ChannelFaderMode::Pan
            })
        );

        assert_eq!(ctx.latch_button_mode(PropertyType::Select), None);
        assert_eq!(
            ctx.hold_button_mode(PropertyType::Mute),
            Some(SurfaceEvent::ButtonModeChanged {
                mode: PropertyType::Mute
            })
        );
        assert_eq!(ctx.release_button_mode(PropertyType::Solo), None);
        assert_eq!(
            ctx.release_button_mode(PropertyType::Mute),
            Some(SurfaceEvent::ButtonModeChanged {
                mode: PropertyType::Select
            })
        );
    }

    #[test]
    fn test_resolve_uses_focus_and_user_page() {
        let mut doc = SettingsDocument::default();
        let device = doc.device_mut("Pro-Q 3");
        let mut pinned = ParamSetting::named("2:0U");
        pinned.label = Some("Pinned".into());
        device.param_settings.push(pinned);

        let ctx = BridgeContext::new(
            ProtocolLayout::default(),
            Arc::new(ChangeCoalescer::default()),
            Arc::new(SettingsEngine::from_document(doc)),
        );
        assert_eq!(ctx.set_focus("Vocals - Pro-Q 3"), "Pro-Q 3");

        assert_eq!(
            ctx.resolve_focused("Gain", true, 0).source(),
            ParamSource::EngineDefault
        );

        ctx.with_modes(|modes| modes.user_pages.set_held(1, true));
        let resolved = ctx.resolve_focused("Gain", true, 0);
        assert_eq!(resolved.source(), ParamSource::Positional);
        assert_eq!(resolved.label(), "Pinned");
    }
}
