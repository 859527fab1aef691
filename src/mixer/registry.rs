//! ChannelRegistry - concurrency-safe store of the fixed channel set
//!
//! Channels are keyed by their index rendered as a string. The set is created
//! once and never grows or shrinks; lookups for unknown keys are no-ops.

use dashmap::DashMap;

use super::channel::Channel;

/// Registry of all channel strips, including the two selected-channel slots
pub struct ChannelRegistry {
    channels: DashMap<String, Channel>,
    channel_count: usize,
}

impl ChannelRegistry {
    /// Create `channel_count + 2` channels: physical strips, then the
    /// selected-channel volume and pan slots
    pub fn new(channel_count: usize) -> Self {
        let channels = DashMap::with_capacity(channel_count + 2);
        for index in 0..channel_count + 2 {
            channels.insert(Self::key(index), Channel::new(index));
        }

        Self {
            channels,
            channel_count,
        }
    }

    /// Registry key for a channel index
    pub fn key(index: usize) -> String {
        index.to_string()
    }

    /// Number of physical strips
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Index of the selected-channel volume slot
    pub fn selected_volume_index(&self) -> usize {
        self.channel_count
    }

    /// Index of the selected-channel pan slot
    pub fn selected_pan_index(&self) -> usize {
        self.channel_count + 1
    }

    /// Total number of slots
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Mutate a channel in place. Returns `None` when the index is unknown.
    ///
    /// Writes to different fields are not atomic as a group across calls;
    /// readers that care wait for the debounced notification.
    pub fn update<R>(&self, index: usize, f: impl FnOnce(&mut Channel) -> R) -> Option<R> {
        self.channels
            .get_mut(&Self::key(index))
            .map(|mut entry| f(entry.value_mut()))
    }

    /// Copy of a single channel
    pub fn snapshot(&self, index: usize) -> Option<Channel> {
        self.channels
            .get(&Self::key(index))
            .map(|entry| entry.value().clone())
    }

    /// Copies of every channel, ordered by index
    pub fn snapshot_all(&self) -> Vec<Channel> {
        let mut all: Vec<Channel> = self
            .channels
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(Channel::index);
        all
    }

    /// Flag a strip as the master bus
    pub fn set_master(&self, index: usize, is_master: bool) -> bool {
        self.update(index, |channel| channel.is_master = is_master)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::PropertyType;

    #[test]
    fn test_fixed_channel_set() {
        let registry = ChannelRegistry::new(8);
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.selected_volume_index(), 8);
        assert_eq!(registry.selected_pan_index(), 9);

        let indices: Vec<usize> = registry.snapshot_all().iter().map(Channel::index).collect();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_index_is_noop() {
        let registry = ChannelRegistry::new(8);
        assert!(registry.update(10, |c| c.label = "x".into()).is_none());
        assert!(registry.snapshot(42).is_none());
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_update_and_snapshot() {
        let registry = ChannelRegistry::new(8);
        registry.update(2, |c| {
            c.label = "Kick".to_string();
            c.set_property(PropertyType::Mute, true);
        });

        let channel = registry.snapshot(2).unwrap();
        assert_eq!(channel.label, "Kick");
        assert!(channel.property(PropertyType::Mute));
    }

    #[test]
    fn test_set_master() {
        let registry = ChannelRegistry::new(8);
        assert!(registry.set_master(7, true));
        assert!(registry.snapshot(7).unwrap().is_master);
        assert!(!registry.set_master(99, true));
    }
}
