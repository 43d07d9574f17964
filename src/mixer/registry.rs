//! Channel registry.
//!
//! One channel per successfully bound catalog track. Binding happens once at
//! startup; a track whose media cannot be bound is logged and left out for
//! the rest of the process.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::sound::{LoopHandle, MediaBackend};
use crate::types::TrackId;

use super::error::MixerError;

/// Runtime playback state bound to one track.
///
/// `active` always equals `volume > 0.0` after a mutation completes.
pub struct Channel {
    track_id: TrackId,
    volume: f32,
    active: bool,
    handle: Box<dyn LoopHandle>,
}

impl Channel {
    fn new(track_id: TrackId, mut handle: Box<dyn LoopHandle>) -> Self {
        handle.set_volume(0.0);
        Self {
            track_id,
            volume: 0.0,
            active: false,
            handle,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Applies an already validated volume.
    ///
    /// Crossing up from zero starts the loop; crossing down to zero stops it
    /// and rewinds. Changes on the same side of zero only adjust the gain, so
    /// a running loop is never restarted.
    pub(crate) fn apply_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.handle.set_volume(volume);

        if volume > 0.0 {
            if !self.handle.is_playing() {
                if let Err(e) = self.handle.play() {
                    warn!("Failed to start '{}': {}", self.track_id, e);
                }
                debug!("Channel '{}' started", self.track_id);
            }
            self.active = true;
        } else {
            if self.handle.is_playing() {
                self.handle.pause();
                if let Err(e) = self.handle.rewind() {
                    warn!("Failed to rewind '{}': {}", self.track_id, e);
                }
                debug!("Channel '{}' stopped", self.track_id);
            }
            self.active = false;
        }
    }

    /// Stops, rewinds and zeroes the channel regardless of its state.
    pub(crate) fn silence(&mut self) {
        self.handle.pause();
        if let Err(e) = self.handle.rewind() {
            warn!("Failed to rewind '{}': {}", self.track_id, e);
        }
        self.handle.set_volume(0.0);
        self.volume = 0.0;
        self.active = false;
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("track_id", &self.track_id)
            .field("volume", &self.volume)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Mapping from track identity to its channel.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: HashMap<TrackId, Channel>,
}

impl ChannelRegistry {
    /// Binds every catalog track through the backend.
    ///
    /// Never fails as a whole: tracks that cannot be bound are reported with
    /// a warning and skipped, so the registry may end up with zero channels.
    /// Failed bindings are not retried.
    pub fn initialize(catalog: &Catalog, backend: &dyn MediaBackend) -> Self {
        let mut channels = HashMap::with_capacity(catalog.len());

        for track in catalog.tracks() {
            match backend.bind(track) {
                Ok(handle) => {
                    channels.insert(track.id.clone(), Channel::new(track.id.clone(), handle));
                }
                Err(source) => {
                    let err = MixerError::MediaBindingFailed {
                        track: track.id.clone(),
                        source,
                    };
                    warn!("{}", err);
                }
            }
        }

        info!(
            "Bound {} of {} tracks",
            channels.len(),
            catalog.len()
        );

        Self { channels }
    }

    pub fn get(&self, id: &TrackId) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &TrackId) -> Option<&mut Channel> {
        self.channels.get_mut(id)
    }

    pub(crate) fn channels_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.values_mut()
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.channels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{LoopCall, MockBackend};
    use crate::types::{Category, Track};

    fn abc_catalog() -> Catalog {
        Catalog::new(vec![
            Track::new("a", "A", "a", "waveform", Category::AntiNoise),
            Track::new("b", "B", "b", "wind", Category::Nature),
            Track::new("c", "C", "c", "flame.fill", Category::Other),
        ])
    }

    #[test]
    fn test_initialize_binds_every_track() {
        let backend = MockBackend::new();
        let registry = ChannelRegistry::initialize(&abc_catalog(), &backend);

        assert_eq!(registry.len(), 3);
        for id in ["a", "b", "c"] {
            let channel = registry.get(&TrackId::new(id)).unwrap();
            assert_eq!(channel.volume(), 0.0);
            assert!(!channel.is_active());
        }
    }

    #[test]
    fn test_initialize_starts_at_zero_gain() {
        let backend = MockBackend::new();
        let _registry = ChannelRegistry::initialize(&abc_catalog(), &backend);

        assert_eq!(backend.calls_for("a"), vec![LoopCall::SetVolume(0.0)]);
    }

    #[test]
    fn test_initialize_skips_failed_bindings() {
        let backend = MockBackend::new();
        backend.fail_media("b");

        let registry = ChannelRegistry::initialize(&abc_catalog(), &backend);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&TrackId::new("a")));
        assert!(!registry.contains(&TrackId::new("b")));
        assert!(registry.contains(&TrackId::new("c")));
    }

    #[test]
    fn test_initialize_all_failures_yields_empty_registry() {
        let backend = MockBackend::new();
        for id in ["a", "b", "c"] {
            backend.fail_media(id);
        }

        let registry = ChannelRegistry::initialize(&abc_catalog(), &backend);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_volume_edges() {
        let backend = MockBackend::new();
        let mut registry = ChannelRegistry::initialize(&abc_catalog(), &backend);
        backend.clear_calls();

        let channel = registry.get_mut(&TrackId::new("a")).unwrap();
        channel.apply_volume(0.4);
        assert!(channel.is_active());
        channel.apply_volume(0.0);
        assert!(!channel.is_active());

        assert_eq!(
            backend.calls_for("a"),
            vec![
                LoopCall::SetVolume(0.4),
                LoopCall::Play,
                LoopCall::SetVolume(0.0),
                LoopCall::Pause,
                LoopCall::Rewind,
            ]
        );
    }

    #[test]
    fn test_zero_on_idle_channel_does_not_touch_player() {
        let backend = MockBackend::new();
        let mut registry = ChannelRegistry::initialize(&abc_catalog(), &backend);
        backend.clear_calls();

        registry.get_mut(&TrackId::new("c")).unwrap().apply_volume(0.0);
        assert_eq!(backend.calls_for("c"), vec![LoopCall::SetVolume(0.0)]);
    }

    #[test]
    fn test_silence_always_rewinds() {
        let backend = MockBackend::new();
        let mut registry = ChannelRegistry::initialize(&abc_catalog(), &backend);
        backend.clear_calls();

        for channel in registry.channels_mut() {
            channel.silence();
            assert_eq!(channel.volume(), 0.0);
            assert!(!channel.is_active());
        }
        assert_eq!(backend.count("b", &LoopCall::Rewind), 1);
    }
}
