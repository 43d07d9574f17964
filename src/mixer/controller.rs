//! Playback controller.
//!
//! The controller is the single owner of the channel registry, the sleep
//! timer and the list of snapshot listeners. Every public mutation runs to
//! completion before returning and ends with a snapshot push, so observers
//! never see a half-applied change.

use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::surface::SnapshotListener;
use crate::types::{Category, ChannelStatus, Snapshot, Track, TrackId};

use super::error::MixerError;
use super::registry::ChannelRegistry;
use super::timer::{SleepTimer, TimerTick};

/// Mutation surface over the bound channels and the sleep timer.
pub struct PlaybackController {
    catalog: Catalog,
    registry: ChannelRegistry,
    timer: SleepTimer,
    listeners: Vec<Box<dyn SnapshotListener>>,
}

impl PlaybackController {
    pub fn new(catalog: Catalog, registry: ChannelRegistry) -> Self {
        Self {
            catalog,
            registry,
            timer: SleepTimer::new(),
            listeners: Vec::new(),
        }
    }

    /// Registers a listener and immediately pushes the current snapshot to it.
    pub fn add_listener(&mut self, listener: Box<dyn SnapshotListener>) {
        listener.publish(&self.snapshot());
        self.listeners.push(listener);
    }

    // ------------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------------

    /// Sets a channel's volume, starting or stopping its loop as the volume
    /// crosses zero.
    ///
    /// # Errors
    ///
    /// - `MixerError::UnknownTrack` if the track has no bound channel
    /// - `MixerError::InvalidArgument` if `volume` is outside `[0, 1]`
    ///
    /// Nothing is mutated on error.
    pub fn set_volume(&mut self, id: &TrackId, volume: f32) -> Result<(), MixerError> {
        validate_volume(volume)?;
        let channel = self
            .registry
            .get_mut(id)
            .ok_or_else(|| MixerError::UnknownTrack(id.clone()))?;

        channel.apply_volume(volume);
        debug!("Volume of '{}' set to {:.2}", id, volume);

        self.publish();
        Ok(())
    }

    /// Stops, rewinds and zeroes every channel. Idempotent.
    pub fn stop_all(&mut self) {
        self.silence_all();
        info!("All channels stopped");
        self.publish();
    }

    fn silence_all(&mut self) {
        for channel in self.registry.channels_mut() {
            channel.silence();
        }
    }

    /// Stored volume of a channel; 0.0 for unknown tracks.
    pub fn volume(&self, id: &TrackId) -> f32 {
        self.registry.get(id).map_or(0.0, |c| c.volume())
    }

    /// Whether a channel is active; false for unknown tracks.
    pub fn is_active(&self, id: &TrackId) -> bool {
        self.registry.get(id).is_some_and(|c| c.is_active())
    }

    /// True if any channel is active.
    pub fn is_playing(&self) -> bool {
        self.active_tracks().next().is_some()
    }

    /// Catalog tracks of `category`, in catalog order.
    pub fn tracks_in(&self, category: Category) -> Vec<&Track> {
        self.catalog.by_category(category).collect()
    }

    /// Active tracks in catalog order.
    fn active_tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.catalog
            .tracks()
            .iter()
            .filter(move |track| self.is_active(&track.id))
    }

    /// Volume table of every bound channel, in catalog order.
    pub fn channel_statuses(&self) -> Vec<ChannelStatus> {
        self.catalog
            .tracks()
            .iter()
            .filter_map(|track| {
                self.registry.get(&track.id).map(|channel| ChannelStatus {
                    id: track.id.clone(),
                    name: track.display_name.clone(),
                    category: track.category,
                    volume: channel.volume(),
                    active: channel.is_active(),
                })
            })
            .collect()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Sleep timer
    // ------------------------------------------------------------------------

    /// Arms (or with zero minutes, cancels) the sleep timer.
    ///
    /// Returns the generation the driving ticker must check with.
    pub fn start_timer(&mut self, minutes: u32) -> Option<u64> {
        let generation = self.timer.start(minutes, Instant::now());
        match generation {
            Some(_) => info!("Sleep timer armed for {} minutes", minutes),
            None => info!("Sleep timer cancelled"),
        }
        self.publish();
        generation
    }

    /// Disarms the sleep timer. Idempotent.
    pub fn cancel_timer(&mut self) {
        if self.timer.cancel() {
            info!("Sleep timer cancelled");
        }
        self.publish();
    }

    /// One periodic check from the ticker holding `generation`.
    ///
    /// On expiry every channel is stopped and the timer returns to idle.
    pub fn tick_timer(&mut self, generation: u64, now: Instant) -> TimerTick {
        let tick = self.timer.check(generation, now);
        if tick == TimerTick::Expired {
            info!("Sleep timer expired, stopping all channels");
            self.silence_all();
            self.timer.cancel();
            self.publish();
        }
        tick
    }

    pub fn timer_remaining(&self) -> Duration {
        self.timer.remaining(Instant::now())
    }

    pub fn timer_active(&self) -> bool {
        self.timer.is_active()
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        let active_track_names: Vec<String> = self
            .active_tracks()
            .map(|track| track.display_name.clone())
            .collect();

        Snapshot {
            is_playing: !active_track_names.is_empty(),
            active_track_names,
            timer_deadline: self.timer.deadline_epoch_secs(),
        }
    }

    fn publish(&self) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for listener in &self.listeners {
            listener.publish(&snapshot);
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("registry", &self.registry)
            .field("timer", &self.timer)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Rejects volumes outside `[0, 1]` (including NaN).
fn validate_volume(volume: f32) -> Result<(), MixerError> {
    if (0.0..=1.0).contains(&volume) {
        Ok(())
    } else {
        Err(MixerError::InvalidArgument(format!(
            "volume {} is outside [0, 1]",
            volume
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
