//! Loop playback for the Serenity mixer.
//!
//! This module provides the audio seam underneath the channel registry:
//!
//! - Media resolution inside a media directory
//! - Infinitely looping, pre-buffered players (one per track)
//! - A silent fallback when the audio output cannot be opened
//! - A recording backend for tests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   bind(track)   ┌──────────────────┐
//! │   MediaBackend   │ ──────────────▶ │    LoopHandle    │ ← owned by a Channel
//! └────────┬─────────┘                 └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │   MediaLibrary   │────▶│  <ref>.mp3/.wav  │
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use serenity::catalog::Catalog;
//! use serenity::sound::{LoopHandle, MediaBackend, MediaLibrary, RodioBackend};
//!
//! let backend = RodioBackend::new(MediaLibrary::new("/opt/serenity/sounds")).expect("audio init");
//! let catalog = Catalog::builtin();
//! let mut rain = backend.bind(&catalog.tracks()[3]).expect("bind");
//! rain.set_volume(0.4);
//! rain.play().expect("play");
//! ```

mod error;
mod player;
mod source;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::types::{Track, TrackId};

pub use error::SoundError;
pub use player::{try_create_backend, RodioBackend, RodioLoop};
pub use source::{MediaLibrary, MEDIA_EXTENSIONS};

/// An exclusively owned, infinitely looping player bound to one track.
///
/// Handles are created ready to play: volume 0, paused, positioned at the
/// start of the loop.
pub trait LoopHandle: Send {
    /// Starts or resumes looped playback from the current position.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform player refuses to start.
    fn play(&mut self) -> Result<(), SoundError>;

    /// Pauses playback, keeping the current position.
    fn pause(&mut self);

    /// Moves the playback position back to the start of the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop cannot be re-queued.
    fn rewind(&mut self) -> Result<(), SoundError>;

    /// Sets the linear gain in `[0.0, 1.0]`.
    fn set_volume(&mut self, volume: f32);

    /// Returns true if the loop is currently audible (started and not paused).
    fn is_playing(&self) -> bool;
}

/// Binds catalog tracks to loop handles.
pub trait MediaBackend {
    /// Acquires a loop-capable player for the track's media reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the media is missing or cannot be decoded. The
    /// failure is permanent for the life of the process.
    fn bind(&self, track: &Track) -> Result<Box<dyn LoopHandle>, SoundError>;
}

// ============================================================================
// SilentBackend
// ============================================================================

/// Backend used when no audio output is available.
///
/// Every track binds; handles keep their playing flag and volume but never
/// produce sound.
#[derive(Debug, Default)]
pub struct SilentBackend;

#[derive(Debug, Default)]
struct SilentLoop {
    playing: bool,
    volume: f32,
}

impl MediaBackend for SilentBackend {
    fn bind(&self, _track: &Track) -> Result<Box<dyn LoopHandle>, SoundError> {
        Ok(Box::new(SilentLoop::default()))
    }
}

impl LoopHandle for SilentLoop {
    fn play(&mut self) -> Result<(), SoundError> {
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn rewind(&mut self) -> Result<(), SoundError> {
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

// ============================================================================
// MockBackend
// ============================================================================

/// One call observed by a mock loop.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopCall {
    Play,
    Pause,
    Rewind,
    SetVolume(f32),
}

/// Mock backend for testing.
///
/// Records every call made on the handles it binds, and can be told to
/// refuse specific media references.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    calls: Arc<Mutex<Vec<(TrackId, LoopCall)>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

struct MockLoop {
    track: TrackId,
    playing: bool,
    calls: Arc<Mutex<Vec<(TrackId, LoopCall)>>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes binding fail for the given media reference.
    pub fn fail_media(&self, media_ref: impl Into<String>) {
        self.failing.lock().unwrap().insert(media_ref.into());
    }

    #[must_use]
    pub fn calls(&self) -> Vec<(TrackId, LoopCall)> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls recorded for one track, in order.
    #[must_use]
    pub fn calls_for(&self, track: &str) -> Vec<LoopCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id.as_str() == track)
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Number of times `call` was recorded for `track`.
    #[must_use]
    pub fn count(&self, track: &str, call: &LoopCall) -> usize {
        self.calls_for(track).iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl MediaBackend for MockBackend {
    fn bind(&self, track: &Track) -> Result<Box<dyn LoopHandle>, SoundError> {
        if self.failing.lock().unwrap().contains(&track.media_ref) {
            return Err(SoundError::FileNotFound(track.media_ref.clone()));
        }
        Ok(Box::new(MockLoop {
            track: track.id.clone(),
            playing: false,
            calls: Arc::clone(&self.calls),
        }))
    }
}

impl MockLoop {
    fn record(&self, call: LoopCall) {
        self.calls.lock().unwrap().push((self.track.clone(), call));
    }
}

impl LoopHandle for MockLoop {
    fn play(&mut self) -> Result<(), SoundError> {
        self.playing = true;
        self.record(LoopCall::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
        self.record(LoopCall::Pause);
    }

    fn rewind(&mut self) -> Result<(), SoundError> {
        self.record(LoopCall::Rewind);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(LoopCall::SetVolume(volume));
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
