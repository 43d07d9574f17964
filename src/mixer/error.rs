//! Mixer error types.

use thiserror::Error;

use crate::sound::SoundError;
use crate::types::TrackId;

/// Errors raised by the channel registry and the playback controller.
#[derive(Debug, Error)]
pub enum MixerError {
    /// The track has no bound channel.
    #[error("unknown track: {0}")]
    UnknownTrack(TrackId),

    /// An argument was out of range; nothing was mutated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The track's media could not be bound at startup. Non-fatal: the
    /// track is left out of the registry.
    #[error("failed to bind media for '{track}': {source}")]
    MediaBindingFailed {
        track: TrackId,
        #[source]
        source: SoundError,
    },

    /// The screen lock is engaged.
    #[error("controls are locked")]
    Locked,
}

impl MixerError {
    /// Returns true if the caller passed something the mixer cannot act on.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::UnknownTrack(_) | Self::InvalidArgument(_))
    }
}
