//! Sound system error types.
//!
//! Every error here is non-fatal to the mixer: a track that fails to bind is
//! dropped, and a missing output device degrades to silent playback.

use thiserror::Error;

/// Errors that can occur in the loop playback system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio output device is not available (the audio session cannot be activated).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// No media file exists for the reference.
    #[error("sound file not found: {0}")]
    FileNotFound(String),

    /// Failed to decode the media file.
    #[error("failed to decode sound file: {0}")]
    DecodeError(String),

    /// Failed to create the playback sink.
    #[error("failed to create audio stream: {0}")]
    StreamError(String),

    /// Generic playback error.
    #[error("playback error: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to the media file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "connect an audio output device",
            Self::FileNotFound(_) => "add an .mp3 or .wav loop to the media directory",
            Self::DecodeError(_) => "the sound file may be corrupt",
            Self::StreamError(_) => "check the audio settings",
            Self::PlaybackError(_) => "restart the daemon",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SoundError::DeviceNotAvailable("no device".to_string());
        assert!(err.to_string().contains("no device"));
        assert!(err.to_string().contains("audio device not available"));

        let err = SoundError::FileNotFound("/sounds/rain".to_string());
        assert!(err.to_string().contains("/sounds/rain"));

        let err = SoundError::DecodeError("invalid format".to_string());
        assert!(err.to_string().contains("invalid format"));

        let err = SoundError::StreamError("stream failed".to_string());
        assert!(err.to_string().contains("stream failed"));

        let err = SoundError::PlaybackError("unknown error".to_string());
        assert!(err.to_string().contains("unknown error"));
    }

    #[test]
    fn test_is_device_error() {
        assert!(SoundError::DeviceNotAvailable("x".into()).is_device_error());
        assert!(SoundError::StreamError("x".into()).is_device_error());
        assert!(!SoundError::FileNotFound("x".into()).is_device_error());
        assert!(!SoundError::DecodeError("x".into()).is_device_error());
        assert!(!SoundError::PlaybackError("x".into()).is_device_error());
    }

    #[test]
    fn test_is_file_error() {
        assert!(SoundError::FileNotFound("x".into()).is_file_error());
        assert!(SoundError::DecodeError("x".into()).is_file_error());
        assert!(!SoundError::DeviceNotAvailable("x".into()).is_file_error());
        assert!(!SoundError::StreamError("x".into()).is_file_error());
        assert!(!SoundError::PlaybackError("x".into()).is_file_error());
    }

    #[test]
    fn test_suggestion() {
        assert!(SoundError::DeviceNotAvailable("x".into())
            .suggestion()
            .contains("audio output"));
        assert!(SoundError::FileNotFound("x".into())
            .suggestion()
            .contains("media directory"));
        assert!(SoundError::DecodeError("x".into()).suggestion().contains("corrupt"));
    }
}
