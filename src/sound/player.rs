//! Loop players built on rodio.
//!
//! This module provides `RodioBackend`, which keeps the process-wide audio
//! output stream alive and binds each track to its own rodio `Sink` holding
//! the decoded loop repeated forever.

use std::io::Cursor;
use std::sync::Arc;

use rodio::source::Repeat;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info, warn};

use crate::types::Track;

use super::error::SoundError;
use super::source::MediaLibrary;
use super::{LoopHandle, MediaBackend, SilentBackend};

type LoopSource = Repeat<Decoder<Cursor<Arc<[u8]>>>>;

/// Decodes in-memory media into an infinitely repeating source.
fn decode_loop(media: &Arc<[u8]>) -> Result<LoopSource, SoundError> {
    Decoder::new(Cursor::new(Arc::clone(media)))
        .map(Source::repeat_infinite)
        .map_err(|e| SoundError::DecodeError(e.to_string()))
}

/// Creates a paused sink at the given volume with the loop queued.
fn prepared_sink(
    handle: &OutputStreamHandle,
    media: &Arc<[u8]>,
    volume: f32,
) -> Result<Sink, SoundError> {
    let source = decode_loop(media)?;
    let sink = Sink::try_new(handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
    sink.pause();
    sink.set_volume(volume);
    sink.append(source);
    Ok(sink)
}

/// A media backend that plays through the default audio output.
///
/// The output stream is not `Send`; the backend stays on the thread that
/// created it while the `RodioLoop` handles it hands out can move freely.
pub struct RodioBackend {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
    library: MediaLibrary,
}

impl RodioBackend {
    /// Opens the default audio output.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(library: MediaLibrary) -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
            library,
        })
    }

    /// The media directory tracks are bound from.
    pub fn library(&self) -> &MediaLibrary {
        &self.library
    }
}

impl MediaBackend for RodioBackend {
    fn bind(&self, track: &Track) -> Result<Box<dyn LoopHandle>, SoundError> {
        let media = self.library.load(&track.media_ref)?;
        let sink = prepared_sink(&self.stream_handle, &media, 0.0)?;

        debug!("Bound '{}' to a looping sink", track.id);

        Ok(Box::new(RodioLoop {
            sink,
            stream_handle: self.stream_handle.clone(),
            media,
            volume: 0.0,
        }))
    }
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend")
            .field("library", &self.library)
            .finish_non_exhaustive()
    }
}

/// One looping rodio sink.
pub struct RodioLoop {
    sink: Sink,
    stream_handle: OutputStreamHandle,
    /// Decoded once at bind time so rewinding never touches the filesystem.
    media: Arc<[u8]>,
    volume: f32,
}

impl LoopHandle for RodioLoop {
    fn play(&mut self) -> Result<(), SoundError> {
        if self.sink.empty() {
            return Err(SoundError::PlaybackError("loop queue is empty".to_string()));
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn rewind(&mut self) -> Result<(), SoundError> {
        // Repeating sources cannot seek, so the sink is rebuilt at position zero.
        let fresh = prepared_sink(&self.stream_handle, &self.media, self.volume)?;
        let old = std::mem::replace(&mut self.sink, fresh);
        old.stop();
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.sink.set_volume(volume);
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }
}

/// Creates the media backend for the daemon.
///
/// Falls back to `SilentBackend` when `silent` is set or when the audio
/// output cannot be opened; in the latter case a warning is logged and the
/// mixer keeps running without sound.
#[must_use]
pub fn try_create_backend(library: MediaLibrary, silent: bool) -> Box<dyn MediaBackend> {
    if silent {
        info!("Audio output disabled, using silent backend");
        return Box::new(SilentBackend);
    }

    match RodioBackend::new(library) {
        Ok(backend) => {
            info!("Playing media from {:?}", backend.library().root());
            Box::new(backend)
        }
        Err(e) => {
            warn!(
                "Audio session unavailable, continuing without sound: {} ({})",
                e,
                e.suggestion()
            );
            Box::new(SilentBackend)
        }
    }
}
