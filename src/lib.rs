//! Serenity Library
//!
//! This library provides the core functionality for the Serenity ambient
//! sound mixer. It includes:
//! - The bundled sound catalog
//! - Looping playback through rodio, behind a mockable backend trait
//! - The mixer: channel registry, playback controller and sleep timer
//! - The session and IPC server run by the daemon
//! - Snapshot publishing for the lock-screen surface
//! - CLI command parsing, IPC client and display utilities

pub mod catalog;
pub mod cli;
pub mod daemon;
pub mod mixer;
pub mod sound;
pub mod surface;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Category, ChannelStatus, DaemonConfig, IpcRequest, IpcResponse, ResponseData, Snapshot,
    Track, TrackId,
};

pub use catalog::Catalog;

pub use mixer::{Channel, ChannelRegistry, MixerError, PlaybackController};

pub use daemon::{
    format_preset, format_remaining, IpcServer, RequestHandler, Session, SleepTimer, StopOrigin,
};

pub use sound::{
    try_create_backend, LoopHandle, MediaBackend, MediaLibrary, MockBackend, RodioBackend,
    SilentBackend, SoundError,
};

pub use surface::{SnapshotListener, SurfaceFile, SurfaceMirror, WatchPublisher};
