//! The mixer: channel registry and playback controller.
//!
//! - `registry`: binds catalog tracks to loop handles at startup
//! - `controller`: volume, stop-all, sleep timer and snapshot pushes
//! - `timer`: sleep timer deadline bookkeeping and formatting

mod controller;
mod error;
mod registry;
pub mod timer;

pub use controller::PlaybackController;
pub use error::MixerError;
pub use registry::{Channel, ChannelRegistry};
pub use timer::{format_preset, format_remaining, SleepTimer, TimerTick, PRESET_MINUTES};
