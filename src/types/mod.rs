//! Core data types for the Serenity sound mixer.
//!
//! This module defines the data structures used for:
//! - Catalog entries (tracks and categories)
//! - Playback snapshots pushed to the lock-screen surface
//! - Daemon configuration with validation
//! - IPC request/response serialization

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// TrackId
// ============================================================================

/// Opaque identifier of a catalog track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Category
// ============================================================================

/// Grouping of catalog tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Colored noise used to mask the environment
    AntiNoise,
    /// Rain, wind, water and animals
    Nature,
    /// Vehicles and cities
    Travel,
    /// Everything else
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Category::AntiNoise,
        Category::Nature,
        Category::Travel,
        Category::Other,
    ];

    /// Returns the string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AntiNoise => "anti_noise",
            Category::Nature => "nature",
            Category::Travel => "travel",
            Category::Other => "other",
        }
    }

    /// Returns the section title shown above the category's tracks.
    pub fn title(&self) -> &'static str {
        match self {
            Category::AntiNoise => "Anti Noise",
            Category::Nature => "Nature",
            Category::Travel => "Travel",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "anti_noise" | "antinoise" => Ok(Category::AntiNoise),
            "nature" => Ok(Category::Nature),
            "travel" => Ok(Category::Travel),
            "other" => Ok(Category::Other),
            _ => Err(format!(
                "unknown category '{}' (expected anti-noise, nature, travel or other)",
                s
            )),
        }
    }
}

// ============================================================================
// Track
// ============================================================================

/// An immutable catalog entry describing one playable ambient sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Name of the bundled audio loop, without extension
    #[serde(rename = "mediaRef")]
    pub media_ref: String,
    pub icon: String,
    pub category: Category,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        media_ref: impl Into<String>,
        icon: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: TrackId::new(id),
            display_name: display_name.into(),
            media_ref: media_ref.into(),
            icon: icon.into(),
            category,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Playback state mirrored to the lock-screen surface.
///
/// Delivery is last-write-wins: a surface only ever needs the newest one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Display names of active channels, in catalog order
    #[serde(rename = "activeTrackNames")]
    pub active_track_names: Vec<String>,
    /// True if any channel is active
    #[serde(rename = "isPlaying")]
    pub is_playing: bool,
    /// Sleep timer deadline as seconds since the Unix epoch
    #[serde(rename = "timerDeadline", skip_serializing_if = "Option::is_none", default)]
    pub timer_deadline: Option<u64>,
}

// ============================================================================
// DaemonConfig
// ============================================================================

/// Default socket path relative to the home directory
pub const DEFAULT_SOCKET_PATH: &str = ".serenity/serenity.sock";

/// Default media directory relative to the home directory
pub const DEFAULT_MEDIA_DIR: &str = ".serenity/sounds";

fn default_media_dir() -> PathBuf {
    home_relative(DEFAULT_MEDIA_DIR)
}

fn default_socket_path() -> PathBuf {
    home_relative(DEFAULT_SOCKET_PATH)
}

fn home_relative(path: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(path)
}

/// Configuration for the mixer daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding one audio loop per media reference
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
    /// Unix socket the daemon listens on
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// Shared file the lock-screen surface reads snapshots from
    #[serde(default)]
    pub surface_path: Option<PathBuf>,
    /// Skip opening the audio output (state transitions still run)
    #[serde(default)]
    pub silent: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            socket_path: default_socket_path(),
            surface_path: None,
            silent: false,
        }
    }
}

impl DaemonConfig {
    /// Loads a configuration from a JSON file; missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn with_media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = dir.into();
        self
    }

    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    pub fn with_surface_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.surface_path = Some(path.into());
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.media_dir.as_os_str().is_empty() {
            return Err("media directory must not be empty".to_string());
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err("socket path must not be empty".to_string());
        }
        if let Some(surface) = &self.surface_path {
            if surface.as_os_str().is_empty() {
                return Err("surface file path must not be empty".to_string());
            }
            if surface == &self.socket_path {
                return Err("surface file and socket must be different paths".to_string());
            }
        }
        Ok(())
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Set one channel's volume
    SetVolume { track: TrackId, volume: f32 },
    /// Silence every channel
    StopAll,
    /// Stop request from the lock-screen surface (never gated by the lock)
    SurfaceStop,
    /// Arm the sleep timer
    StartTimer { minutes: u32 },
    /// Disarm the sleep timer
    CancelTimer,
    /// Engage the screen lock
    Lock,
    /// Release the screen lock
    Unlock,
    /// Query the current status
    Status,
}

/// One row of the channel table in a status response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub id: TrackId,
    pub name: String,
    pub category: Category,
    pub volume: f32,
    pub active: bool,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Display names of active channels
    #[serde(rename = "activeTrackNames", default)]
    pub active_track_names: Vec<String>,
    /// True if any channel is active
    #[serde(rename = "isPlaying", default)]
    pub is_playing: bool,
    /// Sleep timer deadline (seconds since the Unix epoch)
    #[serde(rename = "timerDeadline", skip_serializing_if = "Option::is_none", default)]
    pub timer_deadline: Option<u64>,
    /// Seconds until the sleep timer fires
    #[serde(rename = "timerRemainingSeconds", skip_serializing_if = "Option::is_none", default)]
    pub timer_remaining_seconds: Option<u64>,
    /// Whether the screen lock is engaged
    #[serde(default)]
    pub locked: bool,
    /// Per-channel volume table
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channels: Option<Vec<ChannelStatus>>,
}

impl ResponseData {
    /// Creates response data from a snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            active_track_names: snapshot.active_track_names.clone(),
            is_playing: snapshot.is_playing,
            timer_deadline: snapshot.timer_deadline,
            ..Self::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
