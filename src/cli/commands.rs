//! Command definitions for the Serenity CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::Category;

/// Longest sleep timer the CLI accepts, in minutes (one day)
pub const MAX_TIMER_MINUTES: u32 = 1440;

// ============================================================================
// CLI Structure
// ============================================================================

/// Serenity - an ambient sound mixer with a sleep timer
#[derive(Parser, Debug)]
#[command(
    name = "serenity",
    version,
    about = "Ambient sound mixer with a sleep timer",
    long_about = "Mix looping ambient sounds (rain, wind, noise colours, ...) at independent \
                  volumes and stop them all with a sleep timer.\n\
                  A background daemon owns playback; the other commands talk to it.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path of the daemon's Unix socket
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the available sounds
    List {
        /// Only show one category (anti-noise, nature, travel, other)
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Set the volume of one sound (0 stops it)
    Set {
        /// Track id, as shown by `serenity list`
        track: String,

        /// Volume from 0.0 to 1.0, or a percentage such as 40%
        #[arg(value_parser = parse_volume, allow_negative_numbers = true)]
        volume: f32,
    },

    /// Stop every sound
    Stop,

    /// Manage the sleep timer
    #[command(subcommand)]
    Timer(TimerAction),

    /// Lock the controls
    Lock,

    /// Unlock the controls
    Unlock,

    /// Show the mixer status
    Status,

    /// Run the mixer daemon
    Daemon(DaemonArgs),

    /// Stop request from the lock-screen surface
    #[command(hide = true)]
    SurfaceStop,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Sleep timer subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Stop all sounds after the given number of minutes
    Start {
        /// Duration in minutes (1-1440)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_TIMER_MINUTES as i64))]
        minutes: u32,
    },

    /// Cancel the running sleep timer
    Cancel,

    /// List the preset durations
    Presets,
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the sound loops
    #[arg(long, value_name = "DIR")]
    pub media_dir: Option<PathBuf>,

    /// File to mirror playback state into for the lock-screen surface
    #[arg(long, value_name = "FILE")]
    pub surface_file: Option<PathBuf>,

    /// Run without opening the audio output
    #[arg(long)]
    pub silent: bool,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a volume given as a fraction (`0.4`) or a percentage (`40%`).
///
/// - Must be a finite number
/// - Must lie within 0.0 to 1.0 (0% to 100%)
fn parse_volume(s: &str) -> Result<f32, String> {
    let (number, scale) = match s.strip_suffix('%') {
        Some(percent) => (percent, 100.0),
        None => (s, 1.0),
    };

    let value: f32 = number
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    let volume = value / scale;

    if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
        return Err("volume must be between 0.0 and 1.0 (0% to 100%)".to_string());
    }
    Ok(volume)
}

// ============================================================================
// Tests
// ============================================================================
