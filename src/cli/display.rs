//! Display utilities for the Serenity CLI.
//!
//! This module provides formatted output for:
//! - The sound catalog, grouped by category
//! - Mixer status and sleep timer countdown
//! - Success and error messages

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::catalog::Catalog;
use crate::mixer::{format_preset, format_remaining, PRESET_MINUTES};
use crate::types::{Category, IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the catalog, optionally limited to one category.
    pub fn show_catalog(catalog: &Catalog, category: Option<Category>) {
        print!("{}", Self::render_catalog(catalog, category));
    }

    /// Shows the result of a volume change.
    pub fn show_volume_set(response: &IpcResponse) {
        println!("* {}", response.message);
        if let Some(data) = &response.data {
            println!("  {}", Self::playing_line(data));
        }
    }

    /// Shows a success message for stop-all.
    pub fn show_stop_success(_response: &IpcResponse) {
        println!("[] All sounds stopped");
    }

    /// Shows a success message for a started timer.
    pub fn show_timer_started(response: &IpcResponse) {
        println!("* {}", response.message);
        if let Some(remaining) = response.data.as_ref().and_then(Self::remaining) {
            println!("  Remaining: {}", format_remaining(remaining));
        }
    }

    /// Shows a success message for a cancelled timer.
    pub fn show_timer_cancelled(_response: &IpcResponse) {
        println!("[] Sleep timer cancelled");
    }

    /// Shows the sleep timer presets.
    pub fn show_presets() {
        print!("{}", Self::render_presets());
    }

    /// Shows the result of a lock or unlock request.
    pub fn show_lock_state(response: &IpcResponse) {
        let locked = response.data.as_ref().is_some_and(|data| data.locked);
        if locked {
            println!("Controls locked. The lock-screen stop button still works.");
        } else {
            println!("Controls unlocked");
        }
    }

    /// Shows the current mixer status.
    pub fn show_status(response: &IpcResponse) {
        match &response.data {
            Some(data) => print!("{}", Self::render_status(data)),
            None => println!("The mixer is not running"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Renders one section per category, tracks in catalog order. Empty
    /// sections are left out.
    pub fn render_catalog(catalog: &Catalog, category: Option<Category>) -> String {
        let mut out = String::new();
        let categories: Vec<Category> = match category {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        };

        for category in categories {
            let tracks: Vec<_> = catalog.by_category(category).collect();
            if tracks.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(category.title());
            out.push('\n');
            for track in tracks {
                out.push_str(&format!("  {:<12} {}\n", track.id, track.display_name));
            }
        }
        out
    }

    /// Renders the preset list with human labels.
    pub fn render_presets() -> String {
        PRESET_MINUTES
            .iter()
            .map(|&minutes| format!("  {:>4}  {}\n", minutes, format_preset(minutes)))
            .collect()
    }

    /// Renders the status block.
    pub fn render_status(data: &ResponseData) -> String {
        let mut out = String::new();
        out.push_str("Serenity status\n");
        out.push_str("───────────────\n");
        out.push_str(&format!("{}\n", Self::playing_line(data)));

        match data.timer_remaining_seconds {
            Some(seconds) => out.push_str(&format!(
                "Sleep timer: {} remaining\n",
                format_remaining(Duration::from_secs(seconds))
            )),
            None => out.push_str("Sleep timer: off\n"),
        }

        if data.locked {
            out.push_str("Controls: locked\n");
        }

        if let Some(channels) = &data.channels {
            let active: Vec<_> = channels.iter().filter(|c| c.active).collect();
            if !active.is_empty() {
                out.push('\n');
                for channel in active {
                    out.push_str(&format!(
                        "  {:<12} {:>3}%\n",
                        channel.name,
                        (channel.volume * 100.0).round() as u32
                    ));
                }
            }
        }
        out
    }

    fn playing_line(data: &ResponseData) -> String {
        if data.is_playing {
            format!("Playing: {}", data.active_track_names.join(", "))
        } else {
            "Playing: nothing".to_string()
        }
    }

    /// Time left until the deadline carried in `data`, if any.
    fn remaining(data: &ResponseData) -> Option<Duration> {
        if let Some(seconds) = data.timer_remaining_seconds {
            return Some(Duration::from_secs(seconds));
        }
        let deadline = data.timer_deadline?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        Some(Duration::from_secs(deadline.saturating_sub(now)))
    }
}

// ============================================================================
// Tests
// ============================================================================
