//! The sound catalog.
//!
//! The catalog is the fixed, ordered list of every playable track. It is
//! built once at startup and never mutated; its order is the display order
//! used by every derived view (category sections, active track names).

use std::collections::HashSet;

use tracing::warn;

use crate::types::{Category, Track, TrackId};

/// Fixed ordered sequence of tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    /// Creates a catalog from an explicit track list.
    ///
    /// Track ids are unique: a repeated id is logged and dropped, keeping the
    /// first occurrence and its position.
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut seen = HashSet::with_capacity(tracks.len());
        let tracks = tracks
            .into_iter()
            .filter(|track| {
                let fresh = seen.insert(track.id.clone());
                if !fresh {
                    warn!("Ignoring duplicate track id '{}'", track.id);
                }
                fresh
            })
            .collect();

        Self { tracks }
    }

    /// Returns the bundled catalog.
    pub fn builtin() -> Self {
        use Category::*;

        let entries: [(&str, &str, &str, Category); 13] = [
            ("white-noise", "White Noise", "waveform", AntiNoise),
            ("brown-noise", "Brown Noise", "waveform", AntiNoise),
            ("pink-noise", "Pink Noise", "waveform", AntiNoise),
            ("rain", "Rain", "cloud.rain.fill", Nature),
            ("storm", "Storm", "cloud.bolt.rain.fill", Nature),
            ("wind", "Wind", "wind", Nature),
            ("stream", "Stream", "drop.fill", Nature),
            ("birds", "Birds", "bird.fill", Nature),
            ("waves", "Waves", "water.waves", Nature),
            ("boat", "Boat", "sailboat.fill", Travel),
            ("city", "City", "building.2.fill", Travel),
            ("fireplace", "Fireplace", "flame.fill", Other),
            ("hair-dryer", "Hair Dryer", "wind", Other),
        ];

        Self::new(
            entries
                .into_iter()
                .map(|(media, name, icon, category)| Track::new(media, name, media, icon, category))
                .collect(),
        )
    }

    /// All tracks in catalog order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn find(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| &track.id == id)
    }

    /// Tracks belonging to `category`, in catalog order.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Track> + '_ {
        self.tracks
            .iter()
            .filter(move |track| track.category == category)
    }

    pub fn display_name(&self, id: &TrackId) -> Option<&str> {
        self.find(id).map(|track| track.display_name.as_str())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
