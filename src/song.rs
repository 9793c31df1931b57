//! Songs and artists as they appear in a catalogue snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Id used for songs whose artist list is missing or empty.
pub const UNKNOWN_ARTIST_ID: &str = "unknown-artist";

/// Display name of the synthetic unknown-artist bucket.
pub const UNKNOWN_ARTIST_NAME: &str = "Unknown";

/// Unique track identifier as handed out by the music service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

/// Unique artist identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ArtistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_ARTIST_ID.to_string())
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

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An artist credit on a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Missing ids land in the unknown-artist bucket.
    #[serde(default)]
    pub id: Option<ArtistId>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Artist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(ArtistId::new(id)),
            name: Some(name.into()),
        }
    }

    /// Resolved identity; never fails.
    pub fn resolved_id(&self) -> ArtistId {
        match &self.id {
            Some(id) if !id.0.is_empty() => id.clone(),
            _ => ArtistId::unknown(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_ARTIST_NAME)
    }
}

/// A song record from the snapshot.
///
/// Weights are not stored here. They are recomputed from scratch every run
/// and live in the [`WeightTable`](crate::algorithm::WeightTable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: TrackId,
    /// Empty when the service sent no title.
    #[serde(default)]
    pub title: String,
    /// Ordered artist credits. May be empty.
    #[serde(default)]
    pub artists: Vec<Artist>,
}

impl Song {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artists: Vec<Artist>) -> Self {
        Self {
            id: TrackId::new(id),
            title: title.into(),
            artists,
        }
    }

    /// Distinct artist ids in credit order. Songs without credits belong to
    /// the unknown-artist bucket so artist aggregation never fails.
    #[must_use]
    pub fn artist_ids(&self) -> Vec<ArtistId> {
        let mut ids: Vec<ArtistId> = Vec::with_capacity(self.artists.len().max(1));
        for artist in &self.artists {
            let id = artist.resolved_id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            ids.push(ArtistId::unknown());
        }
        ids
    }

    /// First credited artist's name, for log lines.
    pub fn primary_artist_name(&self) -> &str {
        self.artists
            .first()
            .map_or(UNKNOWN_ARTIST_NAME, Artist::display_name)
    }

    /// Case-insensitive substring test against every excluded word.
    #[must_use]
    pub fn title_contains_any(&self, words: &[String]) -> bool {
        if self.title.is_empty() {
            return false;
        }
        let title = self.title.to_lowercase();
        words
            .iter()
            .filter(|word| !word.is_empty())
            .any(|word| title.contains(&word.to_lowercase()))
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.primary_artist_name())
    }
}
