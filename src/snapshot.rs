//! Read-only view of the listener's catalogue, pulled once per run.
//!
//! The service layer is responsible for producing a complete snapshot; the
//! engine never sees a partial one. On disk it is a camelCase JSON document:
//!
//! ```json
//! {
//!   "playlists": { "Road Trip": [{ "id": "t1", "title": "Song", "artists": [{ "id": "a1", "name": "Artist" }] }] },
//!   "likedSongs": [],
//!   "discoverWeekly": [],
//!   "heardTooMuch": [],
//!   "topTracks": ["t1"],
//!   "rxPlaylists": { "[RX] Master": ["t1"] }
//! }
//! ```

use crate::config::{DISCOVER_WEEKLY, LIKED_SONGS};
use crate::song::{Song, TrackId};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogueSnapshot {
    /// User playlists by name.
    pub playlists: BTreeMap<String, Vec<Song>>,
    pub liked_songs: Vec<Song>,
    pub discover_weekly: Vec<Song>,
    /// "[RX] Songs I Hear Too Much", duplicates included.
    pub heard_too_much: Vec<Song>,
    /// Top listening history, most played first.
    pub top_tracks: Vec<TrackId>,
    /// Live contents of every existing `[RX]` playlist.
    pub rx_playlists: BTreeMap<String, Vec<TrackId>>,
}

impl CatalogueSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Snapshot is not a valid catalogue document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    /// Songs of a source playlist, resolving the sentinel names.
    pub fn source(&self, name: &str) -> Option<&[Song]> {
        match name {
            LIKED_SONGS => Some(self.liked_songs.as_slice()),
            DISCOVER_WEEKLY => self
                .playlists
                .get(DISCOVER_WEEKLY)
                .map(Vec::as_slice)
                .or(Some(self.discover_weekly.as_slice())),
            _ => self.playlists.get(name).map(Vec::as_slice),
        }
    }

    /// Deduplicated union of the named source playlists, in order of first
    /// appearance. Unknown names are skipped.
    pub fn candidate_pool(&self, sources: &[String]) -> Vec<Song> {
        let mut seen: HashSet<&TrackId> = HashSet::new();
        let mut pool = Vec::new();

        for name in sources {
            let Some(songs) = self.source(name) else {
                warn!("Source playlist '{name}' not found in snapshot, skipping");
                continue;
            };
            debug!("Source '{name}': {} songs", songs.len());
            for song in songs {
                if seen.insert(&song.id) {
                    pool.push(song.clone());
                }
            }
        }
        pool
    }

    /// Discover Weekly songs not already in `pool`, for the Radio artist pool.
    pub fn discover_weekly_extension(&self, pool: &[Song]) -> Vec<Song> {
        let mut seen: HashSet<&TrackId> = pool.iter().map(|song| &song.id).collect();
        self.source(DISCOVER_WEEKLY)
            .unwrap_or_default()
            .iter()
            .filter(|song| seen.insert(&song.id))
            .cloned()
            .collect()
    }

    /// Every song record in the snapshot's source collections, duplicates
    /// included: liked songs, user playlists, then Discover Weekly.
    pub fn catalogue(&self) -> impl Iterator<Item = &Song> {
        self.liked_songs
            .iter()
            .chain(self.playlists.values().flatten())
            .chain(&self.discover_weekly)
    }

    /// Current contents of a live `[RX]` playlist; empty if it does not exist.
    pub fn rx_playlist(&self, name: &str) -> &[TrackId] {
        self.rx_playlists
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::Artist;

    fn song(id: &str) -> Song {
        Song::new(id, format!("Title {id}"), vec![Artist::new("a", "A")])
    }

    fn snapshot() -> CatalogueSnapshot {
        let mut playlists = BTreeMap::new();
        playlists.insert("Gym".to_string(), vec![song("t2"), song("t3"), song("t2")]);
        CatalogueSnapshot {
            playlists,
            liked_songs: vec![song("t1"), song("t2")],
            discover_weekly: vec![song("t3"), song("t9")],
            ..CatalogueSnapshot::default()
        }
    }

    #[test]
    fn test_candidate_pool_is_deduplicated_in_first_seen_order() {
        let snapshot = snapshot();
        let pool = snapshot.candidate_pool(&[LIKED_SONGS.to_string(), "Gym".to_string()]);
        let ids: Vec<&str> = pool.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_unknown_source_is_skipped() {
        let snapshot = snapshot();
        let pool = snapshot.candidate_pool(&["Nope".to_string(), "Gym".to_string()]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_discover_weekly_sentinel_and_extension() {
        let snapshot = snapshot();
        let pool = snapshot.candidate_pool(&[DISCOVER_WEEKLY.to_string()]);
        assert_eq!(pool.len(), 2);

        let base = snapshot.candidate_pool(&[LIKED_SONGS.to_string(), "Gym".to_string()]);
        let extra = snapshot.discover_weekly_extension(&base);
        let ids: Vec<&str> = extra.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["t9"]);
    }

    #[test]
    fn test_snapshot_parses_camel_case_document() {
        let snapshot = CatalogueSnapshot::from_json(
            r#"{
                "likedSongs": [{"id": "t1", "title": "One", "artists": [{"id": "a1", "name": "A"}]}],
                "heardTooMuch": [{"id": "t1"}, {"id": "t1"}],
                "topTracks": ["t1"],
                "rxPlaylists": {"[RX] Master": ["t1"]}
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.liked_songs.len(), 1);
        assert_eq!(snapshot.heard_too_much.len(), 2);
        assert_eq!(snapshot.rx_playlist("[RX] Master"), &[TrackId::new("t1")]);
        assert!(snapshot.rx_playlist("[RX] Radio").is_empty());
    }
}
