//! Writing computed playlists back to the listener's library.
//!
//! Every write goes through [`RxPlaylistName`], which can only be constructed
//! for names starting with `[RX]`. A [`PlaylistStore`] never receives a bare
//! string, so user-curated playlists are unreachable from this module.

use crate::error::PublishError;
use crate::song::TrackId;
use anyhow::Context;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix every writable playlist must carry.
pub const RX_PREFIX: &str = "[RX]";

pub const MASTER_PLAYLIST: &str = "[RX] Master";
pub const RADIO_PLAYLIST: &str = "[RX] Radio";
pub const HEARD_TOO_MUCH_PLAYLIST: &str = "[RX] Songs I Hear Too Much";

/// A playlist name proven to carry the `[RX]` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RxPlaylistName(String);

impl RxPlaylistName {
    /// # Errors
    ///
    /// [`PublishError::UnguardedName`] if `name` lacks the prefix.
    pub fn new(name: impl Into<String>) -> Result<Self, PublishError> {
        let name = name.into();
        if name.starts_with(RX_PREFIX) {
            Ok(Self(name))
        } else {
            Err(PublishError::UnguardedName(name))
        }
    }

    pub fn master() -> Self {
        Self(MASTER_PLAYLIST.to_string())
    }

    pub fn radio() -> Self {
        Self(RADIO_PLAYLIST.to_string())
    }

    pub fn heard_too_much() -> Self {
        Self(HEARD_TOO_MUCH_PLAYLIST.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RxPlaylistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write side of the music service.
pub trait PlaylistStore {
    /// Create the playlist if missing. Never touches existing tracks.
    fn ensure_playlist(&mut self, name: &RxPlaylistName, description: &str) -> anyhow::Result<()>;

    /// Replace the playlist's tracks, creating it if needed.
    fn replace_tracks(
        &mut self,
        name: &RxPlaylistName,
        description: &str,
        tracks: &[TrackId],
    ) -> anyhow::Result<()>;
}

/// What publishing one playlist did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub name: RxPlaylistName,
    pub added: usize,
    pub removed: usize,
    pub total: usize,
    /// False when the live playlist already matched and no write happened.
    pub written: bool,
}

/// Reconciles computed playlists against their live contents.
pub struct PlaylistPublisher<S: PlaylistStore> {
    store: S,
}

impl<S: PlaylistStore> PlaylistPublisher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Publishes `tracks` to `name` unless `live` already holds exactly
    /// that list.
    pub fn publish(
        &mut self,
        name: &RxPlaylistName,
        description: &str,
        tracks: &[TrackId],
        live: &[TrackId],
    ) -> Result<PublishOutcome, PublishError> {
        let wanted: HashSet<&TrackId> = tracks.iter().collect();
        let current: HashSet<&TrackId> = live.iter().collect();
        let added = wanted.difference(&current).count();
        let removed = current.difference(&wanted).count();

        let written = tracks != live;
        if written {
            self.store
                .replace_tracks(name, description, tracks)
                .with_context(|| format!("Failed to update '{name}'"))?;
            info!("Updated '{name}' with {} tracks (+{added} / -{removed})", tracks.len());
        } else {
            if tracks.is_empty() {
                // an empty live list may mean the playlist does not exist yet
                self.store
                    .ensure_playlist(name, description)
                    .with_context(|| format!("Failed to create '{name}'"))?;
            }
            info!("'{name}' is already up to date ({} tracks)", tracks.len());
        }

        Ok(PublishOutcome {
            name: name.clone(),
            added,
            removed,
            total: tracks.len(),
            written,
        })
    }

    /// Makes sure "Songs I Hear Too Much" exists so the listener has
    /// somewhere to flag songs. Its contents are never written.
    pub fn ensure_heard_too_much(&mut self) -> Result<(), PublishError> {
        let name = RxPlaylistName::heard_too_much();
        self.store
            .ensure_playlist(&name, "Add songs you are tired of; PlaylistRX will play them less")
            .with_context(|| format!("Failed to create '{name}'"))?;
        Ok(())
    }
}

/// On-disk form of one playlist written by [`JsonDirStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlaylist {
    pub name: String,
    pub description: String,
    pub tracks: Vec<TrackId>,
}

/// Store writing one JSON file per `[RX]` playlist into a directory, for
/// hand-off to the service sync.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `name`: the percent-encoded name, so distinct playlists
    /// never share a file.
    pub fn path_for(&self, name: &RxPlaylistName) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(name.as_str())))
    }

    pub fn read(&self, name: &RxPlaylistName) -> anyhow::Result<Option<StoredPlaylist>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let playlist = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(playlist))
    }

    fn write(&self, playlist: &StoredPlaylist, name: &RxPlaylistName) -> anyhow::Result<()> {
        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(playlist)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl PlaylistStore for JsonDirStore {
    fn ensure_playlist(&mut self, name: &RxPlaylistName, description: &str) -> anyhow::Result<()> {
        if self.read(name)?.is_some() {
            return Ok(());
        }
        warn!("'{name}' not found, creating it empty");
        self.write(
            &StoredPlaylist {
                name: name.to_string(),
                description: description.to_string(),
                tracks: Vec::new(),
            },
            name,
        )
    }

    fn replace_tracks(
        &mut self,
        name: &RxPlaylistName,
        description: &str,
        tracks: &[TrackId],
    ) -> anyhow::Result<()> {
        self.write(
            &StoredPlaylist {
                name: name.to_string(),
                description: description.to_string(),
                tracks: tracks.to_vec(),
            },
            name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Records writes in memory.
    #[derive(Default)]
    struct RecordingStore {
        writes: Vec<(String, Vec<TrackId>)>,
        ensured: Vec<String>,
    }

    impl PlaylistStore for RecordingStore {
        fn ensure_playlist(&mut self, name: &RxPlaylistName, _: &str) -> anyhow::Result<()> {
            self.ensured.push(name.to_string());
            Ok(())
        }

        fn replace_tracks(&mut self, name: &RxPlaylistName, _: &str, tracks: &[TrackId]) -> anyhow::Result<()> {
            self.writes.push((name.to_string(), tracks.to_vec()));
            Ok(())
        }
    }

    fn ids(raw: &[&str]) -> Vec<TrackId> {
        raw.iter().map(|id| TrackId::new(*id)).collect()
    }

    #[test]
    fn test_guard_rejects_unprefixed_names() {
        assert!(RxPlaylistName::new("[RX] Master").is_ok());
        assert!(matches!(
            RxPlaylistName::new("Liked Songs"),
            Err(PublishError::UnguardedName(name)) if name == "Liked Songs"
        ));
        assert!(RxPlaylistName::new(" [RX] Sneaky").is_err());
        assert!(RxPlaylistName::new("[rx] lower").is_err());
    }

    #[test]
    fn test_well_known_names_carry_prefix() {
        for name in [
            RxPlaylistName::master(),
            RxPlaylistName::radio(),
            RxPlaylistName::heard_too_much(),
        ] {
            assert!(name.as_str().starts_with(RX_PREFIX));
        }
    }

    #[test]
    fn test_publish_diffs_against_live_contents() {
        let mut publisher = PlaylistPublisher::new(RecordingStore::default());
        let outcome = publisher
            .publish(&RxPlaylistName::master(), "", &ids(&["a", "b", "c"]), &ids(&["b", "z"]))
            .unwrap();
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.total, 3);
        assert!(outcome.written);
        assert_eq!(publisher.store().writes.len(), 1);
    }

    #[test]
    fn test_unchanged_playlist_is_not_rewritten() {
        let mut publisher = PlaylistPublisher::new(RecordingStore::default());
        let tracks = ids(&["a", "b"]);
        let outcome = publisher
            .publish(&RxPlaylistName::radio(), "", &tracks, &tracks)
            .unwrap();
        assert!(!outcome.written);
        assert!(publisher.store().writes.is_empty());
    }

    #[test]
    fn test_empty_playlist_is_still_created() {
        let dir = TempDir::new().unwrap();
        let mut publisher = PlaylistPublisher::new(JsonDirStore::new(dir.path()).unwrap());
        let outcome = publisher
            .publish(&RxPlaylistName::radio(), "", &[], &[])
            .unwrap();
        assert!(!outcome.written);
        let stored = publisher.store().read(&RxPlaylistName::radio()).unwrap().unwrap();
        assert!(stored.tracks.is_empty());
    }

    #[test]
    fn test_json_store_round_trip_and_ensure() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::new(dir.path()).unwrap();
        let name = RxPlaylistName::master();

        store.replace_tracks(&name, "desc", &ids(&["a", "b"])).unwrap();
        let stored = store.read(&name).unwrap().unwrap();
        assert_eq!(stored.name, "[RX] Master");
        assert_eq!(stored.tracks, ids(&["a", "b"]));

        // ensure leaves existing contents alone
        store.ensure_playlist(&name, "other").unwrap();
        assert_eq!(store.read(&name).unwrap().unwrap().tracks, ids(&["a", "b"]));

        let heard = RxPlaylistName::heard_too_much();
        store.ensure_playlist(&heard, "").unwrap();
        assert!(store.read(&heard).unwrap().unwrap().tracks.is_empty());
    }

    #[test]
    fn test_store_file_names_are_encoded() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::new(dir.path()).unwrap();
        let path = store.path_for(&RxPlaylistName::heard_too_much());
        assert_eq!(
            path.file_name().unwrap(),
            "%5BRX%5D%20Songs%20I%20Hear%20Too%20Much.json"
        );
    }

    #[test]
    fn test_similar_names_do_not_share_a_file() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonDirStore::new(dir.path()).unwrap();
        let spaced = RxPlaylistName::new("[RX] Master").unwrap();
        let underscored = RxPlaylistName::new("[RX]_Master").unwrap();
        assert_ne!(store.path_for(&spaced), store.path_for(&underscored));

        store.replace_tracks(&spaced, "", &ids(&["a"])).unwrap();
        store.replace_tracks(&underscored, "", &ids(&["b"])).unwrap();
        assert_eq!(store.read(&spaced).unwrap().unwrap().tracks, ids(&["a"]));
        assert_eq!(store.read(&underscored).unwrap().unwrap().tracks, ids(&["b"]));
    }
}
