//! # Configuration Module
//!
//! Run parameters for the weighting and selection engine, plus the
//! platform-appropriate locations PlaylistRX reads from and writes to.
//!
//! ## Config File
//!
//! A JSON document with camelCase keys. Missing keys take their defaults and a
//! missing file is the same as `{}`. Unknown keys (credentials and such, used by
//! the service layer) are ignored.
//!
//! ```json
//! {
//!   "playlistsToInclude": ["Liked Songs", "Road Trip"],
//!   "weightModifier": 1.5,
//!   "masterSongs": 800,
//!   "excludedWords": ["live", "remix"]
//! }
//! ```
//!
//! ## Data Storage
//!
//! - Config: `<config dir>/playlistrx/config.json`
//! - Published playlists: `<data dir>/playlistrx/playlists/`

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Sentinel source name for the listener's saved-tracks collection.
pub const LIKED_SONGS: &str = "Liked Songs";

/// Sentinel source name for the weekly discovery playlist.
pub const DISCOVER_WEEKLY: &str = "Discover Weekly";

/// Immutable run parameters, loaded once and shared by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Source playlists unioned into the Master candidate pool.
    pub playlists_to_include: Vec<String>,
    /// Scales every computed penalty before clamping.
    pub weight_modifier: f64,
    /// Distinct artists sampled for Radio. Non-positive means an empty Radio.
    pub number_of_radio_artists: i64,
    /// Per-artist cap in Radio. Non-positive means an empty Radio.
    #[serde(alias = "radioArtistSongs")]
    pub songs_per_artist: i64,
    pub remove_radio_songs_by_weight: bool,
    pub include_radio_in_master: bool,
    pub include_discover_weekly_in_radio: bool,
    /// Base penalty applied to every song of an artist with 3+ entries in
    /// "Songs I Hear Too Much". Accepts the legacy boolean form.
    #[serde(rename = "artistIHearTooMuch", deserialize_with = "deserialize_artist_penalty")]
    pub artist_i_hear_too_much: f64,
    /// Explicit artist exclusions: artist ids, or names (case-insensitive).
    pub artist_blacklist: Vec<String>,
    /// Target size of Master before any Radio merge.
    pub master_songs: i64,
    /// Case-insensitive title substrings removed from Radio.
    pub excluded_words: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playlists_to_include: vec![LIKED_SONGS.to_string()],
            weight_modifier: 1.0,
            number_of_radio_artists: 100,
            songs_per_artist: 10,
            remove_radio_songs_by_weight: false,
            include_radio_in_master: false,
            include_discover_weekly_in_radio: false,
            artist_i_hear_too_much: 1.0,
            artist_blacklist: Vec::new(),
            master_songs: 1000,
            excluded_words: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtistPenaltySetting {
    Toggle(bool),
    Base(f64),
}

fn deserialize_artist_penalty<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ArtistPenaltySetting::deserialize(deserializer)? {
        ArtistPenaltySetting::Toggle(true) => 1.0,
        ArtistPenaltySetting::Toggle(false) => 0.0,
        ArtistPenaltySetting::Base(base) => base,
    })
}

/// Command-line overrides. `None`/`false` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub playlists_to_include: Option<Vec<String>>,
    pub weight_modifier: Option<f64>,
    pub number_of_radio_artists: Option<i64>,
    pub songs_per_artist: Option<i64>,
    pub remove_radio_songs_by_weight: bool,
    pub include_radio_in_master: bool,
    pub include_discover_weekly_in_radio: bool,
    pub artist_i_hear_too_much: Option<f64>,
    pub artist_blacklist: Option<Vec<String>>,
    pub master_songs: Option<i64>,
    pub excluded_words: Option<Vec<String>>,
}

impl Config {
    /// Parse a config document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Config is not a valid PlaylistRX config document")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    /// Layer command-line values over this config and re-validate.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(playlists) = &overrides.playlists_to_include {
            self.playlists_to_include = playlists.clone();
        }
        if let Some(modifier) = overrides.weight_modifier {
            self.weight_modifier = modifier;
        }
        if let Some(count) = overrides.number_of_radio_artists {
            self.number_of_radio_artists = count;
        }
        if let Some(count) = overrides.songs_per_artist {
            self.songs_per_artist = count;
        }
        self.remove_radio_songs_by_weight |= overrides.remove_radio_songs_by_weight;
        self.include_radio_in_master |= overrides.include_radio_in_master;
        self.include_discover_weekly_in_radio |= overrides.include_discover_weekly_in_radio;
        if let Some(base) = overrides.artist_i_hear_too_much {
            self.artist_i_hear_too_much = base;
        }
        if let Some(blacklist) = &overrides.artist_blacklist {
            self.artist_blacklist = blacklist.clone();
        }
        if let Some(count) = overrides.master_songs {
            self.master_songs = count;
        }
        if let Some(words) = &overrides.excluded_words {
            self.excluded_words = words.clone();
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values that are structurally invalid. Out-of-range counts are
    /// not errors; they normalize to empty results downstream.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.weight_modifier.is_finite() || self.weight_modifier < 0.0 {
            return Err(ConfigError::InvalidWeightModifier(self.weight_modifier));
        }
        if !self.artist_i_hear_too_much.is_finite() || self.artist_i_hear_too_much < 0.0 {
            return Err(ConfigError::InvalidArtistPenalty(self.artist_i_hear_too_much));
        }
        if self.playlists_to_include.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "playlistsToInclude contains an empty playlist name".to_string(),
            ));
        }
        Ok(())
    }

    /// `masterSongs` clamped to a usable size.
    pub fn master_limit(&self) -> usize {
        usize::try_from(self.master_songs).unwrap_or(0)
    }

    pub fn radio_artist_limit(&self) -> usize {
        usize::try_from(self.number_of_radio_artists).unwrap_or(0)
    }

    pub fn radio_songs_per_artist(&self) -> usize {
        usize::try_from(self.songs_per_artist).unwrap_or(0)
    }
}

/// Creates and returns `<base>/playlistrx`.
fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    let base = base.ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system {kind} directory. Please ensure your platform supports standard {kind} directories."
        )
    })?;

    let dir = base.join("playlistrx");
    fs::create_dir_all(&dir).with_context(|| {
        format!(
            "Failed to create PlaylistRX {kind} directory at {}. Please check file permissions.",
            dir.display()
        )
    })?;
    Ok(dir)
}

/// Returns the platform-appropriate config file path.
///
/// - **Linux**: `~/.config/playlistrx/config.json`
/// - **macOS**: `~/Library/Application Support/playlistrx/config.json`
/// - **Windows**: `%APPDATA%\playlistrx\config.json`
///
/// # Errors
///
/// Fails if the config directory cannot be determined or created.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(app_dir(dirs::config_dir(), "config")?.join("config.json"))
}

/// Returns the directory [`JsonDirStore`](crate::publisher::JsonDirStore)
/// writes `[RX]` playlists into by default.
pub fn get_output_dir() -> Result<PathBuf> {
    let dir = app_dir(dirs::data_dir(), "data")?.join("playlists");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create playlist directory at {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.number_of_radio_artists, 100);
        assert_eq!(config.songs_per_artist, 10);
        assert_eq!(config.weight_modifier, 1.0);
    }

    #[test]
    fn test_camel_case_keys_and_legacy_alias() {
        let config = Config::from_json(
            r#"{
                "playlistsToInclude": ["Liked Songs", "Gym"],
                "weightModifier": 2,
                "radioArtistSongs": 3,
                "removeRadioSongsByWeight": true,
                "artistBlacklist": ["Nickelback"],
                "masterSongs": 50,
                "excludedWords": ["live"],
                "clientId": "ignored"
            }"#,
        )
        .unwrap();

        assert_eq!(config.playlists_to_include, vec!["Liked Songs", "Gym"]);
        assert_eq!(config.weight_modifier, 2.0);
        assert_eq!(config.songs_per_artist, 3);
        assert!(config.remove_radio_songs_by_weight);
        assert_eq!(config.artist_blacklist, vec!["Nickelback"]);
        assert_eq!(config.master_songs, 50);
    }

    #[test]
    fn test_artist_penalty_accepts_bool_and_number() {
        let on = Config::from_json(r#"{"artistIHearTooMuch": true}"#).unwrap();
        let off = Config::from_json(r#"{"artistIHearTooMuch": false}"#).unwrap();
        let base = Config::from_json(r#"{"artistIHearTooMuch": 2.5}"#).unwrap();
        assert_eq!(on.artist_i_hear_too_much, 1.0);
        assert_eq!(off.artist_i_hear_too_much, 0.0);
        assert_eq!(base.artist_i_hear_too_much, 2.5);
    }

    #[test]
    fn test_non_numeric_weight_modifier_fails_fast() {
        assert!(Config::from_json(r#"{"weightModifier": "heavy"}"#).is_err());
        assert!(Config::from_json(r#"{"weightModifier": -1}"#).is_err());
    }

    #[test]
    fn test_negative_counts_are_not_errors() {
        let config = Config::from_json(r#"{"songsPerArtist": -4, "masterSongs": -1}"#).unwrap();
        assert_eq!(config.radio_songs_per_artist(), 0);
        assert_eq!(config.master_limit(), 0);
    }

    #[test]
    fn test_overrides_layer_over_file_values() {
        let overrides = ConfigOverrides {
            weight_modifier: Some(0.5),
            include_radio_in_master: true,
            excluded_words: Some(vec!["acoustic".to_string()]),
            ..ConfigOverrides::default()
        };
        let config = Config::default().with_overrides(&overrides).unwrap();
        assert_eq!(config.weight_modifier, 0.5);
        assert!(config.include_radio_in_master);
        assert_eq!(config.excluded_words, vec!["acoustic"]);
        assert_eq!(config.master_songs, 1000);

        let bad = ConfigOverrides {
            weight_modifier: Some(f64::NAN),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            Config::default().with_overrides(&bad),
            Err(ConfigError::InvalidWeightModifier(_))
        ));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
