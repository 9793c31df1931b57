//! Song weighting for playlist selection.
//!
//! Every candidate starts at [`MAX_WEIGHT`] and loses points for listening
//! history, for its own entries in "Songs I Hear Too Much", and for belonging to
//! an artist the listener keeps flagging. The calculation is a multi-pass
//! pipeline over immutable inputs:
//!
//! 1. count "heard too much" entries per song
//! 2. aggregate those entries per artist and derive artist penalties/blacklist
//! 3. score each candidate (history + own entries + artist), scale, clamp last
//! 4. drop songs credited to a blacklisted artist

use crate::config::Config;
use crate::snapshot::CatalogueSnapshot;
use crate::song::{Artist, ArtistId, Song, TrackId};
use log::{debug, info, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Weight of a song with no penalties.
pub const MAX_WEIGHT: f64 = 10.0;

/// Penalty parameters for one run.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    /// Multiplies the net penalty of every song.
    pub weight_modifier: f64,
    /// `(rank_below, penalty)` tiers for the top-tracks history, best rank first.
    pub history_tiers: [(usize, f64); 3],
    /// Penalty of the first "heard too much" entry of a song.
    pub heard_too_much_first: f64,
    /// Added to the penalty of each further entry.
    pub heard_too_much_step: f64,
    /// Base penalty per qualifying entry once an artist crosses `artist_threshold`.
    pub artist_base: f64,
    pub artist_threshold: usize,
    pub blacklist_threshold: usize,
    /// Explicit exclusions from config: artist ids or names.
    pub artist_blacklist: Vec<String>,
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self {
            weight_modifier: 1.0,
            history_tiers: [(50, 5.0), (100, 4.0), (200, 3.0)],
            heard_too_much_first: 5.0,
            heard_too_much_step: 2.0,
            artist_base: 1.0,
            artist_threshold: 3,
            blacklist_threshold: 10,
            artist_blacklist: Vec::new(),
        }
    }
}

impl ScoringContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            weight_modifier: config.weight_modifier,
            artist_base: config.artist_i_hear_too_much,
            artist_blacklist: config.artist_blacklist.clone(),
            ..Self::default()
        }
    }
}

/// Penalty for one appearance in the top-tracks history at `rank` (0 = most
/// played). Monotonically non-increasing in rank, never above the first tier.
#[must_use]
pub fn history_penalty(rank: usize, tiers: &[(usize, f64); 3]) -> f64 {
    tiers
        .iter()
        .find(|(below, _)| rank < *below)
        .map_or(0.0, |(_, penalty)| *penalty)
}

/// Total penalty for `occurrences` entries in "heard too much": the n-th entry
/// costs `first + step * (n - 1)`, so 5, 7, 9, ... with the defaults.
#[must_use]
pub fn heard_too_much_penalty(occurrences: usize, context: &ScoringContext) -> f64 {
    (0..occurrences)
        .map(|n| context.heard_too_much_first + context.heard_too_much_step * n as f64)
        .sum()
}

/// Penalty applied to every song by an artist with `count` qualifying entries.
#[must_use]
pub fn artist_penalty(count: usize, context: &ScoringContext) -> f64 {
    if count < context.artist_threshold {
        return 0.0;
    }
    context.artist_base * (count + 1).saturating_sub(context.artist_threshold) as f64
}

/// Unscaled penalties behind a song's weight.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PenaltyBreakdown {
    pub history: f64,
    pub heard_too_much: f64,
    pub artist: f64,
}

impl PenaltyBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.history + self.heard_too_much + self.artist
    }

    /// `MAX_WEIGHT - total * modifier`, clamped to `[0, MAX_WEIGHT]`.
    #[must_use]
    pub fn weight(&self, weight_modifier: f64) -> f64 {
        clamp_weight(MAX_WEIGHT - self.total() * weight_modifier)
    }
}

/// Clamps to `[0, MAX_WEIGHT]`. NaN (an overflowing penalty scaled by zero)
/// counts as fully penalised.
#[inline]
fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        return 0.0;
    }
    weight.clamp(0.0, MAX_WEIGHT)
}

/// Artist-level state after aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRecord {
    pub name: String,
    /// Entries in "heard too much" crediting this artist, duplicates included.
    pub heard_too_much: usize,
    /// Unscaled penalty applied to each of this artist's songs.
    pub penalty: f64,
    pub blacklisted: bool,
}

/// Final weights for one run. Built once, read by Master and Radio selection.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    weights: HashMap<TrackId, f64>,
    breakdowns: HashMap<TrackId, PenaltyBreakdown>,
    artists: BTreeMap<ArtistId, ArtistRecord>,
    blacklisted: BTreeSet<ArtistId>,
}

impl WeightTable {
    /// A table with explicit weights and no blacklist. Values are clamped.
    pub fn from_weights(weights: impl IntoIterator<Item = (TrackId, f64)>) -> Self {
        Self {
            weights: weights
                .into_iter()
                .map(|(id, weight)| (id, clamp_weight(weight)))
                .collect(),
            ..Self::default()
        }
    }

    /// `None` for songs that were never candidates or were blacklisted.
    pub fn weight(&self, id: &TrackId) -> Option<f64> {
        self.weights.get(id).copied()
    }

    /// Inclusion probability, `weight / 10`.
    pub fn probability(&self, id: &TrackId) -> Option<f64> {
        self.weight(id).map(|weight| weight / MAX_WEIGHT)
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.weights.contains_key(id)
    }

    pub fn breakdown(&self, id: &TrackId) -> Option<&PenaltyBreakdown> {
        self.breakdowns.get(id)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Entries sorted by track id.
    pub fn entries(&self) -> Vec<(&TrackId, f64)> {
        let mut entries: Vec<_> = self.weights.iter().map(|(id, w)| (id, *w)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn artist(&self, id: &ArtistId) -> Option<&ArtistRecord> {
        self.artists.get(id)
    }

    pub fn artists(&self) -> impl Iterator<Item = (&ArtistId, &ArtistRecord)> {
        self.artists.iter()
    }

    pub fn is_artist_blacklisted(&self, id: &ArtistId) -> bool {
        self.blacklisted.contains(id)
    }

    pub fn blacklisted_artists(&self) -> &BTreeSet<ArtistId> {
        &self.blacklisted
    }

    fn blacklist(&mut self, id: &ArtistId) {
        self.blacklisted.insert(id.clone());
        if let Some(record) = self.artists.get_mut(id) {
            record.blacklisted = true;
        }
    }
}

/// Entries per song in "heard too much".
fn count_song_entries(heard_too_much: &[Song]) -> HashMap<&TrackId, usize> {
    let mut counts = HashMap::new();
    for song in heard_too_much {
        *counts.entry(&song.id).or_insert(0) += 1;
    }
    counts
}

/// Entries per artist in "heard too much". A song credited to several
/// artists counts once for each of them.
fn count_artist_entries(heard_too_much: &[Song]) -> HashMap<ArtistId, usize> {
    let mut counts = HashMap::new();
    for song in heard_too_much {
        for artist in song.artist_ids() {
            *counts.entry(artist).or_insert(0) += 1;
        }
    }
    counts
}

/// "Heard too much" entries with artist credits filled in. An entry that
/// arrives as a bare track id takes the credits of the same track among the
/// candidates or elsewhere in the catalogue; unmatched entries stay in the
/// unknown-artist bucket.
fn resolve_heard_too_much(snapshot: &CatalogueSnapshot, candidates: &[Song]) -> Vec<Song> {
    let mut credits: HashMap<&TrackId, &[Artist]> = HashMap::new();
    for song in candidates.iter().chain(snapshot.catalogue()) {
        if !song.artists.is_empty() {
            credits.entry(&song.id).or_insert(song.artists.as_slice());
        }
    }

    let mut unresolved = 0;
    let resolved = snapshot
        .heard_too_much
        .iter()
        .map(|entry| match credits.get(&entry.id) {
            Some(artists) if entry.artists.is_empty() => Song {
                artists: artists.to_vec(),
                ..entry.clone()
            },
            None if entry.artists.is_empty() => {
                unresolved += 1;
                entry.clone()
            }
            _ => entry.clone(),
        })
        .collect();
    if unresolved > 0 {
        debug!("{unresolved} 'heard too much' entries have no known artist");
    }
    resolved
}

/// Sum of history penalties over every appearance of each track.
fn history_penalties<'a>(
    top_tracks: &'a [TrackId],
    context: &ScoringContext,
) -> HashMap<&'a TrackId, f64> {
    let mut penalties = HashMap::new();
    for (rank, id) in top_tracks.iter().enumerate() {
        *penalties.entry(id).or_insert(0.0) += history_penalty(rank, &context.history_tiers);
    }
    penalties
}

/// An entry matches an artist id exactly, or appears case-insensitively
/// anywhere in the artist's name. Empty entries match nothing.
fn matches_explicit_blacklist(id: &ArtistId, name: &str, blacklist: &[String]) -> bool {
    let name = name.to_lowercase();
    blacklist
        .iter()
        .filter(|entry| !entry.is_empty())
        .any(|entry| entry == id.as_str() || name.contains(&entry.to_lowercase()))
}

/// Builds the artist records for every artist credited on a candidate or on
/// a "heard too much" entry. Artist aggregates are complete before any song
/// is scored.
fn build_artist_records(
    candidates: &[Song],
    heard_too_much: &[Song],
    context: &ScoringContext,
) -> BTreeMap<ArtistId, ArtistRecord> {
    let counts = count_artist_entries(heard_too_much);
    let mut records = BTreeMap::new();

    for song in candidates.iter().chain(heard_too_much) {
        let ids = song.artist_ids();
        for id in ids {
            records.entry(id.clone()).or_insert_with(|| {
                let name = song
                    .artists
                    .iter()
                    .find(|artist| artist.resolved_id() == id)
                    .map_or(crate::song::UNKNOWN_ARTIST_NAME, |artist| artist.display_name())
                    .to_string();
                let heard = counts.get(&id).copied().unwrap_or(0);
                ArtistRecord {
                    blacklisted: heard >= context.blacklist_threshold
                        || matches_explicit_blacklist(&id, &name, &context.artist_blacklist),
                    penalty: artist_penalty(heard, context),
                    heard_too_much: heard,
                    name,
                }
            });
        }
    }
    records
}

/// Computes the weight table for `candidates`.
///
/// `candidates` is the deduplicated pool the selectors draw from; duplicate
/// ids are scored once.
#[must_use]
pub fn calculate_weights(
    snapshot: &CatalogueSnapshot,
    candidates: &[Song],
    context: &ScoringContext,
) -> WeightTable {
    let song_entries = count_song_entries(&snapshot.heard_too_much);
    let history = history_penalties(&snapshot.top_tracks, context);
    let heard_too_much = resolve_heard_too_much(snapshot, candidates);
    let artists = build_artist_records(candidates, &heard_too_much, context);

    let mut table = WeightTable {
        artists,
        ..WeightTable::default()
    };

    let flagged: Vec<ArtistId> = table
        .artists
        .iter()
        .filter(|(_, record)| record.blacklisted)
        .map(|(id, _)| id.clone())
        .collect();
    for id in &flagged {
        table.blacklist(id);
        info!(
            "Blacklisted artist {} ({} entries in 'Songs I Hear Too Much')",
            table.artists[id].name, table.artists[id].heard_too_much
        );
    }

    for song in candidates {
        if table.weights.contains_key(&song.id) {
            continue;
        }

        let artist_ids = song.artist_ids();
        if artist_ids.iter().any(|id| table.is_artist_blacklisted(id)) {
            debug!("{song}: BLACKLISTED");
            continue;
        }

        let breakdown = PenaltyBreakdown {
            history: history.get(&song.id).copied().unwrap_or(0.0),
            heard_too_much: heard_too_much_penalty(
                song_entries.get(&song.id).copied().unwrap_or(0),
                context,
            ),
            // Heaviest penalty among credited artists.
            artist: artist_ids
                .iter()
                .filter_map(|id| table.artists.get(id))
                .map(|record| record.penalty)
                .fold(0.0, f64::max),
        };
        let weight = breakdown.weight(context.weight_modifier);

        if weight < MAX_WEIGHT {
            debug!("{song}: weight={weight:.2} ({breakdown:?})");
        } else {
            trace!("{song}: weight={weight:.2}");
        }

        table.weights.insert(song.id.clone(), weight);
        table.breakdowns.insert(song.id.clone(), breakdown);
    }

    info!(
        "Weighted {} songs, {} artists blacklisted",
        table.len(),
        table.blacklisted.len()
    );
    table
}

/// Distribution summaries for tuning and the `weights` command.
pub mod statistics {
    use super::*;

    /// Summary of a [`WeightTable`].
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct WeightStatistics {
        pub mean: f64,
        pub variance: f64,
        pub std_deviation: f64,
        pub min: f64,
        pub max: f64,
        pub count: usize,
        /// Songs scoring full weight.
        pub untouched: usize,
        /// Songs scoring zero, which Master can never pick.
        pub excluded: usize,
        /// Expected Master size before truncation: sum of probabilities.
        pub expected_selected: f64,
    }

    #[must_use]
    pub fn analyze_weight_distribution(table: &WeightTable) -> WeightStatistics {
        let weights: Vec<f64> = table.weights.values().copied().collect();
        if weights.is_empty() {
            return WeightStatistics::default();
        }

        #[allow(clippy::cast_precision_loss)]
        let count = weights.len() as f64;
        let mean = weights.iter().sum::<f64>() / count;
        let variance = weights.iter().map(|&w| (w - mean).powi(2)).sum::<f64>() / count;

        WeightStatistics {
            mean,
            variance,
            std_deviation: variance.sqrt(),
            min: weights.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
            max: weights.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
            count: weights.len(),
            untouched: weights.iter().filter(|&&w| w >= MAX_WEIGHT).count(),
            excluded: weights.iter().filter(|&&w| w <= 0.0).count(),
            expected_selected: weights.iter().map(|w| w / MAX_WEIGHT).sum(),
        }
    }
}
