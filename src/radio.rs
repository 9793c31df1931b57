//! Radio: an artist-diverse playlist derived from Master.
//!
//! Artists are drawn uniformly from the ones present in Master (optionally
//! widened with Discover Weekly). Each drawn artist contributes its top
//! `songsPerArtist` candidates by weight, taken from the whole candidate pool
//! rather than only what landed in Master.

use crate::algorithm::{WeightTable, MAX_WEIGHT};
use crate::config::Config;
use crate::song::{ArtistId, Song, TrackId};
use log::{debug, info};
use rand::seq::index;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Output of [`RadioBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Radio {
    pub songs: Vec<Song>,
    /// Artists drawn for this run, in draw order.
    pub artists: Vec<ArtistId>,
}

/// Radio-specific slice of the run configuration.
#[derive(Debug, Clone)]
pub struct RadioSettings {
    pub artists: usize,
    pub songs_per_artist: usize,
    pub excluded_words: Vec<String>,
    pub remove_by_weight: bool,
}

impl From<&Config> for RadioSettings {
    fn from(config: &Config) -> Self {
        Self {
            artists: config.radio_artist_limit(),
            songs_per_artist: config.radio_songs_per_artist(),
            excluded_words: config.excluded_words.clone(),
            remove_by_weight: config.remove_radio_songs_by_weight,
        }
    }
}

pub struct RadioBuilder<'a> {
    table: &'a WeightTable,
    settings: RadioSettings,
}

impl<'a> RadioBuilder<'a> {
    pub fn new(table: &'a WeightTable, config: &Config) -> Self {
        Self::with_settings(table, RadioSettings::from(config))
    }

    pub fn with_settings(table: &'a WeightTable, settings: RadioSettings) -> Self {
        Self { table, settings }
    }

    /// Builds Radio.
    ///
    /// - `seeds`: songs whose artists may be drawn (Master, plus Discover
    ///   Weekly when enabled)
    /// - `pool`: songs an artist's picks come from (the Master candidate pool,
    ///   plus Discover Weekly when enabled)
    ///
    /// Songs absent from the weight table are ignored on both sides.
    pub fn build<R: Rng + ?Sized>(&self, seeds: &[Song], pool: &[Song], rng: &mut R) -> Radio {
        if self.settings.songs_per_artist == 0 || self.settings.artists == 0 {
            debug!("Radio is empty (songsPerArtist or numberOfRadioArtists is zero)");
            return Radio::default();
        }

        let present = self.present_artists(seeds);
        if present.is_empty() {
            info!("No artists available for Radio");
            return Radio::default();
        }

        let chosen = choose_artists(&present, self.settings.artists, rng);
        info!(
            "Chosen artists for radio: {:?}",
            chosen
                .iter()
                .map(|id| self.table.artist(id).map_or(id.as_str(), |a| a.name.as_str()))
                .collect::<Vec<_>>()
        );

        let picked = self.top_songs_per_artist(&chosen, pool);
        let before_words = picked.len();
        let mut songs: Vec<Song> = picked
            .into_iter()
            .filter(|song| {
                let excluded = song.title_contains_any(&self.settings.excluded_words);
                if excluded {
                    debug!("Skipping '{}' - contains excluded word", song.title);
                }
                !excluded
            })
            .collect();
        debug!("Excluded words removed {} songs", before_words - songs.len());

        if self.settings.remove_by_weight {
            let before = songs.len();
            songs.retain(|song| self.accept_by_weight(song, rng));
            info!("Filtered out {} radio songs based on weight", before - songs.len());
        }

        info!("Radio: {} songs from {} artists", songs.len(), chosen.len());
        Radio {
            songs,
            artists: chosen,
        }
    }

    /// Distinct artists credited on weighted seed songs, first-seen order.
    fn present_artists(&self, seeds: &[Song]) -> Vec<ArtistId> {
        let mut seen = HashSet::new();
        seeds
            .iter()
            .filter(|song| self.table.contains(&song.id))
            .flat_map(Song::artist_ids)
            .filter(|id| !self.table.is_artist_blacklisted(id) && seen.insert(id.clone()))
            .collect()
    }

    /// Per chosen artist, the highest-weighted candidates up to the cap.
    ///
    /// A song counts toward every artist it credits. Collaborations with an
    /// artist outside `chosen`, or with one already at the cap, are skipped,
    /// so Radio never holds more than `chosen.len()` distinct artists or more
    /// than the cap for any of them. Each song appears once.
    fn top_songs_per_artist(&self, chosen: &[ArtistId], pool: &[Song]) -> Vec<Song> {
        let cap = self.settings.songs_per_artist;
        let mut counts: HashMap<&ArtistId, usize> = HashMap::new();
        let mut taken: HashSet<&TrackId> = HashSet::new();
        let mut songs = Vec::new();

        for artist in chosen {
            let mut candidates: Vec<(&Song, Vec<ArtistId>, f64)> = pool
                .iter()
                .filter_map(|song| {
                    let weight = self.table.weight(&song.id)?;
                    let credits = song.artist_ids();
                    credits.contains(artist).then_some((song, credits, weight))
                })
                .collect();
            candidates.sort_by(|a, b| by_weight_then_id(a.0, a.2, b.0, b.2));

            for (song, credits, _) in candidates {
                if counts.get(artist).copied().unwrap_or(0) >= cap {
                    break;
                }
                if taken.contains(&song.id) {
                    continue;
                }
                let credited: Vec<&ArtistId> = chosen
                    .iter()
                    .filter(|id| credits.contains(id))
                    .collect();
                if credited.len() < credits.len() {
                    debug!("Skipping '{}' - credits an artist not drawn for radio", song.title);
                    continue;
                }
                if credited.iter().any(|id| counts.get(*id).copied().unwrap_or(0) >= cap) {
                    continue;
                }
                for id in credited {
                    *counts.entry(id).or_insert(0) += 1;
                }
                taken.insert(&song.id);
                songs.push(song.clone());
            }
        }
        songs
    }

    /// Zero weight never passes; otherwise a Bernoulli trial at weight / 10.
    fn accept_by_weight<R: Rng + ?Sized>(&self, song: &Song, rng: &mut R) -> bool {
        match self.table.weight(&song.id) {
            Some(weight) if weight > 0.0 => rng.gen_bool(weight / MAX_WEIGHT),
            _ => {
                debug!("{song}: weight 0, removed from radio");
                false
            }
        }
    }
}

/// Heaviest first; ties by track id so the order is reproducible.
fn by_weight_then_id(a: &Song, wa: f64, b: &Song, wb: f64) -> Ordering {
    wb.partial_cmp(&wa)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

/// Uniform draw of `amount` distinct artists (all of them if fewer exist).
fn choose_artists<R: Rng + ?Sized>(present: &[ArtistId], amount: usize, rng: &mut R) -> Vec<ArtistId> {
    let amount = amount.min(present.len());
    index::sample(rng, present.len(), amount)
        .into_iter()
        .map(|i| present[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::Artist;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn song(id: &str, title: &str, artists: &[&str]) -> Song {
        Song::new(
            id,
            title,
            artists.iter().map(|a| Artist::new(*a, a.to_uppercase())).collect(),
        )
    }

    fn table(entries: &[(&str, f64)]) -> WeightTable {
        WeightTable::from_weights(entries.iter().map(|(id, w)| (TrackId::new(*id), *w)))
    }

    fn settings(artists: usize, songs_per_artist: usize) -> RadioSettings {
        RadioSettings {
            artists,
            songs_per_artist,
            excluded_words: Vec::new(),
            remove_by_weight: false,
        }
    }

    fn artist_counts(songs: &[Song]) -> HashMap<ArtistId, usize> {
        let mut counts = HashMap::new();
        for song in songs {
            for id in song.artist_ids() {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn test_two_artists_one_song_each() {
        let pool = vec![song("A1", "a1", &["x"]), song("A2", "a2", &["x"]), song("B1", "b1", &["y"])];
        let table = table(&[("A1", 10.0), ("A2", 10.0), ("B1", 10.0)]);
        let builder = RadioBuilder::with_settings(&table, settings(2, 1));

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let radio = builder.build(&pool, &pool, &mut rng);
            assert_eq!(radio.songs.len(), 2);
            let counts = artist_counts(&radio.songs);
            assert_eq!(counts.get(&ArtistId::new("x")), Some(&1));
            assert_eq!(counts.get(&ArtistId::new("y")), Some(&1));
            assert!(radio.songs.iter().any(|s| s.id == TrackId::new("B1")));
        }
    }

    #[test]
    fn test_picks_top_weights_from_whole_pool() {
        let pool = vec![
            song("low", "low", &["x"]),
            song("high", "high", &["x"]),
            song("mid", "mid", &["x"]),
        ];
        let master = vec![pool[0].clone()];
        let table = table(&[("low", 2.0), ("high", 9.0), ("mid", 5.0)]);
        let builder = RadioBuilder::with_settings(&table, settings(5, 2));
        let mut rng = StdRng::seed_from_u64(1);
        let radio = builder.build(&master, &pool, &mut rng);
        let ids: Vec<&str> = radio.songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid"]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let pool = vec![song("b", "b", &["x"]), song("a", "a", &["x"]), song("c", "c", &["x"])];
        let table = table(&[("a", 8.0), ("b", 8.0), ("c", 8.0)]);
        let builder = RadioBuilder::with_settings(&table, settings(1, 2));
        let mut rng = StdRng::seed_from_u64(1);
        let radio = builder.build(&pool, &pool, &mut rng);
        let ids: Vec<&str> = radio.songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_caps_hold_for_large_pools() {
        let pool: Vec<Song> = (0..200)
            .map(|i| song(&format!("t{i}"), "song", &[&format!("artist{}", i % 25)]))
            .collect();
        let table = WeightTable::from_weights(pool.iter().map(|s| (s.id.clone(), 10.0)));
        let builder = RadioBuilder::with_settings(&table, settings(7, 3));
        let mut rng = StdRng::seed_from_u64(9);
        let radio = builder.build(&pool, &pool, &mut rng);

        let counts = artist_counts(&radio.songs);
        assert!(counts.len() <= 7);
        assert!(counts.values().all(|&n| n <= 3));
        assert_eq!(radio.artists.len(), 7);
        assert_eq!(radio.songs.len(), 21);
    }

    #[test]
    fn test_collaborations_respect_every_chosen_artist_cap() {
        let pool = vec![
            song("solo", "solo", &["x"]),
            song("duet", "duet", &["y", "x"]),
            song("y2", "y2", &["y"]),
        ];
        let table = table(&[("solo", 10.0), ("duet", 10.0), ("y2", 5.0)]);
        let builder = RadioBuilder::with_settings(&table, settings(2, 1));
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let radio = builder.build(&pool, &pool, &mut rng);
            let counts = artist_counts(&radio.songs);
            assert!(counts.values().all(|&n| n <= 1), "{:?}", radio.songs);
        }
    }

    #[test]
    fn test_collaboration_cannot_add_undrawn_artist() {
        let pool = vec![song("s1", "s1", &["x", "z"])];
        let table = table(&[("s1", 10.0)]);
        let builder = RadioBuilder::with_settings(&table, settings(1, 5));
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let radio = builder.build(&pool, &pool, &mut rng);
            assert_eq!(radio.artists.len(), 1);
            let counts = artist_counts(&radio.songs);
            assert!(counts.len() <= 1, "seed {seed}: {counts:?}");
            assert!(counts.keys().all(|id| radio.artists.contains(id)));
        }
    }

    #[test]
    fn test_shared_featured_artist_respects_cap() {
        let pool = vec![
            song("s1", "s1", &["x", "z"]),
            song("s2", "s2", &["y", "z"]),
            song("z1", "z1", &["z"]),
        ];
        let table = table(&[("s1", 10.0), ("s2", 10.0), ("z1", 10.0)]);
        let builder = RadioBuilder::with_settings(&table, settings(2, 1));
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let radio = builder.build(&pool, &pool, &mut rng);
            let counts = artist_counts(&radio.songs);
            assert!(counts.values().all(|&n| n <= 1), "seed {seed}: {counts:?}");
            assert!(counts.len() <= 2, "seed {seed}: {counts:?}");
        }
    }

    #[test]
    fn test_excluded_words_are_case_insensitive_substrings() {
        let pool = vec![
            song("t1", "Alive (LIVE)", &["x"]),
            song("t2", "Deliverance", &["x"]),
            song("t3", "Studio Cut", &["x"]),
        ];
        let table = table(&[("t1", 10.0), ("t2", 10.0), ("t3", 10.0)]);
        let builder = RadioBuilder::with_settings(
            &table,
            RadioSettings {
                excluded_words: vec!["Live".to_string()],
                ..settings(1, 10)
            },
        );
        let mut rng = StdRng::seed_from_u64(1);
        let radio = builder.build(&pool, &pool, &mut rng);
        let ids: Vec<&str> = radio.songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["t3"]);
    }

    #[test]
    fn test_remove_by_weight_drops_zero_weight_songs() {
        let pool = vec![song("dead", "dead", &["x"]), song("fine", "fine", &["x"])];
        let table = table(&[("dead", 0.0), ("fine", 10.0)]);
        let builder = RadioBuilder::with_settings(
            &table,
            RadioSettings {
                remove_by_weight: true,
                ..settings(1, 5)
            },
        );
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let radio = builder.build(&pool, &pool, &mut rng);
            let ids: Vec<&str> = radio.songs.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids, vec!["fine"]);
        }

        let keep_all = RadioBuilder::with_settings(&table, settings(1, 5));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(keep_all.build(&pool, &pool, &mut rng).songs.len(), 2);
    }

    #[test]
    fn test_degenerate_settings_give_empty_radio() {
        let pool = vec![song("t1", "t1", &["x"])];
        let table = table(&[("t1", 10.0)]);
        let mut rng = StdRng::seed_from_u64(1);

        let no_songs = RadioBuilder::with_settings(&table, settings(3, 0));
        assert!(no_songs.build(&pool, &pool, &mut rng).songs.is_empty());

        let no_artists = RadioBuilder::with_settings(&table, settings(0, 3));
        assert!(no_artists.build(&pool, &pool, &mut rng).songs.is_empty());

        let builder = RadioBuilder::with_settings(&table, settings(3, 3));
        assert_eq!(builder.build(&[], &pool, &mut rng), Radio::default());
    }

    #[test]
    fn test_artist_draw_is_not_order_biased() {
        let pool: Vec<Song> = (0..10).map(|i| song(&format!("t{i}"), "s", &[&format!("a{i}")])).collect();
        let table = WeightTable::from_weights(pool.iter().map(|s| (s.id.clone(), 10.0)));
        let builder = RadioBuilder::with_settings(&table, settings(1, 1));
        let mut rng = StdRng::seed_from_u64(5);
        let mut hits: HashMap<ArtistId, usize> = HashMap::new();

        let runs = 5000;
        for _ in 0..runs {
            for id in builder.build(&pool, &pool, &mut rng).artists {
                *hits.entry(id).or_insert(0) += 1;
            }
        }
        assert_eq!(hits.len(), 10);
        for (id, n) in hits {
            let rate = n as f64 / runs as f64;
            assert!((rate - 0.1).abs() < 0.03, "{id} drawn at rate {rate}");
        }
    }
}
