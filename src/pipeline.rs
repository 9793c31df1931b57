//! One PlaylistRX run: snapshot in, Master/Radio out, then publish.
//!
//! Data flows forward only. Weighting finishes before either selector runs,
//! Radio reads Master but never the merged result, and nothing here writes
//! outside the [`PlaylistPublisher`].

use crate::algorithm::{calculate_weights, ScoringContext, WeightTable};
use crate::config::Config;
use crate::error::{ConfigError, PublishError};
use crate::master::MasterSelector;
use crate::publisher::{PlaylistPublisher, PlaylistStore, PublishOutcome, RxPlaylistName};
use crate::radio::{Radio, RadioBuilder};
use crate::snapshot::CatalogueSnapshot;
use crate::song::{Song, TrackId};
use log::info;
use rand::Rng;
use std::collections::HashSet;

/// Everything a run computed.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub weights: WeightTable,
    /// Deduplicated Master candidate pool.
    pub pool: Vec<Song>,
    /// Master before any Radio merge.
    pub master: Vec<Song>,
    pub radio: Radio,
    /// Master as published: with Radio appended when `includeRadioInMaster`.
    pub published_master: Vec<Song>,
}

/// Candidate pools of one run and their weights.
#[derive(Debug, Clone)]
pub struct Candidates {
    /// Deduplicated songs of `playlistsToInclude`.
    pub pool: Vec<Song>,
    /// Discover Weekly songs not already in `pool`; empty unless enabled.
    pub discover: Vec<Song>,
    /// `pool` followed by `discover`. Everything here is weighted.
    pub radio_pool: Vec<Song>,
    pub weights: WeightTable,
}

/// Builds the candidate pools and weighs every song in them.
pub fn weigh_candidates(
    snapshot: &CatalogueSnapshot,
    config: &Config,
) -> Result<Candidates, ConfigError> {
    config.validate()?;

    let pool = snapshot.candidate_pool(&config.playlists_to_include);
    let discover = if config.include_discover_weekly_in_radio {
        snapshot.discover_weekly_extension(&pool)
    } else {
        Vec::new()
    };
    info!(
        "Candidate pool: {} songs ({} extra from Discover Weekly for radio)",
        pool.len(),
        discover.len()
    );

    let radio_pool: Vec<Song> = pool.iter().chain(&discover).cloned().collect();
    let weights = calculate_weights(snapshot, &radio_pool, &ScoringContext::from_config(config));

    Ok(Candidates {
        pool,
        discover,
        radio_pool,
        weights,
    })
}

/// Runs weighting, Master selection and Radio building.
///
/// # Errors
///
/// Only configuration errors; data anomalies degrade gracefully.
pub fn compute<R: Rng + ?Sized>(
    snapshot: &CatalogueSnapshot,
    config: &Config,
    rng: &mut R,
) -> Result<RunOutput, ConfigError> {
    let Candidates {
        pool,
        discover,
        radio_pool,
        weights,
    } = weigh_candidates(snapshot, config)?;

    let master = MasterSelector::new(&weights, config).select(&pool, rng);

    let seeds: Vec<Song> = master.iter().chain(&discover).cloned().collect();
    let radio = RadioBuilder::new(&weights, config).build(&seeds, &radio_pool, rng);

    let published_master = if config.include_radio_in_master {
        let merged = merge_radio_into_master(&master, &radio.songs);
        info!(
            "Final '[RX] Master' contains {} master + {} radio = {} tracks",
            master.len(),
            merged.len() - master.len(),
            merged.len()
        );
        merged
    } else {
        master.clone()
    };

    Ok(RunOutput {
        weights,
        pool,
        master,
        radio,
        published_master,
    })
}

/// Master followed by the Radio songs it does not already hold.
#[must_use]
pub fn merge_radio_into_master(master: &[Song], radio: &[Song]) -> Vec<Song> {
    let mut seen: HashSet<&TrackId> = master.iter().map(|song| &song.id).collect();
    master
        .iter()
        .chain(radio.iter().filter(|song| seen.insert(&song.id)))
        .cloned()
        .collect()
}

fn track_ids(songs: &[Song]) -> Vec<TrackId> {
    songs.iter().map(|song| song.id.clone()).collect()
}

/// Publishes Radio and Master, and makes sure the heard-too-much playlist
/// exists. Live contents for the diff come from the snapshot.
pub fn publish<S: PlaylistStore>(
    output: &RunOutput,
    snapshot: &CatalogueSnapshot,
    publisher: &mut PlaylistPublisher<S>,
) -> Result<Vec<PublishOutcome>, PublishError> {
    publisher.ensure_heard_too_much()?;

    let radio_name = RxPlaylistName::radio();
    let radio = publisher.publish(
        &radio_name,
        "[RX] Radio generated by PlaylistRX",
        &track_ids(&output.radio.songs),
        snapshot.rx_playlist(radio_name.as_str()),
    )?;

    let master_name = RxPlaylistName::master();
    let master = publisher.publish(
        &master_name,
        "Generated by PlaylistRX",
        &track_ids(&output.published_master),
        snapshot.rx_playlist(master_name.as_str()),
    )?;

    Ok(vec![radio, master])
}
