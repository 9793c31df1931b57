//! # Command-Line Interface Module
//!
//! Defines the `playlistrx` command line with Clap derive macros.
//!
//! ## Commands
//!
//! - `run`: Compute Master and Radio from a snapshot and publish them
//! - `weights`: Show every candidate's weight and the penalties behind it
//! - `completion`: Generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! playlistrx run --snapshot snapshot.json
//! playlistrx run --snapshot snapshot.json --master-songs 500 --excluded-words live remix
//! playlistrx weights --snapshot snapshot.json --changed-only
//! ```

use crate::config::ConfigOverrides;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser, Debug)]
#[command(name = "playlistrx")]
#[command(about = "PlaylistRX - de-biased Master and artist-diverse Radio playlists")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Inputs shared by the commands that read a snapshot.
#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// Catalogue snapshot (JSON) pulled from the music service
    #[arg(long, env = "PLAYLISTRX_SNAPSHOT", value_hint = clap::ValueHint::FilePath)]
    pub snapshot: PathBuf,

    /// Config file (JSON). Defaults to the platform config directory.
    #[arg(long, env = "PLAYLISTRX_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Per-run overrides of config file values.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Scale all computed penalties
    #[arg(long, allow_negative_numbers = true)]
    pub weight_modifier: Option<f64>,

    /// Number of distinct artists sampled for Radio
    #[arg(long, allow_negative_numbers = true)]
    pub number_of_radio_artists: Option<i64>,

    /// Per-artist song cap in Radio
    #[arg(long, alias = "radio-artist-songs", allow_negative_numbers = true)]
    pub songs_per_artist: Option<i64>,

    /// Drop low-weight songs from Radio
    #[arg(long)]
    pub remove_radio_songs_by_weight: bool,

    /// Merge Radio into the published Master
    #[arg(long)]
    pub include_radio_in_master: bool,

    /// Widen Radio's artist pool with Discover Weekly
    #[arg(long)]
    pub include_discover_weekly_in_radio: bool,

    /// Source playlists for the Master candidate pool
    #[arg(long, num_args = 1..)]
    pub playlists_to_include: Option<Vec<String>>,

    /// Base penalty for artists you hear too much
    #[arg(long, allow_negative_numbers = true)]
    pub artist_i_hear_too_much: Option<f64>,

    /// Artists (ids or names) to exclude entirely
    #[arg(long, num_args = 1..)]
    pub artist_blacklist: Option<Vec<String>>,

    /// Maximum Master size before Radio is merged
    #[arg(long, allow_negative_numbers = true)]
    pub master_songs: Option<i64>,

    /// Words that remove a song from Radio when found in its title
    #[arg(long, num_args = 1..)]
    pub excluded_words: Option<Vec<String>>,
}

impl OverrideArgs {
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            playlists_to_include: self.playlists_to_include.clone(),
            weight_modifier: self.weight_modifier,
            number_of_radio_artists: self.number_of_radio_artists,
            songs_per_artist: self.songs_per_artist,
            remove_radio_songs_by_weight: self.remove_radio_songs_by_weight,
            include_radio_in_master: self.include_radio_in_master,
            include_discover_weekly_in_radio: self.include_discover_weekly_in_radio,
            artist_i_hear_too_much: self.artist_i_hear_too_much,
            artist_blacklist: self.artist_blacklist.clone(),
            master_songs: self.master_songs,
            excluded_words: self.excluded_words.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute Master and Radio and publish them
    ///
    /// Reads the snapshot, weights every candidate, samples Master, builds
    /// Radio and writes the `[RX]` playlists into the output directory.
    /// Only playlists prefixed with "[RX]" are ever written.
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Directory the `[RX]` playlists are written to
        #[arg(long, env = "PLAYLISTRX_OUT", value_hint = clap::ValueHint::DirPath)]
        out: Option<PathBuf>,

        /// Seed the random source (for reproducing a run)
        #[arg(long)]
        seed: Option<u64>,

        /// Compute and report without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print every candidate's weight with its penalty breakdown
    Weights {
        #[command(flatten)]
        input: InputArgs,

        /// Only list songs whose weight is below 10
        #[arg(long)]
        changed_only: bool,
    },

    /// Generate shell completions
    ///
    /// Usage: playlistrx completion bash > ~/.local/share/bash-completion/completions/playlistrx
    Completion {
        shell: Shell,
    },
}
