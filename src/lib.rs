//! De-biased Master and artist-diverse Radio playlists from a listening
//! history.
//!
//! Core modules:
//! - [`algorithm`] - Multi-pass weight calculation
//! - [`master`] - Weighted Bernoulli selection of Master
//! - [`radio`] - Artist-diverse Radio built on top of Master
//! - [`publisher`] - `[RX]`-guarded playlist writes
//! - [`pipeline`] - One complete run, snapshot to published playlists
//!
//! ### Supporting Modules
//!
//! - [`song`] - Track and artist identities
//! - [`snapshot`] - Read-only catalogue snapshot and candidate pools
//! - [`config`] - Configuration file, overrides and directories
//! - [`error`] - Typed configuration and publishing errors
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use playlistrx::config::Config;
//! use playlistrx::pipeline;
//! use playlistrx::publisher::{JsonDirStore, PlaylistPublisher};
//! use playlistrx::snapshot::CatalogueSnapshot;
//! use rand::SeedableRng;
//!
//! let snapshot = CatalogueSnapshot::load("snapshot.json".as_ref())?;
//! let config = Config::load(&playlistrx::config::get_config_path()?)?;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let output = pipeline::compute(&snapshot, &config, &mut rng)?;
//! println!("Master: {} songs, Radio: {} songs", output.master.len(), output.radio.songs.len());
//!
//! let mut publisher = PlaylistPublisher::new(JsonDirStore::new("out")?);
//! pipeline::publish(&output, &snapshot, &mut publisher)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Weighting
//!
//! Every candidate starts at weight 10 and loses points for:
//!
//! - **Listening history**: a rank in the listener's top tracks
//! - **Heard too much**: each entry in "[RX] Songs I Hear Too Much"
//! - **Artist saturation**: the artist's share of that playlist
//!
//! Penalties are summed, scaled by `weightModifier` and clamped to `[0, 10]`.
//! Artists past the saturation threshold, or named in `artistBlacklist`, are
//! removed from the run entirely.
//!
//! ## Error Handling
//!
//! Configuration problems surface as [`error::ConfigError`] and writes as
//! [`error::PublishError`]. Missing playlists and songs without artists are
//! logged and skipped rather than failing a run.

pub mod algorithm;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod master;
pub mod pipeline;
pub mod publisher;
pub mod radio;
pub mod snapshot;
pub mod song;
