use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use playlistrx::algorithm::statistics::analyze_weight_distribution;
use playlistrx::algorithm::MAX_WEIGHT;
use playlistrx::cli::{self, InputArgs};
use playlistrx::completion;
use playlistrx::config::{self, Config};
use playlistrx::pipeline;
use playlistrx::publisher::{JsonDirStore, PlaylistPublisher};
use playlistrx::snapshot::CatalogueSnapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Loads the snapshot and the config with command-line overrides applied.
fn load_inputs(input: &InputArgs) -> Result<(CatalogueSnapshot, Config)> {
    let config_path = match &input.config {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };
    debug!("Using config file {}", config_path.display());

    let config = Config::load(&config_path)?
        .with_overrides(&input.overrides.to_overrides())
        .context("Invalid command-line override")?;
    let snapshot = CatalogueSnapshot::load(&input.snapshot)?;
    Ok((snapshot, config))
}

/// Main entry point for PlaylistRX.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=info playlistrx run ...` - Run summary
/// - `RUST_LOG=playlistrx::algorithm=trace playlistrx run ...` - Every penalty
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Run {
            input,
            out,
            seed,
            dry_run,
        } => {
            let (snapshot, config) = load_inputs(&input)?;
            let mut rng = match seed {
                Some(seed) => {
                    info!("Using fixed seed {seed}");
                    StdRng::seed_from_u64(seed)
                }
                None => StdRng::from_entropy(),
            };

            let output = pipeline::compute(&snapshot, &config, &mut rng)?;
            println!("Candidates:  {}", output.pool.len());
            println!("Master:      {}", output.master.len());
            println!(
                "Radio:       {} songs from {} artists",
                output.radio.songs.len(),
                output.radio.artists.len()
            );
            println!("Published:   {}", output.published_master.len());

            if dry_run {
                info!("Dry run, nothing written");
                return Ok(());
            }

            let dir = match out {
                Some(dir) => dir,
                None => config::get_output_dir()?,
            };
            let mut publisher = PlaylistPublisher::new(JsonDirStore::new(&dir)?);
            for outcome in pipeline::publish(&output, &snapshot, &mut publisher)? {
                println!(
                    "{}: {} tracks (+{} / -{}){}",
                    outcome.name,
                    outcome.total,
                    outcome.added,
                    outcome.removed,
                    if outcome.written { "" } else { ", unchanged" }
                );
            }
            info!("Playlists written to {}", dir.display());
        }
        cli::Command::Weights {
            input,
            changed_only,
        } => {
            let (snapshot, config) = load_inputs(&input)?;
            let candidates = pipeline::weigh_candidates(&snapshot, &config)?;
            let weights = &candidates.weights;

            for song in &candidates.radio_pool {
                let Some(weight) = weights.weight(&song.id) else {
                    continue;
                };
                if changed_only && weight >= MAX_WEIGHT {
                    continue;
                }
                let breakdown = weights.breakdown(&song.id).copied().unwrap_or_default();
                println!(
                    "{weight:5.2}  history={:<4} heard={:<4} artist={:<4}  {song}",
                    breakdown.history, breakdown.heard_too_much, breakdown.artist
                );
            }

            let blacklisted = weights.blacklisted_artists();
            if !blacklisted.is_empty() {
                println!();
                println!("Blacklisted artists:");
                for id in blacklisted {
                    let name = weights.artist(id).map_or(id.as_str(), |record| record.name.as_str());
                    println!("  {name} ({id})");
                }
            }

            let stats = analyze_weight_distribution(weights);
            println!();
            println!(
                "{} songs, mean {:.2}, std dev {:.2}, min {:.2}, max {:.2}",
                stats.count, stats.mean, stats.std_deviation, stats.min, stats.max
            );
            println!(
                "{} untouched, {} excluded, ~{:.0} expected in Master before truncation",
                stats.untouched, stats.excluded, stats.expected_selected
            );
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
    }

    Ok(())
}
