//! Master selection: one Bernoulli trial per candidate, then uniform
//! truncation down to `masterSongs`.

use crate::algorithm::WeightTable;
use crate::config::Config;
use crate::song::Song;
use log::{debug, info};
use rand::seq::index;
use rand::Rng;

/// Samples Master from the candidate pool.
#[derive(Debug, Clone, Copy)]
pub struct MasterSelector<'a> {
    table: &'a WeightTable,
    limit: usize,
}

impl<'a> MasterSelector<'a> {
    pub fn new(table: &'a WeightTable, config: &Config) -> Self {
        Self::with_limit(table, config.master_limit())
    }

    pub fn with_limit(table: &'a WeightTable, limit: usize) -> Self {
        Self { table, limit }
    }

    /// Selects Master from `pool`.
    ///
    /// Songs missing from the weight table (blacklisted) are never tried and
    /// never backfilled. The result keeps pool order and holds at most
    /// `min(limit, pool.len())` songs.
    pub fn select<R: Rng + ?Sized>(&self, pool: &[Song], rng: &mut R) -> Vec<Song> {
        if self.limit == 0 || pool.is_empty() {
            debug!("Master is empty (limit {}, pool {})", self.limit, pool.len());
            return Vec::new();
        }

        let accepted: Vec<&Song> = pool
            .iter()
            .filter(|song| {
                let Some(probability) = self.table.probability(&song.id) else {
                    return false;
                };
                let included = rng.gen_bool(probability);
                if probability < 1.0 || !included {
                    debug!(
                        "{song}: weight={:.2}, {}",
                        probability * 10.0,
                        if included { "included" } else { "excluded" }
                    );
                }
                included
            })
            .collect();

        if accepted.len() <= self.limit {
            info!("Master: {} of {} candidates selected", accepted.len(), pool.len());
            return accepted.into_iter().cloned().collect();
        }

        info!(
            "Selected songs exceed masterSongs ({}). Truncating {} down to {}.",
            self.limit,
            accepted.len(),
            self.limit
        );
        let mut keep = index::sample(rng, accepted.len(), self.limit).into_vec();
        keep.sort_unstable();
        keep.into_iter().map(|i| accepted[i].clone()).collect()
    }
}
