//! Typed errors for the two places a run must stop: bad configuration and
//! refused playlist writes.

use thiserror::Error;

/// Configuration that cannot be normalized into a runnable value.
///
/// Raised before any weight is computed or playlist touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("weightModifier must be a finite, non-negative number (got {0})")]
    InvalidWeightModifier(f64),

    #[error("artistIHearTooMuch must be a finite, non-negative number (got {0})")]
    InvalidArtistPenalty(f64),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures at the publishing boundary.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The write target does not carry the `[RX]` prefix.
    #[error("Refusing to write to playlist '{0}': only playlists prefixed with \"[RX]\" may be modified")]
    UnguardedName(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
