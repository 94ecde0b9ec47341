use std::path::PathBuf;

use thiserror::Error;

/// Recoverable per-attempt failures while locating or normalizing a play.
/// Callers skip the play and let the user pick another one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("play {play} is not a down (kickoff, extra point, ...)")]
    NotADown { play: String },
    #[error("play {play} not found in game {game_id}")]
    NotFound { game_id: String, play: String },
    #[error("game {game_id} has no plays yet")]
    NoPlays { game_id: String },
    #[error("possessing team {team} is neither {home} nor {away}")]
    UnknownPossession {
        team: String,
        home: String,
        away: String,
    },
    #[error("quarter {0} is outside the game")]
    UnknownQuarter(i64),
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("classifier artifact missing: {}", path.display())]
    MissingArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("classifier artifact {} is invalid: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },
    #[error("model expects {model} features but the column list has {columns}")]
    WidthMismatch { model: usize, columns: usize },
    #[error("no game situation loaded; update game data first")]
    NoSnapshot,
}
