use tracing::debug;

use crate::error::PlayError;
use crate::historical::HistoricalPlay;
use crate::live::LivePlay;
use crate::ordinal::ordinal;

/// nflverse play ids that never carry a snap: 0 is unused/kickoff placeholder,
/// 1 marks the start of the game. Real plays start above these.
pub const RESERVED_PLAY_IDS: [i64; 2] = [0, 1];

pub const NO_DOWN: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIndex {
    Latest,
    /// Live: position in the play list. Historical: the row's `play_id`.
    At(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Live,
    Historical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PossessionRef {
    Code(String),
    Reference(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPlayFields {
    pub label: String,
    pub quarter: i64,
    pub clock_seconds: f64,
    pub down: i64,
    pub distance: i64,
    pub yards_to_endzone: i64,
    pub home_score: i64,
    pub away_score: i64,
    pub possession: Option<PossessionRef>,
    pub down_distance_text: Option<String>,
    pub following_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowingPlay {
    Known(String),
    NotYetHappened,
}

pub trait PlaySource {
    fn kind(&self) -> SourceKind;
    fn game_id(&self) -> &str;
    fn locate(&self, index: PlayIndex) -> Result<usize, PlayError>;
    fn fields(&self, pos: usize) -> RawPlayFields;
    fn following(&self, pos: usize) -> FollowingPlay;
}

/// Play list of one live game, fetched once per update so the current play and
/// its successor always come from the same list.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveGame {
    pub game_id: String,
    pub plays: Vec<LivePlay>,
}

impl PlaySource for LiveGame {
    fn kind(&self) -> SourceKind {
        SourceKind::Live
    }

    fn game_id(&self) -> &str {
        &self.game_id
    }

    fn locate(&self, index: PlayIndex) -> Result<usize, PlayError> {
        if self.plays.is_empty() {
            return Err(PlayError::NoPlays {
                game_id: self.game_id.clone(),
            });
        }
        let pos = match index {
            PlayIndex::Latest => self.plays.len() - 1,
            PlayIndex::At(i) => usize::try_from(i)
                .ok()
                .filter(|p| *p < self.plays.len())
                .ok_or_else(|| PlayError::NotFound {
                    game_id: self.game_id.clone(),
                    play: i.to_string(),
                })?,
        };
        debug!(game_id = %self.game_id, pos, total = self.plays.len(), "located live play");
        Ok(pos)
    }

    fn fields(&self, pos: usize) -> RawPlayFields {
        let play = &self.plays[pos];
        RawPlayFields {
            label: play.id.clone(),
            quarter: play.period,
            clock_seconds: play.clock_seconds,
            down: play.end.down,
            distance: play.end.distance,
            yards_to_endzone: play.end.yards_to_endzone,
            home_score: play.home_score,
            away_score: play.away_score,
            possession: play
                .possession_ref()
                .map(|r| PossessionRef::Reference(r.to_string())),
            down_distance_text: Some(play.end.down_distance_text.clone()),
            following_text: self
                .plays
                .get(pos + 1)
                .map(|next| next.text.clone())
                .filter(|text| !text.is_empty()),
        }
    }

    fn following(&self, pos: usize) -> FollowingPlay {
        match self.plays.get(pos + 1) {
            Some(next) => FollowingPlay::Known(next.type_text.clone()),
            None => FollowingPlay::NotYetHappened,
        }
    }
}

/// Rows of one historical game in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalGame {
    pub game_id: String,
    pub rows: Vec<HistoricalPlay>,
}

impl HistoricalGame {
    pub fn from_week_rows(game_id: &str, rows: &[HistoricalPlay]) -> Self {
        Self {
            game_id: game_id.to_string(),
            rows: rows
                .iter()
                .filter(|r| r.game_id == game_id)
                .cloned()
                .collect(),
        }
    }

    pub fn play_options(&self) -> Vec<(i64, String)> {
        self.rows
            .iter()
            .filter(|r| r.is_selectable() && !RESERVED_PLAY_IDS.contains(&r.play_id))
            .filter_map(|r| {
                let qtr = r.qtr?;
                let posteam = r.posteam.as_deref()?;
                let down = r.down? as i64;
                let ydstogo = r.ydstogo? as i64;
                Some((
                    r.play_id,
                    format!("{qtr}Q {posteam} - {} & {ydstogo}", ordinal(down)),
                ))
            })
            .collect()
    }
}

impl PlaySource for HistoricalGame {
    fn kind(&self) -> SourceKind {
        SourceKind::Historical
    }

    fn game_id(&self) -> &str {
        &self.game_id
    }

    fn locate(&self, index: PlayIndex) -> Result<usize, PlayError> {
        if self.rows.is_empty() {
            return Err(PlayError::NoPlays {
                game_id: self.game_id.clone(),
            });
        }
        // Archive ids are sparse, so match the stored id instead of the position.
        match index {
            PlayIndex::Latest => Ok(self.rows.len() - 1),
            PlayIndex::At(play_id) => self
                .rows
                .iter()
                .position(|r| r.play_id == play_id)
                .ok_or_else(|| PlayError::NotFound {
                    game_id: self.game_id.clone(),
                    play: play_id.to_string(),
                }),
        }
    }

    fn fields(&self, pos: usize) -> RawPlayFields {
        let row = &self.rows[pos];
        let down = if RESERVED_PLAY_IDS.contains(&row.play_id) {
            NO_DOWN
        } else {
            row.down.map(|d| d as i64).unwrap_or(NO_DOWN)
        };
        let pos_score = row.posteam_score.unwrap_or(0.0) as i64;
        let def_score = row.defteam_score.unwrap_or(0.0) as i64;
        let pos_is_home = row.posteam.as_deref() == Some(row.home_team.as_str());
        let (home_score, away_score) = if pos_is_home {
            (pos_score, def_score)
        } else {
            (def_score, pos_score)
        };
        RawPlayFields {
            label: row.play_id.to_string(),
            quarter: row.qtr.unwrap_or(0),
            clock_seconds: row.clock_seconds().unwrap_or(0.0),
            down,
            distance: row.ydstogo.unwrap_or(0.0).round() as i64,
            yards_to_endzone: row.yardline_100.unwrap_or(0.0).round() as i64,
            home_score,
            away_score,
            possession: row.posteam.clone().map(PossessionRef::Code),
            down_distance_text: None,
            following_text: row.desc.clone(),
        }
    }

    fn following(&self, pos: usize) -> FollowingPlay {
        match self.rows[pos].play_type.as_deref() {
            Some(kind) if !kind.is_empty() => FollowingPlay::Known(kind.to_string()),
            _ => FollowingPlay::NotYetHappened,
        }
    }
}
