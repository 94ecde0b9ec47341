use anyhow::Result;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::PlayError;
use crate::historical::QUARTER_SECONDS;
use crate::live::{LiveProvider, TeamDetail};
use crate::locator::{FollowingPlay, NO_DOWN, PossessionRef, RawPlayFields, SourceKind};
use crate::ordinal::ordinal;

pub const OVERTIME: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SituationSnapshot {
    pub week: u32,
    pub yardline_100: i64,
    pub half_seconds_remaining: i64,
    pub game_seconds_remaining: i64,
    pub down: i64,
    pub goal_to_go: u8,
    pub ydstogo: i64,
    pub posteam_score: i64,
    pub defteam_score: i64,
    pub is_pos_home: u8,
}

impl SituationSnapshot {
    pub const FEATURE_NAMES: [&'static str; 10] = [
        "week",
        "yardline_100",
        "half_seconds_remaining",
        "game_seconds_remaining",
        "down",
        "goal_to_go",
        "ydstogo",
        "posteam_score",
        "defteam_score",
        "is_pos_home",
    ];

    pub fn features(&self) -> [(&'static str, f64); 10] {
        let values = [
            f64::from(self.week),
            self.yardline_100 as f64,
            self.half_seconds_remaining as f64,
            self.game_seconds_remaining as f64,
            self.down as f64,
            f64::from(self.goal_to_go),
            self.ydstogo as f64,
            self.posteam_score as f64,
            self.defteam_score as f64,
            f64::from(self.is_pos_home),
        ];
        std::array::from_fn(|i| (Self::FEATURE_NAMES[i], values[i]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPlay {
    pub snapshot: SituationSnapshot,
    pub kind: SourceKind,
    pub play_label: String,
    pub home_team: String,
    pub away_team: String,
    pub possessing_team: String,
    pub defending_team: String,
    pub quarter: i64,
    pub clock_seconds: i64,
    pub logo: Option<String>,
    pub down_text: String,
    pub following: FollowingPlay,
    pub following_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Ready(Box<NormalizedPlay>),
    Invalid(PlayError),
}

#[derive(Debug, Clone, Copy)]
pub struct PlayContext<'a> {
    pub kind: SourceKind,
    pub week: u32,
    pub home: &'a str,
    pub away: &'a str,
}

pub trait TeamResolver {
    fn resolve(&self, possession: &PossessionRef) -> Result<TeamDetail>;
}

pub struct ProviderTeams<'a> {
    pub live: &'a dyn LiveProvider,
    pub config: &'a AppConfig,
}

impl TeamResolver for ProviderTeams<'_> {
    fn resolve(&self, possession: &PossessionRef) -> Result<TeamDetail> {
        match possession {
            PossessionRef::Code(code) => Ok(TeamDetail {
                abbreviation: code.clone(),
                logo: Some(self.config.logo_url_for(code)),
            }),
            PossessionRef::Reference(reference) => self.live.team(reference),
        }
    }
}

pub fn game_seconds_remaining(quarter: i64, clock_seconds: i64) -> i64 {
    if quarter >= OVERTIME {
        return clock_seconds;
    }
    clock_seconds + QUARTER_SECONDS * (4 - quarter)
}

pub fn half_seconds_remaining(quarter: i64, clock_seconds: i64) -> i64 {
    if quarter >= 3 {
        return game_seconds_remaining(quarter, clock_seconds);
    }
    clock_seconds + QUARTER_SECONDS * (2 - quarter)
}

pub fn goal_to_go(ydstogo: i64, yardline_100: i64) -> u8 {
    u8::from(ydstogo >= yardline_100)
}

/// Builds the snapshot for one play. Invalid plays come back as
/// `Normalized::Invalid` before any team lookup happens; only the lookup itself
/// can fail with an error.
pub fn normalize(
    fields: &RawPlayFields,
    following: FollowingPlay,
    ctx: PlayContext<'_>,
    teams: &dyn TeamResolver,
) -> Result<Normalized> {
    if fields.down == NO_DOWN {
        warn!(play = %fields.label, "invalid play: not a down");
        return Ok(Normalized::Invalid(PlayError::NotADown {
            play: fields.label.clone(),
        }));
    }
    if fields.quarter < 1 {
        warn!(play = %fields.label, quarter = fields.quarter, "invalid play: bad quarter");
        return Ok(Normalized::Invalid(PlayError::UnknownQuarter(fields.quarter)));
    }
    let Some(possession) = fields.possession.as_ref() else {
        warn!(play = %fields.label, "invalid play: no possessing team");
        return Ok(Normalized::Invalid(PlayError::UnknownPossession {
            team: String::new(),
            home: ctx.home.to_string(),
            away: ctx.away.to_string(),
        }));
    };

    let quarter = fields.quarter;
    let clock_seconds = fields.clock_seconds.round().max(0.0) as i64;
    let game_secs = game_seconds_remaining(quarter, clock_seconds);
    let half_secs = half_seconds_remaining(quarter, clock_seconds);

    let team = teams.resolve(possession)?;
    let possessing_team = team.abbreviation;
    let defending_team = if possessing_team == ctx.home {
        ctx.away
    } else if possessing_team == ctx.away {
        ctx.home
    } else {
        warn!(play = %fields.label, team = %possessing_team, "invalid play: unknown possession");
        return Ok(Normalized::Invalid(PlayError::UnknownPossession {
            team: possessing_team,
            home: ctx.home.to_string(),
            away: ctx.away.to_string(),
        }));
    };
    let is_pos_home = possessing_team == ctx.home;
    let (posteam_score, defteam_score) = if is_pos_home {
        (fields.home_score, fields.away_score)
    } else {
        (fields.away_score, fields.home_score)
    };

    let down_text = match (ctx.kind, fields.down_distance_text.as_deref()) {
        (SourceKind::Live, Some(text)) => text.to_string(),
        _ => format!("{} & {}", ordinal(fields.down), fields.distance),
    };

    let snapshot = SituationSnapshot {
        week: ctx.week,
        yardline_100: fields.yards_to_endzone,
        half_seconds_remaining: half_secs,
        game_seconds_remaining: game_secs,
        down: fields.down,
        goal_to_go: goal_to_go(fields.distance, fields.yards_to_endzone),
        ydstogo: fields.distance,
        posteam_score,
        defteam_score,
        is_pos_home: u8::from(is_pos_home),
    };
    debug!(play = %fields.label, ?snapshot, "snapshot built");

    Ok(Normalized::Ready(Box::new(NormalizedPlay {
        snapshot,
        kind: ctx.kind,
        play_label: fields.label.clone(),
        home_team: ctx.home.to_string(),
        away_team: ctx.away.to_string(),
        possessing_team,
        defending_team: defending_team.to_string(),
        quarter,
        clock_seconds,
        logo: team.logo,
        down_text,
        following,
        following_text: fields.following_text.clone(),
    })))
}
