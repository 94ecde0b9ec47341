use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::http_client::{fetch_text, http_client};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Scheduled,
    InProgress,
    Final,
    /// Postponed or canceled.
    Inactive,
}

impl GameState {
    pub fn has_started(self) -> bool {
        matches!(self, GameState::InProgress | GameState::Final)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveGameSummary {
    pub id: String,
    pub short_name: String,
    pub state: GameState,
    pub week: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scoreboard {
    pub week: Option<u32>,
    pub games: Vec<LiveGameSummary>,
}

/// One entry of the ESPN play list. Situation fields describe the state at the
/// end of the play, i.e. the situation the following snap starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct LivePlay {
    pub id: String,
    pub type_text: String,
    pub text: String,
    pub period: i64,
    pub clock_seconds: f64,
    pub home_score: i64,
    pub away_score: i64,
    pub team_ref: Option<String>,
    pub end: LivePlayEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LivePlayEnd {
    pub down: i64,
    pub distance: i64,
    pub yards_to_endzone: i64,
    pub down_distance_text: String,
    pub team_ref: Option<String>,
}

impl LivePlay {
    /// Team in possession for the next snap; falls back to the team that ran the play.
    pub fn possession_ref(&self) -> Option<&str> {
        self.end
            .team_ref
            .as_deref()
            .or(self.team_ref.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamDetail {
    pub abbreviation: String,
    pub logo: Option<String>,
}

pub trait LiveProvider {
    fn scoreboard(&self) -> Result<Scoreboard>;
    fn plays(&self, game_id: &str) -> Result<Vec<LivePlay>>;
    fn team(&self, reference: &str) -> Result<TeamDetail>;
}

pub struct EspnClient {
    client: &'static Client,
    config: AppConfig,
}

impl EspnClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.http_timeout_secs)?,
            config: config.clone(),
        })
    }
}

impl LiveProvider for EspnClient {
    fn scoreboard(&self) -> Result<Scoreboard> {
        let body = fetch_text(self.client, &self.config.scoreboard_url).context("fetch scoreboard")?;
        parse_scoreboard_json(&body)
    }

    fn plays(&self, game_id: &str) -> Result<Vec<LivePlay>> {
        let url = self.config.plays_url_for(game_id);
        let body = fetch_text(self.client, &url)
            .with_context(|| format!("fetch plays for game {game_id}"))?;
        let plays = parse_plays_json(&body)?;
        debug!(game_id, count = plays.len(), "fetched live plays");
        Ok(plays)
    }

    fn team(&self, reference: &str) -> Result<TeamDetail> {
        let body = fetch_text(self.client, reference).context("fetch team detail")?;
        parse_team_json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct EspnScoreboard {
    #[serde(default)]
    week: Option<EspnWeek>,
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Deserialize)]
struct EspnWeek {
    number: u32,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    id: String,
    #[serde(rename = "shortName")]
    short_name: String,
    #[serde(default)]
    week: Option<EspnWeek>,
    status: EspnStatus,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type")]
    status_type: EspnStatusType,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    #[serde(default)]
    state: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct EspnPlayList {
    #[serde(default)]
    items: Vec<EspnPlay>,
}

#[derive(Debug, Deserialize)]
struct EspnPlay {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    play_type: Option<EspnPlayType>,
    #[serde(default)]
    text: String,
    period: EspnPeriod,
    clock: EspnClock,
    #[serde(rename = "homeScore", default)]
    home_score: i64,
    #[serde(rename = "awayScore", default)]
    away_score: i64,
    #[serde(default)]
    team: Option<EspnRef>,
    end: EspnPlayEnd,
}

#[derive(Debug, Deserialize)]
struct EspnPlayType {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct EspnPeriod {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct EspnClock {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct EspnRef {
    #[serde(rename = "$ref")]
    reference: String,
}

#[derive(Debug, Deserialize)]
struct EspnPlayEnd {
    #[serde(default = "no_down")]
    down: i64,
    #[serde(default)]
    distance: i64,
    #[serde(rename = "yardsToEndzone", default)]
    yards_to_endzone: i64,
    #[serde(rename = "downDistanceText", default)]
    down_distance_text: String,
    #[serde(default)]
    team: Option<EspnRef>,
}

fn no_down() -> i64 {
    -1
}

#[derive(Debug, Deserialize)]
struct EspnTeam {
    abbreviation: String,
    #[serde(default)]
    logos: Vec<EspnLogo>,
}

#[derive(Debug, Deserialize)]
struct EspnLogo {
    href: String,
}

fn is_null_body(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "null"
}

pub fn parse_scoreboard_json(raw: &str) -> Result<Scoreboard> {
    if is_null_body(raw) {
        return Ok(Scoreboard::default());
    }
    let data: EspnScoreboard = serde_json::from_str(raw.trim()).context("invalid scoreboard json")?;
    let week = data.week.map(|w| w.number);
    let games = data
        .events
        .into_iter()
        .map(|event| {
            let state = match event.status.status_type.state.as_str() {
                "in" => GameState::InProgress,
                _ if event.status.status_type.completed => GameState::Final,
                "post" => GameState::Inactive,
                _ => GameState::Scheduled,
            };
            LiveGameSummary {
                id: event.id,
                short_name: event.short_name,
                state,
                week: event.week.map(|w| w.number).or(week),
            }
        })
        .collect();
    Ok(Scoreboard { week, games })
}

pub fn parse_plays_json(raw: &str) -> Result<Vec<LivePlay>> {
    if is_null_body(raw) {
        return Ok(Vec::new());
    }
    let data: EspnPlayList = serde_json::from_str(raw.trim()).context("invalid plays json")?;
    Ok(data
        .items
        .into_iter()
        .map(|p| LivePlay {
            id: p.id,
            type_text: p.play_type.map(|t| t.text).unwrap_or_default(),
            text: p.text,
            period: p.period.number,
            clock_seconds: p.clock.value,
            home_score: p.home_score,
            away_score: p.away_score,
            team_ref: p.team.map(|t| t.reference),
            end: LivePlayEnd {
                down: p.end.down,
                distance: p.end.distance,
                yards_to_endzone: p.end.yards_to_endzone,
                down_distance_text: p.end.down_distance_text,
                team_ref: p.end.team.map(|t| t.reference),
            },
        })
        .collect())
}

pub fn parse_team_json(raw: &str) -> Result<TeamDetail> {
    let data: EspnTeam = serde_json::from_str(raw.trim()).context("invalid team json")?;
    Ok(TeamDetail {
        abbreviation: data.abbreviation,
        logo: data.logos.into_iter().last().map(|l| l.href),
    })
}

/// `"NYJ @ BUF"` lists the away side first. Returns `(home, away)`.
pub fn split_short_name(short_name: &str) -> Option<(String, String)> {
    let (away, home) = short_name.split_once('@')?;
    let (home, away) = (home.trim(), away.trim());
    if home.is_empty() || away.is_empty() {
        return None;
    }
    Some((home.to_string(), away.to_string()))
}
