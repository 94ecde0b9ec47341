use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::historical::{HistoricalPlay, HistoricalProvider};
use crate::live::{LiveProvider, split_short_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelector {
    Live,
    Week(u32),
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelector::Live => write!(f, "Live"),
            SourceSelector::Week(week) => write!(f, "Week {week}"),
        }
    }
}

impl FromStr for SourceSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("live") {
            return Ok(SourceSelector::Live);
        }
        let week = s
            .strip_prefix("Week")
            .or_else(|| s.strip_prefix("week"))
            .map(str::trim)
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| anyhow!("unknown source {s:?}"))?;
        Ok(SourceSelector::Week(week))
    }
}

/// `Live` followed by every week already played. The week after `week1_end`
/// (the Tuesday closing week 1) is week 2.
pub fn week_options(today: NaiveDate, week1_end: NaiveDate) -> Vec<SourceSelector> {
    let days = (today - week1_end).num_days();
    let current_week = days.div_euclid(7) + 2;
    let mut out = vec![SourceSelector::Live];
    out.extend((1..current_week.max(1)).map(|w| SourceSelector::Week(w as u32)));
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDescriptor {
    pub name: String,
    pub id: String,
    pub home: String,
    pub away: String,
    pub week: u32,
}

impl GameDescriptor {
    pub fn teams(&self) -> (&str, &str) {
        (&self.home, &self.away)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    Live,
    Historical(Vec<HistoricalPlay>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub source: SourceSelector,
    pub games: Vec<GameDescriptor>,
    pub week: u32,
    pub data: RawData,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn team_pairs(&self) -> Vec<(String, String)> {
        self.games
            .iter()
            .map(|g| (g.home.clone(), g.away.clone()))
            .collect()
    }
}

/// Lists the games a source offers. No qualifying games is an empty catalog,
/// not an error; provider failures are errors.
pub fn load_catalog(
    source: SourceSelector,
    season: i32,
    live: &dyn LiveProvider,
    historical: &dyn HistoricalProvider,
) -> Result<Catalog> {
    let catalog = match source {
        SourceSelector::Live => live_catalog(live)?,
        SourceSelector::Week(week) => {
            let table = historical.season(season)?;
            historical_catalog(week, table.week_rows(week))
        }
    };
    info!(source = %source, games = catalog.games.len(), week = catalog.week, "catalog loaded");
    Ok(catalog)
}

fn live_catalog(live: &dyn LiveProvider) -> Result<Catalog> {
    let board = live.scoreboard()?;
    let mut games = Vec::new();
    for game in &board.games {
        if !game.state.has_started() {
            continue;
        }
        let Some((home, away)) = split_short_name(&game.short_name) else {
            debug!(game_id = %game.id, name = %game.short_name, "skipping game without team codes");
            continue;
        };
        games.push(GameDescriptor {
            name: game.short_name.clone(),
            id: game.id.clone(),
            home,
            away,
            week: game.week.or(board.week).unwrap_or(0),
        });
    }
    let week = board
        .week
        .or_else(|| games.first().map(|g| g.week))
        .unwrap_or(0);
    Ok(Catalog {
        source: SourceSelector::Live,
        games,
        week,
        data: RawData::Live,
    })
}

pub fn historical_catalog(week: u32, rows: Vec<HistoricalPlay>) -> Catalog {
    let mut seen = HashSet::new();
    let mut games = Vec::new();
    for row in &rows {
        let key = (row.home_team.as_str(), row.away_team.as_str(), row.game_id.as_str());
        if !seen.insert(key) {
            continue;
        }
        games.push(GameDescriptor {
            name: format!("{} @ {}", row.away_team, row.home_team),
            id: row.game_id.clone(),
            home: row.home_team.clone(),
            away: row.away_team.clone(),
            week,
        });
    }
    Catalog {
        source: SourceSelector::Week(week),
        games,
        week,
        data: RawData::Historical(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn selector_round_trips_text() {
        assert_eq!("Live".parse::<SourceSelector>().ok(), Some(SourceSelector::Live));
        assert_eq!(
            "Week 12".parse::<SourceSelector>().ok(),
            Some(SourceSelector::Week(12))
        );
        assert_eq!(SourceSelector::Week(3).to_string(), "Week 3");
        assert!("Week 0".parse::<SourceSelector>().is_err());
        assert!("Preseason".parse::<SourceSelector>().is_err());
    }

    #[test]
    fn week_options_before_week_one_ends() {
        let opts = week_options(date(2023, 9, 10), date(2023, 9, 12));
        assert_eq!(opts, vec![SourceSelector::Live]);
    }

    #[test]
    fn week_options_mid_season() {
        // 15 days after the week 1 Tuesday: current week is 4.
        let opts = week_options(date(2023, 9, 27), date(2023, 9, 12));
        assert_eq!(
            opts,
            vec![
                SourceSelector::Live,
                SourceSelector::Week(1),
                SourceSelector::Week(2),
                SourceSelector::Week(3),
            ]
        );
    }

    #[test]
    fn historical_catalog_dedups_in_first_seen_order() {
        let row = |game: &str, home: &str, away: &str| HistoricalPlay {
            game_id: game.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            week: 1,
            ..HistoricalPlay::default()
        };
        let rows = vec![
            row("g2", "KC", "DET"),
            row("g1", "BUF", "NYJ"),
            row("g2", "KC", "DET"),
            row("g1", "BUF", "NYJ"),
        ];
        let catalog = historical_catalog(1, rows);
        let ids: Vec<&str> = catalog.games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g2", "g1"]);
        assert_eq!(catalog.games[0].name, "DET @ KC");
        assert_eq!(
            catalog.team_pairs(),
            vec![
                ("KC".to_string(), "DET".to_string()),
                ("BUF".to_string(), "NYJ".to_string())
            ]
        );
    }

    #[test]
    fn historical_catalog_for_empty_week() {
        let catalog = historical_catalog(18, Vec::new());
        assert!(catalog.is_empty());
        assert_eq!(catalog.week, 18);
    }
}
