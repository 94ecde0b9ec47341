use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;

const CACHE_DIR: &str = "playcall_terminal";

pub const DEFAULT_SCOREBOARD_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard";
pub const DEFAULT_PLAYS_URL: &str = "https://sports.core.api.espn.com/v2/sports/football/leagues/nfl/events/{game_id}/competitions/{game_id}/plays?limit=300";
pub const DEFAULT_PBP_URL: &str = "https://github.com/nflverse/nflverse-data/releases/download/pbp/play_by_play_{season}.parquet";
pub const DEFAULT_LOGO_URL: &str = "https://a.espncdn.com/i/teamlogos/nfl/500/{team}.png";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scoreboard_url: String,
    pub plays_url: String,
    pub pbp_url: String,
    pub logo_url: String,
    pub season: i32,
    pub week1_end: NaiveDate,
    pub model_path: PathBuf,
    pub features_path: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scoreboard_url: DEFAULT_SCOREBOARD_URL.to_string(),
            plays_url: DEFAULT_PLAYS_URL.to_string(),
            pbp_url: DEFAULT_PBP_URL.to_string(),
            logo_url: DEFAULT_LOGO_URL.to_string(),
            season: 2023,
            week1_end: NaiveDate::from_ymd_opt(2023, 9, 12).unwrap_or_default(),
            model_path: PathBuf::from("model/forest.json"),
            features_path: PathBuf::from("data/feature_cols.json"),
            http_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Reads `PLAYCALL_*` variables, falling back to defaults for anything
    /// unset or unparsable. Call after dotenvy has loaded `.env` files.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            scoreboard_url: string_env("PLAYCALL_SCOREBOARD_URL").unwrap_or(d.scoreboard_url),
            plays_url: string_env("PLAYCALL_PLAYS_URL").unwrap_or(d.plays_url),
            pbp_url: string_env("PLAYCALL_PBP_URL").unwrap_or(d.pbp_url),
            logo_url: string_env("PLAYCALL_LOGO_URL").unwrap_or(d.logo_url),
            season: string_env("PLAYCALL_SEASON")
                .and_then(|val| val.parse::<i32>().ok())
                .unwrap_or(d.season)
                .clamp(1999, 2100),
            week1_end: string_env("PLAYCALL_WEEK1_END")
                .and_then(|val| NaiveDate::parse_from_str(&val, "%Y-%m-%d").ok())
                .unwrap_or(d.week1_end),
            model_path: string_env("PLAYCALL_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.model_path),
            features_path: string_env("PLAYCALL_FEATURES_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.features_path),
            http_timeout_secs: string_env("PLAYCALL_HTTP_TIMEOUT_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(d.http_timeout_secs)
                .clamp(2, 120),
        }
    }

    pub fn plays_url_for(&self, game_id: &str) -> String {
        self.plays_url.replace("{game_id}", game_id)
    }

    pub fn pbp_url_for(&self, season: i32) -> String {
        self.pbp_url.replace("{season}", &season.to_string())
    }

    pub fn logo_url_for(&self, team: &str) -> String {
        self.logo_url.replace("{team}", &team.to_ascii_lowercase())
    }
}

fn string_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}
