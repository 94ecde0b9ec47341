use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};

use playcall_terminal::catalog::{SourceSelector, load_catalog};
use playcall_terminal::config::AppConfig;
use playcall_terminal::error::{PlayError, PredictError};
use playcall_terminal::historical::{HistoricalPlay, HistoricalProvider, SeasonTable};
use playcall_terminal::live::{
    LivePlay, LiveProvider, Scoreboard, TeamDetail, parse_plays_json, parse_scoreboard_json,
    parse_team_json,
};
use playcall_terminal::locator::{FollowingPlay, PlayIndex, SourceKind};
use playcall_terminal::prediction::{PlayCategory, Predictor, Verdict};
use playcall_terminal::session::{Providers, Session, UpdateOutcome};
use playcall_terminal::state::{AppState, INVALID_PLAY, NO_LIVE_GAMES, Notice};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

fn predictor() -> Predictor {
    Predictor::load(&fixture_path("forest.json"), &fixture_path("feature_cols.json"))
        .expect("artifacts should load")
}

struct FakeLive {
    scoreboard: String,
    plays_calls: Cell<usize>,
}

impl FakeLive {
    fn from_fixtures() -> Self {
        Self {
            scoreboard: read_fixture("espn_scoreboard.json"),
            plays_calls: Cell::new(0),
        }
    }

    fn nothing_started() -> Self {
        Self {
            scoreboard: r#"{"week": {"number": 6}, "events": [
                {"id": "1", "shortName": "MIA @ NE", "status": {"type": {"state": "pre", "completed": false}}},
                {"id": "2", "shortName": "LV @ KC", "status": {"type": {"state": "post", "completed": false, "name": "STATUS_POSTPONED"}}}
            ]}"#
            .to_string(),
            plays_calls: Cell::new(0),
        }
    }
}

impl LiveProvider for FakeLive {
    fn scoreboard(&self) -> Result<Scoreboard> {
        parse_scoreboard_json(&self.scoreboard)
    }

    fn plays(&self, game_id: &str) -> Result<Vec<LivePlay>> {
        self.plays_calls.set(self.plays_calls.get() + 1);
        if game_id != "401547401" {
            return Ok(Vec::new());
        }
        parse_plays_json(&read_fixture("espn_plays.json"))
    }

    fn team(&self, reference: &str) -> Result<TeamDetail> {
        if reference.ends_with("/teams/2") {
            parse_team_json(&read_fixture("espn_team.json"))
        } else if reference.ends_with("/teams/20") {
            parse_team_json(r#"{"abbreviation": "NYJ", "logos": [{"href": "nyj.png"}]}"#)
        } else {
            Err(anyhow!("unknown team {reference}"))
        }
    }
}

struct FakeHistorical {
    table: Arc<SeasonTable>,
}

impl HistoricalProvider for FakeHistorical {
    fn season(&self, season: i32) -> Result<Arc<SeasonTable>> {
        if season != self.table.season {
            return Err(anyhow!("season {season} not available"));
        }
        Ok(Arc::clone(&self.table))
    }
}

fn row(game_id: &str, play_id: i64, week: u32, home: &str, away: &str) -> HistoricalPlay {
    HistoricalPlay {
        game_id: game_id.to_string(),
        play_id,
        week,
        home_team: home.to_string(),
        away_team: away.to_string(),
        ..HistoricalPlay::default()
    }
}

fn down_row(
    play_id: i64,
    down: f64,
    ydstogo: f64,
    yardline_100: f64,
    game_seconds: f64,
    play_type: &str,
) -> HistoricalPlay {
    HistoricalPlay {
        qtr: Some(1),
        posteam: Some("BUF".to_string()),
        desc: Some(format!("({play_id}) {play_type} play")),
        yardline_100: Some(yardline_100),
        game_seconds_remaining: Some(game_seconds),
        down: Some(down),
        ydstogo: Some(ydstogo),
        posteam_score: Some(0.0),
        defteam_score: Some(0.0),
        play_type: Some(play_type.to_string()),
        ..row("2023_01_NYJ_BUF", play_id, 1, "BUF", "NYJ")
    }
}

fn season_2023() -> FakeHistorical {
    let rows = vec![
        row("2023_01_NYJ_BUF", 1, 1, "BUF", "NYJ"),
        HistoricalPlay {
            qtr: Some(1),
            posteam: Some("NYJ".to_string()),
            play_type: Some("kickoff".to_string()),
            ..row("2023_01_NYJ_BUF", 43, 1, "BUF", "NYJ")
        },
        down_row(68, 1.0, 10.0, 75.0, 3600.0, "pass"),
        down_row(92, 3.0, 1.0, 40.0, 3520.0, "run"),
        HistoricalPlay {
            qtr: Some(1),
            posteam: Some("DAL".to_string()),
            down: Some(1.0),
            ydstogo: Some(10.0),
            yardline_100: Some(70.0),
            game_seconds_remaining: Some(3600.0),
            play_type: Some("run".to_string()),
            ..row("2023_01_DAL_PHI", 55, 1, "PHI", "DAL")
        },
        row("2023_02_BUF_MIA", 40, 2, "MIA", "BUF"),
    ];
    FakeHistorical {
        table: Arc::new(SeasonTable { season: 2023, rows }),
    }
}

#[test]
fn historical_first_down_end_to_end() {
    let live = FakeLive::from_fixtures();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut session = Session::new();
    let games = session
        .select_source(SourceSelector::Week(1), providers)
        .expect("week 1 should load");
    assert_eq!(games, 2);
    let game = session.selected_game().expect("first game selected");
    assert_eq!(game.name, "NYJ @ BUF");
    assert_eq!(game.teams(), ("BUF", "NYJ"));

    let options = session.play_options();
    let ids: Vec<i64> = options.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![68, 92]);
    assert_eq!(options[0].1, "1Q BUF - 1st & 10");
    assert_eq!(options[1].1, "1Q BUF - 3rd & 1");

    let outcome = session.update(providers).expect("update should succeed");
    assert_eq!(outcome, UpdateOutcome::Updated);

    let play = session.current.as_ref().expect("snapshot built");
    assert_eq!(play.kind, SourceKind::Historical);
    assert_eq!(play.snapshot.week, 1);
    assert_eq!(play.snapshot.down, 1);
    assert_eq!(play.snapshot.ydstogo, 10);
    assert_eq!(play.snapshot.yardline_100, 75);
    assert_eq!(play.snapshot.goal_to_go, 0);
    assert_eq!(play.snapshot.is_pos_home, 1);
    assert_eq!(play.snapshot.game_seconds_remaining, 3600);
    assert_eq!(play.snapshot.half_seconds_remaining, 1800);
    assert_eq!(play.possessing_team, "BUF");
    assert_eq!(play.defending_team, "NYJ");
    assert_eq!(
        play.logo.as_deref(),
        Some("https://a.espncdn.com/i/teamlogos/nfl/500/buf.png")
    );
    assert_eq!(play.following, FollowingPlay::Known("pass".to_string()));
    assert_eq!(play.following_text.as_deref(), Some("(68) pass play"));

    let text = session.text.as_ref().expect("text built");
    assert_eq!(text.score_line, "NYJ 0  BUF 0");
    assert_eq!(text.clock_line, "15:00 1Q");
    assert_eq!(text.down_line, "1st & 10");

    let result = session.predict(&predictor()).expect("prediction available");
    assert_eq!(result.label, "pass");
    assert_eq!(result.actual, PlayCategory::Pass);
    assert_eq!(result.verdict, Verdict::Correct);
}

#[test]
fn historical_short_yardage_predicts_run() {
    let live = FakeLive::from_fixtures();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut session = Session::new();
    session
        .select_source(SourceSelector::Week(1), providers)
        .expect("week 1 should load");
    session.select_play(PlayIndex::At(92));
    session.update(providers).expect("update should succeed");

    let text = session.text.as_ref().expect("text built");
    assert_eq!(text.down_line, "3rd & 1");
    assert_eq!(text.clock_line, "13:40 1Q");

    let result = session.predict(&predictor()).expect("prediction available");
    assert_eq!(result.label, "run");
    assert_eq!(result.verdict, Verdict::Correct);
}

#[test]
fn non_down_never_reaches_prediction() {
    let live = FakeLive::from_fixtures();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut session = Session::new();
    session
        .select_source(SourceSelector::Week(1), providers)
        .expect("week 1 should load");
    session.update(providers).expect("update should succeed");
    assert!(session.current.is_some());

    for play_id in [43, 1] {
        session.select_play(PlayIndex::At(play_id));
        let outcome = session.update(providers).expect("update should not error");
        assert_eq!(
            outcome,
            UpdateOutcome::Invalid(PlayError::NotADown {
                play: play_id.to_string()
            })
        );
        assert!(session.current.is_none());
        assert!(session.text.is_none());
        assert!(matches!(
            session.predict(&predictor()),
            Err(PredictError::NoSnapshot)
        ));
    }

    session.select_play(PlayIndex::At(9999));
    let outcome = session.update(providers).expect("update should not error");
    assert!(matches!(
        outcome,
        UpdateOutcome::Invalid(PlayError::NotFound { .. })
    ));
}

#[test]
fn live_latest_play_is_pending() {
    let live = FakeLive::from_fixtures();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut session = Session::new();
    let games = session
        .select_source(SourceSelector::Live, providers)
        .expect("live should load");
    assert_eq!(games, 2);
    let names: Vec<&str> = session
        .catalog
        .as_ref()
        .expect("catalog loaded")
        .games
        .iter()
        .map(|g| g.name.as_str())
        .collect();
    assert_eq!(names, vec!["NYJ @ BUF", "DAL @ PHI"]);
    assert!(session.play_options().is_empty());

    let outcome = session.update(providers).expect("update should succeed");
    assert_eq!(outcome, UpdateOutcome::Updated);
    assert_eq!(live.plays_calls.get(), 1);

    let play = session.current.as_ref().expect("snapshot built");
    assert_eq!(play.kind, SourceKind::Live);
    assert_eq!(play.snapshot.week, 6);
    assert_eq!(play.snapshot.down, 1);
    assert_eq!(play.snapshot.yardline_100, 55);
    assert_eq!(play.snapshot.posteam_score, 7);
    assert_eq!(play.snapshot.defteam_score, 3);
    assert_eq!(play.snapshot.game_seconds_remaining, 801 + 2700);
    assert_eq!(play.following, FollowingPlay::NotYetHappened);
    assert_eq!(
        play.logo.as_deref(),
        Some("https://a.espncdn.com/i/teamlogos/nfl/500-dark/buf.png")
    );

    let text = session.text.as_ref().expect("text built");
    assert_eq!(text.score_line, "NYJ 3  BUF 7");
    assert_eq!(text.clock_line, "13:21 1Q");
    assert_eq!(text.down_line, "1st & 10 at BUF 45");

    let result = session.predict(&predictor()).expect("prediction available");
    assert_eq!(result.actual, PlayCategory::NotYetHappened);
    assert_eq!(result.verdict, Verdict::Pending);
}

#[test]
fn live_earlier_play_knows_what_followed() {
    let live = FakeLive::from_fixtures();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut session = Session::new();
    session
        .select_source(SourceSelector::Live, providers)
        .expect("live should load");

    session.select_play(PlayIndex::At(1));
    session.update(providers).expect("update should succeed");
    let play = session.current.as_ref().expect("snapshot built");
    assert_eq!(play.possessing_team, "NYJ");
    assert_eq!(play.snapshot.is_pos_home, 0);
    assert_eq!(
        play.following,
        FollowingPlay::Known("Pass Reception".to_string())
    );
    assert_eq!(
        play.following_text.as_deref(),
        Some("J.Allen pass short right to S.Diggs to BUF 45 for 12 yards.")
    );

    session.select_play(PlayIndex::At(0));
    let outcome = session.update(providers).expect("update should not error");
    assert!(matches!(
        outcome,
        UpdateOutcome::Invalid(PlayError::NotADown { .. })
    ));
}

#[test]
fn postponed_games_are_not_listed() {
    let live = FakeLive::nothing_started();
    let historical = season_2023();
    let catalog = load_catalog(SourceSelector::Live, 2023, &live, &historical)
        .expect("live should load");
    assert!(catalog.is_empty());
}

#[test]
fn empty_sources_are_not_errors() {
    let live = FakeLive::nothing_started();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut session = Session::new();
    assert_eq!(
        session
            .select_source(SourceSelector::Live, providers)
            .expect("live should load"),
        0
    );
    assert!(session.selected_game().is_none());
    assert_eq!(
        session
            .select_source(SourceSelector::Week(9), providers)
            .expect("week 9 should load"),
        0
    );
    assert!(session.update(providers).is_err());
}

#[test]
fn unavailable_season_is_an_error() {
    let live = FakeLive::from_fixtures();
    let historical = season_2023();
    let config = AppConfig {
        season: 2019,
        ..AppConfig::default()
    };
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };
    let mut session = Session::new();
    assert!(session.select_source(SourceSelector::Week(1), providers).is_err());
}

#[test]
fn app_state_surfaces_user_messages() {
    let live = FakeLive::nothing_started();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut state = AppState::new(vec![SourceSelector::Live, SourceSelector::Week(1)]);
    state.load_source(providers);
    assert_eq!(state.notice, Some(Notice::Warn(NO_LIVE_GAMES.to_string())));

    state.select_next();
    state.load_source(providers);
    assert_eq!(state.game_names(), vec!["NYJ @ BUF", "DAL @ PHI"]);

    state.choose_game();
    state.select_next();
    state.update(providers);
    let text = state.session.text.as_ref().expect("text built");
    assert_eq!(text.down_line, "3rd & 1");

    let missing: Result<Predictor, PredictError> =
        Predictor::load(&fixture_path("missing.json"), &fixture_path("feature_cols.json"));
    state.predict(&missing);
    assert!(matches!(&state.notice, Some(Notice::Warn(t)) if t.starts_with("Prediction unavailable")));

    state.predict(&Ok(predictor()));
    assert_eq!(state.notice, Some(Notice::Info("PREDICTION: RUN".to_string())));
    assert_eq!(
        state.outcome_line().as_deref(),
        Some("What actually happened: run 🤘")
    );

    state.session.select_play(PlayIndex::At(43));
    state.focus_prev();
    state.update(providers);
    assert!(matches!(&state.notice, Some(Notice::Warn(t)) if t.starts_with(INVALID_PLAY)));
    assert!(state.logs.iter().any(|l| l.starts_with("[WARN]")));
}

#[test]
fn failed_source_keeps_cursors() {
    let live = FakeLive::from_fixtures();
    let historical = season_2023();
    let config = AppConfig::default();
    let providers = Providers {
        live: &live,
        historical: &historical,
        config: &config,
    };

    let mut state = AppState::new(vec![SourceSelector::Week(1)]);
    state.load_source(providers);
    state.select_next();
    assert_eq!(state.game_selected, 1);

    let stale_season = AppConfig {
        season: 2019,
        ..AppConfig::default()
    };
    state.load_source(Providers {
        config: &stale_season,
        ..providers
    });
    assert!(matches!(&state.notice, Some(Notice::Warn(t)) if t.contains("unavailable")));
    assert_eq!(state.game_selected, 1);
    assert_eq!(state.game_names(), vec!["NYJ @ BUF", "DAL @ PHI"]);
}
