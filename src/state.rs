use std::collections::VecDeque;

use crate::catalog::SourceSelector;
use crate::error::PredictError;
use crate::locator::{PlayIndex, SourceKind};
use crate::prediction::Predictor;
use crate::session::{Providers, Session, UpdateOutcome};

pub const NO_LIVE_GAMES: &str = "No live games! Try selecting a previous week";
pub const INVALID_PLAY: &str = "Invalid play, try the next one!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sources,
    Games,
    Plays,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warn(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Warn(text) => text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub focus: Focus,
    pub sources: Vec<SourceSelector>,
    pub source_selected: usize,
    pub game_selected: usize,
    pub play_selected: usize,
    pub session: Session,
    pub notice: Option<Notice>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(sources: Vec<SourceSelector>) -> Self {
        Self {
            focus: Focus::Sources,
            sources,
            source_selected: 0,
            game_selected: 0,
            play_selected: 0,
            session: Session::new(),
            notice: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn notify(&mut self, notice: Notice) {
        let line = match &notice {
            Notice::Info(text) => format!("[INFO] {text}"),
            Notice::Warn(text) => format!("[WARN] {text}"),
        };
        self.push_log(line);
        self.notice = Some(notice);
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Sources => Focus::Games,
            Focus::Games => Focus::Plays,
            Focus::Plays => Focus::Plays,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focus::Sources => Focus::Sources,
            Focus::Games => Focus::Sources,
            Focus::Plays => Focus::Games,
        };
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            Focus::Sources => self.sources.len(),
            Focus::Games => self.game_names().len(),
            Focus::Plays => self.session.play_options().len(),
        }
    }

    fn focused_cursor(&mut self) -> &mut usize {
        match self.focus {
            Focus::Sources => &mut self.source_selected,
            Focus::Games => &mut self.game_selected,
            Focus::Plays => &mut self.play_selected,
        }
    }

    pub fn select_next(&mut self) {
        let len = self.focused_len();
        let cursor = self.focused_cursor();
        if len > 0 && *cursor + 1 < len {
            *cursor += 1;
        }
    }

    pub fn select_prev(&mut self) {
        let cursor = self.focused_cursor();
        *cursor = cursor.saturating_sub(1);
    }

    pub fn game_names(&self) -> Vec<&str> {
        self.session
            .catalog
            .as_ref()
            .map(|c| c.games.iter().map(|g| g.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn is_live(&self) -> bool {
        self.session.source() == Some(SourceSelector::Live)
    }

    pub fn activate(&mut self, providers: Providers<'_>) {
        match self.focus {
            Focus::Sources => self.load_source(providers),
            Focus::Games => self.choose_game(),
            Focus::Plays => self.choose_play(),
        }
    }

    pub fn load_source(&mut self, providers: Providers<'_>) {
        let Some(source) = self.sources.get(self.source_selected).copied() else {
            return;
        };
        let result = self.session.select_source(source, providers);
        if result.is_ok() {
            self.game_selected = 0;
            self.play_selected = 0;
        }
        match result {
            Ok(0) => {
                let text = match source {
                    SourceSelector::Live => NO_LIVE_GAMES.to_string(),
                    SourceSelector::Week(week) => format!("No games found for Week {week}"),
                };
                self.notify(Notice::Warn(text));
            }
            Ok(n) => {
                self.notify(Notice::Info(format!("{source}: {n} games")));
                self.focus = Focus::Games;
            }
            Err(err) => self.notify(Notice::Warn(format!("{source} unavailable: {err:#}"))),
        }
    }

    pub fn choose_game(&mut self) {
        self.play_selected = 0;
        if let Some(game) = self.session.select_game(self.game_selected) {
            let name = game.name.clone();
            self.notify(Notice::Info(format!("Selected {name}")));
            if !self.is_live() {
                self.focus = Focus::Plays;
            }
        }
    }

    pub fn choose_play(&mut self) {
        let options = self.session.play_options();
        if let Some((play_id, label)) = options.get(self.play_selected) {
            self.session.select_play(PlayIndex::At(*play_id));
            self.notify(Notice::Info(format!("Selected play {label}")));
        }
    }

    pub fn update(&mut self, providers: Providers<'_>) {
        if self.focus == Focus::Plays && !self.is_live() {
            self.choose_play();
        }
        match self.session.update(providers) {
            Ok(UpdateOutcome::Updated) => {
                let line = self
                    .session
                    .text
                    .as_ref()
                    .map(|t| format!("{} | {} | {}", t.score_line, t.clock_line, t.down_line))
                    .unwrap_or_default();
                self.notify(Notice::Info(line));
            }
            Ok(UpdateOutcome::Invalid(err)) => {
                self.notify(Notice::Warn(format!("{INVALID_PLAY} ({err})")));
            }
            Err(err) => self.notify(Notice::Warn(format!("Update failed: {err:#}"))),
        }
    }

    pub fn predict(&mut self, predictor: &Result<Predictor, PredictError>) {
        let predictor = match predictor {
            Ok(p) => p,
            Err(err) => {
                self.notify(Notice::Warn(format!("Prediction unavailable: {err}")));
                return;
            }
        };
        match self.session.predict(predictor) {
            Ok(result) => {
                let text = format!("PREDICTION: {}", result.label.to_uppercase());
                self.notify(Notice::Info(text));
            }
            Err(err) => self.notify(Notice::Warn(format!("Prediction unavailable: {err}"))),
        }
    }

    /// Actual-play line; live sources only show the prediction.
    pub fn outcome_line(&self) -> Option<String> {
        let play = self.session.current.as_ref()?;
        let result = self.session.last_prediction.as_ref()?;
        if play.kind == SourceKind::Live {
            return None;
        }
        Some(format!(
            "What actually happened: {} {}",
            result.actual.label(),
            result.verdict.marker()
        ))
    }
}
