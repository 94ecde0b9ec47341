use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::catalog::{Catalog, GameDescriptor, RawData, SourceSelector, load_catalog};
use crate::config::AppConfig;
use crate::error::{PlayError, PredictError};
use crate::historical::HistoricalProvider;
use crate::live::LiveProvider;
use crate::locator::{HistoricalGame, LiveGame, PlayIndex, PlaySource};
use crate::normalize::{NormalizedPlay, Normalized, PlayContext, ProviderTeams, normalize};
use crate::play_text::{PlayText, build_play_text};
use crate::prediction::{PredictionResult, Predictor};

#[derive(Clone, Copy)]
pub struct Providers<'a> {
    pub live: &'a dyn LiveProvider,
    pub historical: &'a dyn HistoricalProvider,
    pub config: &'a AppConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameData {
    Live(LiveGame),
    Historical(HistoricalGame),
}

impl GameData {
    fn source(&self) -> &dyn PlaySource {
        match self {
            GameData::Live(game) => game,
            GameData::Historical(game) => game,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated,
    Invalid(PlayError),
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub catalog: Option<Catalog>,
    pub selected_game: Option<usize>,
    pub play_index: Option<PlayIndex>,
    pub game_data: Option<GameData>,
    pub current: Option<NormalizedPlay>,
    pub text: Option<PlayText>,
    pub last_prediction: Option<PredictionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<SourceSelector> {
        self.catalog.as_ref().map(|c| c.source)
    }

    pub fn selected_game(&self) -> Option<&GameDescriptor> {
        let catalog = self.catalog.as_ref()?;
        catalog.games.get(self.selected_game?)
    }

    /// Loads the game list for a source and drops everything derived from the
    /// previous one. The first game, if any, is selected. Returns the number of
    /// games; zero is a normal answer.
    pub fn select_source(
        &mut self,
        source: SourceSelector,
        providers: Providers<'_>,
    ) -> Result<usize> {
        let catalog = load_catalog(
            source,
            providers.config.season,
            providers.live,
            providers.historical,
        )?;
        *self = Session::default();
        let games = catalog.games.len();
        self.catalog = Some(catalog);
        if games > 0 {
            self.select_game(0);
        }
        Ok(games)
    }

    pub fn select_game(&mut self, idx: usize) -> Option<&GameDescriptor> {
        let catalog = self.catalog.as_ref()?;
        let game = catalog.games.get(idx)?;
        let (game_data, play_index) = match &catalog.data {
            RawData::Live => (None, Some(PlayIndex::Latest)),
            RawData::Historical(rows) => {
                let hist = HistoricalGame::from_week_rows(&game.id, rows);
                let first = hist
                    .play_options()
                    .first()
                    .map(|(id, _)| PlayIndex::At(*id));
                (Some(GameData::Historical(hist)), first)
            }
        };
        self.selected_game = Some(idx);
        self.game_data = game_data;
        self.play_index = play_index;
        self.current = None;
        self.text = None;
        self.last_prediction = None;
        self.selected_game()
    }

    pub fn play_options(&self) -> Vec<(i64, String)> {
        match &self.game_data {
            Some(GameData::Historical(game)) => game.play_options(),
            _ => Vec::new(),
        }
    }

    pub fn select_play(&mut self, index: PlayIndex) {
        self.play_index = Some(index);
    }

    /// Rebuilds the working snapshot from scratch. Invalid plays clear it so
    /// nothing stale can reach prediction; provider failures are errors.
    pub fn update(&mut self, providers: Providers<'_>) -> Result<UpdateOutcome> {
        let Some(game) = self.selected_game().cloned() else {
            return Err(anyhow!("no game selected"));
        };
        let week = self.catalog.as_ref().map(|c| c.week).unwrap_or(game.week);
        let index = self.play_index.unwrap_or(PlayIndex::Latest);

        self.current = None;
        self.text = None;
        self.last_prediction = None;

        if matches!(self.source(), Some(SourceSelector::Live)) {
            let plays = providers.live.plays(&game.id)?;
            self.game_data = Some(GameData::Live(LiveGame {
                game_id: game.id.clone(),
                plays,
            }));
        }
        let Some(data) = self.game_data.as_ref() else {
            return Ok(UpdateOutcome::Invalid(PlayError::NoPlays { game_id: game.id }));
        };
        let source = data.source();

        let pos = match source.locate(index) {
            Ok(pos) => pos,
            Err(err) => {
                warn!(game_id = %game.id, ?index, %err, "play not located");
                return Ok(UpdateOutcome::Invalid(err));
            }
        };
        let fields = source.fields(pos);
        let following = source.following(pos);
        let ctx = PlayContext {
            kind: source.kind(),
            week,
            home: &game.home,
            away: &game.away,
        };
        let teams = ProviderTeams {
            live: providers.live,
            config: providers.config,
        };

        match normalize(&fields, following, ctx, &teams)? {
            Normalized::Ready(play) => {
                info!(game_id = %game.id, play = %play.play_label, "game data updated");
                self.text = Some(build_play_text(&play));
                self.current = Some(*play);
                Ok(UpdateOutcome::Updated)
            }
            Normalized::Invalid(err) => Ok(UpdateOutcome::Invalid(err)),
        }
    }

    pub fn predict(&mut self, predictor: &Predictor) -> Result<&PredictionResult, PredictError> {
        let play = self.current.as_ref().ok_or(PredictError::NoSnapshot)?;
        let result = predictor.predict(play);
        Ok(self.last_prediction.insert(result))
    }
}
