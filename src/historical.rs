use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Row, RowAccessor};
use parquet::schema::types::Type;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, app_cache_dir};
use crate::file_cache::fetch_file_cached;

pub const QUARTER_SECONDS: i64 = 900;

const REQUIRED_COLUMNS: [&str; 14] = [
    "game_id",
    "play_id",
    "week",
    "qtr",
    "home_team",
    "away_team",
    "posteam",
    "yardline_100",
    "game_seconds_remaining",
    "down",
    "ydstogo",
    "posteam_score",
    "defteam_score",
    "play_type",
];

// Older seasons ship without these.
const OPTIONAL_COLUMNS: [&str; 2] = ["quarter_seconds_remaining", "desc"];

/// One row of the season table. Situation columns describe the state before
/// the snap of this play; `play_type` is what was actually run from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalPlay {
    pub game_id: String,
    pub play_id: i64,
    pub week: u32,
    pub qtr: Option<i64>,
    pub home_team: String,
    pub away_team: String,
    pub posteam: Option<String>,
    pub yardline_100: Option<f64>,
    pub quarter_seconds_remaining: Option<f64>,
    pub game_seconds_remaining: Option<f64>,
    pub down: Option<f64>,
    pub ydstogo: Option<f64>,
    pub posteam_score: Option<f64>,
    pub defteam_score: Option<f64>,
    pub play_type: Option<String>,
    pub desc: Option<String>,
}

impl HistoricalPlay {
    /// Clock at the snap, backed out of the game clock when the quarter clock
    /// is missing from the file or null on the row.
    pub fn clock_seconds(&self) -> Option<f64> {
        if let Some(secs) = self.quarter_seconds_remaining {
            return Some(secs);
        }
        let game = self.game_seconds_remaining?;
        let qtr = self.qtr?;
        if qtr >= 5 {
            return Some(game);
        }
        Some(game - (QUARTER_SECONDS * (4 - qtr)) as f64)
    }

    pub fn is_selectable(&self) -> bool {
        self.qtr.is_some() && self.posteam.is_some() && self.down.is_some() && self.ydstogo.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonTable {
    pub season: i32,
    pub rows: Vec<HistoricalPlay>,
}

impl SeasonTable {
    pub fn week_rows(&self, week: u32) -> Vec<HistoricalPlay> {
        self.rows.iter().filter(|r| r.week == week).cloned().collect()
    }
}

pub trait HistoricalProvider {
    fn season(&self, season: i32) -> Result<Arc<SeasonTable>>;
}

pub struct NflverseClient {
    config: AppConfig,
    loaded: Mutex<HashMap<i32, Arc<SeasonTable>>>,
}

impl NflverseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    fn season_path(&self, season: i32) -> Result<PathBuf> {
        let dir = app_cache_dir().ok_or_else(|| anyhow!("no cache directory (HOME unset)"))?;
        Ok(dir.join(format!("play_by_play_{season}.parquet")))
    }
}

impl HistoricalProvider for NflverseClient {
    fn season(&self, season: i32) -> Result<Arc<SeasonTable>> {
        {
            let guard = self
                .loaded
                .lock()
                .map_err(|_| anyhow!("season cache lock poisoned"))?;
            if let Some(table) = guard.get(&season) {
                return Ok(Arc::clone(table));
            }
        }

        let url = self.config.pbp_url_for(season);
        let path = fetch_file_cached(&url, &self.season_path(season)?)
            .with_context(|| format!("download season {season}"))?;
        let table = Arc::new(read_season_parquet(&path, season)?);
        info!(season, rows = table.rows.len(), "loaded historical season");

        let mut guard = self
            .loaded
            .lock()
            .map_err(|_| anyhow!("season cache lock poisoned"))?;
        guard.insert(season, Arc::clone(&table));
        Ok(table)
    }
}

struct ColumnIndex(HashMap<&'static str, usize>);

impl ColumnIndex {
    fn num(&self, row: &Row, name: &str) -> Option<f64> {
        self.0.get(name).and_then(|idx| read_num(row, *idx))
    }

    fn string(&self, row: &Row, name: &str) -> Option<String> {
        self.0
            .get(name)
            .and_then(|idx| row.get_string(*idx).ok())
            .map(|s| s.to_string())
    }
}

pub fn read_season_parquet(path: &Path, season: i32) -> Result<SeasonTable> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader season")?;

    let schema = reader.metadata().file_metadata().schema_descr().root_schema();
    let mut fields = Vec::with_capacity(REQUIRED_COLUMNS.len() + OPTIONAL_COLUMNS.len());
    let mut index = HashMap::new();
    for (name, required) in REQUIRED_COLUMNS
        .iter()
        .map(|n| (*n, true))
        .chain(OPTIONAL_COLUMNS.iter().map(|n| (*n, false)))
    {
        match schema.get_fields().iter().find(|f| f.name() == name) {
            Some(field) => {
                index.insert(name, fields.len());
                fields.push(Arc::clone(field));
            }
            None if required => {
                return Err(anyhow!("season file {} lacks column {name}", path.display()));
            }
            None => debug!(season, column = name, "optional column absent"),
        }
    }
    let projection = Type::group_type_builder(schema.name())
        .with_fields(fields)
        .build()
        .context("build parquet projection")?;
    let columns = ColumnIndex(index);

    let iter = reader
        .get_row_iter(Some(projection))
        .context("iterate season rows")?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for row in iter {
        let Ok(row) = row else {
            skipped += 1;
            continue;
        };
        match decode_row(&row, &columns) {
            Some(play) => rows.push(play),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(season, skipped, "skipped undecodable season rows");
    }
    Ok(SeasonTable { season, rows })
}

fn decode_row(row: &Row, cols: &ColumnIndex) -> Option<HistoricalPlay> {
    Some(HistoricalPlay {
        game_id: cols.string(row, "game_id")?,
        play_id: cols.num(row, "play_id")? as i64,
        week: cols.num(row, "week")? as u32,
        qtr: cols.num(row, "qtr").map(|q| q as i64),
        home_team: cols.string(row, "home_team")?,
        away_team: cols.string(row, "away_team")?,
        posteam: cols.string(row, "posteam").filter(|s| !s.is_empty()),
        yardline_100: cols.num(row, "yardline_100"),
        quarter_seconds_remaining: cols.num(row, "quarter_seconds_remaining"),
        game_seconds_remaining: cols.num(row, "game_seconds_remaining"),
        down: cols.num(row, "down"),
        ydstogo: cols.num(row, "ydstogo"),
        posteam_score: cols.num(row, "posteam_score"),
        defteam_score: cols.num(row, "defteam_score"),
        play_type: cols.string(row, "play_type"),
        desc: cols.string(row, "desc").filter(|s| !s.is_empty()),
    })
}

fn read_num(row: &Row, idx: usize) -> Option<f64> {
    if let Ok(v) = row.get_double(idx) {
        return v.is_finite().then_some(v);
    }
    if let Ok(v) = row.get_float(idx) {
        return v.is_finite().then_some(f64::from(v));
    }
    if let Ok(v) = row.get_long(idx) {
        return Some(v as f64);
    }
    if let Ok(v) = row.get_int(idx) {
        return Some(f64::from(v));
    }
    None
}
