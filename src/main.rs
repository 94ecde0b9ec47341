use std::fs::{self, File};
use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::{error, info};

use playcall_terminal::catalog::week_options;
use playcall_terminal::config::{AppConfig, app_cache_dir};
use playcall_terminal::error::PredictError;
use playcall_terminal::historical::NflverseClient;
use playcall_terminal::live::EspnClient;
use playcall_terminal::prediction::Predictor;
use playcall_terminal::session::Providers;
use playcall_terminal::state::{AppState, Focus, Notice};

struct App {
    state: AppState,
    config: AppConfig,
    live: EspnClient,
    historical: NflverseClient,
    predictor: Result<Predictor, PredictError>,
    should_quit: bool,
}

impl App {
    fn new(config: AppConfig) -> anyhow::Result<Self> {
        let sources = week_options(Local::now().date_naive(), config.week1_end);
        let mut state = AppState::new(sources);
        let predictor = Predictor::load(&config.model_path, &config.features_path);
        match &predictor {
            Ok(p) => state.push_log(format!("[INFO] Classifier ready ({} columns)", p.schema().len())),
            Err(err) => {
                error!(%err, "classifier unavailable");
                state.push_log(format!("[WARN] Classifier unavailable: {err}"));
            }
        }
        Ok(Self {
            state,
            live: EspnClient::new(&config)?,
            historical: NflverseClient::new(&config),
            config,
            predictor,
            should_quit: false,
        })
    }

    fn on_key(&mut self, key: KeyEvent) {
        let providers = Providers {
            live: &self.live,
            historical: &self.historical,
            config: &self.config,
        };
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => self.state.focus_next(),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('b') | KeyCode::Esc => {
                self.state.focus_prev()
            }
            KeyCode::Enter => self.state.activate(providers),
            KeyCode::Char('u') | KeyCode::Char('U') => self.state.update(providers),
            KeyCode::Char('p') | KeyCode::Char('P') => self.state.predict(&self.predictor),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }
}

fn init_logging() {
    let Some(dir) = app_cache_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(log_file) = File::create(dir.join("playcall_terminal.log")) else {
        return;
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("playcall_terminal=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let config = AppConfig::from_env();
    info!(season = config.season, "starting");
    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("error: {err:#}");
            return Ok(());
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(14),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Min(30),
        ])
        .split(chunks[1]);

    let sources: Vec<String> = app.state.sources.iter().map(|s| s.to_string()).collect();
    render_list(
        frame,
        columns[0],
        "Source",
        &sources,
        app.state.source_selected,
        app.state.focus == Focus::Sources,
    );
    let games: Vec<String> = app.state.game_names().into_iter().map(String::from).collect();
    render_list(
        frame,
        columns[1],
        "Games",
        &games,
        app.state.game_selected,
        app.state.focus == Focus::Games,
    );
    let plays: Vec<String> = if app.state.is_live() {
        vec!["Latest play".to_string()]
    } else {
        app.state
            .session
            .play_options()
            .into_iter()
            .map(|(_, label)| label)
            .collect()
    };
    render_list(
        frame,
        columns[2],
        "Plays",
        &plays,
        app.state.play_selected,
        app.state.focus == Focus::Plays,
    );
    render_situation(frame, columns[3], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let source = state
        .session
        .source()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no source".to_string());
    let game = state
        .session
        .selected_game()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "no game".to_string());
    let line1 = format!("   __   PLAYCALL TERMINAL | {source} | {game}");
    let line2 = "  (__)".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text() -> String {
    "Enter Select | j/k/↑/↓ Move | Tab/l Next | b/Esc Back | u Update | p Predict | ? Help | q Quit"
        .to_string()
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: &[String],
    selected: usize,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (start, end) = visible_range(selected, items.len(), inner.height as usize);
    for (row, idx) in (start..end).enumerate() {
        let style = if idx == selected {
            Style::default()
                .fg(Color::Black)
                .bg(if focused { Color::Yellow } else { Color::Gray })
        } else {
            Style::default()
        };
        let line = Rect {
            x: inner.x,
            y: inner.y + row as u16,
            width: inner.width,
            height: 1,
        };
        render_cell_text(frame, line, &items[idx], style);
    }
}

fn render_situation(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Situation").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(notice) = &state.notice {
        let style = match notice {
            Notice::Info(_) => Style::default().fg(Color::Cyan),
            Notice::Warn(_) => Style::default().fg(Color::Red),
        };
        lines.push(Line::styled(notice.text().to_string(), style));
        lines.push(Line::raw(""));
    }

    match (&state.session.text, &state.session.current) {
        (Some(text), Some(play)) => {
            lines.push(Line::styled(
                text.score_line.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::raw(text.clock_line.clone()));
            if let Some(logo) = &play.logo {
                lines.push(Line::raw(format!("{} logo: {logo}", play.possessing_team)));
            }
            lines.push(Line::raw(format!("{} ball", play.possessing_team)));
            lines.push(Line::raw(text.down_line.clone()));
        }
        _ => lines.push(Line::styled(
            "Press u to update game data",
            Style::default().fg(Color::DarkGray),
        )),
    }

    if let Some(result) = &state.session.last_prediction {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("PREDICTION: {}", result.label.to_uppercase()),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
        if let Some(outcome) = state.outcome_line() {
            lines.push(Line::raw(outcome));
            let detail = state
                .session
                .current
                .as_ref()
                .and_then(|p| p.following_text.as_deref());
            if let Some(detail) = detail {
                lines.push(Line::styled(
                    detail.to_string(),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Playcall Terminal - Help",
        "",
        "Navigation:",
        "  j/k or ↑/↓   Move",
        "  Tab / l      Next pane",
        "  b / Esc      Previous pane",
        "  Enter        Select source, game or play",
        "",
        "Actions:",
        "  u            Update game data",
        "  p            Predict play",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Live games always use the latest play.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
