use std::{
    io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::error;

use sprout_core::{
    format_remaining, progress_bar, unix_now, AppConfig, Catalog, GameError, GameSession,
    GrowthStage, LoadOutcome, LoadSource, ReconcileReport, SaveManager,
};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Offline windows shorter than this are not worth a modal.
const OFFLINE_NOTICE_MIN_SECS: f64 = 10.0;

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modal {
    None,
    SeedSelect,
    OfflineSummary,
}

/// High-level application state for the farm TUI.
pub struct FarmApp {
    config: AppConfig,
    catalog: Catalog,
    save_manager: SaveManager,
    session: GameSession,
    summary: Option<ReconcileReport>,
    cursor: (u32, u32),
    seed_cursor: usize,
    modal: Modal,
    status: String,
    should_quit: bool,
    last_autosave: Instant,
}

impl FarmApp {
    pub fn new(
        config: AppConfig,
        catalog: Catalog,
        save_manager: SaveManager,
        outcome: LoadOutcome,
    ) -> Self {
        let LoadOutcome {
            session,
            report,
            source,
        } = outcome;

        let status = match source {
            LoadSource::Fresh => "Welcome to your new farm!".to_string(),
            LoadSource::Restored => "Welcome back!".to_string(),
            LoadSource::Recovered => {
                "Save file was unreadable; started a fresh farm".to_string()
            }
        };
        let show_summary =
            source == LoadSource::Restored && report.is_noteworthy(OFFLINE_NOTICE_MIN_SECS);

        Self {
            config,
            catalog,
            save_manager,
            session,
            summary: show_summary.then_some(report),
            cursor: (0, 0),
            seed_cursor: 0,
            modal: if show_summary {
                Modal::OfflineSummary
            } else {
                Modal::None
            },
            status,
            should_quit: false,
            last_autosave: Instant::now(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => self.handle_event(event),
                Some(AppEvent::Tick) => self.handle_tick(),
                None => break,
            }
        }

        // The final save must land before the terminal is handed back.
        let final_save = self.save_now("Saved on exit");
        restore_terminal(&mut terminal)?;
        final_save?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            self.handle_key(key);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.modal {
            Modal::OfflineSummary => self.handle_summary_key(key),
            Modal::SeedSelect => self.handle_seed_key(key),
            Modal::None => self.handle_farm_key(key),
        }
    }

    fn handle_summary_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('q')
        ) {
            self.modal = Modal::None;
            self.summary = None;
        }
    }

    fn handle_seed_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.modal = Modal::None;
                self.status = "Planting cancelled".to_string();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.seed_cursor = self.seed_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.seed_cursor = (self.seed_cursor + 1).min(self.catalog.len() - 1);
            }
            KeyCode::Enter => self.plant_selected(),
            _ => {}
        }
    }

    fn handle_farm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1, 0),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(0, -1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(0, 1),
            KeyCode::Enter | KeyCode::Char(' ') => self.primary_action(),
            KeyCode::Char('s') => {
                let _ = self.save_now("Saved");
            }
            _ => {}
        }
    }

    fn handle_tick(&mut self) {
        let interval = Duration::from_secs(self.config.autosave_secs);
        if self.last_autosave.elapsed() >= interval {
            let _ = self.save_now("Auto-saved");
        }
    }

    fn move_cursor(&mut self, dx: i64, dy: i64) {
        let farm = &self.session.farm;
        let x = (self.cursor.0 as i64 + dx).clamp(0, farm.width() as i64 - 1);
        let y = (self.cursor.1 as i64 + dy).clamp(0, farm.height() as i64 - 1);
        self.cursor = (x as u32, y as u32);
    }

    fn primary_action(&mut self) {
        let (x, y) = self.cursor;
        if self.session.farm.crop_at(x, y).is_some() {
            self.harvest_under_cursor();
        } else {
            self.seed_cursor = 0;
            self.modal = Modal::SeedSelect;
            self.status = "Select a seed to plant".to_string();
        }
    }

    fn plant_selected(&mut self) {
        let (x, y) = self.cursor;
        let (id, name, growth_secs) = match self.catalog.iter().nth(self.seed_cursor) {
            Some(ty) => (ty.id.clone(), ty.name.clone(), ty.growth_secs),
            None => return,
        };

        let now = unix_now();
        match self
            .session
            .plant(x, y, &id, &self.catalog, &self.config.balance, now)
        {
            Ok(_) => {
                self.modal = Modal::None;
                self.status = format!(
                    "Planted {name}; ready in {}",
                    format_remaining(growth_secs as f64)
                );
            }
            Err(err @ GameError::SlotOccupied { .. }) => {
                self.modal = Modal::None;
                self.status = err.to_string();
            }
            // Locked or unaffordable: stay in the selector to pick another.
            Err(err) => self.status = err.to_string(),
        }
    }

    fn harvest_under_cursor(&mut self) {
        let (x, y) = self.cursor;
        let now = unix_now();
        match self
            .session
            .harvest(x, y, &self.catalog, &self.config.balance, now)
        {
            Ok(outcome) => {
                let mut message = format!(
                    "Harvested {} (+{} coins, +{} xp)",
                    outcome.crop, outcome.coins, outcome.xp
                );
                if outcome.levels_gained > 0 {
                    let level = self.session.player.level(self.config.balance.xp_per_level);
                    message.push_str(&format!(" — level up! Now level {level}"));
                }
                self.status = message;
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn save_now(&mut self, label: &str) -> Result<()> {
        match self
            .save_manager
            .save(&self.session, &self.config.balance, unix_now())
        {
            Ok(()) => {
                self.last_autosave = Instant::now();
                self.status = format!("{label} at {}", Local::now().format("%H:%M:%S"));
                Ok(())
            }
            Err(err) => {
                error!(?err, "save failed");
                self.status = format!("Save failed: {err:#}");
                Err(err)
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);

        self.render_farm(frame, body[0]);
        self.render_sidebar(frame, body[1]);
        self.render_status(frame, rows[1]);

        match self.modal {
            Modal::SeedSelect => self.render_seed_selector(frame, area),
            Modal::OfflineSummary => self.render_offline_summary(frame, area),
            Modal::None => {}
        }
    }

    fn render_farm(&self, frame: &mut Frame, area: Rect) {
        let now = unix_now();
        let farm = &self.session.farm;
        let mut lines: Vec<Line> = Vec::with_capacity(farm.height() as usize * 2);
        for y in 0..farm.height() {
            let mut spans: Vec<Span> = Vec::with_capacity(farm.width() as usize * 2);
            for x in 0..farm.width() {
                let (text, mut style) = match farm.crop_at(x, y) {
                    Some(crop) => match self.catalog.get(crop.kind()) {
                        Some(ty) => {
                            let stage = crop.stage(ty, now);
                            let bar = progress_bar(crop.progress(ty, now), 4);
                            let style = if stage == GrowthStage::Ready {
                                Style::default()
                                    .fg(Color::Green)
                                    .add_modifier(Modifier::BOLD)
                            } else {
                                Style::default().fg(Color::White)
                            };
                            (format!(" {} {bar} ", stage.glyph()), style)
                        }
                        None => (" ?      ".to_string(), Style::default().fg(Color::Red)),
                    },
                    None => (
                        " ⬛ ···· ".to_string(),
                        Style::default().fg(Color::DarkGray),
                    ),
                };
                if (x, y) == self.cursor {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }
                spans.push(Span::styled(text, style));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
            lines.push(Line::default());
        }

        let block = Block::default().borders(Borders::ALL).title("Farm");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let now = unix_now();
        let player = &self.session.player;
        let per_level = self.config.balance.xp_per_level;
        let level = player.level(per_level);

        let mut lines = vec![
            Line::from(format!("Coins   {}", player.coins())),
            Line::from(format!(
                "Level   {level}  ({} / {per_level} xp)",
                player.xp_into_level(per_level)
            )),
            Line::from(format!(
                "        {}",
                progress_bar(player.xp_progress(per_level), 12)
            )),
            Line::from(format!(
                "Planted {} · Harvested {}",
                player.crops_planted(),
                player.crops_harvested()
            )),
            Line::default(),
            Line::from(Span::styled(
                format!("Plot ({}, {})", self.cursor.0, self.cursor.1),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];

        match self.session.farm.crop_at(self.cursor.0, self.cursor.1) {
            Some(crop) => match self.catalog.get(crop.kind()) {
                Some(ty) => {
                    let stage = crop.stage(ty, now);
                    lines.push(Line::from(format!(
                        "{} {} — {}",
                        ty.glyph,
                        ty.name,
                        stage.label()
                    )));
                    lines.push(Line::from(format!(
                        "{} {}",
                        progress_bar(crop.progress(ty, now), 12),
                        format_remaining(crop.remaining_secs(ty, now))
                    )));
                    if stage == GrowthStage::Ready {
                        lines.push(Line::from(Span::styled(
                            format!(
                                "Enter to harvest (+{} coins, +{} xp)",
                                ty.sell_price, ty.xp_reward
                            ),
                            Style::default().fg(Color::Green),
                        )));
                    }
                }
                None => lines.push(Line::from("Unknown crop".to_string())),
            },
            None => lines.push(Line::from(Span::styled(
                "Empty — press Enter to plant",
                Style::default().fg(Color::DarkGray),
            ))),
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "←↑↓→ move · Enter plant/harvest",
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(Span::styled(
            "s save · q quit",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default().borders(Borders::ALL).title("Homestead");
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        frame.render_widget(
            Paragraph::new(Line::from(self.status.clone())).block(block),
            area,
        );
    }

    fn render_seed_selector(&self, frame: &mut Frame, area: Rect) {
        let height = (self.catalog.len() as u16 + 4).min(area.height);
        let width = 52.min(area.width);
        let modal = centered_rect(width, height, area);
        frame.render_widget(Clear, modal);

        let player = &self.session.player;
        let per_level = self.config.balance.xp_per_level;
        let level = player.level(per_level);

        let mut lines = Vec::with_capacity(self.catalog.len() + 2);
        for (idx, ty) in self.catalog.iter().enumerate() {
            let marker = if idx == self.seed_cursor { "▶ " } else { "  " };
            let locked = ty.unlock_level > level;
            let (text, style) = if locked {
                (
                    format!(
                        "{marker}{} {} — unlocks at level {}",
                        ty.glyph, ty.name, ty.unlock_level
                    ),
                    Style::default().fg(Color::DarkGray),
                )
            } else {
                let style = if player.coins() >= ty.seed_cost {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::Red)
                };
                (
                    format!(
                        "{marker}{} {} — {} coins · {}",
                        ty.glyph,
                        ty.name,
                        ty.seed_cost,
                        format_remaining(ty.growth_secs as f64)
                    ),
                    style,
                )
            };
            let style = if idx == self.seed_cursor {
                style.add_modifier(Modifier::BOLD)
            } else {
                style
            };
            lines.push(Line::from(Span::styled(text, style)));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Enter plant · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default().borders(Borders::ALL).title("Plant a seed");
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }

    fn render_offline_summary(&self, frame: &mut Frame, area: Rect) {
        let Some(report) = &self.summary else {
            return;
        };

        let height = (report.harvested.len() as u16 + 8).min(area.height);
        let width = 46.min(area.width);
        let modal = centered_rect(width, height, area);
        frame.render_widget(Clear, modal);

        let mut lines = vec![
            Line::from(Span::styled(
                format!("You were away for {}.", fmt_away(report.offline_secs)),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];
        if report.harvested.is_empty() {
            lines.push(Line::from("Your crops kept growing while you were gone."));
        } else {
            for harvest in &report.harvested {
                lines.push(Line::from(format!(
                    "  {} — +{} coins · +{} xp",
                    harvest.crop, harvest.coins, harvest.xp
                )));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!(
                    "Total +{} coins · +{} xp",
                    report.coins_credited, report.xp_credited
                ),
                Style::default().fg(Color::Green),
            )));
            if report.levels_gained > 0 {
                lines.push(Line::from(Span::styled(
                    format!("Level up! +{}", report.levels_gained),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Press Enter to continue",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Welcome back");
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

fn fmt_away(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
