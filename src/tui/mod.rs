//! TUI module - live workout screen with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::notify::RestTimer;
use crate::session::{
    ConfirmOutcome, ElapsedTime, FieldError, SessionController, SessionError, SessionState,
};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// How long a toast stays on screen
const TOAST_SECS: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Load,
    Reps,
}

struct Toast {
    text: String,
    is_error: bool,
    shown_at: Instant,
}

/// App state for the workout screen
pub struct App {
    session: SessionController,
    clock: watch::Receiver<ElapsedTime>,
    rest: RestTimer,
    default_rest: Duration,
    exercise: usize,
    set: u32,
    focus: Focus,
    load_input: String,
    reps_input: String,
    field_errors: Vec<FieldError>,
    toast: Option<Toast>,
    should_quit: bool,
}

impl App {
    pub fn new(session: SessionController, rest: RestTimer, default_rest: Duration) -> Self {
        let clock = session.subscribe_clock();
        let mut app = Self {
            session,
            clock,
            rest,
            default_rest,
            exercise: 0,
            set: 1,
            focus: Focus::Load,
            load_input: String::new(),
            reps_input: String::new(),
            field_errors: Vec::new(),
            toast: None,
            should_quit: false,
        };
        app.load_inputs();
        app
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal).await;

        restore_terminal()?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events().await?;
        }
        self.rest.cancel();
        Ok(())
    }

    fn show(&mut self, text: impl Into<String>, is_error: bool) {
        self.toast = Some(Toast {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    fn set_count(&self) -> u32 {
        self.session
            .ledgers()
            .get(self.exercise)
            .map_or(0, |l| l.set_count())
    }

    /// Fill inputs from the selected set, or from the set before it as a hint
    fn load_inputs(&mut self) {
        self.field_errors.clear();
        let Some(ledger) = self.session.ledgers().get(self.exercise) else {
            return;
        };
        let source = ledger
            .entry(self.set)
            .or_else(|| self.set.checked_sub(1).and_then(|prev| ledger.entry(prev)));

        match source {
            Some(entry) => {
                self.load_input = format!("{}", entry.load);
                self.reps_input = entry.reps.to_string();
            }
            None => {
                self.load_input.clear();
                self.reps_input.clear();
            }
        }
    }

    fn select_set(&mut self, set: u32) {
        if (1..=self.set_count()).contains(&set) {
            self.set = set;
            self.focus = Focus::Load;
            self.load_inputs();
        }
    }

    fn select_exercise(&mut self, exercise: usize) {
        if exercise < self.session.ledgers().len() {
            self.exercise = exercise;
            self.set = 1;
            self.focus = Focus::Load;
            self.load_inputs();
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Focus::Load => &mut self.load_input,
            Focus::Reps => &mut self.reps_input,
        }
    }

    fn report(&mut self, error: SessionError) {
        match error {
            SessionError::Invalid(invalid) => self.field_errors = invalid.errors,
            SessionError::NotActive => self.show("Press s to start the workout first", true),
            other => self.show(other.to_string(), true),
        }
    }

    async fn start(&mut self) {
        match self.session.start().await.map(|w| w.id.clone()) {
            Ok(id) => {
                self.show(format!("Workout {} started", id), false);
                self.select_exercise(0);
            }
            Err(e) => self.report(e),
        }
    }

    async fn stop(&mut self) {
        match self.session.stop().await.map(|_| ()) {
            Ok(()) => {
                self.rest.cancel();
                let msg = format!("Workout finished in {}", self.session.elapsed());
                self.show(msg, false);
            }
            Err(e) => self.report(e),
        }
    }

    /// Record the inputs for the selected set and persist them
    async fn submit(&mut self) {
        let Some(exercise) = self.session.training().exercises.get(self.exercise).cloned() else {
            return;
        };

        if let Err(e) = self
            .session
            .record_set(&exercise.id, self.set, &self.load_input, &self.reps_input)
            .map(|_| ())
        {
            self.report(e);
            return;
        }
        self.field_errors.clear();

        match self.session.confirm_set(&exercise.id, self.set).await {
            Ok(ConfirmOutcome::Confirmed) => {
                let rest = exercise
                    .rest_seconds
                    .map_or(self.default_rest, |s| Duration::from_secs(s as u64));
                self.rest.schedule(rest, &exercise.name);
                self.show(format!("Set {} saved, rest {}s", self.set, rest.as_secs()), false);
                self.select_set(self.set + 1);
            }
            Ok(ConfirmOutcome::AlreadyConfirmed) => self.select_set(self.set + 1),
            Ok(ConfirmOutcome::Superseded) => self.show("Set changed while saving, press Enter again", true),
            Err(e) => self.report(e),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);
        self.render_exercises(frame, body[0]);
        self.render_sets(frame, body[1]);

        self.render_input(frame, chunks[2]);
        self.render_footer(frame, chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let state = self.session.state();
        let color = match state {
            SessionState::NotStarted => Color::DarkGray,
            SessionState::InProgress(_) => Color::Green,
            SessionState::Stopped(_) => Color::Yellow,
        };

        let header = Paragraph::new(Line::from(vec![
            Span::styled(self.session.training().name.clone(), Style::default().fg(Color::Cyan).bold()),
            Span::raw("  |  "),
            Span::styled(state.label(), Style::default().fg(color)),
            Span::raw("  |  "),
            Span::styled(format!("⏱ {}", *self.clock.borrow()), Style::default().bold()),
            Span::raw(format!("  |  {:.0} kg", self.session.confirmed_volume())),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn render_exercises(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .session
            .training()
            .exercises
            .iter()
            .zip(self.session.ledgers())
            .enumerate()
            .map(|(i, (exercise, ledger))| {
                let style = if i == self.exercise {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else if ledger.is_complete() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(exercise.name.clone()),
                    Cell::from(format!("{}/{}", ledger.done_count(), ledger.set_count())),
                    Cell::from(exercise.target_reps.clone().unwrap_or_default()),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [Constraint::Min(16), Constraint::Length(6), Constraint::Length(8)],
        )
        .header(Row::new(vec!["Exercise", "Done", "Target"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Exercises"));

        frame.render_widget(table, area);
    }

    fn render_sets(&self, frame: &mut Frame, area: Rect) {
        let Some(ledger) = self.session.ledgers().get(self.exercise) else {
            return;
        };

        let rows: Vec<Row> = (1..=ledger.set_count())
            .map(|index| {
                let (load, reps, status) = match ledger.entry(index) {
                    Some(e) if e.confirmed => (format!("{}", e.load), e.reps.to_string(), "✓"),
                    Some(e) => (format!("{}", e.load), e.reps.to_string(), "unsaved"),
                    None => ("-".to_string(), "-".to_string(), ""),
                };
                let style = if index == self.set {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else if status == "✓" {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(index.to_string()),
                    Cell::from(load),
                    Cell::from(reps),
                    Cell::from(status),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(5),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Min(8),
            ],
        )
        .header(Row::new(vec!["Set", "Load", "Reps", ""]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Sets"));

        frame.render_widget(table, area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let editable = self.session.is_editable();
        let field_style = |focus: Focus| {
            if !editable {
                Style::default().fg(Color::DarkGray)
            } else if self.focus == focus {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            }
        };

        let inputs = Line::from(vec![
            Span::raw(format!("Set {}  ", self.set)),
            Span::styled(format!("Load [{:>6}]", self.load_input), field_style(Focus::Load)),
            Span::raw("  "),
            Span::styled(format!("Reps [{:>4}]", self.reps_input), field_style(Focus::Reps)),
        ]);

        let errors = self
            .field_errors
            .iter()
            .map(|e| e.message())
            .collect::<Vec<_>>()
            .join("  ");

        let hint = if editable { errors } else { "Read only".to_string() };
        let input = Paragraph::new(vec![inputs, Line::styled(hint, Style::default().fg(Color::Red))])
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(input, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let fresh_toast = self
            .toast
            .as_ref()
            .filter(|t| t.shown_at.elapsed() < Duration::from_secs(TOAST_SECS));

        let footer = match fresh_toast {
            Some(toast) => {
                let color = if toast.is_error { Color::Red } else { Color::Green };
                Paragraph::new(toast.text.clone()).style(Style::default().fg(color))
            }
            None => Paragraph::new(
                "q: quit | s: start | x: stop | ←/→: exercise | ↑/↓: set | tab: field | enter: save",
            )
            .style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(footer.block(Block::default().borders(Borders::ALL)), area);
    }

    async fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    let editable = self.session.is_editable();
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                        KeyCode::Char('s') => self.start().await,
                        KeyCode::Char('x') => self.stop().await,
                        KeyCode::Left => self.select_exercise(self.exercise.saturating_sub(1)),
                        KeyCode::Right => self.select_exercise(self.exercise + 1),
                        KeyCode::Up => self.select_set(self.set.saturating_sub(1)),
                        KeyCode::Down => self.select_set(self.set + 1),
                        KeyCode::Tab if editable => {
                            self.focus = match self.focus {
                                Focus::Load => Focus::Reps,
                                Focus::Reps => Focus::Load,
                            };
                        }
                        KeyCode::Char(c) if editable && (c.is_ascii_digit() || c == '.' || c == ',') => {
                            self.focused_input().push(c);
                        }
                        KeyCode::Backspace if editable => {
                            self.focused_input().pop();
                        }
                        KeyCode::Enter => self.submit().await,
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
