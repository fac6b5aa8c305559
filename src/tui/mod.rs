// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! A thin ratatui + crossterm shell around [`Workbench`]. The UI thread owns the workbench;
//! fetch tickets are spawned onto a tokio runtime and their results come back over an unbounded
//! channel, so the event loop never blocks on the network.

use std::{
    error::Error,
    io, mem,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::future::{BoxFuture, FutureExt};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::debug;

use crate::explore::{Completion, DeepDiveTicket, ExpansionState, FetchedDeepDive, NodePath};
use crate::model::ViewMode;
use crate::viewport::{ExportFormat, ViewportContent};
use crate::workbench::{
    FetchedGeneration, GenerationOutcome, GenerationTicket, Notice, StartError, Workbench,
};

mod theme;

pub use theme::ThemeError;
use theme::TuiTheme;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const TOAST_TTL: Duration = Duration::from_secs(3);
const PAN_STEP_X: i32 = 4;
const PAN_STEP_Y: i32 = 2;
const DETAIL_PANE_HEIGHT: u16 = 8;

/// Runs the interactive terminal UI until the user quits.
///
/// `handle` must belong to a runtime that keeps running while the UI is up; fetches are spawned
/// onto it.
pub fn run(
    workbench: Workbench,
    initial_topic: Option<String>,
    handle: Handle,
) -> Result<(), Box<dyn Error>> {
    let theme = TuiTheme::from_env()?;
    let (results_tx, mut results_rx) = mpsc::unbounded_channel::<Delivery>();
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(workbench, theme);
    if let Some(topic) = initial_topic {
        app.submit_topic(&topic);
    }

    while !app.should_quit {
        for job in app.take_jobs() {
            let results_tx = results_tx.clone();
            handle.spawn(async move {
                let delivery = job.fetch().await;
                if results_tx.send(delivery).is_err() {
                    debug!("ui gone; fetch result dropped");
                }
            });
        }
        while let Ok(delivery) = results_rx.try_recv() {
            app.apply(delivery);
        }
        app.tick(Instant::now());
        terminal.draw(|frame| draw(frame, &app))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Work the UI wants done off-thread.
enum Job {
    Generation(GenerationTicket),
    DeepDive(DeepDiveTicket),
}

impl Job {
    fn fetch(self) -> BoxFuture<'static, Delivery> {
        match self {
            Self::Generation(ticket) => ticket.fetch().map(Delivery::Generation).boxed(),
            Self::DeepDive(ticket) => ticket.fetch().map(Delivery::DeepDive).boxed(),
        }
    }
}

enum Delivery {
    Generation(FetchedGeneration),
    DeepDive(FetchedDeepDive),
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    expires_at: Instant,
}

struct App {
    workbench: Workbench,
    theme: TuiTheme,
    focus: Focus,
    input: String,
    plan_cursor: usize,
    history_cursor: usize,
    toast: Option<Toast>,
    jobs: Vec<Job>,
    should_quit: bool,
}

impl App {
    fn new(workbench: Workbench, theme: TuiTheme) -> Self {
        let focus = if workbench.tree().is_empty() { Focus::Input } else { Focus::Plan };
        Self {
            workbench,
            theme,
            focus,
            input: String::new(),
            plan_cursor: 0,
            history_cursor: 0,
            toast: None,
            jobs: Vec::new(),
            should_quit: false,
        }
    }

    fn take_jobs(&mut self) -> Vec<Job> {
        mem::take(&mut self.jobs)
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast { message: message.into(), expires_at: Instant::now() + TOAST_TTL });
    }

    fn submit_topic(&mut self, topic: &str) {
        match self.workbench.begin_generation(topic) {
            Ok(ticket) => {
                self.set_toast(format!("Generating \u{201c}{}\u{201d}…", ticket.request().topic()));
                self.jobs.push(Job::Generation(ticket));
            }
            Err(StartError::Input(err)) => self.set_toast(capitalize(&err.to_string())),
            Err(err @ (StartError::Offline | StartError::Busy)) => {
                self.set_toast(capitalize(&err.to_string()));
            }
        }
    }

    fn apply(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Generation(fetched) => match self.workbench.finish_generation(fetched) {
                GenerationOutcome::Accepted(result) => {
                    self.plan_cursor = 0;
                    self.history_cursor = 0;
                    self.focus = Focus::Plan;
                    self.input.clear();
                    self.set_toast(format!("Loaded {}", result.topic()));
                }
                GenerationOutcome::Failed(_) | GenerationOutcome::Discarded => {}
            },
            Delivery::DeepDive(fetched) => {
                if self.workbench.finish_deep_dive(fetched) == Completion::Expanded {
                    self.clamp_plan_cursor();
                }
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        self.workbench.tick(now);
        while self.workbench.notice().is_some_and(|notice| !notice.is_blocking()) {
            if let Some(notice) = self.workbench.dismiss_notice() {
                self.set_toast(notice.message());
            }
        }
        if self.toast.as_ref().is_some_and(|toast| toast.expires_at <= now) {
            self.toast = None;
        }
    }

    fn blocking_notice(&self) -> Option<&Notice> {
        self.workbench.notice().filter(|notice| notice.is_blocking())
    }

    fn mode(&self) -> ViewMode {
        self.workbench.store().mode()
    }

    fn selected_path(&self) -> Option<NodePath> {
        self.workbench.tree().visible_nodes().nth(self.plan_cursor).map(|visible| visible.path.clone())
    }

    fn history_topics(&self) -> Vec<String> {
        let snapshot = self.workbench.store().snapshot();
        snapshot.history().iter().map(|entry| entry.topic().to_owned()).collect()
    }

    fn clamp_plan_cursor(&mut self) {
        let len = self.workbench.tree().len();
        self.plan_cursor = self.plan_cursor.min(len.saturating_sub(1));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.blocking_notice().is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.workbench.dismiss_notice();
            }
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.cycle();
                return;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.cycle_back();
                return;
            }
            _ => {}
        }

        let focus = self.focus;
        match focus {
            Focus::Input => self.handle_input_key(key),
            Focus::Plan | Focus::History if self.handle_global_key(key) => {}
            Focus::Plan => match self.mode() {
                ViewMode::Roadmap => self.handle_plan_key(key),
                ViewMode::Diagram => self.handle_diagram_key(key),
            },
            Focus::History => self.handle_history_key(key),
        }
    }

    fn handle_global_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('i') | KeyCode::Char('/') => self.focus = Focus::Input,
            KeyCode::Char('m') => {
                let mode = self.workbench.toggle_mode();
                self.set_toast(format!("{} view", mode.label()));
            }
            KeyCode::Char('p') => {
                let persona = self.workbench.persona().next();
                self.workbench.set_persona(persona);
                self.set_toast(format!("Persona: {persona}"));
            }
            _ => return false,
        }
        true
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let generating = self.workbench.is_generating();
        match key.code {
            KeyCode::Esc => self.focus = Focus::Plan,
            KeyCode::Enter if generating => self.set_toast("Generation in progress"),
            KeyCode::Enter => {
                let topic = self.input.clone();
                self.submit_topic(&topic);
            }
            _ if generating => {}
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            _ => {}
        }
    }

    fn handle_plan_key(&mut self, key: KeyEvent) {
        let len = self.workbench.tree().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.plan_cursor = self.plan_cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.plan_cursor = (self.plan_cursor + 1).min(len.saturating_sub(1));
            }
            KeyCode::Home | KeyCode::Char('g') => self.plan_cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.plan_cursor = len.saturating_sub(1),
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') => self.toggle_selected_expansion(),
            KeyCode::Char('h') | KeyCode::Left => self.collapse_or_select_parent(),
            KeyCode::Char('x') => {
                if let Some(path) = self.selected_path() {
                    if let Ok(done) = self.workbench.toggle_completed(&path) {
                        self.set_toast(if done { "Marked done" } else { "Marked open" });
                    }
                }
            }
            KeyCode::Char('y') => self.yank_selected_resource(),
            _ => {}
        }
    }

    fn toggle_selected_expansion(&mut self) {
        let Some(path) = self.selected_path() else {
            return;
        };
        match self.workbench.toggle_expansion(&path) {
            Ok(Some(ticket)) => {
                self.set_toast(format!("Deep-diving into {}…", ticket.request().step_title()));
                self.jobs.push(Job::DeepDive(ticket));
            }
            Ok(None) => self.clamp_plan_cursor(),
            Err(err) => self.set_toast(capitalize(&err.to_string())),
        }
    }

    fn collapse_or_select_parent(&mut self) {
        let Some(path) = self.selected_path() else {
            return;
        };
        let expanded =
            self.workbench.tree().node(&path).is_ok_and(|node| node.expansion() == ExpansionState::Expanded);
        if expanded {
            self.toggle_selected_expansion();
            return;
        }
        if let Some(parent) = path.parent() {
            if let Some(idx) = self.workbench.tree().visible_nodes().position(|visible| *visible.path == parent) {
                self.plan_cursor = idx;
            }
        }
    }

    fn yank_selected_resource(&mut self) {
        let Some(path) = self.selected_path() else {
            return;
        };
        let link = self
            .workbench
            .tree()
            .node(&path)
            .ok()
            .and_then(|node| node.step().resource_links().into_iter().next());
        let Some(link) = link else {
            self.set_toast("No resources for this step");
            return;
        };
        match copy_to_clipboard(link.url().as_str()) {
            Ok(()) => self.set_toast(format!("Copied link for {}", link.label())),
            Err(err) => self.set_toast(format!("Copy failed: {err}")),
        }
    }

    fn handle_diagram_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        let viewport = self.workbench.viewport_mut();
        match key.code {
            KeyCode::Char('+') | KeyCode::Char('=') => {
                viewport.zoom_in();
            }
            KeyCode::Char('-') => {
                viewport.zoom_out();
            }
            KeyCode::Char('0') => viewport.reset(),
            KeyCode::Left | KeyCode::Char('h') => viewport.pan_by(-PAN_STEP_X, 0),
            KeyCode::Right | KeyCode::Char('l') => viewport.pan_by(PAN_STEP_X, 0),
            KeyCode::Up | KeyCode::Char('k') => viewport.pan_by(0, -PAN_STEP_Y),
            KeyCode::Down | KeyCode::Char('j') => viewport.pan_by(0, PAN_STEP_Y),
            KeyCode::Char('f') => {
                viewport.toggle_fullscreen();
            }
            KeyCode::Esc => {
                viewport.handle_escape();
            }
            KeyCode::Char('r') => {
                self.workbench.rerender();
                self.set_toast("Diagram re-rendered");
            }
            KeyCode::Char('e') => self.export(ExportFormat::Png, now),
            KeyCode::Char('s') => self.export(ExportFormat::Svg, now),
            _ => {}
        }
    }

    fn export(&mut self, format: ExportFormat, now: Instant) {
        if !self.workbench.viewport().can_export(now) {
            self.set_toast(if self.workbench.viewport().is_busy(now) {
                "Export in progress"
            } else {
                "Nothing to export"
            });
            return;
        }
        // Success and failure both surface through workbench notices.
        let _ = self.workbench.export(format, now);
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        let topics = self.history_topics();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.history_cursor = self.history_cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.history_cursor = (self.history_cursor + 1).min(topics.len().saturating_sub(1));
            }
            KeyCode::Enter => {
                if let Some(topic) = topics.get(self.history_cursor) {
                    if self.workbench.restore(topic) {
                        self.plan_cursor = 0;
                        self.set_toast(format!("Restored {topic}"));
                    }
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(topic) = topics.get(self.history_cursor) {
                    if self.workbench.remove_history(topic) {
                        self.set_toast(format!("Removed {topic}"));
                    }
                    self.history_cursor = self.history_cursor.min(topics.len().saturating_sub(2));
                }
            }
            KeyCode::Char('D') => {
                self.workbench.clear_history();
                self.history_cursor = 0;
                self.set_toast("History cleared");
            }
            _ => {}
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().style(app.theme.base_style()), area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let body = layout[0];
    let status_area = layout[1];

    let fullscreen = app.mode() == ViewMode::Diagram && app.workbench.viewport().is_fullscreen();
    if fullscreen {
        draw_diagram(frame, app, body);
    } else {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(body);
        draw_input(frame, app, rows[0]);

        let direction = if stack_main_panes_vertically(rows[1]) {
            Direction::Vertical
        } else {
            Direction::Horizontal
        };
        let panes = Layout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(rows[1]);
        match app.mode() {
            ViewMode::Roadmap => draw_plan(frame, app, panes[0]),
            ViewMode::Diagram => draw_diagram(frame, app, panes[0]),
        }
        draw_history(frame, app, panes[1]);
    }

    frame.render_widget(Paragraph::new(footer_line(app)), status_area);

    if let Some(notice) = app.blocking_notice() {
        let popup = centered_rect(area, 60, 7);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Error ─ Esc to dismiss ")
            .border_style(app.theme.error_style());
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(notice.message().to_owned())
                .style(app.theme.error_style())
                .wrap(Wrap { trim: true })
                .block(block),
            popup,
        );
    }
}

fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == Focus::Input;
    let generating = app.workbench.is_generating();
    let mut tail = format!("· {} · {}", app.workbench.persona(), app.mode().label());
    if generating {
        tail.push_str(" · generating…");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(view_title("Topic", 'i', Some(&tail)))
        .border_style(app.theme.panel_border_style(focused && !generating));

    let text = if generating {
        Line::from(Span::styled(app.input.clone(), app.theme.muted_style()))
    } else if app.input.is_empty() && !focused {
        Line::from(Span::styled("Type a topic, e.g. Как работает DNS", app.theme.muted_style()))
    } else {
        Line::from(app.input.clone())
    };
    frame.render_widget(Paragraph::new(text).block(block), area);

    if focused && !generating {
        let cursor_x = area.x.saturating_add(1).saturating_add(app.input.chars().count() as u16);
        frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn draw_plan(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == Focus::Plan;
    let tree = app.workbench.tree();
    let title_tail = tree.root().map(|root| root.topic().to_owned());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(view_title("Roadmap", 'm', title_tail.as_deref()))
        .border_style(app.theme.panel_border_style(focused));

    if tree.is_empty() {
        let hint = if app.workbench.store().is_loading() { "Generating…" } else { "No roadmap yet." };
        frame.render_widget(Paragraph::new(hint).style(app.theme.muted_style()).block(block), area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(DETAIL_PANE_HEIGHT)])
        .split(area);

    let items = tree
        .visible_nodes()
        .map(|visible| ListItem::new(plan_item_line(&app.theme, visible.depth(), visible.node)))
        .collect::<Vec<_>>();
    let list = List::new(items).block(block).highlight_style(app.theme.selection_style());
    let mut state = ListState::default().with_selected(Some(app.plan_cursor));
    frame.render_stateful_widget(list, rows[0], &mut state);

    let detail = app
        .selected_path()
        .and_then(|path| tree.node(&path).ok())
        .map(|node| step_detail_text(&app.theme, node.step()))
        .unwrap_or_default();
    let detail_block = Block::default().borders(Borders::ALL).title(" Details ");
    frame.render_widget(Paragraph::new(detail).wrap(Wrap { trim: true }).block(detail_block), rows[1]);
}

fn draw_diagram(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let viewport = app.workbench.viewport();
    let now = Instant::now();
    let mut tail = format!("zoom {:.1}×", viewport.zoom());
    if viewport.is_busy(now) {
        tail.push_str(" · exporting");
    }
    if viewport.is_fullscreen() {
        tail.push_str(" · fullscreen");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(view_title("Diagram", 'm', Some(&tail)))
        .border_style(app.theme.panel_border_style(app.focus == Focus::Plan));

    let paragraph = match viewport.content() {
        ViewportContent::Empty => {
            Paragraph::new("No diagram yet.").style(app.theme.muted_style())
        }
        ViewportContent::Placeholder { message, .. } => {
            Paragraph::new(message.clone()).style(app.theme.error_style()).wrap(Wrap { trim: true })
        }
        ViewportContent::Rendered(_) => {
            let (pan_x, pan_y) = viewport.pan();
            Paragraph::new(viewport.preview_text())
                .scroll((clamp_positive_i32_to_u16(pan_y), clamp_positive_i32_to_u16(pan_x)))
        }
    };
    frame.render_widget(paragraph.block(block), area);
}

fn draw_history(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == Focus::History;
    let snapshot = app.workbench.store().snapshot();
    let active = snapshot.active_result().map(|result| result.topic().to_owned());
    let counter = format!("[{}/{}]", snapshot.history().len(), snapshot.history().capacity());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(view_title("History", '⇥', Some(&counter)))
        .border_style(app.theme.panel_border_style(focused));

    let items = snapshot
        .history()
        .iter()
        .map(|entry| {
            let marker = if active.as_deref() == Some(entry.topic()) { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(entry.topic().to_owned()),
                Span::styled(format!(" ({})", entry.steps().len()), app.theme.muted_style()),
            ]))
        })
        .collect::<Vec<_>>();
    let list = List::new(items).block(block).highlight_style(app.theme.selection_style());
    let selected = focused.then_some(app.history_cursor);
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}

fn copy_to_clipboard(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, Print(osc52_sequence(text)))
}

fn osc52_sequence(text: &str) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}

include!("chrome.rs");
