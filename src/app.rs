//! Terminal shell around the controller
//!
//! Maps keys to controller intents, drains background events and renderer
//! frames every tick, and draws the current page, status line and controls.
//! Zoom controls are drawn dimmed whenever the controller's affordance says
//! they would do nothing.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use flume::Receiver;
use log::debug;
use ratatui::{
    Frame, Terminal,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::controller::{Intent, ViewerController};
use crate::event_source::EventSource;
use crate::picker::{PagePicker, PathPrompt, PopupOutcome, fixed_rect};
use crate::renderer;
use crate::resource::ResourceHandle;
use crate::session::{LoadState, PageCount};
use crate::theme::OCEANIC_NEXT;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

#[derive(Clone, Debug)]
enum Popup {
    JumpToPage(PagePicker),
    Open(PathPrompt),
}

pub struct App {
    controller: ViewerController,
    frames: Receiver<renderer::Frame>,
    last_frame: Option<renderer::Frame>,
    popup: Option<Popup>,
}

impl App {
    pub fn new(controller: ViewerController, frames: Receiver<renderer::Frame>) -> Self {
        Self {
            controller,
            frames,
            last_frame: None,
            popup: None,
        }
    }

    pub fn controller(&self) -> &ViewerController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewerController {
        &mut self.controller
    }

    pub fn into_controller(self) -> ViewerController {
        self.controller
    }

    /// Last frame the renderer produced for the current document
    pub fn last_frame(&self) -> Option<&renderer::Frame> {
        self.last_frame.as_ref()
    }

    pub fn has_active_popup(&self) -> bool {
        self.popup.is_some()
    }

    /// Drain background work: controller events, then renderer frames
    pub fn tick(&mut self) {
        self.controller.pump();
        while let Ok(frame) = self.frames.try_recv() {
            self.last_frame = Some(frame);
        }
        if !matches!(self.controller.load_state(), LoadState::Ready(_)) {
            self.last_frame = None;
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if let Some(popup) = self.popup.as_mut() {
            let intent = match popup {
                Popup::JumpToPage(picker) => match picker.handle_key(key) {
                    PopupOutcome::Pending => return None,
                    PopupOutcome::Confirmed(page) => Some(Intent::JumpToPage(i64::from(page))),
                    PopupOutcome::Cancelled => None,
                },
                Popup::Open(prompt) => match prompt.handle_key(key) {
                    PopupOutcome::Pending => return None,
                    PopupOutcome::Confirmed(path) => Some(Intent::Open(ResourceHandle::new(path))),
                    PopupOutcome::Cancelled => None,
                },
            };
            self.popup = None;
            if let Some(intent) = intent {
                self.controller.dispatch(intent);
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                self.controller.dispatch(Intent::NextPage);
            }
            KeyCode::Char('h') | KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                self.controller.dispatch(Intent::PreviousPage);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.controller.dispatch(Intent::ZoomIn),
            KeyCode::Char('-') => self.controller.dispatch(Intent::ZoomOut),
            KeyCode::Char('g') => self.open_jump_picker(),
            KeyCode::Char('o') => self.popup = Some(Popup::Open(PathPrompt::new())),
            _ => {}
        }
        None
    }

    fn open_jump_picker(&mut self) {
        let session = self.controller.session();
        match session.load_state() {
            LoadState::Ready(PageCount::Known(total)) => {
                self.popup = Some(Popup::JumpToPage(PagePicker::new(
                    session.current_page(),
                    total,
                )));
            }
            state => debug!("Jump picker unavailable while {state:?}"),
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.draw_title(f, chunks[0]);
        self.draw_viewport(f, chunks[1]);
        self.draw_status(f, chunks[2]);
        self.draw_controls(f, chunks[3]);

        let area = f.area();
        match &self.popup {
            Some(Popup::JumpToPage(picker)) => picker.render(f, area),
            Some(Popup::Open(prompt)) => prompt.render(f, area),
            None => {}
        }
    }

    fn draw_title(&self, f: &mut Frame, area: Rect) {
        let name = self
            .controller
            .session()
            .resource()
            .map_or("pdfshell", ResourceHandle::display_name);
        let title = Paragraph::new(Line::from(Span::styled(
            format!(" {name} "),
            Style::default()
                .fg(OCEANIC_NEXT.bright)
                .add_modifier(Modifier::BOLD),
        )))
        .style(Style::default().bg(OCEANIC_NEXT.surface));
        f.render_widget(title, area);
    }

    fn draw_viewport(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(OCEANIC_NEXT.muted));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let message = match (self.controller.load_state(), &self.last_frame) {
            (LoadState::Empty, _) => "No document. Press o to open one.",
            (LoadState::Loading, _) => "Loading…",
            (LoadState::Ready(_), Some(frame)) => {
                draw_page(f, inner, frame);
                return;
            }
            (LoadState::Ready(_), None) => "Waiting for renderer…",
        };

        let text = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(OCEANIC_NEXT.muted));
        f.render_widget(text, fixed_rect(inner.width, 1, inner));
    }

    fn draw_status(&self, f: &mut Frame, area: Rect) {
        let session = self.controller.session();
        let pages = match session.load_state() {
            LoadState::Empty => "-".to_string(),
            LoadState::Loading | LoadState::Ready(PageCount::Unknown) => {
                format!("{} / ?", session.current_page())
            }
            LoadState::Ready(PageCount::Known(total)) => {
                format!("{} / {total}", session.current_page())
            }
        };
        let status = Paragraph::new(Line::from(vec![
            Span::styled(" Page ", Style::default().fg(OCEANIC_NEXT.muted)),
            Span::styled(pages, Style::default().fg(OCEANIC_NEXT.foreground)),
            Span::styled("   Zoom ", Style::default().fg(OCEANIC_NEXT.muted)),
            Span::styled(
                format!("{}%", session.zoom().percent()),
                Style::default().fg(OCEANIC_NEXT.foreground),
            ),
        ]));
        f.render_widget(status, area);
    }

    fn draw_controls(&self, f: &mut Frame, area: Rect) {
        let affordance = self.controller.current_affordance();
        let mut spans = Vec::new();
        for (key, label, enabled) in [
            ("h", "Prev", true),
            ("l", "Next", true),
            ("g", "Go to", true),
            ("o", "Open", true),
            ("-", "Zoom out", affordance.can_zoom_out),
            ("+", "Zoom in", affordance.can_zoom_in),
            ("q", "Quit", true),
        ] {
            let (key_style, label_style) = if enabled {
                (
                    Style::default().fg(OCEANIC_NEXT.highlight),
                    Style::default().fg(OCEANIC_NEXT.foreground),
                )
            } else {
                (
                    Style::default().fg(OCEANIC_NEXT.muted),
                    Style::default()
                        .fg(OCEANIC_NEXT.muted)
                        .add_modifier(Modifier::DIM),
                )
            };
            spans.push(Span::styled(format!(" {key} "), key_style));
            spans.push(Span::styled(format!("{label} "), label_style));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Draw the painted page as a sheet whose size follows the zoom scale
fn draw_page(f: &mut Frame, area: Rect, frame: &renderer::Frame) {
    let width = ((f32::from(area.width) * 0.4 * frame.scale) as u16).clamp(12, area.width);
    let height = ((f32::from(area.height) * 0.5 * frame.scale) as u16).clamp(3, area.height);
    let sheet = fixed_rect(width, height, area);

    let page = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Page {}", frame.page),
            Style::default()
                .fg(OCEANIC_NEXT.background)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("of {}", frame.page_count),
            Style::default().fg(OCEANIC_NEXT.muted),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().bg(OCEANIC_NEXT.bright));
    f.render_widget(page, sheet);
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    loop {
        app.tick();
        terminal.draw(|f| app.draw(f))?;

        if event_source.poll(tick_rate)? {
            if let Event::Key(key) = event_source.read()? {
                if app.handle_key_event(key) == Some(AppAction::Quit) {
                    return Ok(());
                }
            }
        }
    }
}
