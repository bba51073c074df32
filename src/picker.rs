//! Popups that collect input for the controller: the bounded jump-to-page
//! picker and the open-document path prompt.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::theme::OCEANIC_NEXT;

/// Result of feeding a key to a popup
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopupOutcome<T> {
    Pending,
    Confirmed(T),
    Cancelled,
}

/// Numeric picker bounded to `[1, max]`
#[derive(Clone, Debug)]
pub struct PagePicker {
    max: u32,
    value: u32,
    /// Digits typed since the last arrow key
    typed: String,
}

impl PagePicker {
    pub fn new(current: u32, max: u32) -> Self {
        let max = max.max(1);
        Self {
            max,
            value: current.clamp(1, max),
            typed: String::new(),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn increment(&mut self) {
        self.typed.clear();
        self.value = self.value.saturating_add(1).min(self.max);
    }

    pub fn decrement(&mut self) {
        self.typed.clear();
        self.value = self.value.saturating_sub(1).max(1);
    }

    fn type_digit(&mut self, digit: char) {
        if self.typed.len() >= 10 {
            return;
        }
        self.typed.push(digit);
        self.sync_typed();
    }

    fn backspace(&mut self) {
        self.typed.pop();
        self.sync_typed();
    }

    fn sync_typed(&mut self) {
        if let Ok(typed) = self.typed.parse::<u64>() {
            self.value = typed.clamp(1, u64::from(self.max)) as u32;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PopupOutcome<u32> {
        match key.code {
            KeyCode::Enter => PopupOutcome::Confirmed(self.value),
            KeyCode::Esc => PopupOutcome::Cancelled,
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('+') => {
                self.increment();
                PopupOutcome::Pending
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('-') => {
                self.decrement();
                PopupOutcome::Pending
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.type_digit(c);
                PopupOutcome::Pending
            }
            KeyCode::Backspace => {
                self.backspace();
                PopupOutcome::Pending
            }
            _ => PopupOutcome::Pending,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let popup_area = fixed_rect(30, 7, area);
        f.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(Span::styled("▲", Style::default().fg(OCEANIC_NEXT.muted))),
            Line::from(Span::styled(
                self.value.to_string(),
                Style::default()
                    .fg(OCEANIC_NEXT.bright)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled("▼", Style::default().fg(OCEANIC_NEXT.muted))),
            Line::from(Span::styled(
                format!("1 – {}", self.max),
                Style::default().fg(OCEANIC_NEXT.muted),
            )),
        ];

        let picker = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .title(" Go to page ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(OCEANIC_NEXT.accent))
                .style(Style::default().bg(OCEANIC_NEXT.background)),
        );
        f.render_widget(picker, popup_area);
    }
}

/// Single-line prompt for a document path
#[derive(Clone, Debug, Default)]
pub struct PathPrompt {
    input: String,
}

impl PathPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PopupOutcome<String> {
        match key.code {
            KeyCode::Enter => {
                let path = self.input.trim();
                if path.is_empty() {
                    PopupOutcome::Cancelled
                } else {
                    PopupOutcome::Confirmed(path.to_string())
                }
            }
            KeyCode::Esc => PopupOutcome::Cancelled,
            KeyCode::Backspace => {
                self.input.pop();
                PopupOutcome::Pending
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                PopupOutcome::Pending
            }
            _ => PopupOutcome::Pending,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(8).clamp(20, 80);
        let popup_area = fixed_rect(width, 3, area);
        f.render_widget(Clear, popup_area);

        let prompt = Paragraph::new(Line::from(vec![
            Span::styled(self.input.as_str(), Style::default().fg(OCEANIC_NEXT.bright)),
            Span::styled("█", Style::default().fg(OCEANIC_NEXT.accent)),
        ]))
        .block(
            Block::default()
                .title(" Open document ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(OCEANIC_NEXT.accent))
                .style(Style::default().bg(OCEANIC_NEXT.background)),
        );
        f.render_widget(prompt, popup_area);
    }
}

/// Rect of the given size centred in `r`, shrunk to fit
pub fn fixed_rect(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height.min(r.height)),
            Constraint::Fill(1),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width.min(r.width)),
            Constraint::Fill(1),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn picker_starts_at_current_page_within_bounds() {
        assert_eq!(PagePicker::new(4, 10).value(), 4);
        assert_eq!(PagePicker::new(40, 10).value(), 10);
        assert_eq!(PagePicker::new(0, 10).value(), 1);
    }

    #[test]
    fn picker_arrows_clamp() {
        let mut picker = PagePicker::new(9, 10);
        picker.handle_key(key(KeyCode::Up));
        picker.handle_key(key(KeyCode::Up));
        assert_eq!(picker.value(), 10);

        let mut picker = PagePicker::new(2, 10);
        picker.handle_key(key(KeyCode::Down));
        picker.handle_key(key(KeyCode::Down));
        assert_eq!(picker.value(), 1);
    }

    #[test]
    fn up_at_the_largest_page_count_stays_put() {
        let mut picker = PagePicker::new(u32::MAX, u32::MAX);
        picker.handle_key(key(KeyCode::Up));
        assert_eq!(picker.value(), u32::MAX);
    }

    #[test]
    fn typed_digits_clamp_to_range() {
        let mut picker = PagePicker::new(1, 12);
        picker.handle_key(key(KeyCode::Char('7')));
        assert_eq!(picker.value(), 7);
        picker.handle_key(key(KeyCode::Char('5')));
        assert_eq!(picker.value(), 12);
        picker.handle_key(key(KeyCode::Backspace));
        assert_eq!(picker.value(), 7);
        assert_eq!(
            picker.handle_key(key(KeyCode::Enter)),
            PopupOutcome::Confirmed(7)
        );
    }

    #[test]
    fn prompt_collects_path() {
        let mut prompt = PathPrompt::new();
        for c in "a.pdf".chars() {
            assert_eq!(prompt.handle_key(key(KeyCode::Char(c))), PopupOutcome::Pending);
        }
        prompt.handle_key(key(KeyCode::Char('x')));
        prompt.handle_key(key(KeyCode::Backspace));
        assert_eq!(prompt.input(), "a.pdf");
        assert_eq!(
            prompt.handle_key(key(KeyCode::Enter)),
            PopupOutcome::Confirmed("a.pdf".to_string())
        );
    }

    #[test]
    fn empty_prompt_cancels() {
        let mut prompt = PathPrompt::new();
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PopupOutcome::Cancelled);
    }
}
