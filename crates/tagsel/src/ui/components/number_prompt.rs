//! Overlay that collects a complete tag number.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Input state for the tag number overlay. Only digits are accepted.
#[derive(Debug, Default, Clone)]
pub struct NumberPromptState {
    visible: bool,
    input: String,
}

impl NumberPromptState {
    /// Show the prompt pre-filled with `initial`.
    pub fn open_with(&mut self, initial: impl Into<String>) {
        self.visible = true;
        self.input = initial.into();
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.input.clear();
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Consume the typed number and hide the prompt.
    pub fn take_input(&mut self) -> String {
        self.visible = false;
        std::mem::take(&mut self.input)
    }

    pub fn push_char(&mut self, ch: char) {
        if ch.is_ascii_digit() {
            self.input.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }
}

#[derive(Debug, Default)]
pub struct NumberPrompt;

impl NumberPrompt {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &NumberPromptState) {
        if !state.is_open() {
            return;
        }

        let width = area.width.saturating_sub(4).min(32);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + area.height.saturating_sub(4),
            width,
            height: 3.min(area.height),
        };

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title("Tag number")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let prompt = Paragraph::new(format!("# {}", state.input()))
            .style(Style::default().fg(Color::White))
            .block(block);
        frame.render_widget(prompt, popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_keeps_only_digits() {
        let mut state = NumberPromptState::default();
        state.open_with("1");
        state.push_char('2');
        state.push_char('x');
        state.push_char('3');
        state.pop_char();

        assert!(state.is_open());
        assert_eq!(state.input(), "12");
        assert_eq!(state.take_input(), "12");
        assert!(!state.is_open());
        assert_eq!(state.input(), "");
    }
}
