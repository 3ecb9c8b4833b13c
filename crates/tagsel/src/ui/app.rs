//! Interactive selection screen.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::app::find::Navigator;
use crate::app::history::NavigationHistory;
use crate::app::preview::{PreviewService, PreviewWindow};
use crate::app::selection::{NumberChoice, SelectionSession};
use crate::domain::errors::TagError;
use crate::domain::model::{JumpTarget, Location};
use crate::infra::config::{Select, Ui};
use crate::ui::components::number_prompt::{NumberPrompt, NumberPromptState};
use crate::ui::components::preview::Preview;
use crate::ui::components::tag_list::TagList;

const TICK_RATE: Duration = Duration::from_millis(100);
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Terminal side of the [`Navigator`] seam.
///
/// Jumps to the other window land in the preview pane; a plain jump ends the screen and is
/// reported back to the caller.
#[derive(Debug)]
pub struct TerminalHost {
    origin: Option<Location>,
    ui: Ui,
    previews: PreviewService,
    preview: Option<PreviewWindow>,
    flash_until: Option<Instant>,
    jumped: Option<JumpTarget>,
    typed: Option<String>,
    status: Option<StatusMessage>,
}

impl TerminalHost {
    pub fn new(origin: Option<Location>, ui: Ui) -> Self {
        Self {
            origin,
            ui,
            previews: PreviewService::new(),
            preview: None,
            flash_until: None,
            jumped: None,
            typed: None,
            status: None,
        }
    }

    pub fn jumped(&self) -> Option<&JumpTarget> {
        self.jumped.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewWindow> {
        self.preview.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }

    fn is_flashing(&self) -> bool {
        self.flash_until.is_some_and(|until| Instant::now() < until)
    }

    /// Show `target` in the preview pane without recording a jump.
    fn peek(&mut self, target: &JumpTarget) {
        match self.previews.around(target, &self.ui) {
            Ok(window) => self.preview = Some(window),
            Err(err) => {
                tracing::debug!(target = %target, error = %err, "preview unavailable");
                self.preview = None;
            }
        }
    }

    fn tick(&mut self) {
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
        }
        if self.flash_until.is_some() && !self.is_flashing() {
            self.flash_until = None;
        }
    }
}

impl Navigator for TerminalHost {
    fn current_location(&self) -> Option<Location> {
        self.origin.clone()
    }

    fn open(&mut self, target: &JumpTarget) -> Result<()> {
        if target.other_window {
            let window = self
                .previews
                .around(target, &self.ui)
                .with_context(|| format!("cannot preview {target}"))?;
            self.preview = Some(window);
            self.status = Some(StatusMessage::info(format!("Showing {target}")));
        } else {
            self.jumped = Some(target.clone());
        }
        Ok(())
    }

    fn highlight(&mut self, target: &JumpTarget, duration: Duration) {
        if target.other_window {
            self.flash_until = Some(Instant::now() + duration);
        }
    }

    /// Answers with whatever was typed into the number overlay.
    fn read_tag_number(&mut self, _initial: &str) -> Option<String> {
        self.typed.take()
    }

    fn alert(&mut self, error: &TagError) {
        tracing::debug!(%error, "tag alert");
        self.status = Some(if error.is_alert() {
            StatusMessage::info(error.to_string())
        } else {
            StatusMessage::error(error.to_string())
        });
    }
}

/// Event loop around one live selection session.
pub struct SelectApp<'h> {
    session: SelectionSession,
    options: Select,
    host: TerminalHost,
    history: &'h mut dyn NavigationHistory,
    prompt: NumberPromptState,
    pending_digit: Option<char>,
    should_quit: bool,
}

impl<'h> SelectApp<'h> {
    pub fn new(
        session: SelectionSession,
        options: Select,
        host: TerminalHost,
        history: &'h mut dyn NavigationHistory,
    ) -> Self {
        let mut app = Self {
            session,
            options,
            host,
            history,
            prompt: NumberPromptState::default(),
            pending_digit: None,
            should_quit: false,
        };
        app.refresh_preview();
        app
    }

    pub fn session(&self) -> &SelectionSession {
        &self.session
    }

    pub fn host(&self) -> &TerminalHost {
        &self.host
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Hand the session back so the caller can dispose it.
    pub fn finish(self) -> (SelectionSession, Option<JumpTarget>) {
        (self.session, self.host.jumped)
    }

    /// Take over the terminal until the user jumps or quits.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stderr();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.host.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)?
                && let Event::Key(key) = event::read()?
                && key.kind != KeyEventKind::Release
            {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    pub fn render(&self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(2)])
            .split(size);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(layout[0]);

        TagList.render(frame, panes[0], &self.session, !self.prompt.is_open());

        match self.host.preview() {
            Some(window) => {
                Preview.render(window, self.host.is_flashing(), panes[1], frame.buffer_mut());
            }
            None => {
                let placeholder = Paragraph::new("No preview for this line")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().borders(Borders::ALL).title("Preview"));
                frame.render_widget(placeholder, panes[1]);
            }
        }

        self.render_status(frame, layout[1]);
        NumberPrompt.render(frame, size, &self.prompt);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let line = match &self.host.status {
            Some(status) => Line::styled(status.text.clone(), status.style()),
            None => Line::from(vec![
                Span::styled("n/p", Style::default().fg(Color::Cyan)),
                Span::raw(" next/prev · "),
                Span::styled("↵", Style::default().fg(Color::Cyan)),
                Span::raw(" jump · "),
                Span::styled("o", Style::default().fg(Color::Cyan)),
                Span::raw(" other window · "),
                Span::styled("0-9", Style::default().fg(Color::Cyan)),
                Span::raw(" by number · "),
                Span::styled("q", Style::default().fg(Color::Cyan)),
                Span::raw(" quit"),
            ]),
        };
        frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), inner);
    }

    /// Apply one key press to the session.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_open() {
            self.handle_prompt_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        let result = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                Ok(())
            }
            KeyCode::Char('n') | KeyCode::Char('j') | KeyCode::Down => {
                self.session.next_tag().map(drop)
            }
            KeyCode::Char('p') | KeyCode::Char('k') | KeyCode::Up => {
                self.session.previous_tag().map(drop)
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.session.set_cursor_line(0);
                Ok(())
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.session.set_cursor_line(usize::MAX);
                Ok(())
            }
            KeyCode::Enter => self.jump(false),
            KeyCode::Char('o') => self.jump(true),
            KeyCode::Char(digit) if digit.is_ascii_digit() => self.start_number(digit),
            _ => Ok(()),
        };

        if let Err(error) = result {
            self.host.alert(&error);
        }
        if !matches!(key.code, KeyCode::Char('o')) {
            self.refresh_preview();
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.prompt.close();
                self.finish_number(None);
            }
            KeyCode::Enter => {
                let typed = self.prompt.take_input();
                self.finish_number(Some(typed));
            }
            KeyCode::Backspace => self.prompt.pop_char(),
            KeyCode::Char(ch) => self.prompt.push_char(ch),
            _ => {}
        }
    }

    fn jump(&mut self, other_window: bool) -> Result<(), TagError> {
        self.session
            .goto_tag(other_window, &self.options, &mut *self.history, &mut self.host)?;
        if !other_window {
            self.should_quit = true;
        }
        Ok(())
    }

    fn start_number(&mut self, digit: char) -> Result<(), TagError> {
        match self.session.resolve_number_prefix(digit, &self.options) {
            NumberChoice::Immediate(_) => self.select_number(digit),
            NumberChoice::NeedsCompletion { initial } => {
                self.pending_digit = Some(digit);
                self.prompt.open_with(initial);
                Ok(())
            }
        }
    }

    fn finish_number(&mut self, typed: Option<String>) {
        let Some(digit) = self.pending_digit.take() else {
            return;
        };
        self.host.typed = typed;
        if let Err(error) = self.select_number(digit) {
            self.host.alert(&error);
        }
        self.refresh_preview();
    }

    fn select_number(&mut self, digit: char) -> Result<(), TagError> {
        self.session.select_by_number(
            digit,
            false,
            &self.options,
            &mut *self.history,
            &mut self.host,
        )?;
        self.should_quit = true;
        Ok(())
    }

    fn refresh_preview(&mut self) {
        match self.session.target_at(self.session.cursor_line(), true) {
            Some(target) => self.host.peek(&target),
            None => self.host.preview = None,
        }
    }
}

#[derive(Debug)]
struct StatusMessage {
    text: String,
    error: bool,
    expires_at: Instant,
}

impl StatusMessage {
    fn info(text: String) -> Self {
        Self {
            text,
            error: false,
            expires_at: Instant::now() + STATUS_TTL,
        }
    }

    fn error(text: String) -> Self {
        Self {
            error: true,
            ..Self::info(text)
        }
    }

    fn style(&self) -> Style {
        if self.error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}
