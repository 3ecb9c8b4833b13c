//! Preview pane showing the source around a match.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::preview::PreviewWindow;
use crate::infra::highlight::StyledSpan;

const FOCUS_BACKGROUND: Color = Color::Rgb(32, 52, 70);
const FLASH_BACKGROUND: Color = Color::Rgb(120, 90, 20);

#[derive(Debug, Default)]
pub struct Preview;

impl Preview {
    /// Draw `window`. `flashing` paints the focus line with the post-jump highlight.
    pub fn render(&self, window: &PreviewWindow, flashing: bool, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(
                "{}:{} ({}-{})",
                window.path.display(),
                window.focus_line,
                window.first_line,
                window.last_line()
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = Vec::with_capacity(window.highlighted.lines.len() + 1);
        if let Some(notice) = &window.notice {
            lines.push(Line::styled(
                notice.as_str(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        }

        let focus = window.focus_offset();
        // Keep the focus line on screen for long windows.
        let skip = focus
            .map(|offset| offset.saturating_sub(usize::from(inner.height) / 2))
            .unwrap_or(0);

        for (offset, line) in window.highlighted.lines.iter().enumerate().skip(skip) {
            let background = match focus {
                Some(f) if f == offset && flashing => FLASH_BACKGROUND,
                Some(f) if f == offset => FOCUS_BACKGROUND,
                _ => Color::Reset,
            };
            let mut spans = vec![Span::styled(
                format!("{:>5} │ ", window.first_line + offset),
                Style::default().fg(Color::DarkGray).bg(background),
            )];
            spans.extend(line.spans.iter().map(|span| styled(span, background)));
            lines.push(Line::from(spans));
        }

        if window.highlighted.lines.is_empty() && window.notice.is_none() {
            lines.push(Line::styled("(empty file)", Style::default().fg(Color::DarkGray)));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}

fn styled(span: &StyledSpan, background: Color) -> Span<'_> {
    let mut style = Style::default().bg(background);
    if let Some(rgb) = span.style.foreground {
        style = style.fg(Color::Rgb(rgb.0, rgb.1, rgb.2));
    }
    if span.style.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if span.style.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if span.style.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(span.content.as_str(), style)
}
