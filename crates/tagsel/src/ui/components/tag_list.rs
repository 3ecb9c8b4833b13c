//! Renders a selection session as a scrollable, numbered list.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::app::selection::{LineKind, RenderLine, SelectionSession};

#[derive(Debug, Default)]
pub struct TagList;

impl TagList {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        session: &SelectionSession,
        has_focus: bool,
    ) {
        let block = Block::default().borders(Borders::ALL).title(format!(
            "{} · {} matches",
            session.name(),
            session.match_count()
        ));

        let items: Vec<ListItem<'_>> = session.lines().iter().map(list_item).collect();

        let mut list_state = ListState::default();
        list_state.select(Some(session.cursor_line()));

        let highlight_style = Style::default()
            .fg(Color::Black)
            .bg(if has_focus { Color::Cyan } else { Color::Gray })
            .add_modifier(Modifier::BOLD);

        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style)
            .highlight_symbol("▸ ");

        frame.render_stateful_widget(list, area, &mut list_state);
    }
}

fn list_item(line: &RenderLine) -> ListItem<'_> {
    match line.kind {
        LineKind::Header => ListItem::new(Line::styled(
            line.text.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        LineKind::Blank => ListItem::new(Line::raw("")),
        LineKind::FileHeader => ListItem::new(Line::styled(
            line.text.as_str(),
            Style::default().fg(Color::Yellow),
        )),
        LineKind::Match { number } => {
            let digits = number.to_string().len();
            let (label, rest) = line.text.split_at(digits.min(line.text.len()));
            ListItem::new(Line::from(vec![
                Span::styled(label, Style::default().fg(Color::Cyan)),
                Span::raw(rest),
            ]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::domain::model::{FileGroup, Match, Position, SourceId};

    fn session() -> SelectionSession {
        let source = SourceId::new(1);
        let groups = vec![FileGroup {
            locator: PathBuf::from("src/lib.rs"),
            source,
            matches: vec![Match {
                source,
                locator: PathBuf::from("src/lib.rs"),
                line_text: "pub fn render() {}".into(),
                position: Position::new(3, 8),
            }],
        }];
        SelectionSession::build("render", "render", groups).expect("session")
    }

    #[test]
    fn draws_header_file_and_match_rows() {
        let backend = TestBackend::new(48, 8);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let session = session();

        terminal
            .draw(|frame| {
                let area = frame.size();
                TagList.render(frame, area, &session, true);
            })
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer.get(x, y).symbol().to_string())
                    .collect()
            })
            .collect();
        let screen = rows.join("\n");

        assert!(screen.contains("render · 1 matches"));
        assert!(screen.contains("Finding tag: render"));
        assert!(screen.contains("In: src/lib.rs"));
        assert!(screen.contains("▸ 1 pub fn render() {}"));
    }
}
