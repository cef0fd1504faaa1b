use lookahead::{Candidate, Snapshot, Status, highlight};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
};

use super::App;

const CARD_WIDTH: u16 = 64;
const PROMPT: &str = "› ";
const MARKER: &str = "▸ ";

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let card = Rect {
        width: CARD_WIDTH.min(area.width),
        ..area
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Search")
        .title_bottom(Line::from(footer(&app.snapshot)).right_aligned())
        .padding(Padding::horizontal(1));
    let inner = block.inner(card);

    frame.render_widget(Paragraph::new(view_lines(&app.input, &app.snapshot)).block(block), card);

    frame.set_cursor_position((cursor_column(inner, &app.input), inner.y));
}

/// Column just after the typed text, clamped to the card.
fn cursor_column(inner: Rect, input: &str) -> u16 {
    let offset = PROMPT.chars().count().saturating_add(input.chars().count());
    inner
        .x
        .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
        .min(inner.right().saturating_sub(1))
}

/// Everything inside the card, top to bottom.
pub fn view_lines<'a>(input: &'a str, snapshot: &'a Snapshot) -> Vec<Line<'a>> {
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut input_line = Line::from(vec![Span::raw(PROMPT), Span::raw(input)]);
    if snapshot.status == Status::Debouncing {
        input_line.push_span(Span::styled(" …", dim));
    }
    let mut lines = vec![input_line];

    if snapshot.popup.is_open() {
        match snapshot.status {
            Status::Idle if input.is_empty() => {
                lines.push(Line::styled("Type to search", dim));
            }
            Status::Idle => {}
            Status::NoResults => {
                lines.push(Line::styled(
                    format!("No results found for \"{}\"", snapshot.debounced_query),
                    dim,
                ));
            }
            Status::Debouncing if snapshot.results.is_empty() => {
                lines.push(Line::styled("Searching…", dim));
            }
            Status::Debouncing | Status::Results(_) => {
                let cursor = snapshot.popup.cursor();
                lines.extend(snapshot.results.iter().enumerate().map(|(index, candidate)| {
                    result_line(candidate, snapshot.results.query(), cursor == Some(index))
                }));
            }
        }
    }

    if let Some(selected) = &snapshot.selection {
        let mut line = Line::from(vec![
            Span::styled("Selected: ", dim),
            Span::styled(
                selected.label.as_str(),
                Style::default().fg(Color::Green),
            ),
        ]);
        if let Some(category) = &selected.category {
            line.push_span(Span::styled(format!(" ({category})"), dim));
        }
        lines.push(line);
    }

    lines
}

fn result_line<'a>(candidate: &'a Candidate, query: &str, highlighted: bool) -> Line<'a> {
    let base = if highlighted {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    let emphasis = base.add_modifier(Modifier::BOLD).fg(Color::Yellow);

    let mut spans = vec![Span::styled(if highlighted { MARKER } else { "  " }, base)];
    spans.extend(
        highlight::segments(&candidate.label, query)
            .into_iter()
            .map(|(text, matched)| Span::styled(text, if matched { emphasis } else { base })),
    );
    if let Some(category) = &candidate.category {
        spans.push(Span::styled(
            format!("  {category}"),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    Line::from(spans)
}

fn footer(snapshot: &Snapshot) -> String {
    match snapshot.status {
        Status::Results(count) if count == 1 => "1 result".to_string(),
        Status::Results(count) => format!("{count} results"),
        _ => "↑↓ navigate · enter select · esc close".to_string(),
    }
}
