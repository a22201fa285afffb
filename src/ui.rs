use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use flashbrain::timing::{format_word_count, word_count, words};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Min(3),    // body
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            self.title.clone(),
            bold_style.fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        match self.state {
            AppState::Finished => {
                let message = if self.controller.item_count() == 0 {
                    "Nothing to show: this class has no training items"
                } else {
                    "Session complete"
                };
                Paragraph::new(Span::styled(
                    message,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::ITALIC),
                ))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(centered_line(chunks[1]), buf);
            }
            AppState::Presenting => render_item(self, chunks[1], buf),
        }

        render_status(self, chunks[2], buf, dim_style);

        let legend = match self.state {
            AppState::Presenting => "(space) skip / (r)estart / (d)ebug / (esc)ape",
            AppState::Finished => "(r)estart / (d)ebug / (esc)ape",
        };
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
}

fn render_item(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(item) = app.controller.current_item() else {
        return;
    };
    let state = app.controller.state();
    let text = item.text();

    let max_chars_per_line = area.width.saturating_sub(2).max(1);
    let text_lines = ((text.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(text_lines.saturating_add(2)),
        ])
        .split(area);

    let image_style = Style::default().fg(Color::Magenta);

    if state.is_image_visible {
        let image_block = Block::default().borders(Borders::ALL).title("image");
        let inner = image_block.inner(chunks[0]);
        image_block.render(chunks[0], buf);
        Paragraph::new(Span::styled(item.image.as_str(), image_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(centered_line(inner), buf);
    }

    if state.is_text_visible {
        let highlighted = app.highlighted_word();
        let spoken_style = Style::default().add_modifier(Modifier::BOLD);
        let current_style = Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let pending_style = if highlighted.is_some() {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            spoken_style
        };

        let mut spans = Vec::new();
        for (idx, word) in words(text).into_iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw(" "));
            }
            let style = match highlighted {
                Some(h) if idx == h => current_style,
                Some(h) if idx < h => spoken_style,
                _ => pending_style,
            };
            spans.push(Span::styled(word, style));
        }

        let alignment = if text.width() <= max_chars_per_line as usize {
            Alignment::Center
        } else {
            Alignment::Left
        };
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("text"))
            .alignment(alignment)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);
    }
}

fn render_status(app: &App, area: Rect, buf: &mut Buffer, style: Style) {
    let controller = &app.controller;
    let state = controller.state();

    let mut status = match controller.current_item() {
        Some(item) => format!(
            "item {}/{}   {}   {}",
            state.current_item_index + 1,
            controller.item_count(),
            controller.phase(),
            format_word_count(word_count(item.text()) as i64),
        ),
        None => format!("{} items", controller.item_count()),
    };

    if app.settings.debug_mode() {
        let clock = &app.clock;
        let remaining = clock
            .time_remaining(controller, &app.settings)
            .zip(clock.phase_duration(controller, &app.settings))
            .map_or_else(
                || "-".to_string(),
                |(left, total)| format!("{}/{}ms", left.as_millis(), total.as_millis()),
            );
        status.push_str(&format!(
            "   [epoch {} | {}s/word | {}]",
            controller.epoch(),
            app.settings.seconds_per_word(),
            remaining
        ));
    }

    Paragraph::new(Span::styled(status, style))
        .alignment(Alignment::Center)
        .render(area, buf);
}

/// A one-line strip through the vertical middle of `area`.
fn centered_line(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect {
        x: area.x,
        y: y.min(area.bottom().saturating_sub(1)),
        width: area.width,
        height: area.height.min(1),
    }
}
