use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{MenuState, Model, Overlay, OverlayStatus, QuestionInput};
use crate::chat::RequestKind;
use crate::layout::wrap;

use super::render::truncate_to_width;
use super::style;

const OVERLAY_MIN_WIDTH: u16 = 20;
const OVERLAY_MIN_HEIGHT: u16 = 6;
const CURRENT_MARKER: &str = "\u{2192}";
const PROMPT: &str = "> ";

/// Popup area for the AI overlay within `area`.
fn overlay_rect(area: Rect) -> Rect {
    let width = area.width.saturating_sub(8).max(OVERLAY_MIN_WIDTH);
    let height = area.height.saturating_sub(4).max(OVERLAY_MIN_HEIGHT);
    centered_popup_rect(width, height, area)
}

/// Wrap width and visible rows of the overlay text for a terminal of
/// `width` x `height` cells.
pub fn overlay_text_size(width: u16, height: u16) -> (usize, usize) {
    let popup = overlay_rect(Rect::new(0, 0, width, height));
    // Borders plus one column of padding on each side; borders plus hint row.
    let text_width = popup.width.saturating_sub(4).max(1);
    let rows = popup.height.saturating_sub(3).max(1);
    (text_width as usize, rows as usize)
}

/// Wrap AI output to `width` columns, keeping its hard line breaks.
///
/// Each source line wraps on its own; blank lines stay blank.
pub fn wrap_overlay_text(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push(String::new());
        } else {
            out.extend(wrap(line, width));
        }
    }
    out
}

fn overlay_title(overlay: &Overlay) -> String {
    let state = match &overlay.status {
        OverlayStatus::Streaming if overlay.text.is_empty() => " (thinking\u{2026})",
        OverlayStatus::Streaming => " (streaming\u{2026})",
        OverlayStatus::Speaking => " (speaking\u{2026})",
        OverlayStatus::Complete => "",
        OverlayStatus::Failed(_) => " (failed)",
    };
    format!(" {}{state} ", overlay.kind.title())
}

pub fn render_chat_overlay(overlay: &Overlay, frame: &mut Frame, area: Rect) {
    let popup = overlay_rect(area);
    let (text_width, rows) = overlay_text_size(area.width, area.height);

    let lines: Vec<Line> = match &overlay.status {
        OverlayStatus::Failed(message) => {
            let mut lines = vec![Line::styled("Request failed", style::error()), Line::raw("")];
            lines.extend(wrap_overlay_text(message, text_width).into_iter().map(Line::raw));
            lines
        }
        OverlayStatus::Streaming if overlay.text.is_empty() => {
            vec![Line::styled("Waiting for a response\u{2026}", style::dim())]
        }
        _ => {
            let wrapped = wrap_overlay_text(&overlay.text, text_width);
            let max_top = wrapped.len().saturating_sub(rows);
            let top = overlay.scroll.unwrap_or(max_top).min(max_top);
            wrapped
                .into_iter()
                .skip(top)
                .take(rows)
                .map(Line::raw)
                .collect()
        }
    };

    let block = Block::default()
        .title(overlay_title(overlay))
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(style::popup());
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);
    if inner.is_empty() {
        return;
    }

    let content_height = inner.height.saturating_sub(1);
    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height);
    frame.render_widget(Paragraph::new(lines), content_area);

    let hint = match &overlay.status {
        OverlayStatus::Failed(_) => "any key returns",
        _ if overlay.is_running() => "Esc cancel \u{2502} PgUp/PgDn scroll",
        _ if overlay.kind == RequestKind::Ask => "f follow-up \u{2502} Esc close \u{2502} PgUp/PgDn scroll",
        _ => "Esc close \u{2502} PgUp/PgDn scroll",
    };
    let hint_area = Rect::new(inner.x, inner.y + content_height, inner.width, 1);
    frame.render_widget(Paragraph::new(Line::styled(hint, style::dim())), hint_area);
}

/// Longest suffix of `text` that fits in `max` columns.
fn visible_tail(text: &str, max: usize) -> &str {
    let mut used = 0usize;
    let mut start = text.len();
    for (idx, ch) in text.char_indices().rev() {
        used += UnicodeWidthChar::width(ch).unwrap_or(0);
        if used > max {
            break;
        }
        start = idx;
    }
    &text[start..]
}

/// One-line question editor with the cursor after the typed text.
pub fn render_question_input(input: &QuestionInput, frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(8).max(OVERLAY_MIN_WIDTH);
    let popup = centered_popup_rect(width, 5, area);
    let title = if input.follow_up {
        " Follow-up "
    } else {
        " Ask "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(style::popup());
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);
    if inner.is_empty() {
        return;
    }

    let room = (inner.width as usize).saturating_sub(PROMPT.len() + 1);
    let shown = visible_tail(&input.text, room);
    let placeholder = input.text.is_empty();
    let text_line = if placeholder {
        Line::from(vec![
            Span::raw(PROMPT),
            Span::styled("explain this passage", style::dim()),
        ])
    } else {
        Line::raw(format!("{PROMPT}{shown}"))
    };
    let hint = Line::styled("Enter ask \u{2502} Esc cancel", style::dim());
    frame.render_widget(Paragraph::new(vec![text_line, Line::raw(""), hint]), inner);

    let cursor_offset = if placeholder { 0 } else { shown.width() };
    let cursor_x = inner
        .x
        .saturating_add(u16::try_from(PROMPT.len() + cursor_offset).unwrap_or(inner.width));
    frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
}

/// Chapter list with the current chapter marked and the selection highlighted.
pub fn render_toc_menu(model: &Model, menu: MenuState, frame: &mut Frame, area: Rect) {
    let toc = model.nav.table_of_contents();
    let current = model.nav.cursor().chapter;
    let number_width = toc.len().to_string().len();

    let entries: Vec<String> = toc
        .iter()
        .map(|(idx, title)| {
            let marker = if *idx == current { CURRENT_MARKER } else { " " };
            format!("{marker} {:>number_width$}. {title}", idx + 1)
        })
        .collect();

    let widest = entries.iter().map(|e| e.width()).max().unwrap_or(0);
    let popup_width = u16::try_from(widest + 4)
        .unwrap_or(u16::MAX)
        .max(OVERLAY_MIN_WIDTH);
    let popup_height = u16::try_from(entries.len() + 2)
        .unwrap_or(u16::MAX)
        .min(area.height.saturating_sub(2).max(3));
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let visible_rows = popup.height.saturating_sub(2).max(1) as usize;
    let selected = menu.selected.min(entries.len().saturating_sub(1));
    let start = (selected + 1).saturating_sub(visible_rows);
    let text_width = popup.width.saturating_sub(4) as usize;

    let lines: Vec<Line> = entries
        .iter()
        .enumerate()
        .skip(start)
        .take(visible_rows)
        .map(|(i, entry)| {
            let text = truncate_to_width(entry, text_width);
            if i == selected {
                Line::styled(text, Style::default().reversed())
            } else {
                Line::raw(text)
            }
        })
        .collect();

    let block = Block::default()
        .title(" Contents ")
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(style::popup());
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
