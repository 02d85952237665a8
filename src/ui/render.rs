use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::{Mode, Model};

use super::{FOOTER_HEIGHT, HEADER_HEIGHT, PAGE_PADDING, overlays, status, style};

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    render_header(model, frame, chunks[0]);
    render_page(model, frame, chunks[1]);
    status::render_footer(model, frame, chunks[2]);

    match &model.mode {
        Mode::Reading => {}
        Mode::Menu(menu) => overlays::render_toc_menu(model, *menu, frame, area),
        Mode::Question(input) => overlays::render_question_input(input, frame, area),
        Mode::Overlay(overlay) => overlays::render_chat_overlay(overlay, frame, area),
    }
}

/// "Section i/n • Page p/m (x%) • Overall y%"
pub(super) fn progress_label(model: &Model) -> String {
    let nav = &model.nav;
    let cursor = nav.cursor();
    format!(
        "Section {}/{} \u{2022} Page {}/{} ({}%) \u{2022} Overall {}%",
        cursor.chapter + 1,
        nav.book().len(),
        cursor.page + 1,
        nav.page_count(),
        nav.chapter_percent(),
        nav.book_percent(),
    )
}

fn render_header(model: &Model, frame: &mut Frame, area: Rect) {
    let progress = format!("{} ", progress_label(model));
    let title_room = (area.width as usize).saturating_sub(progress.width() + 1);
    let chapter = model.nav.book().chapter(model.nav.cursor().chapter);
    let title = truncate_to_width(&format!(" {}", chapter.title()), title_room);
    let gap = (area.width as usize).saturating_sub(title.width() + progress.width());

    let line = Line::from(vec![
        Span::styled(title, style::header_title()),
        Span::styled(" ".repeat(gap), style::header()),
        Span::styled(progress, style::header_progress()),
    ]);
    frame.render_widget(Paragraph::new(line).style(style::header()), area);
}

fn render_page(model: &Model, frame: &mut Frame, area: Rect) {
    let inner = Rect::new(
        area.x + PAGE_PADDING.min(area.width),
        area.y,
        area.width.saturating_sub(2 * PAGE_PADDING),
        area.height,
    );
    let lines: Vec<Line> = model
        .nav
        .visible_page()
        .map(|page| page.lines().iter().map(|l| Line::raw(l.as_str())).collect())
        .unwrap_or_default();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Cut `text` to at most `max` display columns, marking the cut with "…".
pub(super) fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('\u{2026}');
    out
}
