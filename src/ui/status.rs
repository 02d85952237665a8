use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Mode, Model};
use crate::chat::RequestKind;

use super::style;

const READING_HELP: &str = "\u{2190}(h) \u{2192}(l) \u{2022} \u{2191}(k) \u{2193}(j) \u{2022} \
     g/G start/end \u{2022} TOC(t) \u{2022} Summarize(s) \u{2022} Ask AI(a) \u{2022} \
     Read(r) \u{2022} Guide(>) \u{2022} Quit(q)";
const MENU_HELP: &str = "j/k move \u{2022} g/G first/last \u{2022} Enter jump \u{2022} Esc close";
const RUNNING_OVERLAY_HELP: &str = "PgUp/PgDn scroll \u{2022} Esc cancel \u{2022} j/k/h/l cancel and move";
const OVERLAY_HELP: &str = "PgUp/PgDn scroll \u{2022} Esc close \u{2022} navigation keys return to the book";
const ANSWER_OVERLAY_HELP: &str =
    "PgUp/PgDn scroll \u{2022} Follow-up(f) \u{2022} Esc close \u{2022} navigation keys return to the book";
const QUESTION_HELP: &str =
    "Enter ask (empty explains the page) \u{2022} Backspace edit \u{2022} Esc cancel";
const FAILED_OVERLAY_HELP: &str = "Press any key to return to the book";

/// Bottom line: a toast, the read-aloud indicator, or key help.
pub fn render_footer(model: &Model, frame: &mut Frame, area: Rect) {
    if let Some((message, level)) = model.active_toast() {
        let (prefix, style) = style::toast(level);
        let bar = Paragraph::new(format!(" {prefix} {message}")).style(style);
        frame.render_widget(bar, area);
        return;
    }
    if model.is_reading_aloud() {
        let bar = Paragraph::new(" \u{266a} Reading aloud\u{2026} Esc to stop")
            .style(style::speech_bar());
        frame.render_widget(bar, area);
        return;
    }
    let bar = Paragraph::new(format!(" {}", help_text(model))).style(style::help_bar());
    frame.render_widget(bar, area);
}

pub fn help_text(model: &Model) -> &'static str {
    match &model.mode {
        Mode::Reading => READING_HELP,
        Mode::Menu(_) => MENU_HELP,
        Mode::Question(_) => QUESTION_HELP,
        Mode::Overlay(overlay) if overlay.is_failed() => FAILED_OVERLAY_HELP,
        Mode::Overlay(overlay) if overlay.is_running() => RUNNING_OVERLAY_HELP,
        Mode::Overlay(overlay) if overlay.kind == RequestKind::Ask => ANSWER_OVERLAY_HELP,
        Mode::Overlay(_) => OVERLAY_HELP,
    }
}
