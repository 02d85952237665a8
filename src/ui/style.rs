//! Colors for the reader chrome.
//!
//! Uses ANSI colors that adapt to the terminal's color palette.

use ratatui::style::{Color, Modifier, Style};

use crate::app::ToastLevel;

pub fn header() -> Style {
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

pub fn header_title() -> Style {
    header().add_modifier(Modifier::BOLD)
}

pub fn header_progress() -> Style {
    header().fg(Color::Yellow)
}

pub fn help_bar() -> Style {
    Style::default().fg(Color::Indexed(245))
}

pub fn speech_bar() -> Style {
    Style::default().bg(Color::Blue).fg(Color::White)
}

pub fn popup() -> Style {
    Style::default().bg(Color::Black).fg(Color::White)
}

pub fn dim() -> Style {
    Style::default().fg(Color::Indexed(245))
}

pub fn error() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

/// Prefix and style for a toast.
pub fn toast(level: ToastLevel) -> (&'static str, Style) {
    match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    }
}
