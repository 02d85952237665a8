use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::model::{Mode, Overlay};
use crate::app::{App, Message, Model};

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key, model),
            Event::Resize(w, h) => {
                tracing::debug!(width = w, height = h, "resize queued");
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Message::Quit),
                _ => None,
            };
        }

        match &model.mode {
            Mode::Reading => reading_key(key.code),
            Mode::Menu(_) => menu_key(key.code),
            Mode::Question(_) => question_key(key.code),
            Mode::Overlay(overlay) => overlay_key(key.code, overlay),
        }
    }
}

fn reading_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Char('h') | KeyCode::Left => Some(Message::PrevChapter),
        KeyCode::Char('l') | KeyCode::Right => Some(Message::NextChapter),
        KeyCode::Char('j') | KeyCode::Down => Some(Message::NextPage),
        KeyCode::Char('k') | KeyCode::Up => Some(Message::PrevPage),
        KeyCode::Char('g') => Some(Message::JumpToStart),
        KeyCode::Char('G') => Some(Message::JumpToEnd),
        KeyCode::Char('t') => Some(Message::OpenMenu),
        KeyCode::Char('a') => Some(Message::Ask),
        KeyCode::Char('s') => Some(Message::Summarize),
        KeyCode::Char('r') => Some(Message::ReadAloud),
        KeyCode::Char('>') => Some(Message::Compass),
        KeyCode::Esc => Some(Message::StopSpeech),
        KeyCode::Char('q') => Some(Message::Quit),
        _ => None,
    }
}

fn menu_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => Some(Message::MenuDown),
        KeyCode::Char('k') | KeyCode::Up => Some(Message::MenuUp),
        KeyCode::Char('g') => Some(Message::MenuTop),
        KeyCode::Char('G') => Some(Message::MenuBottom),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Message::MenuSelect),
        KeyCode::Char('t' | 'q') | KeyCode::Esc => Some(Message::CloseMenu),
        _ => None,
    }
}

fn question_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Char(ch) => Some(Message::QuestionChar(ch)),
        KeyCode::Backspace => Some(Message::QuestionBackspace),
        KeyCode::Enter => Some(Message::QuestionSubmit),
        KeyCode::Esc => Some(Message::QuestionCancel),
        _ => None,
    }
}

/// Navigation and request keys pass through as reading messages; `update`
/// decides whether they close the overlay first or are ignored.
fn overlay_key(code: KeyCode, overlay: &Overlay) -> Option<Message> {
    if overlay.is_failed() {
        return Some(Message::CloseOverlay);
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Message::CloseOverlay),
        KeyCode::PageDown | KeyCode::Char(' ') => Some(Message::OverlayScrollDown),
        KeyCode::PageUp => Some(Message::OverlayScrollUp),
        KeyCode::Char('f') => Some(Message::FollowUp),
        code => reading_key(code)
            .filter(|msg| msg.is_navigation() || msg.request_kind().is_some()),
    }
}
