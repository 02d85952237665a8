use crate::app::Model;
use crate::app::model::{MenuState, Mode, Overlay, OverlayStatus, QuestionInput, ToastLevel};
use crate::chat::{ChatHistory, RequestKind, RequestSpec, prompt};

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Next page, crossing into the next chapter
    NextPage,
    /// Previous page, crossing into the previous chapter
    PrevPage,
    NextChapter,
    PrevChapter,
    /// First page of the book
    JumpToStart,
    /// Last page of the book
    JumpToEnd,

    // Table of contents
    /// Open the chapter menu on the current chapter
    OpenMenu,
    MenuUp,
    MenuDown,
    MenuTop,
    MenuBottom,
    /// Jump to the highlighted chapter
    MenuSelect,
    /// Close the menu without moving
    CloseMenu,

    // Assistant
    /// Start typing a question about the visible page
    Ask,
    /// Continue a finished answer with another question
    FollowUp,
    /// Character typed into the question line
    QuestionChar(char),
    QuestionBackspace,
    /// Send the typed question
    QuestionSubmit,
    /// Abandon the typed question
    QuestionCancel,
    /// Summarize the chapter through the visible page
    Summarize,
    /// Speak the visible page
    ReadAloud,
    /// Stream and speak a reading guide
    Compass,
    /// Stop an in-progress read-aloud
    StopSpeech,
    OverlayScrollUp,
    OverlayScrollDown,
    /// Close the overlay, cancelling its request if running
    CloseOverlay,
    /// Poll the background request
    Tick,

    // Window
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit the application
    Quit,
}

impl Message {
    /// Keys that move through the book from reading mode.
    pub const fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::NextPage
                | Self::PrevPage
                | Self::NextChapter
                | Self::PrevChapter
                | Self::JumpToStart
                | Self::JumpToEnd
                | Self::OpenMenu
        )
    }

    /// Keys that start a background request.
    pub const fn request_kind(&self) -> Option<RequestKind> {
        match self {
            Self::Ask => Some(RequestKind::Ask),
            Self::Summarize => Some(RequestKind::Summary),
            Self::ReadAloud => Some(RequestKind::ReadAloud),
            Self::Compass => Some(RequestKind::Compass),
            _ => None,
        }
    }
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here.
/// Background work is only queued in `model.outbox`; launching it is a side
/// effect handled by the event loop.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Tick => model.poll_request(),
        Message::Resize(width, height) => apply_resize(&mut model, width, height),
        Message::Quit => {
            model.cancel_request();
            model.should_quit = true;
        }
        msg => match model.mode {
            Mode::Reading => apply_reading(&mut model, msg),
            Mode::Menu(menu) => apply_menu(&mut model, menu, msg),
            Mode::Question(_) => apply_question(&mut model, msg),
            Mode::Overlay(_) => apply_overlay(&mut model, msg),
        },
    }
    model
}

fn apply_resize(model: &mut Model, width: u16, height: u16) {
    model.terminal_size = (width, height);
    let viewport = crate::ui::page_viewport(width, height);
    if viewport == model.nav.viewport() {
        return;
    }
    if model.overlay().is_some() {
        model.close_overlay();
    }
    model.nav.on_resize(viewport);
}

fn apply_reading(model: &mut Model, msg: Message) {
    match msg {
        Message::NextPage => model.nav.next_page(),
        Message::PrevPage => model.nav.prev_page(),
        Message::NextChapter => model.nav.next_chapter(),
        Message::PrevChapter => model.nav.prev_chapter(),
        Message::JumpToStart => model.nav.jump_to_start(),
        Message::JumpToEnd => model.nav.jump_to_end(),
        Message::OpenMenu => {
            model.mode = Mode::Menu(MenuState {
                selected: model.nav.cursor().chapter,
            });
        }
        Message::StopSpeech => {
            if model.is_reading_aloud() {
                model.cancel_request();
                model.show_toast(ToastLevel::Info, "Stopped reading");
            }
        }
        Message::Ask => open_question(model, false),
        msg => {
            if let Some(kind) = msg.request_kind() {
                start_request(model, kind);
            }
        }
    }
}

/// Show a toast and return true when a request is already under way.
fn reject_if_busy(model: &mut Model) -> bool {
    if !model.is_busy() {
        return false;
    }
    let hint = if model.is_reading_aloud() {
        "Reading aloud - press Esc to stop"
    } else {
        "A request is already running"
    };
    model.show_toast(ToastLevel::Info, hint);
    true
}

fn open_question(model: &mut Model, follow_up: bool) {
    if reject_if_busy(model) {
        return;
    }
    model.mode = Mode::Question(QuestionInput {
        text: String::new(),
        follow_up,
    });
}

fn start_request(model: &mut Model, kind: RequestKind) {
    if reject_if_busy(model) {
        return;
    }
    let payload = match kind {
        RequestKind::Ask => prompt::ask_prompt(&model.nav, ""),
        RequestKind::Summary => prompt::summary_prompt(&model.nav),
        RequestKind::Compass => prompt::compass_prompt(&model.nav),
        RequestKind::ReadAloud => model.nav.visible_text(),
    };
    if kind == RequestKind::ReadAloud && payload.trim().is_empty() {
        model.show_toast(ToastLevel::Info, "Nothing to read on this page");
        return;
    }
    queue_request(model, kind, payload);
}

fn queue_request(model: &mut Model, kind: RequestKind, payload: String) {
    model.outbox = Some(RequestSpec {
        kind,
        origin: model.nav.cursor(),
        payload,
    });
    if kind.uses_overlay() {
        model.mode = Mode::Overlay(Overlay::streaming(kind));
    }
}

fn apply_menu(model: &mut Model, mut menu: MenuState, msg: Message) {
    let last = model.nav.book().len().saturating_sub(1);
    match msg {
        Message::MenuUp => menu.selected = menu.selected.saturating_sub(1),
        Message::MenuDown => menu.selected = (menu.selected + 1).min(last),
        Message::MenuTop => menu.selected = 0,
        Message::MenuBottom => menu.selected = last,
        Message::MenuSelect => {
            model.nav.select_chapter(menu.selected);
            model.mode = Mode::Reading;
            return;
        }
        Message::CloseMenu => {
            model.mode = Mode::Reading;
            return;
        }
        _ => return,
    }
    model.mode = Mode::Menu(menu);
}

fn apply_question(model: &mut Model, msg: Message) {
    match msg {
        Message::QuestionChar(ch) => {
            if let Mode::Question(input) = &mut model.mode {
                input.text.push(ch);
            }
        }
        Message::QuestionBackspace => {
            if let Mode::Question(input) = &mut model.mode {
                input.text.pop();
            }
        }
        Message::QuestionCancel => model.mode = Mode::Reading,
        Message::QuestionSubmit => {
            let Mode::Question(input) = std::mem::take(&mut model.mode) else {
                return;
            };
            let question = input.text.trim();
            if matches!(question.to_lowercase().as_str(), ":q" | ":quit") {
                return;
            }
            if reject_if_busy(model) {
                return;
            }
            if !input.follow_up {
                model.conversation = ChatHistory::default();
            }
            let payload = prompt::ask_prompt(&model.nav, question);
            queue_request(model, RequestKind::Ask, payload);
        }
        _ => {}
    }
}

fn apply_overlay(model: &mut Model, msg: Message) {
    let Mode::Overlay(overlay) = &model.mode else {
        return;
    };
    let running = overlay.is_running();
    let failed = overlay.is_failed();
    let answered = overlay.kind == RequestKind::Ask && overlay.status == OverlayStatus::Complete;

    match msg {
        Message::CloseOverlay => model.close_overlay(),
        Message::OverlayScrollDown => scroll_overlay(model, true),
        Message::OverlayScrollUp => scroll_overlay(model, false),
        _ if failed => model.close_overlay(),
        Message::FollowUp if answered => open_question(model, true),
        msg if msg.is_navigation() => {
            model.close_overlay();
            apply_reading(model, msg);
        }
        msg if msg.request_kind().is_some() && !running => {
            model.close_overlay();
            apply_reading(model, msg);
        }
        _ => {}
    }
}

fn scroll_overlay(model: &mut Model, down: bool) {
    let (width, height) = model.terminal_size;
    let (text_width, rows) = crate::ui::overlay_text_size(width, height);
    let Mode::Overlay(overlay) = &mut model.mode else {
        return;
    };
    let total = crate::ui::wrap_overlay_text(&overlay.text, text_width).len();
    let max_top = total.saturating_sub(rows);
    let top = overlay.scroll.unwrap_or(max_top).min(max_top);
    let next = if down {
        (top + rows).min(max_top)
    } else {
        top.saturating_sub(rows)
    };
    overlay.scroll = if down && next == max_top && overlay.is_running() {
        None
    } else {
        Some(next)
    };
}
