use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::book::Book;
use crate::chat::{
    ChatHistory, ChatTurn, Phase, PendingRequest, ProviderError, RequestKind, RequestSpec,
};
use crate::navigation::Navigation;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TOAST_DURATION: Duration = Duration::from_secs(4);
/// Prior exchanges of the current ask conversation sent with each question.
pub const ASK_CONTEXT_EXCHANGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Table-of-contents menu state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuState {
    /// Highlighted chapter index.
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayStatus {
    Streaming,
    Speaking,
    Complete,
    Failed(String),
}

/// AI answer shown over the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub kind: RequestKind,
    pub text: String,
    pub status: OverlayStatus,
    /// First visible wrapped line; `None` follows the end of the text.
    pub scroll: Option<usize>,
}

impl Overlay {
    pub const fn streaming(kind: RequestKind) -> Self {
        Self {
            kind,
            text: String::new(),
            status: OverlayStatus::Streaming,
            scroll: None,
        }
    }

    /// Waiting on the provider or the speech command.
    pub const fn is_running(&self) -> bool {
        matches!(
            self.status,
            OverlayStatus::Streaming | OverlayStatus::Speaking
        )
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self.status, OverlayStatus::Failed(_))
    }
}

/// Question being typed for the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionInput {
    pub text: String,
    /// Continue the current ask conversation instead of starting a new one.
    pub follow_up: bool,
}

/// Interaction mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Reading,
    Menu(MenuState),
    Question(QuestionInput),
    Overlay(Overlay),
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug)]
pub struct Model {
    pub nav: Navigation,
    pub mode: Mode,
    /// Every completed exchange of the session.
    pub history: ChatHistory,
    /// Exchanges of the current ask conversation; reset by a new question.
    pub conversation: ChatHistory,
    /// The single in-flight background request.
    pub pending: Option<PendingRequest>,
    /// Request accepted by `update`, waiting to be launched.
    pub outbox: Option<RequestSpec>,
    /// A request with no new output for this long is abandoned.
    pub request_timeout: Duration,
    /// Last terminal size seen, in cells.
    pub terminal_size: (u16, u16),
    pub should_quit: bool,
    seen_revision: u64,
    toast: Option<Toast>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            nav: Navigation::default(),
            mode: Mode::Reading,
            history: ChatHistory::default(),
            conversation: ChatHistory::default(),
            pending: None,
            outbox: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            terminal_size: (1, 1),
            should_quit: false,
            seen_revision: 0,
            toast: None,
        }
    }
}

impl Model {
    /// Open `book` at its first page, laid out for a terminal of `terminal_size`.
    pub fn new(book: Arc<Book>, terminal_size: (u16, u16)) -> Self {
        let viewport = crate::ui::page_viewport(terminal_size.0, terminal_size.1);
        Self {
            nav: Navigation::new(book, viewport),
            terminal_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        match &self.mode {
            Mode::Overlay(overlay) => Some(overlay),
            _ => None,
        }
    }

    pub fn menu(&self) -> Option<MenuState> {
        match self.mode {
            Mode::Menu(menu) => Some(menu),
            _ => None,
        }
    }

    pub fn question(&self) -> Option<&QuestionInput> {
        match &self.mode {
            Mode::Question(input) => Some(input),
            _ => None,
        }
    }

    /// Prior turns to send with a request of `kind`.
    ///
    /// Questions carry the tail of their conversation; summaries and reading
    /// guides are sent alone.
    pub fn request_context(&self, kind: RequestKind) -> &[ChatTurn] {
        match kind {
            RequestKind::Ask => self.conversation.recent_exchanges(ASK_CONTEXT_EXCHANGES),
            _ => &[],
        }
    }

    pub fn is_reading_aloud(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.kind() == RequestKind::ReadAloud)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.outbox.is_some()
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Revision of the request output last folded into the model.
    pub(super) const fn seen_revision(&self) -> u64 {
        self.seen_revision
    }

    /// Track a launched request.
    pub(super) fn attach_request(&mut self, pending: PendingRequest) {
        self.seen_revision = 0;
        self.pending = Some(pending);
    }

    /// Cancel and forget the in-flight request, if any.
    pub(super) fn cancel_request(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.outbox = None;
    }

    /// Leave the overlay, cancelling its request when still running.
    pub(super) fn close_overlay(&mut self) {
        if let Mode::Overlay(overlay) = &self.mode
            && overlay.is_running()
        {
            self.cancel_request();
        }
        self.mode = Mode::Reading;
    }

    /// Fold the latest worker output into the model.
    pub(super) fn poll_request(&mut self) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        let snapshot = pending.snapshot();

        if snapshot.phase == Phase::Streaming && snapshot.idle >= self.request_timeout {
            let kind = pending.kind();
            tracing::warn!(
                kind = kind.title(),
                idle_secs = snapshot.idle.as_secs(),
                "request timed out"
            );
            self.cancel_request();
            let err = ProviderError::Timeout(self.request_timeout.as_secs());
            self.report_failure(kind, err.to_string());
            return;
        }
        if snapshot.revision == self.seen_revision {
            return;
        }
        self.seen_revision = snapshot.revision;

        let kind = pending.kind();
        match snapshot.phase {
            Phase::Streaming => self.show_progress(snapshot.text, OverlayStatus::Streaming),
            Phase::Speaking => self.show_progress(snapshot.text, OverlayStatus::Speaking),
            Phase::Done => {
                let prompt = pending.spec.payload.clone();
                self.pending = None;
                if kind == RequestKind::ReadAloud {
                    self.show_toast(ToastLevel::Info, "Finished reading");
                } else {
                    tracing::info!(
                        kind = kind.title(),
                        chars = snapshot.text.len(),
                        "request complete"
                    );
                    if kind == RequestKind::Ask {
                        self.conversation
                            .push_exchange(prompt.clone(), snapshot.text.clone());
                    }
                    self.history.push_exchange(prompt, snapshot.text.clone());
                    if let Mode::Overlay(overlay) = &mut self.mode {
                        overlay.text = snapshot.text;
                        overlay.status = OverlayStatus::Complete;
                    }
                }
            }
            Phase::Failed(message) => {
                self.pending = None;
                self.report_failure(kind, message);
            }
        }
    }

    fn show_progress(&mut self, text: String, status: OverlayStatus) {
        if let Mode::Overlay(overlay) = &mut self.mode {
            overlay.text = text;
            overlay.status = status;
        }
    }

    fn report_failure(&mut self, kind: RequestKind, message: String) {
        match &mut self.mode {
            Mode::Overlay(overlay) if kind.uses_overlay() => {
                overlay.status = OverlayStatus::Failed(message);
            }
            _ => self.show_toast(ToastLevel::Error, format!("{}: {message}", kind.title())),
        }
    }
}
