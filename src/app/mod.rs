//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{
    ASK_CONTEXT_EXCHANGES, DEFAULT_REQUEST_TIMEOUT, MenuState, Mode, Model, Overlay,
    OverlayStatus, QuestionInput, ToastLevel,
};
pub use update::{Message, update};

use std::sync::Arc;
use std::time::Duration;

use crate::book::Book;
use crate::chat::Backends;

/// Main application struct that owns the book and backends and runs the
/// event loop.
pub struct App {
    book: Arc<Book>,
    backends: Backends,
    request_timeout: Duration,
}

impl App {
    /// Create a new application for the given book.
    pub fn new(book: Arc<Book>, backends: Backends) -> Self {
        Self {
            book,
            backends,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Abandon requests that produce no output for `timeout`.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
