// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. chat::ChatTurn)
    clippy::module_name_repetitions
)]

//! # Lectern
//!
//! A terminal e-book reader with an AI reading companion.
//!
//! Lectern lays a book out into pages that exactly fit the terminal and
//! offers:
//! - Vim-style page and chapter navigation
//! - A table-of-contents menu
//! - Streaming AI explanations and summaries of the visible text
//! - Read-aloud and a spoken reading guide through an external speech command
//!
//! ## Architecture
//!
//! Lectern uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! AI requests run on a worker thread and publish into a shared buffer that
//! the event loop polls; `update` never blocks.
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`book`]: Book loading and chapter model
//! - [`layout`]: Word wrapping and pagination
//! - [`navigation`]: Reading position over the laid-out book
//! - [`chat`]: Completion provider, speech, and request lifecycle
//! - [`ui`]: Terminal UI components
//! - [`config`]: Saved default flags

pub mod app;
pub mod book;
pub mod chat;
pub mod config;
pub mod layout;
pub mod navigation;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::book::Book;
    pub use crate::layout::Viewport;
    pub use crate::navigation::{Cursor, Navigation};
}
