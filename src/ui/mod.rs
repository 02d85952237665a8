//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`render`]: The page, header and footer
//! - Overlays for AI answers and the table of contents
//! - [`style`]: Colors

pub mod style;

mod overlays;
mod render;
mod status;

pub use overlays::{overlay_text_size, wrap_overlay_text};
pub use render::render;

use crate::layout::Viewport;

pub const HEADER_HEIGHT: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;
/// Blank columns on each side of the page.
pub const PAGE_PADDING: u16 = 2;

/// Page size for a terminal of `width` x `height` cells, after the header,
/// footer and side padding. Degenerate sizes clamp to 1x1.
pub const fn page_viewport(width: u16, height: u16) -> Viewport {
    Viewport::new(
        width.saturating_sub(2 * PAGE_PADDING),
        height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT),
    )
}

#[cfg(test)]
mod tests;
