//! Chapter text layout.
//!
//! Turns chapter text into fixed-size pages for a terminal viewport:
//! - Words are wrapped at whitespace to the viewport width
//! - Tokens wider than a line are hard-broken, never truncated
//! - Paragraphs are separated by a blank line
//! - Lines are grouped into pages of at most the viewport height
//!
//! Layout is pure and deterministic, so results can be cached per
//! `(chapter, viewport)` pair.

mod wrap;

use thiserror::Error;

/// Errors raised by [`layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Width or height was zero.
    #[error("cannot lay out text into a {width}x{height} viewport")]
    EmptyViewport { width: usize, height: usize },
}

/// The usable page area of the terminal, in character cells.
///
/// Both dimensions are at least 1; degenerate sizes are clamped on
/// construction so a page can always be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    width: u16,
    height: u16,
}

impl Viewport {
    /// Create a viewport, clamping zero dimensions to 1.
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }
}

/// One screenful of display lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    lines: Vec<String>,
}

impl Page {
    pub(crate) const fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Display lines on this page, top to bottom.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of display lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The page's lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Lay out `text` into pages of at most `height` lines of `width` columns.
///
/// An empty body yields one page holding a single empty line.
///
/// # Errors
///
/// Returns [`LayoutError::EmptyViewport`] if `width` or `height` is zero.
///
/// # Example
///
/// ```
/// use lectern::layout::layout;
///
/// let pages = layout("the quick brown fox", 9, 1).unwrap();
/// assert_eq!(pages.len(), 2);
/// assert_eq!(pages[0].lines(), &["the quick".to_string()]);
/// ```
pub fn layout(text: &str, width: usize, height: usize) -> Result<Vec<Page>, LayoutError> {
    if width == 0 || height == 0 {
        return Err(LayoutError::EmptyViewport { width, height });
    }
    Ok(wrap::group_pages(wrap::wrap_lines(text, width), height))
}

/// Lay out `text` for a [`Viewport`].
///
/// Infallible because a viewport is never zero-sized.
pub fn paginate(text: &str, viewport: Viewport) -> Vec<Page> {
    wrap::group_pages(
        wrap::wrap_lines(text, usize::from(viewport.width())),
        usize::from(viewport.height()),
    )
}

/// Wrap `text` to `width` columns without paging.
///
/// Uses the same rules as [`layout`]; a zero width is treated as 1.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    wrap::wrap_lines(text, width.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicode_width::UnicodeWidthStr;

    fn non_whitespace(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn joined(pages: &[Page]) -> String {
        pages
            .iter()
            .flat_map(|p| p.lines().iter().cloned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_empty_text_yields_one_blank_page() {
        let pages = layout("", 40, 10).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines(), &[String::new()]);
    }

    #[test]
    fn test_whitespace_only_text_yields_one_blank_page() {
        let pages = layout("  \n\n \t \n", 40, 10).unwrap();
        assert_eq!(pages, vec![Page::new(vec![String::new()])]);
    }

    #[test]
    fn test_zero_width_is_rejected() {
        assert_eq!(
            layout("text", 0, 10),
            Err(LayoutError::EmptyViewport {
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn test_zero_height_is_rejected() {
        assert!(layout("text", 10, 0).is_err());
    }

    #[test]
    fn test_wraps_only_at_whitespace() {
        let pages = layout("alpha beta gamma delta", 11, 10).unwrap();
        assert_eq!(
            pages[0].lines(),
            &[
                "alpha beta".to_string(),
                "gamma delta".to_string()
            ]
        );
    }

    #[test]
    fn test_long_token_is_hard_broken() {
        let pages = layout("supercalifragilistic", 8, 10).unwrap();
        assert_eq!(
            pages[0].lines(),
            &[
                "supercal".to_string(),
                "ifragili".to_string(),
                "stic".to_string()
            ]
        );
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        let pages = layout("first para\n\nsecond para", 20, 10).unwrap();
        assert_eq!(
            pages[0].lines(),
            &[
                "first para".to_string(),
                String::new(),
                "second para".to_string()
            ]
        );
    }

    #[test]
    fn test_paragraph_break_survives_page_boundary() {
        let pages = layout("alpha beta\n\ngamma", 10, 1).unwrap();
        assert_eq!(
            pages,
            vec![
                Page::new(vec!["alpha beta".to_string()]),
                Page::new(vec![String::new()]),
                Page::new(vec!["gamma".to_string()]),
            ]
        );
    }

    #[test]
    fn test_page_may_open_with_separator() {
        let pages = layout("one two three\n\nfour", 9, 2).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines(), &["one two".to_string(), "three".to_string()]);
        assert_eq!(pages[1].lines(), &[String::new(), "four".to_string()]);
    }

    #[test]
    fn test_soft_newlines_collapse_inside_paragraph() {
        let pages = layout("one\ntwo\nthree", 20, 10).unwrap();
        assert_eq!(pages[0].lines(), &["one two three".to_string()]);
    }

    #[test]
    fn test_last_page_may_be_shorter() {
        let text = "a b c d e";
        let pages = layout(text, 1, 2).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].len(), 1);
    }

    #[test]
    fn test_wide_characters_respect_display_width() {
        let pages = layout("日本語 テキスト", 6, 10).unwrap();
        for line in pages[0].lines() {
            assert!(UnicodeWidthStr::width(line.as_str()) <= 6, "{line:?} too wide");
        }
    }

    #[test]
    fn test_paginate_matches_layout() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n\nSed do eiusmod.";
        let viewport = Viewport::new(12, 3);
        assert_eq!(paginate(text, viewport), layout(text, 12, 3).unwrap());
    }

    #[test]
    fn test_viewport_clamps_degenerate_sizes() {
        let vp = Viewport::new(0, 0);
        assert_eq!((vp.width(), vp.height()), (1, 1));
    }

    #[test]
    fn test_wrap_treats_zero_width_as_one() {
        assert_eq!(wrap("ab", 0), vec!["a".to_string(), "b".to_string()]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn chapter_text() -> impl Strategy<Value = String> {
            proptest::collection::vec("[a-zA-Z0-9,.;'é]{1,24}|\n|\n\n| {1,3}", 0..120)
                .prop_map(|parts| parts.concat())
        }

        proptest! {
            #[test]
            fn lines_fit_width_and_pages_fit_height(
                text in chapter_text(),
                width in 1..60usize,
                height in 1..30usize,
            ) {
                let pages = layout(&text, width, height).unwrap();
                prop_assert!(!pages.is_empty());
                for page in &pages {
                    prop_assert!(page.len() <= height);
                    prop_assert!(!page.is_empty());
                    for line in page.lines() {
                        prop_assert!(UnicodeWidthStr::width(line.as_str()) <= width);
                    }
                }
            }

            #[test]
            fn no_characters_lost_or_duplicated(
                text in chapter_text(),
                width in 1..60usize,
                height in 1..30usize,
            ) {
                let pages = layout(&text, width, height).unwrap();
                prop_assert_eq!(non_whitespace(&joined(&pages)), non_whitespace(&text));
            }

            #[test]
            fn pages_rejoin_to_wrapped_text(
                text in chapter_text(),
                width in 1..60usize,
                height in 1..30usize,
            ) {
                let pages = layout(&text, width, height).unwrap();
                let rejoined: Vec<String> = pages
                    .iter()
                    .flat_map(|p| p.lines().iter().cloned())
                    .collect();
                prop_assert_eq!(rejoined, wrap(&text, width));
            }

            #[test]
            fn layout_is_deterministic(
                text in chapter_text(),
                width in 1..60usize,
                height in 1..30usize,
            ) {
                prop_assert_eq!(layout(&text, width, height), layout(&text, width, height));
            }
        }
    }
}
