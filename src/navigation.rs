//! Reading position management.
//!
//! [`Navigation`] tracks the reader's [`Cursor`] (chapter and page) for the
//! current [`Viewport`] and caches chapter layouts per viewport size. Every
//! move is total: boundaries clamp instead of wrapping or failing.

use std::collections::HashMap;
use std::sync::Arc;

use crate::book::Book;
use crate::layout::{Page, Viewport, paginate};

/// A reading position: chapter index and page index within that chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    pub chapter: usize,
    pub page: usize,
}

impl Cursor {
    pub const fn new(chapter: usize, page: usize) -> Self {
        Self { chapter, page }
    }
}

/// Chapter/page navigation over a laid-out book.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lectern::book::{Book, Chapter};
/// use lectern::layout::Viewport;
/// use lectern::navigation::{Cursor, Navigation};
///
/// let book = Book::new(None, None, vec![
///     Chapter::from_text("One", "alpha beta"),
///     Chapter::from_text("Two", "gamma"),
/// ]).unwrap();
/// let mut nav = Navigation::new(Arc::new(book), Viewport::new(5, 1));
/// assert_eq!(nav.page_count(), 2);
///
/// nav.next_page();
/// nav.next_page();
/// assert_eq!(nav.cursor(), Cursor::new(1, 0));
/// ```
#[derive(Debug, Clone)]
pub struct Navigation {
    book: Arc<Book>,
    viewport: Viewport,
    cursor: Cursor,
    layouts: HashMap<(usize, Viewport), Vec<Page>>,
}

impl Navigation {
    /// Start at the first page of the first chapter.
    pub fn new(book: Arc<Book>, viewport: Viewport) -> Self {
        let mut nav = Self {
            book,
            viewport,
            cursor: Cursor::default(),
            layouts: HashMap::new(),
        };
        nav.pages_of(0);
        nav
    }

    pub fn book(&self) -> &Arc<Book> {
        &self.book
    }

    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Number of pages in the current chapter.
    pub fn page_count(&self) -> usize {
        self.current_pages().len().max(1)
    }

    /// The page under the cursor.
    pub fn visible_page(&self) -> Option<&Page> {
        self.current_pages().get(self.cursor.page)
    }

    /// Text of the page under the cursor.
    pub fn visible_text(&self) -> String {
        self.visible_page().map(Page::text).unwrap_or_default()
    }

    /// Text of the current chapter from its first page through the cursor.
    pub fn chapter_text_through_cursor(&self) -> String {
        let pages = self.current_pages();
        let end = (self.cursor.page + 1).min(pages.len());
        pages[..end]
            .iter()
            .map(Page::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Progress through the current chapter (0-100).
    pub fn chapter_percent(&self) -> u8 {
        percent(self.cursor.page, self.page_count())
    }

    /// Progress through the book by chapter (0-100).
    pub fn book_percent(&self) -> u8 {
        percent(self.cursor.chapter, self.book.len())
    }

    /// Chapter titles with their indices, for a jump menu.
    pub fn table_of_contents(&self) -> Vec<(usize, &str)> {
        self.book
            .chapters()
            .iter()
            .enumerate()
            .map(|(idx, chapter)| (idx, chapter.title()))
            .collect()
    }

    /// Advance one page, crossing into the next chapter at a chapter end.
    /// Stays put on the book's last page.
    pub fn next_page(&mut self) {
        if self.cursor.page + 1 < self.page_count() {
            self.cursor.page += 1;
        } else if self.cursor.chapter + 1 < self.book.len() {
            self.set_cursor(self.cursor.chapter + 1, 0);
        }
    }

    /// Go back one page, crossing into the previous chapter's last page.
    /// Stays put on the book's first page.
    pub fn prev_page(&mut self) {
        if self.cursor.page > 0 {
            self.cursor.page -= 1;
        } else if self.cursor.chapter > 0 {
            let chapter = self.cursor.chapter - 1;
            let last = self.pages_of(chapter).len().saturating_sub(1);
            self.set_cursor(chapter, last);
        }
    }

    pub fn next_chapter(&mut self) {
        self.set_cursor(self.cursor.chapter + 1, 0);
    }

    pub fn prev_chapter(&mut self) {
        self.set_cursor(self.cursor.chapter.saturating_sub(1), 0);
    }

    pub fn jump_to_start(&mut self) {
        self.set_cursor(0, 0);
    }

    pub fn jump_to_end(&mut self) {
        let chapter = self.last_chapter();
        let last = self.pages_of(chapter).len().saturating_sub(1);
        self.set_cursor(chapter, last);
    }

    /// Jump to the first page of `chapter` (clamped).
    pub fn select_chapter(&mut self, chapter: usize) {
        self.set_cursor(chapter, 0);
    }

    /// Re-layout for a new viewport, keeping the reader's relative position
    /// within the chapter.
    pub fn on_resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        let old_count = self.page_count();
        let old_page = self.cursor.page;
        self.viewport = viewport;
        let new_count = self.pages_of(self.cursor.chapter).len().max(1);
        self.cursor.page = (old_page * new_count / old_count).min(new_count - 1);
        tracing::debug!(
            width = viewport.width(),
            height = viewport.height(),
            old_page,
            old_count,
            new_page = self.cursor.page,
            new_count,
            "relaid chapter for new viewport"
        );
    }

    fn set_cursor(&mut self, chapter: usize, page: usize) {
        let chapter = chapter.min(self.last_chapter());
        let count = self.pages_of(chapter).len().max(1);
        self.cursor = Cursor::new(chapter, page.min(count - 1));
    }

    fn last_chapter(&self) -> usize {
        self.book.len().saturating_sub(1)
    }

    fn current_pages(&self) -> &[Page] {
        self.layouts
            .get(&(self.cursor.chapter, self.viewport))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn pages_of(&mut self, chapter: usize) -> &[Page] {
        let book = &self.book;
        let viewport = self.viewport;
        self.layouts
            .entry((chapter, viewport))
            .or_insert_with(|| paginate(&book.chapter(chapter).text(), viewport))
    }
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new(Arc::new(Book::default()), Viewport::new(1, 1))
    }
}

fn percent(index: usize, count: usize) -> u8 {
    if count == 0 {
        return 0;
    }
    // Always within 0-100 because index < count
    #[allow(clippy::cast_possible_truncation)]
    {
        (index.min(count) * 100 / count) as u8
    }
}
