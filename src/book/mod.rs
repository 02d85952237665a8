//! Books and chapters.
//!
//! A [`Book`] is an ordered, non-empty list of [`Chapter`]s produced once at
//! startup by [`load_book`] and shared read-only afterwards.

mod loader;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::{load_book, parse_json_book, parse_text_book};

/// Failure to turn a file into a [`Book`].
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a valid JSON book: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} contains no chapters", path.display())]
    Empty { path: PathBuf },
}

/// A single chapter: a title and its paragraphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    title: String,
    paragraphs: Vec<String>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            title: title.into(),
            paragraphs,
        }
    }

    /// Build a chapter from body text, splitting paragraphs at blank lines.
    pub fn from_text(title: impl Into<String>, body: &str) -> Self {
        let mut paragraphs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in body.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(current.join("\n"));
                    current.clear();
                }
            } else {
                current.push(line.trim_end());
            }
        }
        if !current.is_empty() {
            paragraphs.push(current.join("\n"));
        }
        Self::new(title, paragraphs)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// The body as layout input: paragraphs separated by blank lines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    pub fn is_blank(&self) -> bool {
        self.paragraphs.iter().all(|p| p.trim().is_empty())
    }
}

/// An immutable, non-empty sequence of chapters plus optional metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    title: Option<String>,
    author: Option<String>,
    chapters: Vec<Chapter>,
}

impl Book {
    /// Create a book. Returns `None` when `chapters` is empty.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        chapters: Vec<Chapter>,
    ) -> Option<Self> {
        if chapters.is_empty() {
            return None;
        }
        Some(Self {
            title,
            author,
            chapters,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Chapter at `index`, clamped to the last chapter.
    pub fn chapter(&self, index: usize) -> &Chapter {
        let last = self.chapters.len() - 1;
        &self.chapters[index.min(last)]
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// A book holds at least one chapter, so this is false.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

impl Default for Book {
    /// A single blank, untitled chapter.
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            chapters: vec![Chapter::new("Untitled", Vec::new())],
        }
    }
}
