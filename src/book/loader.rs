use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{Book, Chapter, IngestionError};

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}#{1,6}[ \t]+(.+?)[ \t#]*$").expect("heading pattern is valid")
});

const FORM_FEED: char = '\u{0C}';
const FRONT_MATTER_TITLE: &str = "Front Matter";

#[derive(Debug, Deserialize)]
struct JsonBook {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    chapters: Vec<JsonChapter>,
}

#[derive(Debug, Deserialize)]
struct JsonChapter {
    title: String,
    #[serde(default)]
    body: JsonBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonBody {
    Text(String),
    Paragraphs(Vec<String>),
}

impl Default for JsonBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Load a book from disk.
///
/// `.json` files are read as structured books; anything else is treated as
/// plain text or Markdown and split into chapters at headings.
///
/// # Errors
///
/// Returns an [`IngestionError`] naming the file if it cannot be read, is
/// malformed JSON, or yields no chapters.
pub fn load_book(path: &Path) -> Result<Book, IngestionError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let book = if is_json {
        parse_json_book(&content).map_err(|source| IngestionError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        parse_text_book(&content, &title_from_path(path))
    };

    let book = book.ok_or_else(|| IngestionError::Empty {
        path: path.to_path_buf(),
    })?;
    tracing::info!(
        path = %path.display(),
        chapters = book.len(),
        "loaded book"
    );
    Ok(book)
}

/// Parse a JSON book: `{"title", "author", "chapters": [{"title", "body"}]}`.
///
/// `body` may be a single string (paragraphs separated by blank lines) or an
/// array of paragraphs. Returns `Ok(None)` when there are no chapters.
///
/// # Errors
///
/// Returns the `serde_json` error for malformed input.
pub fn parse_json_book(content: &str) -> Result<Option<Book>, serde_json::Error> {
    let raw: JsonBook = serde_json::from_str(content)?;
    let chapters = raw
        .chapters
        .into_iter()
        .map(|ch| match ch.body {
            JsonBody::Text(text) => Chapter::from_text(ch.title, &text),
            JsonBody::Paragraphs(paragraphs) => Chapter::new(ch.title, paragraphs),
        })
        .collect();
    Ok(Book::new(raw.title, raw.author, chapters))
}

/// Split plain text or Markdown into chapters.
///
/// Markdown headings start chapters (text before the first heading becomes a
/// "Front Matter" chapter when it is not blank). Without headings, form feeds
/// separate chapters and each chapter's first line is its title. Otherwise the
/// whole text is one chapter named `fallback_title`.
pub fn parse_text_book(content: &str, fallback_title: &str) -> Option<Book> {
    let chapters = if content.lines().any(|line| HEADING.is_match(line)) {
        split_at_headings(content)
    } else if content.contains(FORM_FEED) {
        split_at_form_feeds(content)
    } else if content.trim().is_empty() {
        Vec::new()
    } else {
        vec![Chapter::from_text(fallback_title, content)]
    };
    let title = (!fallback_title.is_empty()).then(|| fallback_title.to_string());
    Book::new(title, None, chapters)
}

fn split_at_headings(content: &str) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut title: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(caps) = HEADING.captures(line) {
            push_section(&mut chapters, title.take(), &body);
            body.clear();
            title = Some(caps[1].trim().to_string());
        } else {
            body.push(line);
        }
    }
    push_section(&mut chapters, title, &body);
    chapters
}

fn push_section(chapters: &mut Vec<Chapter>, title: Option<String>, body: &[&str]) {
    let text = body.join("\n");
    match title {
        Some(title) => chapters.push(Chapter::from_text(title, &text)),
        None if !text.trim().is_empty() => {
            chapters.push(Chapter::from_text(FRONT_MATTER_TITLE, &text));
        }
        None => {}
    }
}

fn split_at_form_feeds(content: &str) -> Vec<Chapter> {
    content
        .split(FORM_FEED)
        .filter(|part| !part.trim().is_empty())
        .enumerate()
        .map(|(idx, part)| {
            let trimmed = part.trim_start();
            let (first, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
            let title = first.trim();
            if title.is_empty() {
                Chapter::from_text(format!("Part {}", idx + 1), rest)
            } else {
                Chapter::from_text(title, rest)
            }
        })
        .collect()
}

fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " ").trim().to_string())
        .unwrap_or_default()
}
