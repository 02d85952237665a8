//! Prompt text sent to the completion provider.

use crate::navigation::Navigation;

pub const SYSTEM_PROMPT: &str =
    "You are an expert reading assistant analyzing a book. Keep responses clear and concise.";

const DEFAULT_QUESTION: &str =
    "Explain this passage: what is happening, and anything a reader might miss.";

/// Book metadata, chapter and page position, and the visible page.
pub fn location_context(nav: &Navigation) -> String {
    let book = nav.book();
    let mut info = Vec::new();
    if let Some(title) = book.title() {
        info.push(format!("Title: {title}"));
    }
    if let Some(author) = book.author() {
        info.push(format!("Author: {author}"));
    }
    let cursor = nav.cursor();
    format!(
        "Book Information: {}\n\nLocation: Section: {}\nPage: {} of {}\n\nContent:\n{}",
        info.join(" | "),
        book.chapter(cursor.chapter).title(),
        cursor.page + 1,
        nav.page_count(),
        nav.visible_text(),
    )
}

/// Ask `question` about the visible page; a blank question asks for an
/// explanation of the passage.
pub fn ask_prompt(nav: &Navigation, question: &str) -> String {
    let question = match question.trim() {
        "" => DEFAULT_QUESTION,
        typed => typed,
    };
    format!(
        "Based on this text:\n{}\n\nQuestion: {question}",
        location_context(nav)
    )
}

/// Summarize the current chapter from its start through the visible page.
pub fn summary_prompt(nav: &Navigation) -> String {
    format!(
        "Please provide a concise summary of this text:\n{}\n\n\
         Focus on the key points and main ideas. Keep the summary brief and clear.",
        nav.chapter_text_through_cursor()
    )
}

/// Spoken reading guide for the current location.
pub fn compass_prompt(nav: &Navigation) -> String {
    format!(
        "Provide a brief audio guide for the reader's current location:\n\
         - Current story location\n\
         - Scene context\n\
         - Key characters/themes\n\n\
         Keep it conversational, like an audiobook companion.\n\n\
         Context:\n{}",
        location_context(nav)
    )
}
