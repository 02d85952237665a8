use std::sync::Arc;

use ratatui::Terminal;
use ratatui::backend::TestBackend;

use super::render::{progress_label, truncate_to_width};
use super::*;
use crate::app::{Message, Mode, Model, Overlay, OverlayStatus, QuestionInput, update};
use crate::book::{Book, Chapter};
use crate::chat::{Phase, PendingRequest, RequestKind, RequestSpec};
use crate::navigation::Cursor;

fn test_book() -> Arc<Book> {
    let chapters = vec![
        Chapter::new(
            "Loomings",
            vec!["Call me Ishmael. Some years ago, never mind how long precisely.".to_string()],
        ),
        Chapter::new("The Carpet-Bag", vec!["I stuffed a shirt or two.".to_string()]),
        Chapter::new("The Spouter-Inn", vec!["Entering that gable-ended inn.".to_string()]),
    ];
    Arc::new(Book::new(Some("Moby Dick".to_string()), None, chapters).unwrap())
}

fn create_test_model(width: u16, height: u16) -> Model {
    Model::new(test_book(), (width, height))
}

fn render_rows(model: &Model) -> Vec<String> {
    let (width, height) = model.terminal_size;
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    (0..height)
        .map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect())
        .collect()
}

fn screen(model: &Model) -> String {
    render_rows(model).join("\n")
}

fn with_overlay(mut model: Model, status: OverlayStatus, text: &str) -> Model {
    model.mode = Mode::Overlay(Overlay {
        kind: RequestKind::Ask,
        text: text.to_string(),
        status,
        scroll: None,
    });
    model
}

fn reading_aloud(mut model: Model) -> Model {
    model.pending = Some(PendingRequest::new(
        RequestSpec {
            kind: RequestKind::ReadAloud,
            origin: Cursor::default(),
            payload: "Call me Ishmael.".to_string(),
        },
        Phase::Speaking,
    ));
    model
}

#[test]
fn test_header_shows_chapter_title_and_progress() {
    let model = create_test_model(100, 10);
    let rows = render_rows(&model);
    assert!(rows[0].starts_with(" Loomings"));
    assert!(rows[0].contains("Section 1/3"));
    assert!(rows[0].contains("Page 1/1"));
    assert!(rows[0].trim_end().ends_with('%'));
}

#[test]
fn test_progress_label_follows_cursor() {
    let model = update(create_test_model(100, 10), Message::NextChapter);
    let label = progress_label(&model);
    assert!(label.starts_with("Section 2/3 \u{2022} Page 1/1"));
    assert!(label.contains("Overall"));
}

#[test]
fn test_long_chapter_title_is_truncated_in_header() {
    let chapters = vec![Chapter::new(
        "An extraordinarily long chapter title that cannot possibly fit",
        vec!["Text.".to_string()],
    )];
    let book = Arc::new(Book::new(None, None, chapters).unwrap());
    let model = Model::new(book, (50, 6));
    let rows = render_rows(&model);
    assert!(rows[0].contains('\u{2026}'));
    assert!(rows[0].contains("Section 1/1"));
}

#[test]
fn test_page_text_is_rendered_with_padding() {
    let model = create_test_model(40, 10);
    let rows = render_rows(&model);
    assert!(rows[1].starts_with("  Call me Ishmael."));
}

#[test]
fn test_footer_shows_reading_help() {
    let model = create_test_model(120, 10);
    let rows = render_rows(&model);
    let footer = &rows[9];
    assert!(footer.contains("TOC(t)"));
    assert!(footer.contains("Ask AI(a)"));
    assert!(footer.contains("Quit(q)"));
}

#[test]
fn test_footer_shows_speech_indicator() {
    let model = reading_aloud(create_test_model(60, 10));
    let rows = render_rows(&model);
    assert!(rows[9].contains("Reading aloud"));
    assert!(rows[9].contains("Esc to stop"));
}

#[test]
fn test_toast_replaces_footer() {
    let model = reading_aloud(create_test_model(60, 10));
    let model = update(model, Message::Ask);
    let rows = render_rows(&model);
    assert!(rows[9].contains("[info] Reading aloud - press Esc to stop"));
}

#[test]
fn test_toc_menu_marks_current_chapter() {
    let model = update(create_test_model(60, 12), Message::NextChapter);
    let model = update(model, Message::OpenMenu);
    let text = screen(&model);
    assert!(text.contains(" Contents "));
    assert!(text.contains("\u{2192} 2. The Carpet-Bag"));
    assert!(text.contains("  1. Loomings"));
    assert!(text.contains("Enter jump"));
}

#[test]
fn test_toc_menu_scrolls_to_selection() {
    let chapters = (1..=30)
        .map(|i| Chapter::new(format!("Chapter {i}"), vec!["Text.".to_string()]))
        .collect();
    let book = Arc::new(Book::new(None, None, chapters).unwrap());
    let model = Model::new(book, (40, 10));
    let model = update(model, Message::OpenMenu);
    let model = update(model, Message::MenuBottom);
    let text = screen(&model);
    assert!(text.contains("30. Chapter 30"));
    assert!(!text.contains(" 1. Chapter 1 "));
}

#[test]
fn test_overlay_shows_title_and_text() {
    let model = with_overlay(
        create_test_model(60, 16),
        OverlayStatus::Complete,
        "The whale is a symbol of the unknowable.",
    );
    let text = screen(&model);
    assert!(text.contains(" Ask "));
    assert!(text.contains("The whale is a symbol"));
    assert!(text.contains("Esc close"));
}

#[test]
fn test_streaming_overlay_without_text_shows_waiting() {
    let model = with_overlay(create_test_model(60, 16), OverlayStatus::Streaming, "");
    let text = screen(&model);
    assert!(text.contains("Ask (thinking\u{2026})"));
    assert!(text.contains("Waiting for a response"));
    assert!(text.contains("Esc cancel"));
}

#[test]
fn test_failed_overlay_shows_error() {
    let model = with_overlay(
        create_test_model(60, 16),
        OverlayStatus::Failed("rate limited by the provider".to_string()),
        "partial",
    );
    let text = screen(&model);
    assert!(text.contains("(failed)"));
    assert!(text.contains("Request failed"));
    assert!(text.contains("rate limited by the provider"));
    assert!(!text.contains("partial"));
}

#[test]
fn test_overlay_follows_tail_of_long_text() {
    let body = (0..40)
        .map(|i| format!("line{i:02}"))
        .collect::<Vec<_>>()
        .join(" ");
    let model = with_overlay(create_test_model(40, 12), OverlayStatus::Streaming, &body);
    let text = screen(&model);
    assert!(text.contains("line39"));
    assert!(!text.contains("line00"));
}

#[test]
fn test_overlay_text_keeps_hard_line_breaks() {
    let text = "Key points:\n- Ishmael goes to sea\n- He meets Queequeg";
    assert_eq!(
        wrap_overlay_text(text, 60),
        vec![
            "Key points:".to_string(),
            "- Ishmael goes to sea".to_string(),
            "- He meets Queequeg".to_string(),
        ]
    );
}

#[test]
fn test_overlay_text_wraps_long_lines_and_keeps_blank_ones() {
    let wrapped = wrap_overlay_text("alpha beta gamma\n\ndelta", 10);
    assert_eq!(
        wrapped,
        vec![
            "alpha beta".to_string(),
            "gamma".to_string(),
            String::new(),
            "delta".to_string(),
        ]
    );
}

#[test]
fn test_overlay_renders_list_items_on_separate_rows() {
    let model = with_overlay(
        create_test_model(60, 16),
        OverlayStatus::Complete,
        "Key points:\n- Ishmael goes to sea\n- He meets Queequeg",
    );
    let rows = render_rows(&model);
    let row_of = |needle: &str| rows.iter().position(|row| row.contains(needle));
    let first = row_of("- Ishmael goes to sea").unwrap();
    let second = row_of("- He meets Queequeg").unwrap();
    assert_eq!(second, first + 1);
    assert_eq!(row_of("Key points:"), Some(first - 1));
}

#[test]
fn test_question_line_shows_typed_text_and_help() {
    let mut model = update(create_test_model(80, 12), Message::Ask);
    for ch in "Who is Ishmael?".chars() {
        model = update(model, Message::QuestionChar(ch));
    }
    let rows = render_rows(&model);
    let text = rows.join("\n");
    assert!(text.contains(" Ask "));
    assert!(text.contains("> Who is Ishmael?"));
    assert!(text.contains("Enter ask"));
    assert!(rows[11].contains("Esc cancel"));
}

#[test]
fn test_empty_question_line_shows_default_hint() {
    let model = update(create_test_model(80, 12), Message::Ask);
    assert!(screen(&model).contains("> explain this passage"));
}

#[test]
fn test_follow_up_line_is_titled() {
    let mut model = create_test_model(80, 12);
    model.mode = Mode::Question(QuestionInput {
        text: String::new(),
        follow_up: true,
    });
    assert!(screen(&model).contains(" Follow-up "));
}

#[test]
fn test_long_question_shows_its_end() {
    let mut model = create_test_model(30, 12);
    model.mode = Mode::Question(QuestionInput {
        text: format!("{} tail-end", "word ".repeat(20)),
        follow_up: false,
    });
    let text = screen(&model);
    assert!(text.contains("tail-end"));
}

#[test]
fn test_answer_overlay_offers_follow_up() {
    let model = with_overlay(create_test_model(60, 16), OverlayStatus::Complete, "Done.");
    assert!(screen(&model).contains("f follow-up"));
}

#[test]
fn test_tiny_terminal_renders_without_panic() {
    for (width, height) in [(1, 1), (3, 2), (10, 3)] {
        let model = create_test_model(width, height);
        render_rows(&model);
        let model = update(model, Message::OpenMenu);
        render_rows(&model);
        let model = with_overlay(
            create_test_model(width, height),
            OverlayStatus::Complete,
            "text",
        );
        render_rows(&model);
        let model = update(create_test_model(width, height), Message::Ask);
        render_rows(&model);
    }
}

#[test]
fn test_page_viewport_subtracts_chrome_and_clamps() {
    let viewport = page_viewport(80, 24);
    assert_eq!((viewport.width(), viewport.height()), (76, 22));
    let viewport = page_viewport(2, 1);
    assert_eq!((viewport.width(), viewport.height()), (1, 1));
}

#[test]
fn test_overlay_text_size_leaves_room_for_borders() {
    assert_eq!(overlay_text_size(40, 12), (28, 5));
    let (width, rows) = overlay_text_size(1, 1);
    assert!(width >= 1 && rows >= 1);
}

#[test]
fn test_truncate_to_width() {
    assert_eq!(truncate_to_width("short", 10), "short");
    assert_eq!(truncate_to_width("Loomings", 5), "Loom\u{2026}");
    assert_eq!(truncate_to_width("Loomings", 0), "");
}
