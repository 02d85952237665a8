use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::Page;

/// Split chapter text into paragraphs of words.
///
/// A paragraph ends at a blank (or whitespace-only) line. Single newlines
/// inside a paragraph are soft and behave like any other whitespace.
fn paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.extend(line.split_whitespace());
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

pub(super) fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (idx, words) in paragraphs(text).into_iter().enumerate() {
        if idx > 0 {
            lines.push(String::new());
        }
        wrap_paragraph(&words, width, &mut lines);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_paragraph(words: &[&str], width: usize, out: &mut Vec<String>) {
    let mut line = String::new();
    let mut line_width = 0usize;

    for word in words {
        let word_width = UnicodeWidthStr::width(*word);

        if word_width > width {
            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            let mut pieces = hard_break(word, width);
            // The tail of a broken token stays open so following words can join it.
            let tail = pieces.pop().unwrap_or_default();
            out.extend(pieces);
            line_width = UnicodeWidthStr::width(tail.as_str());
            line = tail;
            continue;
        }

        let needed = if line.is_empty() {
            word_width
        } else {
            line_width + 1 + word_width
        };
        if needed > width {
            out.push(std::mem::take(&mut line));
            line.push_str(word);
            line_width = word_width;
        } else {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            line_width = needed;
        }
    }

    if !line.is_empty() {
        out.push(line);
    }
}

/// Break a token wider than `width` at character boundaries.
///
/// A single character wider than `width` (e.g. a CJK glyph on a one-column
/// page) is emitted on its own rather than dropped.
fn hard_break(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in word.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

pub(super) fn group_pages(lines: Vec<String>, height: usize) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current: Vec<String> = Vec::with_capacity(height);

    for line in lines {
        current.push(line);
        if current.len() == height {
            pages.push(Page::new(std::mem::take(&mut current)));
        }
    }

    if !current.is_empty() {
        pages.push(Page::new(current));
    }
    if pages.is_empty() {
        pages.push(Page::new(vec![String::new()]));
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let paras = paragraphs("one two\nthree\n\n\nfour\n   \nfive");
        assert_eq!(
            paras,
            vec![vec!["one", "two", "three"], vec!["four"], vec!["five"]]
        );
    }

    #[test]
    fn test_hard_break_splits_at_width() {
        assert_eq!(hard_break("abcdefg", 3), vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_hard_break_keeps_wide_char_alone() {
        assert_eq!(hard_break("日本", 1), vec!["日", "本"]);
    }

    #[test]
    fn test_broken_tail_joins_following_word() {
        let lines = wrap_lines("abcdefgh ij", 5);
        assert_eq!(lines, vec!["abcde", "fgh", "ij"].into_iter().map(String::from).collect::<Vec<_>>());
        let lines = wrap_lines("abcdefg ij", 6);
        assert_eq!(lines, vec!["abcdef".to_string(), "g ij".to_string()]);
    }

    #[test]
    fn test_group_pages_keeps_separator_at_page_top() {
        let lines = vec!["a".into(), "b".into(), String::new(), "c".into()];
        let pages = group_pages(lines, 2);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].lines(), &[String::new(), "c".to_string()]);
    }
}
