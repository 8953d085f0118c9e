//! Plain-text reflow used when markdown rendering is off or fails.
//!
//! Paragraphs are joined and greedily word-wrapped; fenced code blocks pass
//! through untouched. Widths are measured in terminal columns.

use unicode_width::UnicodeWidthStr;

/// The wrap width never drops below the indent plus this many columns.
const MIN_TEXT_COLUMNS: usize = 20;

const FENCE: &str = "```";

/// Reflow `body` to `width` columns, prefixing every line with `indent`.
///
/// Always returns at least one line.
pub fn wrap_plain_text(body: &str, indent: &str, width: usize) -> Vec<String> {
    let body = body.replace("\r\n", "\n");
    let indent_width = indent.width();
    let max_width = width.max(indent_width + MIN_TEXT_COLUMNS);
    let text_width = max_width - indent_width;

    let mut out: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_fence = false;

    let flush = |paragraph: &mut Vec<&str>, out: &mut Vec<String>| {
        if paragraph.is_empty() {
            return;
        }
        let text = paragraph.join(" ");
        out.extend(
            wrap_text(&text, text_width)
                .into_iter()
                .map(|line| format!("{}{}", indent, line)),
        );
        paragraph.clear();
    };

    for line in body.trim_end_matches('\n').split('\n') {
        let trimmed = line.trim();

        if trimmed.starts_with(FENCE) {
            flush(&mut paragraph, &mut out);
            if out.last().is_some_and(|last| last != indent) {
                out.push(indent.to_string());
            }
            out.push(format!("{}{}", indent, line));
            in_fence = !in_fence;
            continue;
        }

        if in_fence {
            out.push(format!("{}{}", indent, line));
            continue;
        }

        if trimmed.is_empty() {
            flush(&mut paragraph, &mut out);
            out.push(indent.to_string());
            continue;
        }
        paragraph.push(trimmed);
    }
    flush(&mut paragraph, &mut out);

    if out.is_empty() {
        out.push(indent.to_string());
    }
    out
}

/// Greedy word wrap. Words longer than `width` get a line of their own and are never split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    let mut current_width = first.width();

    for word in words {
        let word_width = word.width();
        if current_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
            continue;
        }
        current.push(' ');
        current.push_str(word);
        current_width += 1 + word_width;
    }
    lines.push(current);
    lines
}
