//! Greedy word wrap
//!
//! Paragraphs are separated by `'\n'`; words by single spaces. A word wider
//! than the limit is never split and ends up alone on an overlong line.

use crate::render::font::FontMetrics;

/// Break `text` into lines no wider than `max_width` where possible
pub fn wrap_text<F: FontMetrics + ?Sized>(text: &str, font: &F, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, font, max_width, &mut lines);
    }
    lines
}

fn wrap_paragraph<F: FontMetrics + ?Sized>(paragraph: &str, font: &F, max_width: f32, lines: &mut Vec<String>) {
    if font.text_width(paragraph) <= max_width {
        lines.push(paragraph.to_string());
        return;
    }

    let space_width = font.text_width(" ");
    // Splitting on single spaces keeps runs of spaces as empty words
    let mut words = paragraph.split(' ');
    let first = words.next().unwrap_or_default();
    let mut current = first.to_string();
    let mut current_width = font.text_width(first);

    for word in words {
        let word_width = font.text_width(word);
        if current_width + space_width + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space_width + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    lines.push(current);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::font::BlockFont;
    use pretty_assertions::assert_eq;

    fn font() -> BlockFont {
        BlockFont::new(10.0, 20)
    }

    #[test]
    fn test_fitting_paragraph_is_one_line() {
        assert_eq!(wrap_text("hello world", &font(), 110.0), vec!["hello world"]);
    }

    #[test]
    fn test_greedy_wrap() {
        let lines = wrap_text("the quick brown fox jumps", &font(), 100.0);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_explicit_newlines_split_paragraphs() {
        let lines = wrap_text("first\n\nthird", &font(), 200.0);
        assert_eq!(lines, vec!["first", "", "third"]);
    }

    #[test]
    fn test_long_word_is_not_split() {
        let lines = wrap_text("a supercalifragilistic b", &font(), 60.0);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_double_spaces_survive_as_empty_words() {
        // "aa" + " " + "" + " " + "bb" = 60 wide
        let lines = wrap_text("aa  bb cc", &font(), 60.0);
        assert_eq!(lines, vec!["aa  bb", "cc"]);
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        assert_eq!(wrap_text("", &font(), 100.0), vec![""]);
    }

    #[test]
    fn test_wrapped_lines_respect_limit() {
        let text = (0..50).map(|i| format!("w{}", i % 7)).collect::<Vec<_>>().join(" ");
        let f = font();
        let lines = wrap_text(&text, &f, 75.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(f.text_width(line) <= 75.0, "line too wide: {:?}", line);
        }
        assert_eq!(lines.join(" "), text);
    }
}
