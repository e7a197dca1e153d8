//! Fixed-size text pages and word wrapping.

/// Page dimensions in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    /// Columns per line.
    pub width: usize,
    /// Lines per page.
    pub height: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: 90,
            height: 60,
        }
    }
}

/// Accumulates lines into pages.
#[derive(Debug)]
pub struct PageWriter {
    layout: PageLayout,
    pages: Vec<String>,
    current: Vec<String>,
}

impl PageWriter {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Appends one line, starting a new page when the current one is full.
    pub fn line(&mut self, text: String) {
        if self.current.len() >= self.layout.height {
            self.flush();
        }
        self.current.push(text);
    }

    /// Appends an empty line unless at the top of a page.
    pub fn blank(&mut self) {
        if self.current.len() >= self.layout.height {
            self.flush();
            return;
        }
        if !self.current.is_empty() {
            self.current.push(String::new());
        }
    }

    /// Appends lines that belong together. The block moves to a fresh page
    /// when it would not fit on the current one; blocks taller than a page
    /// flow across pages.
    pub fn block(&mut self, lines: Vec<String>) {
        let remaining = self.layout.height.saturating_sub(self.current.len());
        if lines.len() > remaining && lines.len() <= self.layout.height {
            self.flush();
        }
        for line in lines {
            if line.is_empty() {
                self.blank();
            } else {
                self.line(line);
            }
        }
    }

    fn flush(&mut self) {
        while self.current.last().is_some_and(|l| l.is_empty()) {
            self.current.pop();
        }
        if !self.current.is_empty() {
            self.pages.push(self.current.join("\n"));
            self.current.clear();
        }
    }

    /// Closes the last page and returns all pages.
    pub fn finish(mut self) -> Vec<String> {
        self.flush();
        self.pages
    }
}

/// Centers `text` within `width` columns, without trailing padding.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Word-wraps `text` to `width` columns.
///
/// The first line starts with `prefix`; continuation lines are indented by
/// the prefix width. Embedded newlines start new paragraphs. Words longer
/// than a line are split.
pub fn wrap_with_prefix(prefix: &str, text: &str, width: usize) -> Vec<String> {
    let indent_len = prefix.chars().count().min(width / 2);
    let indent = " ".repeat(indent_len);

    let mut lines = Vec::new();
    for (index, paragraph) in text.split('\n').enumerate() {
        let lead = if index == 0 { prefix.to_string() } else { indent.clone() };
        let mut current_len = lead.chars().count();
        let mut current = lead;
        let mut has_word = false;
        let mut saw_word = false;

        for word in paragraph.split_whitespace() {
            saw_word = true;
            let mut word = word.to_string();
            loop {
                let word_len = word.chars().count();
                let sep = usize::from(has_word);
                if current_len + sep + word_len <= width {
                    if has_word {
                        current.push(' ');
                    }
                    current.push_str(&word);
                    current_len += sep + word_len;
                    has_word = true;
                    break;
                }
                if has_word {
                    lines.push(std::mem::replace(&mut current, indent.clone()));
                    current_len = indent_len;
                    has_word = false;
                    continue;
                }
                let room = width.saturating_sub(current_len).max(1);
                let head: String = word.chars().take(room).collect();
                word = word.chars().skip(room).collect();
                current.push_str(&head);
                lines.push(std::mem::replace(&mut current, indent.clone()));
                current_len = indent_len;
                if word.is_empty() {
                    break;
                }
            }
        }

        if has_word || !saw_word {
            lines.push(current.trim_end().to_string());
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: usize, height: usize) -> PageLayout {
        PageLayout { width, height }
    }

    #[test]
    fn test_wrap_respects_width_and_hanging_indent() {
        let lines = wrap_with_prefix("12. ", "alpha beta gamma delta epsilon", 16);
        assert_eq!(lines, vec!["12. alpha beta", "    gamma delta", "    epsilon"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 16));
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_with_prefix("", "abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        let lines = wrap_with_prefix("- ", "first\nsecond", 40);
        assert_eq!(lines, vec!["- first", "  second"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert_eq!(wrap_with_prefix("", "", 10), vec![String::new()]);
        assert_eq!(wrap_with_prefix("1. ", "", 10), vec!["1.".to_string()]);
    }

    #[test]
    fn test_center() {
        assert_eq!(center("ab", 6), "  ab");
        assert_eq!(center("abcdef", 4), "abcdef");
    }

    #[test]
    fn test_page_writer_breaks_pages() {
        let mut writer = PageWriter::new(layout(20, 3));
        for i in 0..7 {
            writer.line(format!("line {}", i));
        }
        let pages = writer.finish();
        assert_eq!(pages, vec!["line 0\nline 1\nline 2", "line 3\nline 4\nline 5", "line 6"]);
    }

    #[test]
    fn test_block_moves_to_next_page() {
        let mut writer = PageWriter::new(layout(20, 4));
        writer.line("header".to_string());
        writer.line("intro".to_string());
        writer.block(vec!["q1".to_string(), "a".to_string(), "b".to_string()]);

        let pages = writer.finish();
        assert_eq!(pages, vec!["header\nintro", "q1\na\nb"]);
    }

    #[test]
    fn test_blank_is_skipped_at_page_top() {
        let mut writer = PageWriter::new(layout(20, 2));
        writer.line("a".to_string());
        writer.line("b".to_string());
        writer.blank();
        writer.line("c".to_string());

        assert_eq!(writer.finish(), vec!["a\nb", "c"]);
    }
}
