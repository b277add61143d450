use std::ops::Range;

/// Editable text plus a cursor (a byte index that always sits on a char boundary).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the whole content, keeping the cursor where it still fits.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = floor_char_boundary(&self.text, self.cursor);
    }

    pub fn insert_char(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Delete the char before the cursor. Returns false when there is nothing to delete.
    pub fn backspace(&mut self) -> bool {
        match self.text[..self.cursor].chars().next_back() {
            Some(ch) => {
                self.cursor -= ch.len_utf8();
                self.text.remove(self.cursor);
                true
            }
            None => false,
        }
    }

    /// Delete the char under the cursor.
    pub fn delete(&mut self) -> bool {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        if let Some(ch) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
    }

    pub fn move_up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            self.cursor = 0;
            return;
        }
        let column = self.text[start..self.cursor].chars().count();
        let prev_start = self.line_start(start - 1);
        self.cursor = advance_chars(&self.text, prev_start, start - 1, column);
    }

    pub fn move_down(&mut self) {
        let start = self.line_start(self.cursor);
        let column = self.text[start..self.cursor].chars().count();
        let Some(newline) = self.text[self.cursor..].find('\n') else {
            self.cursor = self.text.len();
            return;
        };
        let next_start = self.cursor + newline + 1;
        let next_end = self.text[next_start..]
            .find('\n')
            .map_or(self.text.len(), |i| next_start + i);
        self.cursor = advance_chars(&self.text, next_start, next_end, column);
    }

    /// Replace the UTF-16 range `[offset, offset + length)` and park the cursor
    /// right after the inserted text.
    pub fn splice_utf16(&mut self, offset: usize, length: usize, replacement: &str) {
        let range = utf16_range_to_bytes(&self.text, offset, length);
        let start = range.start;
        self.text.replace_range(range, replacement);
        self.cursor = start + replacement.len();
    }

    /// (line, column) of the cursor, columns counted in chars.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let column = before[self.line_start(self.cursor)..].chars().count();
        (line, column)
    }

    fn line_start(&self, pos: usize) -> usize {
        self.text[..pos].rfind('\n').map_or(0, |i| i + 1)
    }
}

fn advance_chars(text: &str, from: usize, limit: usize, count: usize) -> usize {
    text[from..limit]
        .char_indices()
        .nth(count)
        .map_or(limit, |(i, _)| from + i)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Byte index of the given UTF-16 offset. Offsets past the end clamp to
/// `text.len()`; an offset landing inside a surrogate pair snaps to the start
/// of that char.
pub fn utf16_to_byte(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        let width = ch.len_utf16();
        if units + width > utf16_offset {
            return byte;
        }
        units += width;
    }
    text.len()
}

/// Byte range covered by a service-reported `(offset, length)` pair.
pub fn utf16_range_to_bytes(text: &str, offset: usize, length: usize) -> Range<usize> {
    let start = utf16_to_byte(text, offset);
    let end = utf16_to_byte(text, offset.saturating_add(length)).max(start);
    start..end
}

pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
