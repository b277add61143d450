/// Character and word counts for the current buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    pub char_count: usize,
    pub word_count: usize,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        let word_count = if trimmed.is_empty() {
            0
        } else {
            trimmed.split_whitespace().count()
        };

        Self {
            char_count: text.chars().count(),
            word_count,
        }
    }

    pub fn char_label(&self) -> String {
        pluralize(self.char_count, "character", "characters")
    }

    pub fn word_label(&self) -> String {
        pluralize(self.word_count, "word", "words")
    }
}

fn pluralize(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}
