use unicode_segmentation::UnicodeSegmentation;

use crate::model::LetterId;

const MAX_UNDO: usize = 200;

/// Reply body being written for one letter.
#[derive(Debug, Clone)]
pub struct ReplyDraft {
    letter_id: LetterId,
    recipient: String,
    body: String,
    cursor: usize,
    // (body, cursor) snapshots, oldest first
    undo: Vec<(String, usize)>,
    undo_index: usize,
}

impl ReplyDraft {
    pub fn new(letter_id: LetterId, recipient: impl Into<String>) -> Self {
        Self {
            letter_id,
            recipient: recipient.into(),
            body: String::new(),
            cursor: 0,
            undo: vec![(String::new(), 0)],
            undo_index: 0,
        }
    }

    pub fn letter_id(&self) -> &LetterId {
        &self.letter_id
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Zero-based (line, grapheme column) of the cursor.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.body[..self.cursor];
        let line = before.matches('\n').count();
        let start = line_start(&self.body, self.cursor);
        (line, self.body[start..self.cursor].graphemes(true).count())
    }

    pub fn insert_char(&mut self, ch: char) {
        self.body.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.record();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.body, self.cursor);
        self.body.drain(prev..self.cursor);
        self.cursor = prev;
        self.record();
        true
    }

    pub fn delete(&mut self) -> bool {
        let next = next_grapheme_boundary(&self.body, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.body.drain(self.cursor..next);
        self.record();
        true
    }

    pub fn move_left(&mut self) -> bool {
        let prev = prev_grapheme_boundary(&self.body, self.cursor);
        let moved = prev != self.cursor;
        self.cursor = prev;
        moved
    }

    pub fn move_right(&mut self) -> bool {
        let next = next_grapheme_boundary(&self.body, self.cursor);
        let moved = next != self.cursor;
        self.cursor = next;
        moved
    }

    pub fn move_home(&mut self) -> bool {
        let start = line_start(&self.body, self.cursor);
        let moved = start != self.cursor;
        self.cursor = start;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let end = line_end(&self.body, self.cursor);
        let moved = end != self.cursor;
        self.cursor = end;
        moved
    }

    pub fn undo(&mut self) -> bool {
        if self.undo_index == 0 {
            return false;
        }
        self.undo_index -= 1;
        self.restore();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.undo_index + 1 >= self.undo.len() {
            return false;
        }
        self.undo_index += 1;
        self.restore();
        true
    }

    fn record(&mut self) {
        self.undo.truncate(self.undo_index + 1);
        self.undo.push((self.body.clone(), self.cursor));
        if self.undo.len() > MAX_UNDO {
            let overflow = self.undo.len() - MAX_UNDO;
            self.undo.drain(0..overflow);
        }
        self.undo_index = self.undo.len() - 1;
    }

    fn restore(&mut self) {
        if let Some((body, cursor)) = self.undo.get(self.undo_index).cloned() {
            self.body = body;
            self.cursor = cursor.min(self.body.len());
        }
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}
