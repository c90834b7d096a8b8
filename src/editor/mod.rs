//! Journal editor: cursor, selection and formatting commands over a
//! [`Document`].
//!
//! Formatting follows the usual rich-text widget rules. With a selection the
//! command rewrites the selected text; without one it changes the pending
//! insertion format, which is what the next typed characters receive.

use strum::IntoStaticStr;
use unicode_segmentation::UnicodeSegmentation;

use crate::document::{
    CharFormat, Document, ListStyle, Position, Rgb, TextStyle, HIGHLIGHT_COLOR,
};

const MAX_HISTORY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum FormatCommand {
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    ToggleStrike,
    /// Raw text from the size prompt; only positive integers apply.
    FontSize(String),
    FontFamily(String),
    /// `None` is a cancelled colour prompt.
    FontColor(Option<Rgb>),
    ToggleHighlight,
    ToggleBulletList,
    ToggleNumberList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    /// Current format after the command ran.
    pub format: CharFormat,
    pub document_changed: bool,
}

pub fn parse_font_size(input: &str) -> Option<u16> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u16>().ok().filter(|size| *size > 0)
}

#[derive(Debug, Clone)]
struct Snapshot {
    document: Document,
    cursor: Position,
}

#[derive(Debug, Clone)]
pub struct JournalEditor {
    document: Document,
    cursor: Position,
    anchor: Option<Position>,
    pending: Option<CharFormat>,
    preferred_column: Option<usize>,
    history: Vec<Snapshot>,
    history_index: usize,
}

impl Default for JournalEditor {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl JournalEditor {
    pub fn new(document: Document) -> Self {
        let mut history = Vec::with_capacity(32);
        history.push(Snapshot {
            document: document.clone(),
            cursor: Position::default(),
        });
        Self {
            document,
            cursor: Position::default(),
            anchor: None,
            pending: None,
            preferred_column: None,
            history,
            history_index: 0,
        }
    }

    /// Replaces the document, resetting cursor, selection and history.
    pub fn load(&mut self, document: Document) {
        *self = Self::new(document);
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn has_selection(&self) -> bool {
        self.selection().is_some()
    }

    /// Ordered, non-empty selection range.
    pub fn selection(&self) -> Option<(Position, Position)> {
        let anchor = self.anchor?;
        match anchor.cmp(&self.cursor) {
            std::cmp::Ordering::Less => Some((anchor, self.cursor)),
            std::cmp::Ordering::Greater => Some((self.cursor, anchor)),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn set_cursor(&mut self, pos: Position, extend: bool) {
        let pos = self.document.clamp(pos);
        self.begin_move(extend);
        self.move_to(pos);
    }

    pub fn select(&mut self, anchor: Position, cursor: Position) {
        self.anchor = Some(self.document.clamp(anchor));
        self.cursor = self.document.clamp(cursor);
        self.pending = None;
        self.preferred_column = None;
    }

    pub fn select_all(&mut self) {
        self.select(Position::default(), self.document.end());
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    pub fn current_format(&self) -> CharFormat {
        if let Some((start, end)) = self.selection() {
            return self.document.range_format(start, end);
        }
        self.pending
            .clone()
            .unwrap_or_else(|| self.document.format_at(self.cursor))
    }

    pub fn apply(&mut self, command: FormatCommand) -> FormatOutcome {
        let name: &'static str = (&command).into();
        tracing::debug!(command = name, "applying format command");
        match command {
            FormatCommand::ToggleBold => self.toggle_style(TextStyle::BOLD),
            FormatCommand::ToggleItalic => self.toggle_style(TextStyle::ITALIC),
            FormatCommand::ToggleUnderline => self.toggle_style(TextStyle::UNDERLINE),
            FormatCommand::ToggleStrike => self.toggle_style(TextStyle::STRIKE),
            FormatCommand::FontSize(raw) => match parse_font_size(&raw) {
                Some(size) => self.merge_format(|format| format.font_size = Some(size)),
                None => self.unchanged(),
            },
            FormatCommand::FontFamily(family) => {
                self.merge_format(|format| format.font_family = Some(family.clone()))
            }
            FormatCommand::FontColor(Some(color)) => {
                self.merge_format(|format| format.foreground = Some(color))
            }
            FormatCommand::FontColor(None) => self.unchanged(),
            FormatCommand::ToggleHighlight => self.toggle_highlight(),
            FormatCommand::ToggleBulletList => self.toggle_list(ListStyle::Bullet),
            FormatCommand::ToggleNumberList => self.toggle_list(ListStyle::Numbered),
        }
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut scratch = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut scratch))
    }

    pub fn insert_str(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.delete_selection();
        let format = self.current_format();
        self.cursor = self.document.insert_text(self.cursor, text, &format);
        self.preferred_column = None;
        self.after_edit();
        true
    }

    /// Paragraph break. An empty list item leaves its list instead.
    pub fn insert_newline(&mut self) -> bool {
        self.delete_selection();
        let format = self.current_format();
        let block = self.cursor.block;
        let in_empty_item = self
            .document
            .block(block)
            .map(|b| b.is_empty() && b.list.is_some())
            .unwrap_or(false);
        if in_empty_item {
            self.document.set_list(block, block, None);
        } else {
            self.cursor = self.document.split_block(self.cursor);
        }
        self.pending = Some(format);
        self.preferred_column = Some(0);
        self.after_edit();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.delete_selection() {
            self.after_edit();
            return true;
        }
        let Position { block, offset } = self.cursor;
        if offset > 0 {
            let text = self.block_text(block);
            let prev = prev_grapheme_boundary(&text, offset);
            self.cursor = self
                .document
                .delete_range(Position::new(block, prev), self.cursor);
        } else if self
            .document
            .block(block)
            .map(|b| b.list.is_some())
            .unwrap_or(false)
        {
            self.document.set_list(block, block, None);
        } else if block > 0 {
            let prev_end = Position::new(block - 1, self.document.block_len(block - 1));
            self.cursor = self.document.delete_range(prev_end, self.cursor);
        } else {
            return false;
        }
        self.pending = None;
        self.preferred_column = None;
        self.after_edit();
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.delete_selection() {
            self.after_edit();
            return true;
        }
        let Position { block, offset } = self.cursor;
        let len = self.document.block_len(block);
        if offset < len {
            let text = self.block_text(block);
            let next = next_grapheme_boundary(&text, offset);
            self.document
                .delete_range(self.cursor, Position::new(block, next));
        } else if block + 1 < self.document.block_count() {
            self.document
                .delete_range(self.cursor, Position::new(block + 1, 0));
        } else {
            return false;
        }
        self.pending = None;
        self.preferred_column = None;
        self.after_edit();
        true
    }

    pub fn move_left(&mut self, extend: bool) -> bool {
        if !extend {
            if let Some((start, _)) = self.selection() {
                self.anchor = None;
                self.move_to(start);
                return true;
            }
        }
        let Position { block, offset } = self.cursor;
        let target = if offset > 0 {
            Position::new(block, prev_grapheme_boundary(&self.block_text(block), offset))
        } else if block > 0 {
            Position::new(block - 1, self.document.block_len(block - 1))
        } else {
            return false;
        };
        self.begin_move(extend);
        self.move_to(target);
        true
    }

    pub fn move_right(&mut self, extend: bool) -> bool {
        if !extend {
            if let Some((_, end)) = self.selection() {
                self.anchor = None;
                self.move_to(end);
                return true;
            }
        }
        let Position { block, offset } = self.cursor;
        let len = self.document.block_len(block);
        let target = if offset < len {
            Position::new(block, next_grapheme_boundary(&self.block_text(block), offset))
        } else if block + 1 < self.document.block_count() {
            Position::new(block + 1, 0)
        } else {
            return false;
        };
        self.begin_move(extend);
        self.move_to(target);
        true
    }

    pub fn move_home(&mut self, extend: bool) -> bool {
        let target = Position::new(self.cursor.block, 0);
        if target == self.cursor {
            return false;
        }
        self.begin_move(extend);
        self.move_to(target);
        self.preferred_column = Some(0);
        true
    }

    pub fn move_end(&mut self, extend: bool) -> bool {
        let block = self.cursor.block;
        let target = Position::new(block, self.document.block_len(block));
        if target == self.cursor {
            return false;
        }
        self.begin_move(extend);
        self.move_to(target);
        true
    }

    pub fn move_up(&mut self, extend: bool) -> bool {
        self.move_vertical(-1, extend)
    }

    pub fn move_down(&mut self, extend: bool) -> bool {
        self.move_vertical(1, extend)
    }

    pub fn move_word_left(&mut self, extend: bool) -> bool {
        let Position { block, offset } = self.cursor;
        if offset == 0 {
            return self.move_left(extend);
        }
        let text = self.block_text(block);
        let mut idx = offset;
        while idx > 0 {
            let prev = prev_grapheme_boundary(&text, idx);
            if text[prev..idx].trim().is_empty() {
                idx = prev;
            } else {
                break;
            }
        }
        while idx > 0 {
            let prev = prev_grapheme_boundary(&text, idx);
            if text[prev..idx].trim().is_empty() {
                break;
            }
            idx = prev;
        }
        self.begin_move(extend);
        self.move_to(Position::new(block, idx));
        true
    }

    pub fn move_word_right(&mut self, extend: bool) -> bool {
        let Position { block, offset } = self.cursor;
        let text = self.block_text(block);
        if offset >= text.len() {
            return self.move_right(extend);
        }
        let mut idx = offset;
        while idx < text.len() {
            let next = next_grapheme_boundary(&text, idx);
            if text[idx..next].trim().is_empty() {
                break;
            }
            idx = next;
        }
        while idx < text.len() {
            let next = next_grapheme_boundary(&text, idx);
            if !text[idx..next].trim().is_empty() {
                break;
            }
            idx = next;
        }
        self.begin_move(extend);
        self.move_to(Position::new(block, idx));
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history_index > 0
    }

    pub fn undo(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        self.history_index -= 1;
        self.restore_history_snapshot();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.history_index + 1 >= self.history.len() {
            return false;
        }
        self.history_index += 1;
        self.restore_history_snapshot();
        true
    }

    fn toggle_style(&mut self, flag: TextStyle) -> FormatOutcome {
        let enable = !self.current_format().style.contains(flag);
        self.merge_format(|format| format.style.set(flag, enable))
    }

    fn toggle_highlight(&mut self) -> FormatOutcome {
        let Some((start, end)) = self.selection() else {
            return self.unchanged();
        };
        let current = self.document.range_format(start, end).background;
        let background = if current == Some(HIGHLIGHT_COLOR) {
            None
        } else {
            Some(HIGHLIGHT_COLOR)
        };
        self.merge_format(|format| format.background = background)
    }

    fn toggle_list(&mut self, style: ListStyle) -> FormatOutcome {
        let (first, last) = match self.selection() {
            Some((start, end)) => (start.block, end.block),
            None => (self.cursor.block, self.cursor.block),
        };
        let current = self
            .document
            .block(self.cursor.block)
            .and_then(|block| block.list);
        if current.map(|list| list.style) == Some(style) {
            self.document.set_list(first, last, None);
        } else {
            let list = self.document.new_list(style);
            self.document.set_list(first, last, Some(list));
        }
        self.after_edit();
        FormatOutcome {
            format: self.current_format(),
            document_changed: true,
        }
    }

    fn merge_format<F>(&mut self, mut f: F) -> FormatOutcome
    where
        F: FnMut(&mut CharFormat),
    {
        match self.selection() {
            Some((start, end)) => {
                let before = self.document.clone();
                self.document.update_range(start, end, &mut f);
                let changed = before != self.document;
                if changed {
                    self.after_edit();
                }
                FormatOutcome {
                    format: self.current_format(),
                    document_changed: changed,
                }
            }
            None => {
                let mut format = self.current_format();
                f(&mut format);
                self.pending = Some(format.clone());
                FormatOutcome {
                    format,
                    document_changed: false,
                }
            }
        }
    }

    fn unchanged(&self) -> FormatOutcome {
        FormatOutcome {
            format: self.current_format(),
            document_changed: false,
        }
    }

    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection() else {
            self.anchor = None;
            return false;
        };
        let format = self.document.range_format(start, end);
        self.cursor = self.document.delete_range(start, end);
        self.anchor = None;
        self.pending = Some(format);
        true
    }

    fn begin_move(&mut self, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
        }
    }

    fn move_to(&mut self, pos: Position) {
        self.cursor = pos;
        self.pending = None;
        self.preferred_column = None;
    }

    fn move_vertical(&mut self, delta: isize, extend: bool) -> bool {
        let block = self.cursor.block;
        let column = self
            .preferred_column
            .unwrap_or_else(|| grapheme_column(&self.block_text(block), self.cursor.offset));
        let target_block = block as isize + delta;
        let target = if target_block < 0 {
            Position::default()
        } else if target_block as usize >= self.document.block_count() {
            self.document.end()
        } else {
            let index = target_block as usize;
            let text = self.block_text(index);
            Position::new(index, offset_for_column(&text, column))
        };
        if target == self.cursor {
            return false;
        }
        self.begin_move(extend);
        self.move_to(target);
        self.preferred_column = Some(column);
        true
    }

    fn block_text(&self, index: usize) -> String {
        self.document
            .block(index)
            .map(|block| block.text())
            .unwrap_or_default()
    }

    fn after_edit(&mut self) {
        let document = &self.document;
        if let Some(current) = self.history.get(self.history_index) {
            if current.document == *document {
                return;
            }
        }
        self.history.truncate(self.history_index + 1);
        self.history.push(Snapshot {
            document: document.clone(),
            cursor: self.cursor,
        });
        if self.history.len() > MAX_HISTORY {
            let overflow = self.history.len() - MAX_HISTORY;
            self.history.drain(0..overflow);
        }
        self.history_index = self.history.len() - 1;
    }

    fn restore_history_snapshot(&mut self) {
        if let Some(snapshot) = self.history.get(self.history_index).cloned() {
            self.document = snapshot.document;
            self.cursor = self.document.clamp(snapshot.cursor);
            self.anchor = None;
            self.pending = None;
            self.preferred_column = None;
        }
    }
}

fn prev_grapheme_boundary(text: &str, offset: usize) -> usize {
    text[..offset]
        .grapheme_indices(true)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, offset: usize) -> usize {
    text[offset..]
        .graphemes(true)
        .next()
        .map(|g| offset + g.len())
        .unwrap_or(offset)
}

fn grapheme_column(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].graphemes(true).count()
}

fn offset_for_column(text: &str, column: usize) -> usize {
    text.grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ListStyle, Run, DEFAULT_TEXT_COLOR};

    fn editor_with(text: &str) -> JournalEditor {
        JournalEditor::new(Document::plain(text))
    }

    fn type_text(editor: &mut JournalEditor, text: &str) {
        for ch in text.chars() {
            editor.insert_char(ch);
        }
    }

    #[test]
    fn bold_without_selection_affects_only_new_text() {
        let mut editor = JournalEditor::default();
        type_text(&mut editor, "plain ");
        let outcome = editor.apply(FormatCommand::ToggleBold);
        assert!(outcome.format.bold());
        assert!(!outcome.document_changed);
        type_text(&mut editor, "bold");
        let runs = editor.document().blocks()[0].runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "plain ");
        assert!(runs[1].format.bold());
    }

    #[test]
    fn pending_format_resets_when_cursor_moves() {
        let mut editor = editor_with("abc");
        editor.set_cursor(Position::new(0, 3), false);
        editor.apply(FormatCommand::ToggleItalic);
        assert!(editor.current_format().italic());
        editor.move_left(false);
        assert!(!editor.current_format().italic());
    }

    #[test]
    fn toggling_selection_flips_relative_to_first_character() {
        let mut editor = editor_with("Hello world");
        editor.select(Position::new(0, 0), Position::new(0, 5));
        let outcome = editor.apply(FormatCommand::ToggleUnderline);
        assert!(outcome.document_changed);
        assert!(outcome.format.underline());
        editor.select(Position::new(0, 0), Position::new(0, 11));
        editor.apply(FormatCommand::ToggleUnderline);
        assert!(editor.document().blocks()[0]
            .runs()
            .iter()
            .all(|run| !run.format.underline()));
    }

    #[test]
    fn font_size_rejects_non_numeric_input() {
        let mut editor = JournalEditor::default();
        for raw in ["", "abc", "0", "-4", "12.5", "99999999"] {
            let outcome = editor.apply(FormatCommand::FontSize(raw.into()));
            assert_eq!(outcome.format.font_size, None, "input {raw:?}");
        }
        let outcome = editor.apply(FormatCommand::FontSize(" 24 ".into()));
        assert_eq!(outcome.format.font_size, Some(24));
    }

    #[test]
    fn cancelled_colour_prompt_is_noop() {
        let mut editor = editor_with("text");
        editor.select_all();
        let before = editor.document().clone();
        let outcome = editor.apply(FormatCommand::FontColor(None));
        assert!(!outcome.document_changed);
        assert_eq!(editor.document(), &before);
        let outcome = editor.apply(FormatCommand::FontColor(Some(DEFAULT_TEXT_COLOR)));
        assert!(outcome.document_changed);
        assert_eq!(outcome.format.foreground, Some(DEFAULT_TEXT_COLOR));
    }

    #[test]
    fn font_family_applies_unconditionally() {
        let mut editor = JournalEditor::default();
        let outcome = editor.apply(FormatCommand::FontFamily(String::new()));
        assert_eq!(outcome.format.font_family.as_deref(), Some(""));
    }

    #[test]
    fn highlight_requires_selection() {
        let mut editor = editor_with("text");
        let outcome = editor.apply(FormatCommand::ToggleHighlight);
        assert!(!outcome.document_changed);
        assert_eq!(outcome.format.background, None);
        assert!(editor.current_format().background.is_none());
    }

    #[test]
    fn highlight_twice_restores_background() {
        let mut editor = editor_with("mark me please");
        editor.select(Position::new(0, 5), Position::new(0, 7));
        let original = editor.document().clone();
        let first = editor.apply(FormatCommand::ToggleHighlight);
        assert_eq!(first.format.background, Some(HIGHLIGHT_COLOR));
        let second = editor.apply(FormatCommand::ToggleHighlight);
        assert_eq!(second.format.background, None);
        assert_eq!(editor.document(), &original);
    }

    #[test]
    fn highlight_replaces_other_backgrounds() {
        let mut editor = editor_with("abc");
        editor.select_all();
        let mut doc = editor.document().clone();
        doc.update_range(Position::new(0, 0), Position::new(0, 3), |f| {
            f.background = Some(Rgb::new(1, 2, 3))
        });
        editor.load(doc);
        editor.select_all();
        let outcome = editor.apply(FormatCommand::ToggleHighlight);
        assert_eq!(outcome.format.background, Some(HIGHLIGHT_COLOR));
    }

    #[test]
    fn bullet_toggle_twice_returns_to_paragraph() {
        let mut editor = editor_with("item");
        editor.apply(FormatCommand::ToggleBulletList);
        let list = editor.document().blocks()[0].list.expect("in list");
        assert_eq!(list.style, ListStyle::Bullet);
        editor.apply(FormatCommand::ToggleBulletList);
        assert_eq!(editor.document().blocks()[0].list, None);
    }

    #[test]
    fn switching_list_style_starts_a_new_list() {
        let mut editor = editor_with("one\ntwo\nthree");
        editor.select_all();
        editor.apply(FormatCommand::ToggleNumberList);
        let numbered = editor.document().blocks()[0].list.expect("numbered");

        editor.set_cursor(Position::new(1, 0), false);
        editor.apply(FormatCommand::ToggleBulletList);
        let blocks = editor.document().blocks();
        let bullet = blocks[1].list.expect("bullet");
        assert_eq!(bullet.style, ListStyle::Bullet);
        assert_ne!(bullet.id, numbered.id);
        assert_eq!(blocks[0].list, Some(numbered));
        assert_eq!(blocks[2].list, Some(numbered));
        assert_eq!(editor.document().list_marker(2).as_deref(), Some("2."));
    }

    #[test]
    fn enter_on_empty_list_item_leaves_list() {
        let mut editor = editor_with("first");
        editor.set_cursor(Position::new(0, 5), false);
        editor.apply(FormatCommand::ToggleNumberList);
        editor.insert_newline();
        assert_eq!(editor.cursor(), Position::new(1, 0));
        assert!(editor.document().blocks()[1].list.is_some());
        editor.insert_newline();
        assert_eq!(editor.document().block_count(), 2);
        assert_eq!(editor.document().blocks()[1].list, None);
    }

    #[test]
    fn newline_carries_pending_format() {
        let mut editor = JournalEditor::default();
        editor.apply(FormatCommand::ToggleBold);
        type_text(&mut editor, "a");
        editor.insert_newline();
        type_text(&mut editor, "b");
        assert_eq!(
            editor.document().blocks()[1].runs()[0],
            Run::new(
                "b",
                CharFormat {
                    style: TextStyle::BOLD,
                    ..CharFormat::default()
                }
            )
        );
    }

    #[test]
    fn backspace_merges_paragraphs_and_undo_restores() {
        let mut editor = editor_with("ab\ncd");
        editor.set_cursor(Position::new(1, 0), false);
        assert!(editor.backspace());
        assert_eq!(editor.document().plain_text(), "abcd");
        assert_eq!(editor.cursor(), Position::new(0, 2));
        assert!(editor.undo());
        assert_eq!(editor.document().plain_text(), "ab\ncd");
        assert!(editor.redo());
        assert_eq!(editor.document().plain_text(), "abcd");
    }

    #[test]
    fn typing_replaces_selection() {
        let mut editor = editor_with("hello world");
        editor.select(Position::new(0, 6), Position::new(0, 11));
        type_text(&mut editor, "there");
        assert_eq!(editor.document().plain_text(), "hello there");
        assert!(!editor.has_selection());
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut editor = editor_with("abcdef\nxy\nlonger line");
        editor.set_cursor(Position::new(0, 4), false);
        editor.move_down(false);
        assert_eq!(editor.cursor(), Position::new(1, 2));
        editor.move_down(false);
        assert_eq!(editor.cursor(), Position::new(2, 4));
    }

    #[test]
    fn grapheme_aware_deletion() {
        let mut editor = editor_with("ae\u{301}");
        editor.set_cursor(Position::new(0, 4), false);
        editor.backspace();
        assert_eq!(editor.document().plain_text(), "a");
    }

    #[test]
    fn parse_font_size_accepts_digits_only() {
        assert_eq!(parse_font_size("14"), Some(14));
        assert_eq!(parse_font_size("+14"), None);
        assert_eq!(parse_font_size("0"), None);
    }
}
