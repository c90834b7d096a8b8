//! Rich-text document model: a document is a sequence of blocks, a block is
//! a sequence of formatted runs and may belong to a list.
//!
//! Offsets are byte offsets into a block's text and must fall on character
//! boundaries. Block text never contains a line break.

use std::collections::HashMap;

mod format;
pub mod html;

pub use format::{
    CharFormat, ListStyle, NamedColor, Rgb, TextStyle, DEFAULT_TEXT_COLOR, HIGHLIGHT_COLOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListRef {
    pub id: ListId,
    pub style: ListStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub format: CharFormat,
}

impl Run {
    pub fn new(text: impl Into<String>, format: CharFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, CharFormat::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub list: Option<ListRef>,
    runs: Vec<Run>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_runs(runs: Vec<Run>, list: Option<ListRef>) -> Self {
        let mut block = Self { list, runs };
        for run in &mut block.runs {
            if run.text.contains(['\n', '\r']) {
                run.text = run.text.replace(['\n', '\r'], " ");
            }
        }
        block.normalize();
        block
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.iter().map(|run| run.text.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Format of the character ending at `offset`; at the block start, the
    /// format of the first character.
    pub fn format_before(&self, offset: usize) -> Option<&CharFormat> {
        if offset == 0 {
            return self.runs.first().map(|run| &run.format);
        }
        let mut start = 0;
        for run in &self.runs {
            let end = start + run.text.len();
            if offset <= end {
                return Some(&run.format);
            }
            start = end;
        }
        self.runs.last().map(|run| &run.format)
    }

    /// Format of the character starting at `offset`.
    pub fn format_after(&self, offset: usize) -> Option<&CharFormat> {
        let mut start = 0;
        for run in &self.runs {
            let end = start + run.text.len();
            if offset < end {
                return Some(&run.format);
            }
            start = end;
        }
        None
    }

    fn insert(&mut self, offset: usize, text: &str, format: &CharFormat) {
        if text.is_empty() {
            return;
        }
        let (mut left, right) = split_runs(std::mem::take(&mut self.runs), offset);
        left.push(Run::new(text, format.clone()));
        left.extend(right);
        self.runs = left;
        self.normalize();
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let (mut left, rest) = split_runs(std::mem::take(&mut self.runs), start);
        let (_, right) = split_runs(rest, end - start);
        left.extend(right);
        self.runs = left;
        self.normalize();
    }

    fn update_range<F>(&mut self, start: usize, end: usize, f: &mut F)
    where
        F: FnMut(&mut CharFormat),
    {
        if start >= end {
            return;
        }
        let (mut left, rest) = split_runs(std::mem::take(&mut self.runs), start);
        let (mut middle, right) = split_runs(rest, end - start);
        for run in &mut middle {
            f(&mut run.format);
        }
        left.extend(middle);
        left.extend(right);
        self.runs = left;
        self.normalize();
    }

    fn split_off(&mut self, offset: usize) -> Vec<Run> {
        let (left, right) = split_runs(std::mem::take(&mut self.runs), offset);
        self.runs = left;
        self.normalize();
        right
    }

    fn append(&mut self, runs: Vec<Run>) {
        self.runs.extend(runs);
        self.normalize();
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.format == run.format => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }
}

fn split_runs(runs: Vec<Run>, offset: usize) -> (Vec<Run>, Vec<Run>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut consumed = 0;
    for mut run in runs {
        let len = run.text.len();
        if consumed >= offset {
            right.push(run);
        } else if consumed + len <= offset {
            consumed += len;
            left.push(run);
        } else {
            let tail = run.text.split_off(offset - consumed);
            consumed += len;
            right.push(Run::new(tail, run.format.clone()));
            left.push(run);
        }
    }
    (left, right)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub const fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
    next_list_id: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            blocks: vec![Block::new()],
            next_list_id: 0,
        }
    }
}

/// Content equality: list identities are compared structurally, not by id.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.blocks.len() == other.blocks.len()
            && self.canonical_lists() == other.canonical_lists()
            && self
                .blocks
                .iter()
                .zip(&other.blocks)
                .all(|(a, b)| a.runs == b.runs)
    }
}

impl Eq for Document {}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            return Self::new();
        }
        let next_list_id = blocks
            .iter()
            .filter_map(|block| block.list.map(|list| list.id.0 + 1))
            .max()
            .unwrap_or(0);
        Self {
            blocks,
            next_list_id,
        }
    }

    pub fn plain(text: &str) -> Self {
        let mut doc = Self::new();
        doc.insert_text(Position::default(), text, &CharFormat::default());
        doc
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_len(&self, index: usize) -> usize {
        self.blocks.get(index).map(Block::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1 && self.blocks[0].is_empty() && self.blocks[0].list.is_none()
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn end(&self) -> Position {
        let last = self.blocks.len() - 1;
        Position::new(last, self.blocks[last].len())
    }

    pub fn clamp(&self, pos: Position) -> Position {
        if pos.block >= self.blocks.len() {
            return self.end();
        }
        let len = self.blocks[pos.block].len();
        Position::new(pos.block, pos.offset.min(len))
    }

    /// Format that text typed at `pos` would take.
    pub fn format_at(&self, pos: Position) -> CharFormat {
        self.blocks
            .get(pos.block)
            .and_then(|block| block.format_before(pos.offset))
            .cloned()
            .unwrap_or_default()
    }

    /// Format of the first character inside `[start, end)`.
    pub fn range_format(&self, start: Position, end: Position) -> CharFormat {
        let mut pos = start;
        while pos < end && pos.block < self.blocks.len() {
            if let Some(format) = self.blocks[pos.block].format_after(pos.offset) {
                return format.clone();
            }
            pos = Position::new(pos.block + 1, 0);
        }
        self.format_at(start)
    }

    /// Inserts `text`, splitting blocks at line breaks. Returns the position
    /// just past the inserted text.
    pub fn insert_text(&mut self, pos: Position, text: &str, format: &CharFormat) -> Position {
        let mut pos = self.clamp(pos);
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                pos = self.split_block(pos);
            }
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            self.blocks[pos.block].insert(pos.offset, line, format);
            pos.offset += line.len();
        }
        pos
    }

    /// Splits the block at `pos`; the new block keeps the list membership.
    pub fn split_block(&mut self, pos: Position) -> Position {
        let pos = self.clamp(pos);
        let list = self.blocks[pos.block].list;
        let tail = self.blocks[pos.block].split_off(pos.offset);
        self.blocks
            .insert(pos.block + 1, Block::from_runs(tail, list));
        Position::new(pos.block + 1, 0)
    }

    /// Removes `[start, end)`, merging blocks across the range. The merged
    /// block keeps the first block's list membership.
    pub fn delete_range(&mut self, start: Position, end: Position) -> Position {
        let (start, end) = self.ordered(start, end);
        if start == end {
            return start;
        }
        if start.block == end.block {
            self.blocks[start.block].remove_range(start.offset, end.offset);
            return start;
        }
        let tail = self.blocks[end.block].split_off(end.offset);
        self.blocks[start.block].split_off(start.offset);
        self.blocks[start.block].append(tail);
        self.blocks.drain(start.block + 1..=end.block);
        start
    }

    pub fn update_range<F>(&mut self, start: Position, end: Position, mut f: F)
    where
        F: FnMut(&mut CharFormat),
    {
        let (start, end) = self.ordered(start, end);
        for index in start.block..=end.block {
            let from = if index == start.block { start.offset } else { 0 };
            let to = if index == end.block {
                end.offset
            } else {
                self.blocks[index].len()
            };
            self.blocks[index].update_range(from, to, &mut f);
        }
    }

    pub fn new_list(&mut self, style: ListStyle) -> ListRef {
        let id = ListId(self.next_list_id);
        self.next_list_id += 1;
        ListRef { id, style }
    }

    pub fn set_list(&mut self, first: usize, last: usize, list: Option<ListRef>) {
        let last = last.min(self.blocks.len() - 1);
        for block in &mut self.blocks[first..=last] {
            block.list = list;
        }
    }

    /// 1-based position of the block within its list.
    pub fn list_number(&self, index: usize) -> Option<usize> {
        let list = self.blocks.get(index)?.list?;
        Some(
            self.blocks[..=index]
                .iter()
                .filter(|block| block.list.map(|l| l.id) == Some(list.id))
                .count(),
        )
    }

    /// Prefix shown before a list item, e.g. `•` or `3.`.
    pub fn list_marker(&self, index: usize) -> Option<String> {
        let list = self.blocks.get(index)?.list?;
        match list.style {
            ListStyle::Bullet => Some("•".to_string()),
            ListStyle::Numbered => self.list_number(index).map(|n| format!("{n}.")),
        }
    }

    fn ordered(&self, a: Position, b: Position) -> (Position, Position) {
        let (a, b) = (self.clamp(a), self.clamp(b));
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// List membership with ids renumbered by first appearance.
    fn canonical_lists(&self) -> Vec<Option<(usize, ListStyle)>> {
        let mut seen: HashMap<ListId, usize> = HashMap::new();
        self.blocks
            .iter()
            .map(|block| {
                block.list.map(|list| {
                    let next = seen.len();
                    (*seen.entry(list.id).or_insert(next), list.style)
                })
            })
            .collect()
    }
}
