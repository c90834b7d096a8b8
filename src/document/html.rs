//! HTML codec for journal documents.
//!
//! The writer emits a small, stable subset: `<p>` paragraphs, `<ul>`/`<ol>`
//! lists tagged with `data-list` so interrupted lists keep their identity,
//! and `<span style>` for formatted runs. The reader is tolerant: it also
//! understands the usual inline tags, headings, `<div>`, `<br>` and
//! entities, and ignores anything it does not know.

use std::collections::HashMap;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::{Block, CharFormat, Document, ListId, ListRef, ListStyle, Rgb, Run, TextStyle};

const HEADER: &str = "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"generator\" content=\"daybook\">\n</head>\n<body>\n";
const FOOTER: &str = "</body>\n</html>\n";

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|<(/?)([A-Za-z][A-Za-z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>|<|[^<]+"#,
    )
    .expect("valid markup token regex")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("valid attribute regex")
});

static DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z-]+)\s*:\s*('(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|[^;]*)"#)
        .expect("valid css regex")
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]+);").expect("valid entity regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unterminated tag at byte {offset}")]
    UnterminatedTag { offset: usize },
}

pub fn to_html(document: &Document) -> String {
    let mut out = String::with_capacity(HEADER.len() + FOOTER.len() + document.blocks().len() * 32);
    out.push_str(HEADER);

    let mut list_numbers: HashMap<ListId, usize> = HashMap::new();
    let mut open: Option<ListRef> = None;
    for block in document.blocks() {
        if open.map(|list| list.id) != block.list.map(|list| list.id) {
            if let Some(list) = open.take() {
                let _ = writeln!(out, "</{}>", list_tag(list.style));
            }
            if let Some(list) = block.list {
                let next = list_numbers.len();
                let number = *list_numbers.entry(list.id).or_insert(next);
                let _ = writeln!(out, "<{} data-list=\"{number}\">", list_tag(list.style));
                open = Some(list);
            }
        }
        let tag = if block.list.is_some() { "li" } else { "p" };
        out.push('<');
        out.push_str(tag);
        out.push('>');
        for run in block.runs() {
            write_run(&mut out, run);
        }
        let _ = writeln!(out, "</{tag}>");
    }
    if let Some(list) = open {
        let _ = writeln!(out, "</{}>", list_tag(list.style));
    }

    out.push_str(FOOTER);
    out
}

pub fn from_html(input: &str) -> Result<Document, MarkupError> {
    let mut reader = Reader::default();
    for caps in TOKEN_RE.captures_iter(input) {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        if let Some(name) = caps.get(2) {
            let closing = caps.get(1).map(|m| !m.as_str().is_empty()).unwrap_or(false);
            let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            let name = name.as_str().to_ascii_lowercase();
            if closing {
                reader.close_tag(&name);
            } else {
                reader.open_tag(&name, attrs);
            }
        } else if whole == "<" {
            let offset = caps.get(0).map(|m| m.start()).unwrap_or_default();
            return Err(MarkupError::UnterminatedTag { offset });
        } else if !whole.starts_with('<') {
            reader.text(whole);
        }
    }
    Ok(reader.finish())
}

fn list_tag(style: ListStyle) -> &'static str {
    style.into()
}

fn write_run(out: &mut String, run: &Run) {
    if run.format.is_plain() {
        escape_into(out, &run.text, false);
        return;
    }
    out.push_str("<span style=\"");
    escape_into(out, &style_attribute(&run.format), true);
    out.push_str("\">");
    escape_into(out, &run.text, false);
    out.push_str("</span>");
}

fn style_attribute(format: &CharFormat) -> String {
    let mut css = String::new();
    if let Some(family) = &format.font_family {
        let _ = write!(css, "font-family:{};", quote_css_string(family));
    }
    if let Some(size) = format.font_size {
        let _ = write!(css, "font-size:{size}pt;");
    }
    if format.bold() {
        css.push_str("font-weight:bold;");
    }
    if format.italic() {
        css.push_str("font-style:italic;");
    }
    match (format.underline(), format.strike()) {
        (true, true) => css.push_str("text-decoration:underline line-through;"),
        (true, false) => css.push_str("text-decoration:underline;"),
        (false, true) => css.push_str("text-decoration:line-through;"),
        (false, false) => {}
    }
    if let Some(color) = format.foreground {
        let _ = write!(css, "color:{color};");
    }
    if let Some(color) = format.background {
        let _ = write!(css, "background-color:{color};");
    }
    css
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn apply_css(format: &mut CharFormat, css: &str) {
    for caps in DECL_RE.captures_iter(css) {
        let property = caps[1].to_ascii_lowercase();
        let value = caps[2].trim();
        let lowered = value.to_ascii_lowercase();
        match property.as_str() {
            "font-weight" => {
                let heavy = match lowered.as_str() {
                    "bold" | "bolder" => true,
                    "normal" | "lighter" => false,
                    number => number.parse::<u16>().map(|w| w >= 600).unwrap_or(false),
                };
                format.style.set(TextStyle::BOLD, heavy);
            }
            "font-style" => {
                format
                    .style
                    .set(TextStyle::ITALIC, lowered == "italic" || lowered == "oblique");
            }
            "text-decoration" | "text-decoration-line" => {
                format
                    .style
                    .set(TextStyle::UNDERLINE, lowered.contains("underline"));
                format
                    .style
                    .set(TextStyle::STRIKE, lowered.contains("line-through"));
            }
            "font-size" => {
                let number = lowered.trim_end_matches("pt").trim_end_matches("px").trim();
                if let Ok(size) = number.parse::<f32>() {
                    if size >= 1.0 && size <= f32::from(u16::MAX) {
                        format.font_size = Some(size.round() as u16);
                    }
                }
            }
            "font-family" => {
                if let Some(family) = unquote_css_string(value) {
                    format.font_family = Some(family);
                } else if !value.is_empty() {
                    format.font_family = Some(value.to_string());
                }
            }
            "color" => {
                if let Some(color) = Rgb::parse_hex(value) {
                    format.foreground = Some(color);
                }
            }
            "background-color" | "background" => {
                if lowered == "transparent" || lowered == "none" {
                    format.background = None;
                } else if let Some(color) = Rgb::parse_hex(value) {
                    format.background = Some(color);
                }
            }
            _ => {}
        }
    }
}

/// Single-quoted CSS string with `\` and `'` backslash-escaped.
fn quote_css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Contents of a quoted CSS string, or `None` if `value` is not one.
fn unquote_css_string(value: &str) -> Option<String> {
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = value.strip_prefix(quote)?.strip_suffix(quote)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            other => out.push(other),
        }
    }
    Some(out)
}

#[derive(Debug)]
struct ListContext {
    list: ListRef,
}

#[derive(Default)]
struct Reader {
    blocks: Vec<Block>,
    current: Option<(Vec<Run>, Option<ListRef>)>,
    formats: Vec<(String, CharFormat)>,
    lists: Vec<ListContext>,
    list_ids: HashMap<String, ListId>,
    next_list_id: u32,
    skip_depth: usize,
}

impl Reader {
    fn open_tag(&mut self, name: &str, raw_attrs: &str) {
        let self_closing = raw_attrs.trim_end().ends_with('/');
        match name {
            "head" | "style" | "script" | "title" if !self_closing => self.skip_depth += 1,
            "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote"
            | "pre" => {
                self.flush_block();
                let list = if name == "li" {
                    self.lists.last().map(|ctx| ctx.list)
                } else {
                    None
                };
                self.current = Some((Vec::new(), list));
                if name.starts_with('h') && name.len() == 2 {
                    let mut format = self.current_format();
                    format.style.insert(TextStyle::BOLD);
                    self.formats.push((name.to_string(), format));
                }
            }
            "ul" | "ol" => {
                self.flush_block();
                let style = if name == "ol" {
                    ListStyle::Numbered
                } else {
                    ListStyle::Bullet
                };
                let attrs = parse_attributes(raw_attrs);
                let id = match attrs.get("data-list") {
                    Some(key) => match self.list_ids.get(key) {
                        Some(id) => *id,
                        None => {
                            let id = self.fresh_list_id();
                            self.list_ids.insert(key.clone(), id);
                            id
                        }
                    },
                    None => self.fresh_list_id(),
                };
                self.lists.push(ListContext {
                    list: ListRef { id, style },
                });
            }
            "br" => {
                let list = match &self.current {
                    Some((runs, _)) if runs.is_empty() => return,
                    Some((_, list)) => *list,
                    None => self.lists.last().map(|ctx| ctx.list),
                };
                self.flush_block();
                self.current = Some((Vec::new(), list));
            }
            "span" | "b" | "strong" | "i" | "em" | "u" | "ins" | "s" | "strike" | "del"
            | "mark" | "font"
                if !self_closing =>
            {
                let mut format = self.current_format();
                match name {
                    "b" | "strong" => format.style.insert(TextStyle::BOLD),
                    "i" | "em" => format.style.insert(TextStyle::ITALIC),
                    "u" | "ins" => format.style.insert(TextStyle::UNDERLINE),
                    "s" | "strike" | "del" => format.style.insert(TextStyle::STRIKE),
                    "mark" => format.background = Some(super::HIGHLIGHT_COLOR),
                    _ => {}
                }
                let attrs = parse_attributes(raw_attrs);
                if let Some(color) = attrs.get("color").and_then(|c| Rgb::parse_hex(c)) {
                    format.foreground = Some(color);
                }
                if let Some(css) = attrs.get("style") {
                    apply_css(&mut format, css);
                }
                self.formats.push((name.to_string(), format));
            }
            _ => {}
        }
    }

    fn close_tag(&mut self, name: &str) {
        match name {
            "head" | "style" | "script" | "title" => {
                self.skip_depth = self.skip_depth.saturating_sub(1);
            }
            "p" | "div" | "li" | "blockquote" | "pre" => self.flush_block(),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.pop_format(name);
                self.flush_block();
            }
            "ul" | "ol" => {
                self.flush_block();
                self.lists.pop();
            }
            _ => self.pop_format(name),
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skip_depth > 0 {
            return;
        }
        let decoded = decode_entities(raw);
        let text = decoded.replace("\r\n", " ").replace(['\n', '\r'], " ");
        if self.current.is_none() {
            if text.trim().is_empty() {
                return;
            }
            self.current = Some((Vec::new(), None));
        }
        let format = self.current_format();
        if let Some((runs, _)) = self.current.as_mut() {
            runs.push(Run::new(text, format));
        }
    }

    fn pop_format(&mut self, name: &str) {
        if let Some(idx) = self.formats.iter().rposition(|(tag, _)| tag == name) {
            self.formats.truncate(idx);
        }
    }

    fn current_format(&self) -> CharFormat {
        self.formats
            .last()
            .map(|(_, format)| format.clone())
            .unwrap_or_default()
    }

    fn fresh_list_id(&mut self) -> ListId {
        let id = ListId(self.next_list_id);
        self.next_list_id += 1;
        id
    }

    fn flush_block(&mut self) {
        if let Some((runs, list)) = self.current.take() {
            self.blocks.push(Block::from_runs(runs, list));
        }
    }

    fn finish(mut self) -> Document {
        self.flush_block();
        Document::from_blocks(self.blocks)
    }
}
