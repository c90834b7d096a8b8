use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use time::{macros::format_description, Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{
    AppState, ChoiceOverlay, ColorPickerOverlay, DatePickerOverlay, FocusPane, OverlayState,
};
use crate::config::EditorOptions;
use crate::date::{format_day, month_start, today};
use crate::document::{CharFormat, ListStyle, Position, Rgb};
use crate::editor::JournalEditor;
use crate::journaling::AutoSaveStatus;

pub fn draw_app(frame: &mut Frame, state: &AppState, editor_options: &EditorOptions) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.size());

    frame.render_widget(Paragraph::new(header_line(state.selected_date())), vertical[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(vertical[1]);

    draw_journal(frame, state, editor_options, columns[0]);
    draw_todos(frame, state, columns[1]);

    let status = build_status_line(state);
    let status_paragraph = Paragraph::new(status).style(Style::default().fg(Color::Gray));
    frame.render_widget(status_paragraph, vertical[2]);

    render_overlay(frame, state, editor_options);
}

fn header_line(date: Date) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            " Daybook ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format_day(date), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", date.weekday()),
            Style::default().fg(Color::Gray),
        ),
    ];
    if date == today() {
        spans.push(Span::styled("  (today)", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_journal(frame: &mut Frame, state: &AppState, options: &EditorOptions, area: Rect) {
    let focused = state.focus == FocusPane::Journal;
    let block = Block::default()
        .title("Journal")
        .borders(Borders::ALL)
        .border_style(focus_style(focused));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    frame.render_widget(Paragraph::new(toolbar_line(&state.editor, options)), rows[0]);

    let body = rows[1];
    let layout = layout_document(&state.editor, body.width);
    let scroll = match layout.cursor {
        Some((row, _)) if body.height > 0 && row >= body.height => row + 1 - body.height,
        _ => 0,
    };
    let paragraph = Paragraph::new(Text::from(layout.lines)).scroll((scroll, 0));
    frame.render_widget(paragraph, body);

    if focused && state.overlay().is_none() {
        if let Some((row, col)) = layout.cursor {
            let row = row - scroll;
            if row < body.height {
                frame.set_cursor(body.x + col.min(body.width.saturating_sub(1)), body.y + row);
            }
        }
    }
}

fn toolbar_line(editor: &JournalEditor, options: &EditorOptions) -> Line<'static> {
    let format = editor.current_format();
    let toggle = |label: &'static str, active: bool| {
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(label, style)
    };
    let list_style = editor
        .document()
        .block(editor.cursor().block)
        .and_then(|block| block.list)
        .map(|list| list.style);

    let mut spans = vec![
        toggle(" B ", format.bold()),
        toggle(" I ", format.italic()),
        toggle(" U ", format.underline()),
        toggle(" S ", format.strike()),
        Span::raw(" "),
        toggle(" H ", editor.has_selection() && format.background.is_some()),
        Span::raw(" "),
        toggle(" • ", list_style == Some(ListStyle::Bullet)),
        toggle(" 1. ", list_style == Some(ListStyle::Numbered)),
        Span::raw("  "),
        Span::styled(
            format!("{}pt", format.font_size.unwrap_or(options.default_font_size)),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format
                .font_family
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            Style::default().fg(Color::Gray),
        ),
    ];
    if let Some(color) = format.foreground {
        spans.push(Span::raw(" "));
        spans.push(Span::styled("■", Style::default().fg(to_color(color))));
    }
    Line::from(spans)
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn run_style(format: &CharFormat) -> Style {
    let mut style = Style::default();
    let mut modifiers = Modifier::empty();
    if format.bold() {
        modifiers |= Modifier::BOLD;
    }
    if format.italic() {
        modifiers |= Modifier::ITALIC;
    }
    if format.underline() {
        modifiers |= Modifier::UNDERLINED;
    }
    if format.strike() {
        modifiers |= Modifier::CROSSED_OUT;
    }
    style = style.add_modifier(modifiers);
    if let Some(fg) = format.foreground {
        style = style.fg(to_color(fg));
    }
    if let Some(bg) = format.background {
        style = style.bg(to_color(bg));
    }
    style
}

struct DocumentLayout {
    lines: Vec<Line<'static>>,
    /// Row and column of the cursor inside the text area.
    cursor: Option<(u16, u16)>,
}

/// Character-wraps the document to `width` columns. List items get their
/// marker and a hanging indent; the selection is drawn reversed.
fn layout_document(editor: &JournalEditor, width: u16) -> DocumentLayout {
    let width = usize::from(width.max(1));
    let document = editor.document();
    let cursor = editor.cursor();
    let selection = editor.selection();
    let mut builder = LineBuilder::default();
    let mut cursor_cell = None;

    for (index, block) in document.blocks().iter().enumerate() {
        let marker = document
            .list_marker(index)
            .map(|marker| format!("{marker} "))
            .unwrap_or_default();
        let indent = UnicodeWidthStr::width(marker.as_str()).min(width.saturating_sub(1));
        builder.start_row();
        if !marker.is_empty() {
            builder.push(&marker, Style::default().fg(Color::Cyan), indent);
        }

        let mut offset = 0usize;
        for run in block.runs() {
            let base = run_style(&run.format);
            for grapheme in run.text.graphemes(true) {
                let glyph_width = UnicodeWidthStr::width(grapheme).max(1);
                if builder.col + glyph_width > width && builder.col > indent {
                    builder.wrap(indent);
                }
                let pos = Position::new(index, offset);
                if pos == cursor {
                    cursor_cell = Some(builder.cell());
                }
                let selected = selection
                    .map(|(start, end)| start <= pos && pos < end)
                    .unwrap_or(false);
                let style = if selected {
                    base.add_modifier(Modifier::REVERSED)
                } else {
                    base
                };
                builder.push(grapheme, style, glyph_width);
                offset += grapheme.len();
            }
        }
        if cursor == Position::new(index, offset) {
            if builder.col >= width {
                builder.wrap(indent);
            }
            cursor_cell = Some(builder.cell());
        }
        builder.finish_row();
    }

    DocumentLayout {
        lines: builder.lines,
        cursor: cursor_cell,
    }
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    pending: String,
    pending_style: Style,
    col: usize,
}

impl LineBuilder {
    fn start_row(&mut self) {
        self.spans.clear();
        self.pending.clear();
        self.col = 0;
    }

    fn cell(&self) -> (u16, u16) {
        let row = u16::try_from(self.lines.len()).unwrap_or(u16::MAX);
        let col = u16::try_from(self.col).unwrap_or(u16::MAX);
        (row, col)
    }

    fn push(&mut self, text: &str, style: Style, width: usize) {
        if style != self.pending_style && !self.pending.is_empty() {
            self.flush_span();
        }
        self.pending_style = style;
        self.pending.push_str(text);
        self.col += width;
    }

    fn flush_span(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.spans.push(Span::styled(text, self.pending_style));
        }
    }

    fn wrap(&mut self, indent: usize) {
        self.finish_row();
        self.col = 0;
        if indent > 0 {
            self.push(&" ".repeat(indent), Style::default(), indent);
        }
    }

    fn finish_row(&mut self) {
        self.flush_span();
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        self.col = 0;
    }
}

fn draw_todos(frame: &mut Frame, state: &AppState, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let input_focused = state.focus == FocusPane::TaskInput;
    let input = Paragraph::new(state.todos.input().to_string()).block(
        Block::default()
            .title("New task (Enter to add)")
            .borders(Borders::ALL)
            .border_style(focus_style(input_focused)),
    );
    frame.render_widget(Clear, rows[0]);
    frame.render_widget(input, rows[0]);
    if input_focused && state.overlay().is_none() {
        let width = UnicodeWidthStr::width(state.todos.input());
        let max_col = rows[0].width.saturating_sub(3);
        let col = u16::try_from(width).unwrap_or(u16::MAX).min(max_col);
        frame.set_cursor(rows[0].x + 1 + col, rows[0].y + 1);
    }

    let list_focused = state.focus == FocusPane::TaskList;
    let tasks = state.todos.tasks();
    let items: Vec<ListItem> = if tasks.is_empty() {
        vec![ListItem::new(Span::styled(
            "No tasks for this day.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        tasks
            .iter()
            .map(|task| {
                ListItem::new(Line::from(vec![
                    Span::raw("☐ "),
                    Span::raw(task.to_string()),
                ]))
            })
            .collect()
    };
    let title = format!("To-do ({})", tasks.len());
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(focus_style(list_focused)),
        )
        .highlight_style(if list_focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        })
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default();
    list_state.select(state.todos.selected());
    frame.render_widget(Clear, rows[1]);
    frame.render_stateful_widget(list, rows[1], &mut list_state);
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let focus = match state.focus {
        FocusPane::Journal => "Journal",
        FocusPane::TaskInput => "Task input",
        FocusPane::TaskList => "Tasks",
    };

    let mut spans = vec![
        Span::raw("Focus: "),
        Span::styled(focus, Style::default().add_modifier(Modifier::BOLD)),
    ];

    match state.autosave_status() {
        AutoSaveStatus::Disabled => {
            spans.push(Span::raw(" | Autosave: off (Ctrl-s to save)"));
        }
        AutoSaveStatus::Inactive => {
            spans.push(Span::raw(" | Autosave: idle"));
        }
        AutoSaveStatus::Idle { last_saved_at, .. } => {
            spans.push(Span::raw(" | Autosave: saved"));
            if let Some(ts) = (*last_saved_at).or(state.last_saved_at()) {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format_time_short(ts),
                    Style::default().fg(Color::Gray),
                ));
            }
        }
        AutoSaveStatus::Pending { date, since } => {
            spans.push(Span::raw(" | Autosave: "));
            spans.push(Span::styled(
                "pending",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            if *date != state.selected_date() {
                spans.push(Span::raw(format!(" for {}", format_day(*date))));
            }
            spans.push(Span::raw(" since "));
            spans.push(Span::styled(
                format_time_short(*since),
                Style::default().fg(Color::Gray),
            ));
        }
        AutoSaveStatus::Error { message, .. } => {
            spans.push(Span::raw(" | Autosave: "));
            spans.push(Span::styled(
                format!("error ({message})"),
                Style::default().fg(Color::Red),
            ));
        }
    }

    if let Some(message) = state.status_message() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Cyan),
        ));
    }

    let keys = match state.focus {
        FocusPane::Journal => {
            "Alt-b/i/u/s style • Alt-h highlight • Alt-l/n lists • Alt-c colour • Alt-z size • Alt-f font"
        }
        FocusPane::TaskInput => "Type a task • Enter add • Esc clear • ↓ task list",
        FocusPane::TaskList => "↑/↓ select • d delete • a new task",
    };
    let lines = vec![
        Line::from(spans),
        Line::from(vec![
            Span::styled(
                "Keys: ",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(keys, Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(
            "      Tab pane • Ctrl-d date • Ctrl-s save • Ctrl-z/y undo/redo • F1 help • Ctrl-q quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    Text::from(lines)
}

fn format_time_short(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn render_overlay(frame: &mut Frame, state: &AppState, options: &EditorOptions) {
    match state.overlay() {
        Some(OverlayState::DatePicker(picker)) => {
            render_date_picker(frame, picker, state.selected_date())
        }
        Some(OverlayState::FontColor(picker)) => render_color_picker(frame, picker),
        Some(OverlayState::FontSize(choice)) => {
            render_choice(frame, "Font size", "Type points or pick a size", choice)
        }
        Some(OverlayState::FontFamily(choice)) => {
            render_choice(frame, "Font family", "Type a family or pick one", choice)
        }
        Some(OverlayState::Help) => render_help(frame, options),
        None => {}
    }
}

/// Week rows of the month containing `cursor`, Monday first, three columns
/// per day.
fn calendar_rows(cursor: Date, selected: Date, today: Date) -> Vec<Line<'static>> {
    let first = month_start(cursor);
    let lead = usize::from(first.weekday().number_days_from_monday());
    let days = cursor.month().length(cursor.year());

    let mut rows = Vec::new();
    let mut row: Vec<Span> = (0..lead).map(|_| Span::raw("   ")).collect();
    let mut cells = lead;
    for day in 1..=days {
        let Ok(date) = first.replace_day(day) else {
            continue;
        };
        let mut style = Style::default();
        if date == today {
            style = style.fg(Color::Green).add_modifier(Modifier::UNDERLINED);
        }
        if date == selected {
            style = style.add_modifier(Modifier::BOLD);
        }
        if date == cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        row.push(Span::styled(format!("{day:>2}"), style));
        row.push(Span::raw(" "));
        cells += 1;
        if cells % 7 == 0 {
            rows.push(Line::from(std::mem::take(&mut row)));
        }
    }
    if !row.is_empty() {
        rows.push(Line::from(row));
    }
    rows
}

fn render_date_picker(frame: &mut Frame, picker: &DatePickerOverlay, selected: Date) {
    let area = centered_rect(50, 60, frame.size());
    frame.render_widget(Clear, area);

    let cursor = picker.cursor;
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} {}", cursor.month(), cursor.year()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Mo Tu We Th Fr Sa Su",
            Style::default().fg(Color::Gray),
        )),
    ];
    lines.extend(calendar_rows(cursor, selected, today()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "←/→ day • ↑/↓ week • PgUp/PgDn month • t today • Enter select • Esc cancel",
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Select date")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_color_picker(frame: &mut Frame, picker: &ColorPickerOverlay) {
    let area = centered_rect(40, 60, frame.size());
    frame.render_widget(Clear, area);

    let mut lines = Vec::with_capacity(picker.swatches.len() + 4);
    for (index, swatch) in picker.swatches.iter().enumerate() {
        let rgb = swatch.rgb();
        let marker = if index == picker.selected { "▶ " } else { "  " };
        let name_style = if index == picker.selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled("██ ", Style::default().fg(to_color(rgb))),
            Span::styled(format!("{:<10}", swatch.to_string()), name_style),
            Span::styled(rgb.to_hex(), Style::default().fg(Color::Gray)),
        ]));
    }
    lines.push(Line::from(""));
    let mut hex = picker.hex_input.clone();
    hex.push('▌');
    lines.push(Line::from(vec![Span::raw("Hex: "), Span::raw(hex)]));
    lines.push(Line::from(Span::styled(
        "↑/↓ swatch • type hex • Enter apply • Esc cancel",
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Font colour")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_choice(
    frame: &mut Frame,
    title: &'static str,
    hint: &'static str,
    choice: &ChoiceOverlay,
) {
    let area = centered_rect(40, 60, frame.size());
    frame.render_widget(Clear, area);

    let mut input = choice.input.clone();
    input.push('▌');
    let mut lines = vec![
        Line::from(vec![Span::raw("Value: "), Span::raw(input)]),
        Line::from(""),
    ];
    let visible = usize::from(area.height.saturating_sub(6)).max(1);
    let first = choice.selected.saturating_sub(visible.saturating_sub(1));
    for (index, option) in choice.options.iter().enumerate().skip(first).take(visible) {
        let selected = index == choice.selected && choice.input.is_empty();
        let style = if selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!(" {option} "), style)));
    }
    lines.push(Line::from(Span::styled(
        format!("{hint} • Enter apply • Esc cancel"),
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, options: &EditorOptions) {
    let area = centered_rect(70, 80, frame.size());
    frame.render_widget(Clear, area);
    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(
                format!("{keys:<22}"),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(what),
        ])
    };
    let lines = vec![
        entry("Tab / Shift-Tab", "switch between journal, task input and task list"),
        entry("Ctrl-d", "pick a date"),
        entry("Ctrl-s, Shift/Alt-Enter", "save the journal now"),
        entry("Ctrl-b / Alt-b", "bold"),
        entry("Alt-i", "italic"),
        entry("Ctrl-u / Alt-u", "underline"),
        entry("Alt-s", "strikethrough"),
        entry("Alt-h", "highlight the selection"),
        entry("Alt-l / Alt-n", "bullet / numbered list"),
        entry("Alt-c", "font colour"),
        entry("Alt-z", "font size"),
        entry("Alt-f", "font family"),
        entry("Shift-arrows", "extend the selection"),
        entry("Ctrl-a", "select all"),
        entry("Ctrl-z / Ctrl-y", "undo / redo"),
        entry("Enter (task input)", "add the task"),
        entry("d (task list)", "delete the selected task"),
        entry("Ctrl-q", "save and quit"),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Journal auto-saves after a pause. Default size {}pt.",
                options.default_font_size
            ),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::editor::FormatCommand;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn wraps_long_blocks_and_tracks_cursor() {
        let mut editor = JournalEditor::new(Document::plain("abcdefgh"));
        editor.move_end(false);
        let layout = layout_document(&editor, 5);
        let rows: Vec<_> = layout.lines.iter().map(line_text).collect();
        assert_eq!(rows, vec!["abcde", "fgh"]);
        assert_eq!(layout.cursor, Some((1, 3)));
    }

    #[test]
    fn calendar_days_sit_under_their_weekday() {
        // March 2024 starts on a Friday.
        let cursor = time::macros::date!(2024 - 03 - 15);
        let rows: Vec<_> = calendar_rows(cursor, cursor, cursor)
            .iter()
            .map(|line| line_text(line).trim_end().to_owned())
            .collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], format!("{} 1  2  3", " ".repeat(12)));
        assert_eq!(rows[1], " 4  5  6  7  8  9 10");
        assert_eq!(rows[4], "25 26 27 28 29 30 31");
    }

    #[test]
    fn list_items_get_markers() {
        let mut editor = JournalEditor::new(Document::plain("one\ntwo"));
        editor.select_all();
        editor.apply(FormatCommand::ToggleNumberList);
        let layout = layout_document(&editor, 40);
        let rows: Vec<_> = layout.lines.iter().map(line_text).collect();
        assert_eq!(rows, vec!["1. one", "2. two"]);
    }

    #[test]
    fn selection_is_reversed() {
        let mut editor = JournalEditor::new(Document::plain("hello"));
        editor.select(Position::new(0, 0), Position::new(0, 2));
        let layout = layout_document(&editor, 40);
        let first = &layout.lines[0].spans[0];
        assert_eq!(first.content.as_ref(), "he");
        assert!(first.style.add_modifier.contains(Modifier::REVERSED));
    }
}
