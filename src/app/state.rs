use strum::IntoEnumIterator;
use time::{Date, OffsetDateTime};

use crate::date::{shift_days, shift_months, today};
use crate::document::{NamedColor, Rgb};
use crate::editor::JournalEditor;
use crate::journaling::AutoSaveStatus;
use crate::todo::TodoList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Journal,
    TaskInput,
    TaskList,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Journal => FocusPane::TaskInput,
            FocusPane::TaskInput => FocusPane::TaskList,
            FocusPane::TaskList => FocusPane::Journal,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FocusPane::Journal => FocusPane::TaskList,
            FocusPane::TaskInput => FocusPane::Journal,
            FocusPane::TaskList => FocusPane::TaskInput,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePickerOverlay {
    pub cursor: Date,
}

impl DatePickerOverlay {
    pub fn shift_days(&mut self, days: i64) {
        self.cursor = shift_days(self.cursor, days);
    }

    pub fn shift_months(&mut self, months: i32) {
        self.cursor = shift_months(self.cursor, months);
    }

    pub fn jump_to_today(&mut self) {
        self.cursor = today();
    }
}

/// Swatch list plus a free-form hex field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPickerOverlay {
    pub swatches: Vec<NamedColor>,
    pub selected: usize,
    pub hex_input: String,
}

impl ColorPickerOverlay {
    pub fn new(initial: Rgb) -> Self {
        let swatches: Vec<NamedColor> = NamedColor::iter().collect();
        let selected = swatches
            .iter()
            .position(|swatch| swatch.rgb() == initial)
            .unwrap_or(0);
        Self {
            swatches,
            selected,
            hex_input: String::new(),
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let last = self.swatches.len().saturating_sub(1) as isize;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    /// Typed hex wins over the highlighted swatch. `None` when the typed
    /// value is not a colour.
    pub fn chosen(&self) -> Option<Rgb> {
        if self.hex_input.trim().is_empty() {
            self.swatches.get(self.selected).map(|swatch| swatch.rgb())
        } else {
            let raw = self.hex_input.trim();
            if raw.starts_with('#') {
                Rgb::parse_hex(raw)
            } else {
                Rgb::parse_hex(&format!("#{raw}"))
            }
        }
    }
}

/// Editable combo box: pick from `options` or type a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOverlay {
    pub options: Vec<String>,
    pub selected: usize,
    pub input: String,
}

impl ChoiceOverlay {
    pub fn new(options: Vec<String>, current: Option<&str>) -> Self {
        let selected = current
            .and_then(|value| options.iter().position(|option| option == value))
            .unwrap_or(0);
        Self {
            options,
            selected,
            input: String::new(),
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let last = self.options.len().saturating_sub(1) as isize;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
        self.input.clear();
    }

    pub fn value(&self) -> Option<String> {
        if self.input.is_empty() {
            self.options.get(self.selected).cloned()
        } else {
            Some(self.input.clone())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayState {
    DatePicker(DatePickerOverlay),
    FontColor(ColorPickerOverlay),
    FontSize(ChoiceOverlay),
    FontFamily(ChoiceOverlay),
    Help,
}

pub struct AppState {
    selected_date: Date,
    pub editor: JournalEditor,
    pub todos: TodoList,
    pub focus: FocusPane,
    overlay: Option<OverlayState>,
    status_message: Option<String>,
    autosave_status: AutoSaveStatus,
    last_saved_at: Option<OffsetDateTime>,
}

impl AppState {
    pub fn new(date: Date) -> Self {
        Self {
            selected_date: date,
            editor: JournalEditor::default(),
            todos: TodoList::new(date),
            focus: FocusPane::Journal,
            overlay: None,
            status_message: None,
            autosave_status: AutoSaveStatus::Inactive,
            last_saved_at: None,
        }
    }

    pub fn selected_date(&self) -> Date {
        self.selected_date
    }

    pub(crate) fn set_selected_date(&mut self, date: Date) {
        self.selected_date = date;
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        self.focus = if forward {
            self.focus.next()
        } else {
            self.focus.previous()
        };
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn autosave_status(&self) -> &AutoSaveStatus {
        &self.autosave_status
    }

    pub fn set_autosave_status(&mut self, status: AutoSaveStatus) {
        self.autosave_status = status;
    }

    pub fn last_saved_at(&self) -> Option<OffsetDateTime> {
        self.last_saved_at
    }

    pub fn on_saved(&mut self, timestamp: OffsetDateTime) {
        self.last_saved_at = Some(timestamp);
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn overlay_mut(&mut self) -> Option<&mut OverlayState> {
        self.overlay.as_mut()
    }

    pub fn open_overlay(&mut self, overlay: OverlayState) {
        self.overlay = Some(overlay);
    }

    pub fn close_overlay(&mut self) -> Option<OverlayState> {
        self.overlay.take()
    }

    pub fn open_date_picker(&mut self) {
        self.overlay = Some(OverlayState::DatePicker(DatePickerOverlay {
            cursor: self.selected_date,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DEFAULT_TEXT_COLOR;
    use time::macros::date;

    #[test]
    fn focus_cycles_through_panes() {
        let mut state = AppState::new(date!(2024 - 01 - 01));
        state.cycle_focus(true);
        assert_eq!(state.focus, FocusPane::TaskInput);
        state.cycle_focus(true);
        state.cycle_focus(true);
        assert_eq!(state.focus, FocusPane::Journal);
        state.cycle_focus(false);
        assert_eq!(state.focus, FocusPane::TaskList);
    }

    #[test]
    fn color_picker_starts_on_default_text_colour() {
        let picker = ColorPickerOverlay::new(DEFAULT_TEXT_COLOR);
        assert_eq!(picker.chosen(), Some(DEFAULT_TEXT_COLOR));
    }

    #[test]
    fn typed_hex_overrides_swatch() {
        let mut picker = ColorPickerOverlay::new(DEFAULT_TEXT_COLOR);
        picker.hex_input = "ff0000".into();
        assert_eq!(picker.chosen(), Some(Rgb::new(0xff, 0, 0)));
        picker.hex_input = "#nothex".into();
        assert_eq!(picker.chosen(), None);
    }

    #[test]
    fn choice_prefers_typed_value() {
        let mut choice = ChoiceOverlay::new(vec!["12".into(), "14".into()], Some("14"));
        assert_eq!(choice.value().as_deref(), Some("14"));
        choice.input = "22".into();
        assert_eq!(choice.value().as_deref(), Some("22"));
        choice.move_selection(-1);
        assert_eq!(choice.value().as_deref(), Some("12"));
    }

    #[test]
    fn date_picker_navigation() {
        let mut picker = DatePickerOverlay {
            cursor: date!(2024 - 01 - 31),
        };
        picker.shift_days(7);
        assert_eq!(picker.cursor, date!(2024 - 02 - 07));
        picker.shift_months(-2);
        assert_eq!(picker.cursor, date!(2023 - 12 - 07));
    }
}
