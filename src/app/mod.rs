use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use time::Date;

use crate::config::AppConfig;
use crate::date::{format_day, today};
use crate::document::{Document, DEFAULT_TEXT_COLOR};
use crate::editor::{FormatCommand, JournalEditor};
use crate::journaling::{AutoSaveEvent, AutoSaveRuntime, AutoSaveStatus};
use crate::storage::{FileStore, JournalStore};
use crate::ui;

pub mod state;

pub use state::{
    AppState, ChoiceOverlay, ColorPickerOverlay, DatePickerOverlay, FocusPane, OverlayState,
};

const MAX_TASK_INPUT: usize = 500;

enum Action {
    Quit,
    ManualSave,
    OpenDatePicker,
    NextFocus,
    PreviousFocus,
    ShowHelp,
    Format(FormatCommand),
    OpenFontColor,
    OpenFontSize,
    OpenFontFamily,
}

pub struct App {
    pub config: Arc<AppConfig>,
    pub store: FileStore,
    state: AppState,
    should_quit: bool,
    tick_rate: Duration,
    auto_save: AutoSaveRuntime,
}

impl App {
    pub fn new(config: Arc<AppConfig>, store: FileStore) -> Self {
        Self::with_date(config, store, today())
    }

    /// Builds the app with `date` selected and both panes loaded.
    pub fn with_date(config: Arc<AppConfig>, store: FileStore, date: Date) -> Self {
        let auto_save = AutoSaveRuntime::new(&config.auto_save);
        let mut app = Self {
            tick_rate: config.tick_rate(),
            state: AppState::new(date),
            config,
            store,
            should_quit: false,
            auto_save,
        };
        app.select_date(date);
        app
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        self.quit();
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn editor(&self) -> &JournalEditor {
        &self.state.editor
    }

    pub fn autosave_status(&self) -> AutoSaveStatus {
        self.auto_save.status()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, &self.state, &self.config.editor))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    /// Changes the selected date, then reloads the journal and the task list
    /// in that order. A pending save for `date` is written first so the
    /// reload sees it; text whose save keeps failing is shown instead of the
    /// stale file.
    pub fn select_date(&mut self, date: Date) {
        if let Some(event) = self.auto_save.flush_date(&self.store, date) {
            self.handle_autosave_event(event);
        }
        self.state.set_selected_date(date);
        let label = format_day(date);
        let mut problems = Vec::new();

        let loaded = match self.auto_save.unsaved_snapshot(date) {
            Some(unsaved) => {
                tracing::warn!(date = %label, "journal save still failing, showing unsaved text");
                problems.push("journal: edits not saved yet".to_owned());
                Ok(unsaved.clone())
            }
            None => self.store.load_journal(date),
        };
        match loaded {
            Ok(document) => self.state.editor.load(document),
            Err(err) => {
                tracing::warn!(?err, date = %label, "loading journal failed, starting empty");
                self.state.editor.load(Document::new());
                problems.push(format!("journal: {err}"));
            }
        }
        if let Err(err) = self.state.todos.reload(&self.store, date) {
            tracing::warn!(?err, date = %label, "loading tasks failed, starting empty");
            problems.push(format!("tasks: {err}"));
        }

        tracing::info!(date = %label, "selected date");
        if problems.is_empty() {
            self.state.set_status_message(Some(format!("Showing {label}")));
        } else {
            self.state.set_status_message(Some(format!(
                "Loaded {label} with problems: {}",
                problems.join("; ")
            )));
        }
        self.state.set_autosave_status(self.auto_save.status());
    }

    pub fn apply_format(&mut self, command: FormatCommand) {
        let needs_selection =
            command == FormatCommand::ToggleHighlight && !self.state.editor.has_selection();
        let outcome = self.state.editor.apply(command);
        if needs_selection {
            self.state
                .set_status_message(Some("Select some text to highlight"));
        }
        if outcome.document_changed {
            self.on_journal_changed();
        }
    }

    /// Flushes the journal immediately.
    pub fn save_journal_now(&mut self) {
        let date = self.state.selected_date();
        let events = self
            .auto_save
            .save_now(&self.store, date, self.state.editor.document());
        let saved = events
            .iter()
            .any(|event| matches!(event, AutoSaveEvent::Saved { date: d, .. } if *d == date));
        for event in events {
            self.handle_autosave_event(event);
        }
        if saved {
            self.state.set_status_message(Some("Journal saved"));
        }
    }

    pub fn add_task(&mut self, text: &str) {
        match self.state.todos.add(&self.store, text) {
            Ok(Some(task)) => {
                self.state
                    .set_status_message(Some(format!("Added task: {task}")));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(?err, "failed to save tasks");
                self.state
                    .set_status_message(Some(format!("Could not save tasks: {err}")));
            }
        }
    }

    pub fn submit_task_input(&mut self) {
        let text = self.state.todos.input().to_string();
        self.add_task(&text);
    }

    pub fn remove_task(&mut self, index: usize) {
        match self.state.todos.remove(&self.store, index) {
            Ok(Some(task)) => {
                self.state
                    .set_status_message(Some(format!("Removed task: {task}")));
            }
            Ok(None) => {
                self.state.set_status_message(Some("No task selected"));
            }
            Err(err) => {
                tracing::error!(?err, "failed to save tasks");
                self.state
                    .set_status_message(Some(format!("Could not save tasks: {err}")));
            }
        }
    }

    pub fn on_tick(&mut self) {
        self.on_tick_at(Instant::now());
    }

    pub fn on_tick_at(&mut self, now: Instant) {
        if let Some(event) = self.auto_save.poll_at(&self.store, now) {
            self.handle_autosave_event(event);
        }
        self.state.set_autosave_status(self.auto_save.status());
    }

    /// Stops the loop after writing any pending journal save.
    pub fn quit(&mut self) {
        for event in self.auto_save.flush_now(&self.store) {
            self.handle_autosave_event(event);
        }
        self.should_quit = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        if let Some(action) = global_action(key) {
            self.handle_action(action);
            return;
        }

        match self.state.focus {
            FocusPane::Journal => self.handle_journal_key(key),
            FocusPane::TaskInput => self.handle_task_input_key(key),
            FocusPane::TaskList => self.handle_task_list_key(key),
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit(),
            Action::ManualSave => self.save_journal_now(),
            Action::OpenDatePicker => {
                self.state.open_date_picker();
                self.state.set_status_message(Some(
                    "Arrows day/week • PgUp/PgDn month • t today • Enter select • Esc cancel",
                ));
            }
            Action::NextFocus => self.state.cycle_focus(true),
            Action::PreviousFocus => self.state.cycle_focus(false),
            Action::ShowHelp => self.state.open_overlay(OverlayState::Help),
            Action::Format(command) => self.apply_format(command),
            Action::OpenFontColor => {
                let initial = self
                    .state
                    .editor
                    .current_format()
                    .foreground
                    .unwrap_or(DEFAULT_TEXT_COLOR);
                self.state
                    .open_overlay(OverlayState::FontColor(ColorPickerOverlay::new(initial)));
            }
            Action::OpenFontSize => {
                let options = self
                    .config
                    .editor
                    .font_sizes
                    .iter()
                    .map(u16::to_string)
                    .collect();
                let current = self
                    .state
                    .editor
                    .current_format()
                    .font_size
                    .unwrap_or(self.config.editor.default_font_size)
                    .to_string();
                self.state.open_overlay(OverlayState::FontSize(ChoiceOverlay::new(
                    options,
                    Some(&current),
                )));
            }
            Action::OpenFontFamily => {
                let current = self.state.editor.current_format().font_family;
                self.state
                    .open_overlay(OverlayState::FontFamily(ChoiceOverlay::new(
                        self.config.editor.font_families.clone(),
                        current.as_deref(),
                    )));
            }
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        let Some(overlay) = self.state.overlay_mut() else {
            return false;
        };
        match overlay {
            OverlayState::Help => {
                self.state.close_overlay();
            }
            OverlayState::DatePicker(picker) => match key.code {
                KeyCode::Esc => {
                    self.state.close_overlay();
                    self.state.set_status_message(Some("Date unchanged"));
                }
                KeyCode::Enter => {
                    let date = picker.cursor;
                    self.state.close_overlay();
                    self.select_date(date);
                }
                KeyCode::Left | KeyCode::Char('h') => picker.shift_days(-1),
                KeyCode::Right | KeyCode::Char('l') => picker.shift_days(1),
                KeyCode::Up | KeyCode::Char('k') => picker.shift_days(-7),
                KeyCode::Down | KeyCode::Char('j') => picker.shift_days(7),
                KeyCode::PageUp => picker.shift_months(-1),
                KeyCode::PageDown => picker.shift_months(1),
                KeyCode::Char('t') => picker.jump_to_today(),
                _ => {}
            },
            OverlayState::FontColor(picker) => match key.code {
                KeyCode::Esc => {
                    self.state.close_overlay();
                    self.apply_format(FormatCommand::FontColor(None));
                }
                KeyCode::Enter => match picker.chosen() {
                    Some(color) => {
                        self.state.close_overlay();
                        self.apply_format(FormatCommand::FontColor(Some(color)));
                    }
                    None => {
                        self.state
                            .set_status_message(Some("Not a colour; use #rrggbb"));
                    }
                },
                KeyCode::Up => picker.move_selection(-1),
                KeyCode::Down => picker.move_selection(1),
                KeyCode::Backspace => {
                    picker.hex_input.pop();
                }
                KeyCode::Char(ch) if plain && (ch == '#' || ch.is_ascii_hexdigit()) => {
                    if picker.hex_input.len() < 7 {
                        picker.hex_input.push(ch);
                    }
                }
                _ => {}
            },
            OverlayState::FontSize(choice) | OverlayState::FontFamily(choice) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.close_overlay();
                    }
                    KeyCode::Enter => {
                        let value = choice.value();
                        if let Some(OverlayState::FontSize(_)) = self.state.close_overlay() {
                            if let Some(raw) = value {
                                self.apply_format(FormatCommand::FontSize(raw));
                            }
                        } else if let Some(family) = value {
                            self.apply_format(FormatCommand::FontFamily(family));
                        }
                    }
                    KeyCode::Up => choice.move_selection(-1),
                    KeyCode::Down => choice.move_selection(1),
                    KeyCode::Backspace => {
                        choice.input.pop();
                    }
                    KeyCode::Char(ch) if plain => {
                        if choice.input.len() < 64 {
                            choice.input.push(ch);
                        }
                    }
                    _ => {}
                }
            }
        }
        true
    }

    fn handle_journal_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        if ctrl {
            match key.code {
                KeyCode::Char('z') => {
                    if self.apply_editor_change(JournalEditor::undo) {
                        self.state.set_status_message(Some("Undid change"));
                    } else {
                        self.state.set_status_message(Some("Nothing to undo"));
                    }
                }
                KeyCode::Char('y') => {
                    if self.apply_editor_change(JournalEditor::redo) {
                        self.state.set_status_message(Some("Redid change"));
                    } else {
                        self.state.set_status_message(Some("Nothing to redo"));
                    }
                }
                KeyCode::Char('a') => self.state.editor.select_all(),
                KeyCode::Left => {
                    self.state.editor.move_word_left(shift);
                }
                KeyCode::Right => {
                    self.state.editor.move_word_right(shift);
                }
                KeyCode::Home => {
                    self.state.editor.set_cursor(Default::default(), shift);
                }
                KeyCode::End => {
                    let end = self.state.editor.document().end();
                    self.state.editor.set_cursor(end, shift);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Enter if shift || alt => self.save_journal_now(),
            KeyCode::Enter => {
                self.apply_editor_change(JournalEditor::insert_newline);
            }
            KeyCode::Backspace => {
                self.apply_editor_change(JournalEditor::backspace);
            }
            KeyCode::Delete => {
                self.apply_editor_change(JournalEditor::delete);
            }
            KeyCode::Esc => self.state.editor.clear_selection(),
            KeyCode::Char(ch) if !alt && !key.modifiers.contains(KeyModifiers::SUPER) => {
                self.apply_editor_change(|editor| editor.insert_char(ch));
            }
            KeyCode::Left => {
                self.state.editor.move_left(shift);
            }
            KeyCode::Right => {
                self.state.editor.move_right(shift);
            }
            KeyCode::Up => {
                self.state.editor.move_up(shift);
            }
            KeyCode::Down => {
                self.state.editor.move_down(shift);
            }
            KeyCode::Home => {
                self.state.editor.move_home(shift);
            }
            KeyCode::End => {
                self.state.editor.move_end(shift);
            }
            _ => {}
        }
    }

    fn handle_task_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_task_input(),
            KeyCode::Backspace => self.state.todos.pop_input_char(),
            KeyCode::Esc => self.state.todos.set_input(""),
            KeyCode::Down => self.state.focus = FocusPane::TaskList,
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                if self.state.todos.input().len() < MAX_TASK_INPUT {
                    self.state.todos.push_input_char(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_task_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.state.todos.selected() == Some(0) || self.state.todos.tasks().is_empty() {
                    self.state.focus = FocusPane::TaskInput;
                } else {
                    self.state.todos.move_selection(-1);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.state.todos.move_selection(1),
            KeyCode::Delete | KeyCode::Char('d') | KeyCode::Char('x') => {
                match self.state.todos.selected() {
                    Some(index) => self.remove_task(index),
                    None => self.state.set_status_message(Some("No task selected")),
                }
            }
            KeyCode::Char('a') | KeyCode::Char('i') => self.state.focus = FocusPane::TaskInput,
            _ => {}
        }
    }

    fn apply_editor_change<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut JournalEditor) -> bool,
    {
        let changed = f(&mut self.state.editor);
        if changed {
            self.on_journal_changed();
        }
        changed
    }

    /// Re-arms the debounced save with the current document and date.
    fn on_journal_changed(&mut self) {
        let date = self.state.selected_date();
        if let Some(event) = self
            .auto_save
            .arm(&self.store, date, self.state.editor.document())
        {
            self.handle_autosave_event(event);
        }
        self.state.set_autosave_status(self.auto_save.status());
    }

    fn handle_autosave_event(&mut self, event: AutoSaveEvent) {
        match event {
            AutoSaveEvent::Saved { date, timestamp } => {
                tracing::debug!(date = %format_day(date), "journal saved");
                self.state.on_saved(timestamp);
            }
            AutoSaveEvent::Error { date, message } => {
                tracing::warn!(date = %format_day(date), %message, "autosave error");
                self.state.set_status_message(Some(format!(
                    "Could not save journal for {}: {message}",
                    format_day(date)
                )));
            }
        }
        self.state.set_autosave_status(self.auto_save.status());
    }
}

fn global_action(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('s') if ctrl => Action::ManualSave,
        KeyCode::Char('d') if ctrl => Action::OpenDatePicker,
        KeyCode::Char('b') if ctrl || alt => Action::Format(FormatCommand::ToggleBold),
        KeyCode::Char('u') if ctrl || alt => Action::Format(FormatCommand::ToggleUnderline),
        KeyCode::Char('i') if alt => Action::Format(FormatCommand::ToggleItalic),
        KeyCode::Char('s') if alt => Action::Format(FormatCommand::ToggleStrike),
        KeyCode::Char('h') if alt => Action::Format(FormatCommand::ToggleHighlight),
        KeyCode::Char('l') if alt => Action::Format(FormatCommand::ToggleBulletList),
        KeyCode::Char('n') if alt => Action::Format(FormatCommand::ToggleNumberList),
        KeyCode::Char('c') if alt => Action::OpenFontColor,
        KeyCode::Char('z') if alt => Action::OpenFontSize,
        KeyCode::Char('f') if alt => Action::OpenFontFamily,
        KeyCode::Tab => Action::NextFocus,
        KeyCode::BackTab => Action::PreviousFocus,
        KeyCode::F(1) => Action::ShowHelp,
        _ => return None,
    };
    Some(action)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoSaveConfig;
    use crate::document::{CharFormat, HIGHLIGHT_COLOR};
    use crate::storage::TaskStore;
    use crate::todo::Task;
    use assert_matches::assert_matches;
    use tempfile::TempDir;
    use time::macros::date;

    fn app_at(temp: &TempDir, date: Date) -> App {
        let config = Arc::new(AppConfig {
            auto_save: AutoSaveConfig {
                enabled: true,
                debounce_ms: 1000,
            },
            ..AppConfig::default()
        });
        App::with_date(config, FileStore::new(temp.path()), date)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn press_with(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_key(KeyEvent::new(code, modifiers));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn typed_journal_survives_reload_after_idle() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let day = date!(2024 - 01 - 01);
        let mut app = app_at(&temp, day);
        assert!(app.editor().document().is_empty());

        type_text(&mut app, "Hello");
        assert_matches!(app.autosave_status(), AutoSaveStatus::Pending { .. });
        app.on_tick_at(Instant::now() + Duration::from_millis(1100));
        assert_matches!(app.autosave_status(), AutoSaveStatus::Idle { .. });

        let reloaded = app_at(&temp, day);
        let document = reloaded.editor().document();
        assert_eq!(document.plain_text(), "Hello");
        assert_eq!(document.blocks()[0].runs()[0].format, CharFormat::default());
        Ok(())
    }

    #[test]
    fn switching_dates_does_not_touch_unedited_journal() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let a = date!(2024 - 01 - 01);
        let b = date!(2024 - 01 - 02);
        let mut app = app_at(&temp, a);
        type_text(&mut app, "entry for a");
        app.save_journal_now();
        let path = app.store.journal_path(a);
        let before = std::fs::read(&path)?;

        app.select_date(b);
        app.on_tick_at(Instant::now() + Duration::from_secs(5));
        app.select_date(a);
        app.on_tick_at(Instant::now() + Duration::from_secs(5));

        assert_eq!(std::fs::read(&path)?, before);
        assert!(!app.store.journal_path(b).exists());
        assert_eq!(app.editor().document().plain_text(), "entry for a");
        Ok(())
    }

    #[test]
    fn pending_edit_is_saved_under_its_own_date() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let a = date!(2024 - 02 - 10);
        let b = date!(2024 - 02 - 11);
        let mut app = app_at(&temp, a);
        type_text(&mut app, "written on a");

        app.select_date(b);
        app.on_tick_at(Instant::now() + Duration::from_secs(2));

        assert_eq!(app.store.load_journal(a)?.plain_text(), "written on a");
        assert!(!app.store.journal_path(b).exists());
        assert!(app.editor().document().is_empty());
        Ok(())
    }

    #[test]
    fn unsaved_text_returns_when_its_save_keeps_failing() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let a = date!(2024 - 02 - 20);
        let b = date!(2024 - 02 - 21);
        let mut app = app_at(&temp, b);
        // A plain file where the day directory belongs makes every write fail.
        std::fs::write(app.store.day_dir(a), "not a directory")?;

        app.select_date(a);
        type_text(&mut app, "kept");
        app.on_tick_at(Instant::now() + Duration::from_millis(1100));
        assert_matches!(app.autosave_status(), AutoSaveStatus::Error { date, .. } if date == a);

        app.select_date(b);
        type_text(&mut app, "other day");
        app.select_date(a);
        assert_eq!(app.editor().document().plain_text(), "kept");
        assert!(app
            .state()
            .status_message()
            .is_some_and(|message| message.contains("not saved")));
        Ok(())
    }

    #[test]
    fn reselecting_a_date_flushes_its_pending_save_first() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let day = date!(2024 - 02 - 12);
        let mut app = app_at(&temp, day);
        type_text(&mut app, "draft");
        app.select_date(day);
        assert_eq!(app.editor().document().plain_text(), "draft");
        Ok(())
    }

    #[test]
    fn task_scenario_add_then_remove() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let day = date!(2024 - 03 - 01);
        let mut app = app_at(&temp, day);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state().focus, FocusPane::TaskInput);

        type_text(&mut app, "Buy milk");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "Walk dog");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state().todos.input(), "");

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Char('d'));

        let reloaded = app_at(&temp, day);
        let tasks: Vec<_> = reloaded.state().todos.tasks().iter().map(Task::text).collect();
        assert_eq!(tasks, vec!["Walk dog"]);
        Ok(())
    }

    #[test]
    fn blank_task_input_is_ignored() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let day = date!(2024 - 03 - 02);
        let mut app = app_at(&temp, day);
        app.add_task("");
        app.add_task("   ");
        assert!(app.state().todos.tasks().is_empty());
        assert!(app.store.load_tasks(day)?.is_empty());
        Ok(())
    }

    #[test]
    fn shift_enter_saves_the_journal() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let day = date!(2024 - 03 - 03);
        let mut app = app_at(&temp, day);
        type_text(&mut app, "saved now");
        press_with(&mut app, KeyCode::Enter, KeyModifiers::SHIFT);
        assert_eq!(app.store.load_journal(day)?.plain_text(), "saved now");
        assert_eq!(app.editor().document().block_count(), 1);
        Ok(())
    }

    #[test]
    fn highlight_shortcut_needs_a_selection() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = app_at(&temp, date!(2024 - 03 - 04));
        type_text(&mut app, "mark");
        press_with(&mut app, KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(app.state().status_message(), Some("Select some text to highlight"));

        press_with(&mut app, KeyCode::Char('a'), KeyModifiers::CONTROL);
        press_with(&mut app, KeyCode::Char('h'), KeyModifiers::ALT);
        let runs = app.editor().document().blocks()[0].runs();
        assert_eq!(runs[0].format.background, Some(HIGHLIGHT_COLOR));
        Ok(())
    }

    #[test]
    fn date_picker_enter_reloads_both_panes() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let start = date!(2024 - 04 - 10);
        let mut app = app_at(&temp, start);
        app.add_task("tomorrow's task");
        let store = app.store.clone();
        let next = date!(2024 - 04 - 11);
        let tasks: crate::todo::TaskList = Task::new("on the 11th").into_iter().collect();
        store.save_tasks(next, &tasks)?;

        press_with(&mut app, KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_matches!(app.state().overlay(), Some(OverlayState::DatePicker(_)));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state().selected_date(), next);
        assert!(app.state().overlay().is_none());
        let texts: Vec<_> = app.state().todos.tasks().iter().map(Task::text).collect();
        assert_eq!(texts, vec!["on the 11th"]);
        Ok(())
    }

    #[test]
    fn font_size_overlay_applies_typed_size() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = app_at(&temp, date!(2024 - 04 - 12));
        press_with(&mut app, KeyCode::Char('z'), KeyModifiers::ALT);
        assert_matches!(app.state().overlay(), Some(OverlayState::FontSize(_)));
        type_text(&mut app, "22");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.editor().current_format().font_size, Some(22));

        press_with(&mut app, KeyCode::Char('z'), KeyModifiers::ALT);
        type_text(&mut app, "big");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.editor().current_format().font_size, Some(22));
        Ok(())
    }

    #[test]
    fn quit_flushes_pending_save() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let day = date!(2024 - 05 - 01);
        let mut app = app_at(&temp, day);
        type_text(&mut app, "last words");
        press_with(&mut app, KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit());
        assert_eq!(app.store.load_journal(day)?.plain_text(), "last words");
        Ok(())
    }

    #[test]
    fn malformed_journal_loads_empty_with_notice() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let day = date!(2024 - 05 - 02);
        let store = FileStore::new(temp.path());
        std::fs::create_dir_all(store.day_dir(day))?;
        std::fs::write(store.journal_path(day), "<p>oops <b")?;

        let app = app_at(&temp, day);
        assert!(app.editor().document().is_empty());
        let message = app.state().status_message().unwrap_or_default();
        assert!(message.contains("problems"), "unexpected status: {message}");
        Ok(())
    }
}
