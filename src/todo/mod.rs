use std::fmt;

use serde::Serialize;
use time::Date;

use crate::storage::{StoreError, TaskStore};

/// A single to-do item: trimmed, non-empty, one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Task(String);

impl Task {
    /// Line breaks inside `text` collapse to single spaces so a task always
    /// occupies exactly one line of the tasks file.
    pub fn new(text: &str) -> Option<Self> {
        let normalized = text
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the tasks file format: one task per line, blank lines skipped.
    pub fn parse(contents: &str) -> Self {
        let tasks = contents.lines().filter_map(Task::new).collect();
        Self { tasks }
    }

    /// Tasks joined by `\n` without a trailing newline.
    pub fn to_file_contents(&self) -> String {
        self.tasks
            .iter()
            .map(Task::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn remove(&mut self, index: usize) -> Option<Task> {
        if index < self.tasks.len() {
            Some(self.tasks.remove(index))
        } else {
            None
        }
    }
}

impl FromIterator<Task> for TaskList {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

/// The to-do pane: the selected day's tasks, the input field and the list
/// selection. Every mutation rewrites the whole list to the store.
#[derive(Debug, Clone)]
pub struct TodoList {
    date: Date,
    tasks: TaskList,
    input: String,
    selected: usize,
}

impl TodoList {
    pub fn new(date: Date) -> Self {
        Self {
            date,
            tasks: TaskList::new(),
            input: String::new(),
            selected: 0,
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn selected(&self) -> Option<usize> {
        if self.tasks.is_empty() {
            None
        } else {
            Some(self.selected.min(self.tasks.len() - 1))
        }
    }

    pub fn push_input_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn pop_input_char(&mut self) {
        self.input.pop();
    }

    pub fn set_input(&mut self, text: &str) {
        self.input.clear();
        self.input.push_str(text);
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.tasks.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.tasks.len() as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, last);
        self.selected = next as usize;
    }

    /// Adds the current input as a task.
    pub fn submit<S>(&mut self, store: &S) -> Result<Option<Task>, StoreError>
    where
        S: TaskStore + ?Sized,
    {
        let text = self.input.clone();
        self.add(store, &text)
    }

    /// Appends `text` as a task, clears the input and persists the list.
    /// Blank text is ignored. On a store failure the task stays in memory.
    pub fn add<S>(&mut self, store: &S, text: &str) -> Result<Option<Task>, StoreError>
    where
        S: TaskStore + ?Sized,
    {
        let Some(task) = Task::new(text) else {
            return Ok(None);
        };
        self.tasks.push(task.clone());
        self.input.clear();
        self.selected = self.tasks.len() - 1;
        store.save_tasks(self.date, &self.tasks)?;
        Ok(Some(task))
    }

    pub fn remove<S>(&mut self, store: &S, index: usize) -> Result<Option<Task>, StoreError>
    where
        S: TaskStore + ?Sized,
    {
        let Some(task) = self.tasks.remove(index) else {
            return Ok(None);
        };
        if self.selected >= self.tasks.len() {
            self.selected = self.tasks.len().saturating_sub(1);
        }
        store.save_tasks(self.date, &self.tasks)?;
        Ok(Some(task))
    }

    pub fn remove_selected<S>(&mut self, store: &S) -> Result<Option<Task>, StoreError>
    where
        S: TaskStore + ?Sized,
    {
        match self.selected() {
            Some(index) => self.remove(store, index),
            None => Ok(None),
        }
    }

    /// Switches to `date` and loads its tasks. The list is left empty when
    /// loading fails.
    pub fn reload<S>(&mut self, store: &S, date: Date) -> Result<(), StoreError>
    where
        S: TaskStore + ?Sized,
    {
        self.date = date;
        self.tasks = TaskList::new();
        self.selected = 0;
        self.tasks = store.load_tasks(date)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;
    use tempfile::TempDir;
    use time::macros::date;

    #[test]
    fn task_text_is_trimmed_single_line() {
        assert_eq!(Task::new("  Buy milk \n").unwrap().text(), "Buy milk");
        assert_eq!(Task::new("call\r\n  mom").unwrap().text(), "call mom");
        assert!(Task::new("   ").is_none());
        assert!(Task::new("\n\n").is_none());
    }

    #[test]
    fn parse_skips_blank_lines() {
        let list = TaskList::parse("\n one \n\n two\r\n   \n");
        let texts: Vec<_> = list.iter().map(Task::text).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(list.to_file_contents(), "one\ntwo");
    }

    #[test]
    fn blank_input_never_changes_count() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let mut todos = TodoList::new(date!(2024 - 01 - 01));
        assert_eq!(todos.add(&store, "")?, None);
        assert_eq!(todos.add(&store, "   ")?, None);
        assert_eq!(todos.tasks().len(), 0);
        assert!(!store.tasks_path(todos.date()).exists());
        Ok(())
    }

    #[test]
    fn submit_clears_input_and_persists() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 03 - 10);
        let mut todos = TodoList::new(day);
        todos.set_input("Water plants");
        let added = todos.submit(&store)?;
        assert_eq!(added.as_ref().map(Task::text), Some("Water plants"));
        assert_eq!(todos.input(), "");
        assert_eq!(store.load_tasks(day)?.len(), 1);
        Ok(())
    }

    #[test]
    fn removed_task_is_not_resurrected_by_reload() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 01 - 01);
        let mut todos = TodoList::new(day);
        todos.add(&store, "Buy milk")?;
        todos.add(&store, "Walk dog")?;
        let removed = todos.remove(&store, 0)?;
        assert_eq!(removed.as_ref().map(Task::text), Some("Buy milk"));

        let mut fresh = TodoList::new(day);
        fresh.reload(&store, day)?;
        let texts: Vec<_> = fresh.tasks().iter().map(Task::text).collect();
        assert_eq!(texts, vec!["Walk dog"]);
        Ok(())
    }

    #[test]
    fn removing_every_task_leaves_an_empty_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 05 - 05);
        let mut todos = TodoList::new(day);
        todos.add(&store, "only")?;
        todos.remove_selected(&store)?;
        let path = store.tasks_path(day);
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(path)?, "");
        assert_eq!(todos.selected(), None);
        Ok(())
    }

    #[test]
    fn selection_is_clamped() {
        let mut todos = TodoList::new(date!(2024 - 01 - 01));
        todos.move_selection(3);
        assert_eq!(todos.selected(), None);
        todos.tasks.push(Task::new("a").unwrap());
        todos.tasks.push(Task::new("b").unwrap());
        todos.move_selection(5);
        assert_eq!(todos.selected(), Some(1));
        todos.move_selection(-9);
        assert_eq!(todos.selected(), Some(0));
    }
}
