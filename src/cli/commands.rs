use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use time::Date;

use crate::app::App;
use crate::date::{format_day, parse_day, today};
use crate::document::Document;
use crate::storage::{FileStore, JournalStore, StoreError, TaskStore};
use crate::todo::{Task, TaskList};

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Day to print as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_day)]
    pub date: Option<Date>,
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// Append a task; reads one task per line from stdin when no text is given
    Add(TaskAddArgs),
    /// List tasks with their 1-based numbers
    List(TaskListArgs),
    /// Remove a task by its 1-based number
    Remove(TaskRemoveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TaskAddArgs {
    /// Task text (words are joined with spaces)
    #[arg()]
    pub text: Vec<String>,
    /// Day to modify as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_day)]
    pub date: Option<Date>,
}

#[derive(Args, Debug, Clone)]
pub struct TaskListArgs {
    /// Day to list as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_day)]
    pub date: Option<Date>,
}

#[derive(Args, Debug, Clone)]
pub struct TaskRemoveArgs {
    /// Task number as shown by `task list`
    pub number: usize,
    /// Day to modify as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_day)]
    pub date: Option<Date>,
}

#[derive(Args, Debug, Clone)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Debug, Serialize)]
struct DayReport<'a> {
    date: String,
    journal: String,
    tasks: &'a TaskList,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn show_day(store: &FileStore, args: ShowArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(today);
    let output = render_show(store, date, args.json)?;
    print!("{output}");
    Ok(())
}

fn render_show(store: &FileStore, date: Date, json: bool) -> Result<String> {
    let document = load_journal_lenient(store, date)?;
    let tasks = store
        .load_tasks(date)
        .with_context(|| format!("loading tasks for {}", format_day(date)))?;
    if json {
        let report = DayReport {
            date: format_day(date),
            journal: journal_text(&document),
            tasks: &tasks,
        };
        let mut out = serde_json::to_string_pretty(&report).context("serialising day report")?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(format_day_report(date, &document, &tasks))
    }
}

/// A malformed journal is reported and printed as empty.
fn load_journal_lenient(store: &FileStore, date: Date) -> Result<Document> {
    match store.load_journal(date) {
        Ok(document) => Ok(document),
        Err(err @ StoreError::Malformed { .. }) => {
            tracing::warn!(?err, "journal file is malformed, showing it as empty");
            Ok(Document::new())
        }
        Err(err) => {
            Err(err).with_context(|| format!("loading journal for {}", format_day(date)))
        }
    }
}

fn journal_text(document: &Document) -> String {
    document
        .blocks()
        .iter()
        .enumerate()
        .map(|(index, block)| match document.list_marker(index) {
            Some(marker) => format!("{marker} {}", block.text()),
            None => block.text(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_day_report(date: Date, document: &Document, tasks: &TaskList) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "{} ({})", format_day(date), date.weekday());
    out.push('\n');
    let _ = writeln!(&mut out, "Journal");
    let _ = writeln!(&mut out, "-------");
    if document.is_empty() {
        let _ = writeln!(&mut out, "(empty)");
    } else {
        let _ = writeln!(&mut out, "{}", journal_text(document));
    }
    out.push('\n');
    let _ = writeln!(&mut out, "Tasks");
    let _ = writeln!(&mut out, "-----");
    if tasks.is_empty() {
        let _ = writeln!(&mut out, "(none)");
    }
    for (index, task) in tasks.iter().enumerate() {
        let _ = writeln!(&mut out, "{}. {task}", index + 1);
    }
    out
}

pub fn handle_task_command(store: &FileStore, args: TaskArgs) -> Result<()> {
    match args.command {
        TaskCommand::Add(args) => task_add(store, args),
        TaskCommand::List(args) => task_list(store, args),
        TaskCommand::Remove(args) => task_remove(store, args),
    }
}

fn task_add(store: &FileStore, args: TaskAddArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(today);
    let entries = if !args.text.is_empty() {
        vec![args.text.join(" ")]
    } else if let Some(piped) = read_stdin()? {
        piped.lines().map(str::to_owned).collect()
    } else {
        vec![prompt("Task")?]
    };
    let added = add_tasks(store, date, &entries)?;
    if added.is_empty() {
        bail!("task text cannot be empty");
    }
    for task in &added {
        println!("Added '{task}' to {}", format_day(date));
    }
    Ok(())
}

fn add_tasks(store: &FileStore, date: Date, entries: &[String]) -> Result<Vec<Task>> {
    let mut tasks = store
        .load_tasks(date)
        .with_context(|| format!("loading tasks for {}", format_day(date)))?;
    let added: Vec<Task> = entries.iter().filter_map(|entry| Task::new(entry)).collect();
    if added.is_empty() {
        return Ok(added);
    }
    for task in &added {
        tasks.push(task.clone());
    }
    store
        .save_tasks(date, &tasks)
        .with_context(|| format!("saving tasks for {}", format_day(date)))?;
    Ok(added)
}

fn task_list(store: &FileStore, args: TaskListArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(today);
    let tasks = store
        .load_tasks(date)
        .with_context(|| format!("loading tasks for {}", format_day(date)))?;
    print!("{}", format_task_list(date, &tasks));
    Ok(())
}

fn format_task_list(date: Date, tasks: &TaskList) -> String {
    if tasks.is_empty() {
        return format!("No tasks for {}.\n", format_day(date));
    }
    let mut out = String::new();
    for (index, task) in tasks.iter().enumerate() {
        let _ = writeln!(&mut out, "{:>3}. {task}", index + 1);
    }
    out
}

fn task_remove(store: &FileStore, args: TaskRemoveArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(today);
    let removed = remove_task(store, date, args.number)?;
    println!("Removed '{removed}' from {}", format_day(date));
    Ok(())
}

fn remove_task(store: &FileStore, date: Date, number: usize) -> Result<Task> {
    let mut tasks = store
        .load_tasks(date)
        .with_context(|| format!("loading tasks for {}", format_day(date)))?;
    let Some(removed) = number.checked_sub(1).and_then(|index| tasks.remove(index)) else {
        bail!(
            "no task #{number} on {} ({} task(s))",
            format_day(date),
            tasks.len()
        );
    };
    store
        .save_tasks(date, &tasks)
        .with_context(|| format!("saving tasks for {}", format_day(date)))?;
    Ok(removed)
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{FormatCommand, JournalEditor};
    use tempfile::TempDir;
    use time::macros::date;

    type TestResult<T = ()> = Result<T>;

    fn setup_store() -> TestResult<(TempDir, FileStore)> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().join("data"));
        Ok((temp, store))
    }

    #[test]
    fn show_prints_journal_and_numbered_tasks() -> TestResult {
        let (_temp, store) = setup_store()?;
        let day = date!(2024 - 01 - 01);
        let mut editor = JournalEditor::new(Document::plain("Morning pages\nmilk\neggs"));
        editor.select(
            crate::document::Position::new(1, 0),
            crate::document::Position::new(2, 4),
        );
        editor.apply(FormatCommand::ToggleBulletList);
        store.save_journal(day, editor.document())?;
        add_tasks(&store, day, &["Buy milk".into(), "Walk dog".into()])?;

        let output = render_show(&store, day, false)?;
        insta::assert_snapshot!(output, @r"
2024-01-01 (Monday)

Journal
-------
Morning pages
• milk
• eggs

Tasks
-----
1. Buy milk
2. Walk dog
");
        Ok(())
    }

    #[test]
    fn show_json_lists_tasks_as_strings() -> TestResult {
        let (_temp, store) = setup_store()?;
        let day = date!(2024 - 02 - 02);
        add_tasks(&store, day, &["Call mom".into()])?;
        let output = render_show(&store, day, true)?;
        let value: serde_json::Value = serde_json::from_str(&output)?;
        assert_eq!(value["date"], "2024-02-02");
        assert_eq!(value["journal"], "");
        assert_eq!(value["tasks"], serde_json::json!(["Call mom"]));
        Ok(())
    }

    #[test]
    fn show_tolerates_malformed_journal() -> TestResult {
        let (_temp, store) = setup_store()?;
        let day = date!(2024 - 02 - 03);
        std::fs::create_dir_all(store.day_dir(day))?;
        std::fs::write(store.journal_path(day), "<p>cut off <i")?;
        let output = render_show(&store, day, false)?;
        assert!(output.contains("(empty)"));
        Ok(())
    }

    #[test]
    fn add_skips_blank_entries() -> TestResult {
        let (_temp, store) = setup_store()?;
        let day = date!(2024 - 03 - 03);
        let added = add_tasks(&store, day, &["".into(), "  ".into(), "Read".into()])?;
        assert_eq!(added.len(), 1);
        assert_eq!(format_task_list(day, &store.load_tasks(day)?), "  1. Read\n");
        Ok(())
    }

    #[test]
    fn remove_uses_one_based_numbers() -> TestResult {
        let (_temp, store) = setup_store()?;
        let day = date!(2024 - 03 - 04);
        add_tasks(&store, day, &["first".into(), "second".into()])?;
        assert!(remove_task(&store, day, 0).is_err());
        assert!(remove_task(&store, day, 3).is_err());
        let removed = remove_task(&store, day, 1)?;
        assert_eq!(removed.text(), "first");
        let remaining: Vec<_> = store
            .load_tasks(day)?
            .iter()
            .map(|t| t.text().to_owned())
            .collect();
        assert_eq!(remaining, vec!["second"]);
        Ok(())
    }

    #[test]
    fn empty_day_lists_nothing() -> TestResult {
        let (_temp, store) = setup_store()?;
        let day = date!(2024 - 03 - 05);
        assert_eq!(
            format_task_list(day, &store.load_tasks(day)?),
            "No tasks for 2024-03-05.\n"
        );
        Ok(())
    }
}
