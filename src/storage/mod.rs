use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use time::Date;

use crate::config::StorageOptions;
use crate::date::format_day;
use crate::document::html::{from_html, to_html};
use crate::document::Document;
use crate::todo::TaskList;

const JOURNAL_FILE: &str = "journal.html";
const TASKS_FILE: &str = "tasks.txt";
const TMP_EXTENSION: &str = "tmp";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl StoreError {
    pub fn path(&self) -> &Path {
        match self {
            StoreError::Io { path, .. } | StoreError::Malformed { path, .. } => path,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, StoreError::Malformed { .. })
    }

    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Per-date persistence of journal documents. A date with no file loads as
/// an empty document.
pub trait JournalStore {
    fn load_journal(&self, date: Date) -> Result<Document, StoreError>;
    fn save_journal(&self, date: Date, document: &Document) -> Result<(), StoreError>;
}

/// Per-date persistence of task lists. A date with no file loads as an
/// empty list.
pub trait TaskStore {
    fn load_tasks(&self, date: Date) -> Result<TaskList, StoreError>;
    fn save_tasks(&self, date: Date, tasks: &TaskList) -> Result<(), StoreError>;
}

/// Flat-file store rooted at a data directory:
///
/// ```text
/// <root>/<YYYY-MM-DD>/journal.html
/// <root>/<YYYY-MM-DD>/tasks.txt
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
}

pub fn init(options: &StorageOptions) -> Result<FileStore> {
    let root = options.data_root.clone();
    fs::create_dir_all(&root)
        .with_context(|| format!("creating data directory {}", root.display()))?;
    tracing::debug!(root = %root.display(), "journal store ready");
    Ok(FileStore::new(root))
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn day_dir(&self, date: Date) -> PathBuf {
        self.root.join(format_day(date))
    }

    pub fn journal_path(&self, date: Date) -> PathBuf {
        self.day_dir(date).join(JOURNAL_FILE)
    }

    pub fn tasks_path(&self, date: Date) -> PathBuf {
        self.day_dir(date).join(TASKS_FILE)
    }

    fn ensure_day_dir(&self, date: Date) -> Result<PathBuf, StoreError> {
        let dir = self.day_dir(date);
        fs::create_dir_all(&dir).map_err(|err| StoreError::io(&dir, err))?;
        Ok(dir)
    }

    fn read_optional(&self, date: Date, path: &Path) -> Result<Option<String>, StoreError> {
        self.ensure_day_dir(date)?;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(path, err)),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|err| StoreError::Malformed {
                path: path.to_path_buf(),
                reason: format!("invalid utf-8: {err}"),
            })
    }

    fn write_atomic(&self, date: Date, path: &Path, contents: &str) -> Result<(), StoreError> {
        self.ensure_day_dir(date)?;
        let tmp_path = path.with_extension(TMP_EXTENSION);
        fs::write(&tmp_path, contents).map_err(|err| StoreError::io(&tmp_path, err))?;
        fs::rename(&tmp_path, path).map_err(|err| StoreError::io(path, err))?;
        Ok(())
    }
}

impl JournalStore for FileStore {
    fn load_journal(&self, date: Date) -> Result<Document, StoreError> {
        let path = self.journal_path(date);
        let Some(markup) = self.read_optional(date, &path)? else {
            return Ok(Document::new());
        };
        from_html(&markup).map_err(|err| StoreError::Malformed {
            path,
            reason: err.to_string(),
        })
    }

    fn save_journal(&self, date: Date, document: &Document) -> Result<(), StoreError> {
        let path = self.journal_path(date);
        self.write_atomic(date, &path, &to_html(document))?;
        tracing::debug!(path = %path.display(), "journal written");
        Ok(())
    }
}

impl TaskStore for FileStore {
    fn load_tasks(&self, date: Date) -> Result<TaskList, StoreError> {
        let path = self.tasks_path(date);
        Ok(self
            .read_optional(date, &path)?
            .map(|contents| TaskList::parse(&contents))
            .unwrap_or_default())
    }

    fn save_tasks(&self, date: Date, tasks: &TaskList) -> Result<(), StoreError> {
        let path = self.tasks_path(date);
        self.write_atomic(date, &path, &tasks.to_file_contents())?;
        tracing::debug!(path = %path.display(), count = tasks.len(), "tasks written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CharFormat, Position, Run, TextStyle};
    use crate::todo::Task;
    use assert_matches::assert_matches;
    use tempfile::TempDir;
    use time::macros::date;

    #[test]
    fn missing_files_load_empty_and_create_day_dir() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 01 - 01);
        assert_eq!(store.load_journal(day)?, Document::new());
        assert!(store.load_tasks(day)?.is_empty());
        assert!(temp.path().join("2024-01-01").is_dir());
        Ok(())
    }

    #[test]
    fn journal_round_trips_through_disk() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 02 - 29);
        let mut document = Document::plain("Dear diary");
        let bold = CharFormat {
            style: TextStyle::BOLD,
            ..CharFormat::default()
        };
        document.insert_text(Position::new(0, 10), " today", &bold);

        store.save_journal(day, &document)?;
        assert!(store.journal_path(day).exists());
        let loaded = store.load_journal(day)?;
        assert_eq!(loaded, document);
        assert_eq!(
            loaded.blocks()[0].runs(),
            &[Run::plain("Dear diary"), Run::new(" today", bold)]
        );
        Ok(())
    }

    #[test]
    fn tasks_file_has_no_trailing_newline() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 01 - 02);
        let tasks: TaskList = ["Buy milk", "Walk dog"]
            .into_iter()
            .filter_map(Task::new)
            .collect();
        store.save_tasks(day, &tasks)?;
        assert_eq!(fs::read_to_string(store.tasks_path(day))?, "Buy milk\nWalk dog");
        assert_eq!(store.load_tasks(day)?, tasks);
        Ok(())
    }

    #[test]
    fn unterminated_tag_is_malformed() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 01 - 03);
        fs::create_dir_all(store.day_dir(day))?;
        fs::write(store.journal_path(day), "<p>broken <span style=\"")?;
        let err = store.load_journal(day).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.path(), store.journal_path(day));
        Ok(())
    }

    #[test]
    fn invalid_utf8_tasks_are_malformed() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        let day = date!(2024 - 01 - 04);
        fs::create_dir_all(store.day_dir(day))?;
        fs::write(store.tasks_path(day), [0xff, 0xfe, b'\n'])?;
        assert_matches!(store.load_tasks(day), Err(StoreError::Malformed { .. }));
        Ok(())
    }

    #[test]
    fn root_that_is_a_file_reports_io_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "")?;
        let store = FileStore::new(&blocker);
        let result = store.save_tasks(date!(2024 - 01 - 05), &TaskList::new());
        assert_matches!(result, Err(StoreError::Io { .. }));
        Ok(())
    }

    #[test]
    fn init_creates_the_data_root() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let options = StorageOptions {
            data_dir: None,
            data_root: temp.path().join("nested").join("data"),
        };
        let store = init(&options)?;
        assert!(store.root().is_dir());
        Ok(())
    }
}
