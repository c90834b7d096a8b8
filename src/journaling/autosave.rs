use std::time::{Duration, Instant};

use time::{Date, OffsetDateTime};

use crate::config::AutoSaveConfig;
use crate::date::format_day;
use crate::document::Document;
use crate::storage::JournalStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSaveStatus {
    Disabled,
    Inactive,
    Idle {
        date: Date,
        last_saved_at: Option<OffsetDateTime>,
    },
    Pending {
        date: Date,
        since: OffsetDateTime,
    },
    Error {
        date: Date,
        message: String,
        occurred_at: OffsetDateTime,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSaveEvent {
    Saved {
        date: Date,
        timestamp: OffsetDateTime,
    },
    Error {
        date: Date,
        message: String,
    },
}

/// Single-shot debounced journal writer.
///
/// Arming captures the date and a snapshot of the document, so a save that
/// fires after the user has navigated elsewhere still writes what was typed
/// to the day it was typed under. Snapshots whose save failed are held per
/// date until a later attempt succeeds.
#[derive(Debug)]
pub struct AutoSaveRuntime {
    enabled: bool,
    debounce: Duration,
    pending: Option<PendingSave>,
    /// Failed saves displaced by an edit on another date.
    stalled: Vec<PendingSave>,
    last_date: Option<Date>,
    last_saved_at: Option<OffsetDateTime>,
    last_error: Option<AutoSaveFailure>,
}

#[derive(Debug)]
struct PendingSave {
    date: Date,
    snapshot: Document,
    /// `None` once a save attempt failed: the snapshot waits for the next
    /// edit or an explicit save.
    armed_at: Option<Instant>,
    since: OffsetDateTime,
}

#[derive(Debug, Clone)]
struct AutoSaveFailure {
    date: Date,
    message: String,
    occurred_at: OffsetDateTime,
}

impl AutoSaveRuntime {
    pub fn new(config: &AutoSaveConfig) -> Self {
        Self {
            enabled: config.enabled,
            debounce: config.debounce(),
            pending: None,
            stalled: Vec::new(),
            last_date: None,
            last_saved_at: None,
            last_error: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some() || !self.stalled.is_empty()
    }

    /// Date of the most recently armed snapshot.
    pub fn pending_date(&self) -> Option<Date> {
        self.pending.as_ref().map(|pending| pending.date)
    }

    /// Every date that still has unsaved journal text, oldest failure first.
    pub fn pending_dates(&self) -> Vec<Date> {
        self.stalled
            .iter()
            .chain(self.pending.as_ref())
            .map(|pending| pending.date)
            .collect()
    }

    /// Unsaved text held for `date`, if any.
    pub fn unsaved_snapshot(&self, date: Date) -> Option<&Document> {
        self.pending
            .iter()
            .chain(self.stalled.iter())
            .find(|pending| pending.date == date)
            .map(|pending| &pending.snapshot)
    }

    pub fn status(&self) -> AutoSaveStatus {
        if !self.enabled {
            return AutoSaveStatus::Disabled;
        }
        if let Some(failure) = &self.last_error {
            return AutoSaveStatus::Error {
                date: failure.date,
                message: failure.message.clone(),
                occurred_at: failure.occurred_at,
            };
        }
        if let Some(pending) = self.pending.as_ref().or(self.stalled.first()) {
            return AutoSaveStatus::Pending {
                date: pending.date,
                since: pending.since,
            };
        }
        match self.last_date {
            Some(date) => AutoSaveStatus::Idle {
                date,
                last_saved_at: self.last_saved_at,
            },
            None => AutoSaveStatus::Inactive,
        }
    }

    pub fn arm<S>(&mut self, store: &S, date: Date, document: &Document) -> Option<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        self.arm_at(store, date, document, Instant::now())
    }

    /// Restarts the debounce for `date` with a fresh snapshot. A pending save
    /// for a different date is written first and its outcome returned; if
    /// that write fails its snapshot is kept.
    pub fn arm_at<S>(
        &mut self,
        store: &S,
        date: Date,
        document: &Document,
        now: Instant,
    ) -> Option<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        if !self.enabled {
            return None;
        }
        self.stage(store, date, document, now)
    }

    pub fn poll<S>(&mut self, store: &S) -> Option<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        self.poll_at(store, Instant::now())
    }

    /// Writes the pending snapshot once the debounce has elapsed since the
    /// last arm.
    pub fn poll_at<S>(&mut self, store: &S, now: Instant) -> Option<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        let due = self
            .pending
            .as_ref()
            .and_then(|pending| pending.armed_at)
            .map(|armed_at| now.saturating_duration_since(armed_at) >= self.debounce)
            .unwrap_or(false);
        if due {
            self.flush_internal(store)
        } else {
            None
        }
    }

    /// Writes every unsaved snapshot, pending or stalled.
    pub fn flush_now<S>(&mut self, store: &S) -> Vec<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        let mut events = self.retry_stalled(store, None);
        events.extend(self.flush_internal(store));
        events
    }

    /// Writes the unsaved snapshot for `date` only.
    pub fn flush_date<S>(&mut self, store: &S, date: Date) -> Option<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        if self.pending_date() == Some(date) {
            self.flush_internal(store)
        } else {
            self.retry_stalled(store, Some(date)).pop()
        }
    }

    /// Explicit save: writes `document` for `date` immediately, after any
    /// unsaved snapshots for other dates. Works with auto-save disabled.
    pub fn save_now<S>(&mut self, store: &S, date: Date, document: &Document) -> Vec<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        let mut events = Vec::with_capacity(2);
        events.extend(self.stage(store, date, document, Instant::now()));
        events.extend(self.retry_stalled(store, None));
        events.extend(self.flush_internal(store));
        events
    }

    fn stage<S>(
        &mut self,
        store: &S,
        date: Date,
        document: &Document,
        now: Instant,
    ) -> Option<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        let displaced = match self.pending_date() {
            Some(pending) if pending != date => {
                let event = self.flush_internal(store);
                if let Some(failed) = self.pending.take() {
                    self.stalled.push(failed);
                }
                event
            }
            _ => None,
        };
        let earlier = self
            .stalled
            .iter()
            .position(|stalled| stalled.date == date)
            .map(|index| self.stalled.remove(index).since);
        let since = self
            .pending
            .as_ref()
            .map(|pending| pending.since)
            .or(earlier)
            .unwrap_or_else(OffsetDateTime::now_utc);
        self.pending = Some(PendingSave {
            date,
            snapshot: document.clone(),
            armed_at: Some(now),
            since,
        });
        if self.last_error.as_ref().map(|failure| failure.date) == Some(date) {
            self.last_error = None;
        }
        displaced
    }

    fn flush_internal<S>(&mut self, store: &S) -> Option<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        let pending = self.pending.take()?;
        let (event, failed) = self.write(store, pending);
        self.pending = failed;
        Some(event)
    }

    /// Retries stalled snapshots, all of them or only the one for `only`.
    fn retry_stalled<S>(&mut self, store: &S, only: Option<Date>) -> Vec<AutoSaveEvent>
    where
        S: JournalStore + ?Sized,
    {
        let mut events = Vec::new();
        for stalled in std::mem::take(&mut self.stalled) {
            if only.is_some_and(|date| date != stalled.date) {
                self.stalled.push(stalled);
                continue;
            }
            let (event, failed) = self.write(store, stalled);
            events.push(event);
            self.stalled.extend(failed);
        }
        events
    }

    /// Saves one snapshot; on failure the snapshot is handed back disarmed.
    fn write<S>(
        &mut self,
        store: &S,
        mut pending: PendingSave,
    ) -> (AutoSaveEvent, Option<PendingSave>)
    where
        S: JournalStore + ?Sized,
    {
        let timestamp = OffsetDateTime::now_utc();
        let date = pending.date;
        match store.save_journal(date, &pending.snapshot) {
            Ok(()) => {
                tracing::debug!(date = %format_day(date), "journal auto-saved");
                self.last_date = Some(date);
                self.last_saved_at = Some(timestamp);
                if self.last_error.as_ref().map(|failure| failure.date) == Some(date) {
                    self.last_error = None;
                }
                (AutoSaveEvent::Saved { date, timestamp }, None)
            }
            Err(err) => {
                tracing::error!(?err, date = %format_day(date), "journal save failed");
                let message = err.to_string();
                self.last_error = Some(AutoSaveFailure {
                    date,
                    message: message.clone(),
                    occurred_at: timestamp,
                });
                pending.armed_at = None;
                (AutoSaveEvent::Error { date, message }, Some(pending))
            }
        }
    }
}
