use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, warn};

use crate::db::{achievement_repo, term_repo, in_transaction};
use crate::error::TasktimeError;
use crate::models::Term;

pub use crate::db::achievement_repo::UpsertOutcome;

use super::accumulator::FlushRecord;
use super::session::SessionAction;

/// Where tracked time ends up.
pub trait TimeStore {
    fn upsert_daily(&mut self, record: &FlushRecord) -> Result<UpsertOutcome, TasktimeError>;
    fn save_term(&mut self, term: &Term) -> Result<(), TasktimeError>;
}

/// Store backed by the project database.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl TimeStore for SqliteStore<'_> {
    fn upsert_daily(&mut self, record: &FlushRecord) -> Result<UpsertOutcome, TasktimeError> {
        let times = record.daily_times();
        in_transaction(self.conn, |conn| {
            achievement_repo::upsert_daily(conn, &record.task_id, &times)
        })
    }

    fn save_term(&mut self, term: &Term) -> Result<(), TasktimeError> {
        term_repo::save_term(self.conn, term)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    pub created: u64,
    pub updated: u64,
    pub terms_saved: u64,
    pub failures: u64,
}

/// Applies session actions to a store without ever failing the caller.
///
/// A failed write is logged and counted; the next flush carries absolute
/// values, so it repairs whatever the failed one missed.
pub struct Bridge<S> {
    store: S,
    stats: BridgeStats,
}

impl<S: TimeStore> Bridge<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            stats: BridgeStats::default(),
        }
    }

    /// Returns the upsert outcome for a successful flush, `None` otherwise.
    pub fn apply(&mut self, action: &SessionAction) -> Option<UpsertOutcome> {
        match action {
            SessionAction::Flush(record) => match self.store.upsert_daily(record) {
                Ok(outcome) => {
                    match outcome {
                        UpsertOutcome::Created => self.stats.created += 1,
                        UpsertOutcome::Updated => self.stats.updated += 1,
                    }
                    debug!(task_id = %record.task_id, day = %record.day, ?outcome, "flushed");
                    Some(outcome)
                }
                Err(e) => {
                    self.stats.failures += 1;
                    warn!(task_id = %record.task_id, code = e.code.as_str(), error = %e, "flush failed");
                    None
                }
            },
            SessionAction::SaveTerm(term) => {
                match self.store.save_term(term) {
                    Ok(()) => self.stats.terms_saved += 1,
                    Err(e) => {
                        self.stats.failures += 1;
                        warn!(task_id = %term.task_id, term_id = %term.term_id, error = %e, "term save failed");
                    }
                }
                None
            }
        }
    }

    pub fn apply_all(&mut self, actions: &[SessionAction]) {
        for action in actions {
            self.apply(action);
        }
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[cfg(test)]
    pub fn into_inner(self) -> S {
        self.store
    }
}
