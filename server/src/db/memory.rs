//! An in-memory [`Db`] for tests and for running without a database.
//!
//! Events are kept in insertion order, which stands in for the
//! creation order the SQL queries sort by.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::{BoxFuture, FutureExt};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Claimed, Db};
use crate::day::DayWindow;
use crate::errors::BackendError;
use crate::event::HistoryEvent;

#[derive(Default)]
pub struct MemoryDb {
    events: RwLock<Vec<HistoryEvent>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = HistoryEvent>) -> Self {
        let db = Self::new();
        db.write().extend(events);
        db
    }

    /// Makes every subsequent call fail as if the connection pool had
    /// been closed, or undoes that.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// The number of stamps written so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns a copy of the stored event with the given ID.
    pub fn get(&self, id: &Uuid) -> Option<HistoryEvent> {
        self.read().iter().find(|event| event.id == *id).cloned()
    }

    fn read(&self) -> RwLockReadGuard<Vec<HistoryEvent>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<Vec<HistoryEvent>> {
        self.events.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BackendError::StoreUnavailable {
                source: sqlx::Error::PoolClosed,
            })
        } else {
            Ok(())
        }
    }
}

fn first_shown_within<'a>(
    events: &'a [HistoryEvent],
    window: &DayWindow,
) -> Option<&'a HistoryEvent> {
    events
        .iter()
        .enumerate()
        .filter_map(|(index, event)| {
            event
                .last_shown_at
                .filter(|shown_at| window.contains(*shown_at))
                .map(|shown_at| (shown_at, index, event))
        })
        .min_by_key(|(shown_at, index, _)| (*shown_at, *index))
        .map(|(_, _, event)| event)
}

impl Db for MemoryDb {
    fn shown_within(&self, window: &DayWindow) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>> {
        let window = *window;

        async move {
            self.check_available()?;

            Ok(first_shown_within(&self.read(), &window).cloned())
        }
        .boxed()
    }

    fn never_shown(&self) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>> {
        async move {
            self.check_available()?;

            let events = self.read();

            Ok(events
                .iter()
                .find(|event| event.last_shown_at.is_none())
                .cloned())
        }
        .boxed()
    }

    fn least_recently_shown(&self) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>> {
        async move {
            self.check_available()?;

            let events = self.read();

            Ok(events
                .iter()
                .enumerate()
                .filter_map(|(index, event)| event.last_shown_at.map(|shown_at| (shown_at, index, event)))
                .min_by_key(|(shown_at, index, _)| (*shown_at, *index))
                .map(|(_, _, event)| event.clone()))
        }
        .boxed()
    }

    fn mark_shown(
        &self,
        id: &Uuid,
        window: &DayWindow,
        at: OffsetDateTime,
    ) -> BoxFuture<Result<Claimed, BackendError>> {
        let id = *id;
        let window = *window;

        async move {
            self.check_available()?;

            let mut events = self.write();

            if let Some(event) = first_shown_within(&events, &window) {
                return Ok(Claimed::AlreadyShown(event.clone()));
            }

            let event = events
                .iter_mut()
                .find(|event| event.id == id)
                .ok_or(BackendError::NonExistentId(id))?;

            event.last_shown_at = Some(at);
            self.writes.fetch_add(1, Ordering::SeqCst);

            Ok(Claimed::Stamped(event.clone()))
        }
        .boxed()
    }
}
