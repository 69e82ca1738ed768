use std::cmp;
use std::sync::Arc;

use log::{debug, info, warn, Logger};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::cache::TtlCache;
use crate::day::DayWindow;
use crate::db::{Claimed, Db};
use crate::errors::BackendError;
use crate::event::HistoryEvent;

/// What to present today.
#[derive(Clone, Debug)]
pub enum Selection {
    Today(HistoryEvent),

    /// The store holds no events at all.
    Empty,
}

/// Chooses the event of the day.
///
/// The first selection of a day stamps exactly one event: one that has
/// never been shown if there is any, otherwise the one shown longest
/// ago. Later selections on the same day find that stamp and return the
/// same event without writing. Results are memoized for `ttl`, but never
/// past the end of the day they were chosen for.
pub struct DailySelector {
    logger: Arc<Logger>,
    db: Arc<dyn Db + Send + Sync>,
    offset: UtcOffset,
    ttl: Duration,
    cache: TtlCache<Selection>,
}

impl DailySelector {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        offset: UtcOffset,
        ttl: Duration,
    ) -> Self {
        Self {
            logger,
            db,
            offset,
            ttl,
            cache: TtlCache::new(),
        }
    }

    /// Returns the event of the day for the current time.
    pub async fn today(&self) -> Result<Selection, BackendError> {
        self.select_at(OffsetDateTime::now_utc()).await
    }

    /// Returns the event of the day containing `now`, from the cache if
    /// it is still fresh.
    pub async fn select_at(&self, now: OffsetDateTime) -> Result<Selection, BackendError> {
        let window = DayWindow::containing(now, self.offset);
        let expires_at = cmp::min(now + self.ttl, window.end());

        self.cache
            .get_or_refresh(now, || async move {
                let selection = self.select_uncached(now, &window).await?;

                Ok::<_, BackendError>((selection, expires_at))
            })
            .await
    }

    /// Forgets the memoized selection, so the next request consults the
    /// store again.
    pub async fn forget(&self) {
        self.cache.invalidate().await;
    }

    /// Runs the selection against the store, once more if the chosen
    /// candidate was deleted before it could be claimed.
    async fn select_uncached(
        &self,
        now: OffsetDateTime,
        window: &DayWindow,
    ) -> Result<Selection, BackendError> {
        match self.select_once(now, window).await {
            Err(BackendError::NonExistentId(id)) => {
                warn!(self.logger, "Candidate vanished before it was claimed, retrying"; "id" => %id);

                self.select_once(now, window).await
            }
            result => result,
        }
    }

    async fn select_once(
        &self,
        now: OffsetDateTime,
        window: &DayWindow,
    ) -> Result<Selection, BackendError> {
        if let Some(event) = self.db.shown_within(window).await? {
            debug!(self.logger, "Reusing today’s event..."; "id" => %event.id);

            return Ok(Selection::Today(event));
        }

        let (candidate, reason) = match self.db.never_shown().await? {
            Some(event) => (event, "never_shown"),
            None => match self.db.least_recently_shown().await? {
                Some(event) => (event, "recycled"),
                None => {
                    debug!(self.logger, "No events to choose from");

                    return Ok(Selection::Empty);
                }
            },
        };

        match self.db.mark_shown(&candidate.id, window, now).await? {
            Claimed::Stamped(event) => {
                info!(self.logger, "Chose event of the day"; "id" => %event.id, "reason" => reason, "day" => %window.start().date());

                Ok(Selection::Today(event))
            }
            Claimed::AlreadyShown(event) => {
                debug!(self.logger, "Another request chose today’s event first"; "id" => %event.id);

                Ok(Selection::Today(event))
            }
        }
    }
}
