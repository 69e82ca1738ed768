use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::day::DayWindow;
use crate::errors::BackendError;
use crate::event::HistoryEvent;

pub mod memory;

/// The outcome of trying to stamp an event as the event of the day.
#[derive(Clone, Debug)]
pub enum Claimed {
    /// The event was stamped and is returned with its new timestamp.
    Stamped(HistoryEvent),

    /// Another event had already been shown within the day; nothing
    /// was written and that event is returned instead.
    AlreadyShown(HistoryEvent),
}

/// The queries the daily selection needs from a store of events.
///
/// Every lookup orders its candidates explicitly (by last-shown time,
/// then creation order, then ID) and returns the first.
pub trait Db {
    /// Finds the event whose last-shown time falls within `window`.
    fn shown_within(&self, window: &DayWindow) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>>;

    /// Finds an event that has never been shown.
    fn never_shown(&self) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>>;

    /// Finds the event that was shown longest ago. Events that were never
    /// shown are not considered.
    fn least_recently_shown(&self) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>>;

    /// Stamps the given event as shown at `at`, unless some event has
    /// already been shown within `window`. The check and the write
    /// happen atomically.
    fn mark_shown(
        &self,
        id: &Uuid,
        window: &DayWindow,
        at: OffsetDateTime,
    ) -> BoxFuture<Result<Claimed, BackendError>>;
}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgConnection, PgPool, PgRow},
    };
    use time::OffsetDateTime;
    use url::Url;
    use uuid::Uuid;

    use super::Claimed;
    use crate::day::DayWindow;
    use crate::errors::BackendError;
    use crate::event::{GlossaryTerm, HistoryEvent};

    /// Key for the advisory lock serializing daily claims.
    const SELECTION_LOCK_KEY: i64 = 0x6368_726f_6e6f_73;

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn shown_within(
            &self,
            window: &DayWindow,
        ) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>> {
            let window = *window;

            async move {
                let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;

                let event = retrieve_shown_within(&mut conn, &window)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(event)
            }
            .boxed()
        }

        fn never_shown(&self) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>> {
            async move {
                let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;

                let event = sqlx::query(include_str!("queries/retrieve_never_shown.sql"))
                    .try_map(|row: PgRow| event_from_row(&row))
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(map_sqlx_error)?;

                let event = hydrate(&mut conn, event).await.map_err(map_sqlx_error)?;

                Ok(event)
            }
            .boxed()
        }

        fn least_recently_shown(&self) -> BoxFuture<Result<Option<HistoryEvent>, BackendError>> {
            async move {
                let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;

                let event = sqlx::query(include_str!("queries/retrieve_least_recently_shown.sql"))
                    .try_map(|row: PgRow| event_from_row(&row))
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(map_sqlx_error)?;

                let event = hydrate(&mut conn, event).await.map_err(map_sqlx_error)?;

                Ok(event)
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
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                // held until commit or rollback, so concurrent claims
                // see each other’s stamps
                sqlx::query(include_str!("queries/lock_selection.sql"))
                    .bind(SELECTION_LOCK_KEY)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                if let Some(event) = retrieve_shown_within(&mut tx, &window)
                    .await
                    .map_err(map_sqlx_error)?
                {
                    tx.commit().await.map_err(map_sqlx_error)?;

                    return Ok(Claimed::AlreadyShown(event));
                }

                let count = sqlx::query(include_str!("queries/mark_shown.sql"))
                    .bind(id)
                    .bind(at)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
                    return Err(BackendError::NonExistentId(id));
                }

                let event = sqlx::query(include_str!("queries/retrieve_event.sql"))
                    .bind(id)
                    .try_map(|row: PgRow| event_from_row(&row))
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                let event = hydrate(&mut tx, event)
                    .await
                    .map_err(map_sqlx_error)?
                    .ok_or(BackendError::NonExistentId(id))?;

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(Claimed::Stamped(event))
            }
            .boxed()
        }
    }

    async fn retrieve_shown_within(
        conn: &mut PgConnection,
        window: &DayWindow,
    ) -> Result<Option<HistoryEvent>, sqlx::Error> {
        let event = sqlx::query(include_str!("queries/retrieve_shown_within.sql"))
            .bind(window.start())
            .bind(window.end())
            .try_map(|row: PgRow| event_from_row(&row))
            .fetch_optional(&mut *conn)
            .await?;

        hydrate(conn, event).await
    }

    /// Fills in the tags and glossary of an event read from the `events`
    /// table.
    async fn hydrate(
        conn: &mut PgConnection,
        event: Option<HistoryEvent>,
    ) -> Result<Option<HistoryEvent>, sqlx::Error> {
        let mut event = match event {
            Some(event) => event,
            None => return Ok(None),
        };

        let tags: Vec<(String,)> = sqlx::query_as(include_str!("queries/retrieve_tags.sql"))
            .bind(event.id)
            .fetch_all(&mut *conn)
            .await?;

        let glossary: Vec<(String, String)> =
            sqlx::query_as(include_str!("queries/retrieve_glossary.sql"))
                .bind(event.id)
                .fetch_all(&mut *conn)
                .await?;

        event.tags = tags.into_iter().map(|(name,)| name).collect();
        event.glossary = glossary
            .into_iter()
            .map(|(term, definition)| GlossaryTerm { term, definition })
            .collect();

        Ok(Some(event))
    }

    fn event_from_row(row: &PgRow) -> Result<HistoryEvent, sqlx::Error> {
        let image_url: String = try_get(row, "image_url")?;
        let image_url = Url::parse(&image_url).map_err(|source| {
            // the seeding tool validates URLs, but the table itself
            // accepts any text
            sqlx::Error::Decode(Box::new(BackendError::UnableToParseUrl {
                url: image_url,
                source,
            }))
        })?;

        Ok(HistoryEvent {
            id: try_get(row, "id")?,
            date: try_get(row, "date")?,
            year: try_get(row, "year")?,
            title: try_get(row, "title")?,
            description: try_get(row, "description")?,
            category: try_get(row, "category")?,
            image_url,
            image_credit: try_get(row, "image_credit")?,
            image_position: try_get(row, "image_position")?,
            story: try_get(row, "story")?,
            fun_fact: try_get(row, "fun_fact")?,
            tags: vec![],
            glossary: vec![],
            last_shown_at: try_get(row, "last_shown_at")?,
        })
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Io(_) | Error::PoolTimedOut | Error::PoolClosed => {
                BackendError::StoreUnavailable { source: error }
            }
            _ => BackendError::Sqlx { source: error },
        }
    }
}
