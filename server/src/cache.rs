use std::future::Future;

use time::OffsetDateTime;
use tokio::sync::Mutex;

/// Holds one value until an absolute expiry time.
///
/// Lookups that miss run the refresh while holding the slot, so
/// concurrent callers wait for the first refresh instead of starting
/// their own. Failed refreshes leave the slot empty.
pub struct TtlCache<T> {
    slot: Mutex<Option<Entry<T>>>,
}

struct Entry<T> {
    value: T,
    expires_at: OffsetDateTime,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached value if it is still fresh at `now`, otherwise
    /// runs `refresh` and caches its value until the expiry it returns.
    pub async fn get_or_refresh<F, Fut, E>(&self, now: OffsetDateTime, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(T, OffsetDateTime), E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if now < entry.expires_at {
                return Ok(entry.value.clone());
            }
        }

        *slot = None;

        let (value, expires_at) = refresh().await?;

        *slot = Some(Entry {
            value: value.clone(),
            expires_at,
        });

        Ok(value)
    }

    /// Drops the cached value, if any.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::{Duration, OffsetDateTime};

    use super::TtlCache;

    async fn counted(
        calls: &AtomicUsize,
        expires_at: OffsetDateTime,
    ) -> Result<(usize, OffsetDateTime), ()> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;

        Ok((n, expires_at))
    }

    #[tokio::test]
    async fn reuses_fresh_values() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);
        let now = OffsetDateTime::unix_epoch();
        let expiry = now + Duration::hours(1);

        let first = cache.get_or_refresh(now, || counted(&calls, expiry)).await;
        let second = cache
            .get_or_refresh(now + Duration::minutes(59), || counted(&calls, expiry))
            .await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refreshes_at_expiry() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);
        let now = OffsetDateTime::unix_epoch();
        let expiry = now + Duration::hours(1);

        cache.get_or_refresh(now, || counted(&calls, expiry)).await.unwrap();
        let later = cache
            .get_or_refresh(expiry, || counted(&calls, expiry + Duration::hours(1)))
            .await;

        assert_eq!(later, Ok(2));
    }

    #[tokio::test]
    async fn does_not_keep_failures() {
        let cache: TtlCache<usize> = TtlCache::new();
        let now = OffsetDateTime::unix_epoch();

        let failed = cache
            .get_or_refresh(now, || async { Err::<(usize, OffsetDateTime), _>("down") })
            .await;
        let recovered = cache
            .get_or_refresh(now, || async { Ok::<_, &str>((7, now + Duration::hours(1))) })
            .await;

        assert_eq!(failed, Err("down"));
        assert_eq!(recovered, Ok(7));
    }

    #[tokio::test]
    async fn invalidation_forces_a_refresh() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);
        let now = OffsetDateTime::unix_epoch();
        let expiry = now + Duration::hours(1);

        cache.get_or_refresh(now, || counted(&calls, expiry)).await.unwrap();
        cache.invalidate().await;
        let refreshed = cache.get_or_refresh(now, || counted(&calls, expiry)).await;

        assert_eq!(refreshed, Ok(2));
    }
}
