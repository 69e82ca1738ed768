use std::sync::Arc;

use log::Logger;
use time::{Duration, UtcOffset};

use crate::errors::BackendError;
use crate::selector::DailySelector;

/// Everything a route handler needs.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub selector: Arc<DailySelector>,
    pub config: Config,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, selector: Arc<DailySelector>, config: Config) -> Self {
        Self {
            logger,
            selector,
            config,
        }
    }
}

/// The largest UTC offset a local day can have, in minutes.
const MAX_OFFSET_MINUTES: i16 = 23 * 60 + 59;

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) utc_offset: UtcOffset,
    pub(crate) selection_ttl: Duration,
}

impl Config {
    /// Creates a configuration whose days start at midnight
    /// `utc_offset_minutes` away from UTC and whose selections are
    /// memoized for `selection_ttl_seconds`.
    pub fn new(utc_offset_minutes: i16, selection_ttl_seconds: u32) -> Result<Self, BackendError> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&utc_offset_minutes) {
            return Err(BackendError::InvalidUtcOffset(utc_offset_minutes));
        }

        Ok(Self {
            utc_offset: UtcOffset::minutes(utc_offset_minutes),
            selection_ttl: Duration::seconds(i64::from(selection_ttl_seconds)),
        })
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    pub fn selection_ttl(&self) -> Duration {
        self.selection_ttl
    }
}
