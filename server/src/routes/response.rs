use serde::Serialize;

use crate::card::DailyCard;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
        utc_offset_seconds: i32,
    },
    /// `event` is `None` when there is nothing to show yet.
    Today { event: Option<DailyCard<'a>> },
}
