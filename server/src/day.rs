use time::{Duration, OffsetDateTime, UtcOffset};

/// The span of one local calendar day, from midnight (inclusive) to the
/// following midnight (exclusive).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DayWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl DayWindow {
    /// Returns the local day containing `now` at the given offset. Both
    /// bounds derive from the single `now` passed in.
    pub fn containing(now: OffsetDateTime, offset: UtcOffset) -> Self {
        let start = now.to_offset(offset).date().midnight().assume_offset(offset);

        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// The first instant of the day.
    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// The first instant of the next day.
    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}
