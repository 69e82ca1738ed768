use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

/// A single historical event that can be presented as the event of
/// the day.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HistoryEvent {
    /// The ID of the event.
    pub id: Uuid,

    /// The calendar date it happened on, as `YYYY-MM-DD`.
    pub date: String,

    /// The year it happened in.
    pub year: i32,

    pub title: String,

    /// A one-line summary.
    pub description: String,

    /// The category label (e.g. “Ciencia”).
    pub category: String,

    /// The URL of the illustration.
    pub image_url: Url,

    /// Who the illustration should be credited to.
    pub image_credit: String,

    /// The focal point of the illustration, as a CSS `object-position`
    /// value.
    pub image_position: Option<String>,

    /// The narrative, with paragraphs separated by newlines.
    pub story: String,

    pub fun_fact: String,

    /// Tags in display order.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Glossary entries in display order.
    #[serde(default)]
    pub glossary: Vec<GlossaryTerm>,

    /// When it was last chosen as the event of the day, if ever.
    #[serde(skip)]
    pub last_shown_at: Option<OffsetDateTime>,
}

/// A term used in an event’s text and the definition shown for it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
}

impl GlossaryTerm {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}
