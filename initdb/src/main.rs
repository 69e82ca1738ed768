//! A helper program to initialize the database, and optionally fill it
//! with events from a JSON file.
//!
//! `CHRONOS_SEED_MODE=replace` (the default) wipes every stored event
//! first, selection history included. `CHRONOS_SEED_MODE=append`
//! publishes the file's events next to the existing ones.

use std::convert::TryFrom;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use movine::Movine;
use postgres::{Client, NoTls};
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use log::{debug, info, initialize_logger, Logger};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedEvent {
    date: String,
    year: i32,
    title: String,
    description: String,
    category: String,
    image_url: String,
    image_credit: String,
    #[serde(default)]
    image_position: Option<String>,
    story: String,
    fun_fact: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    glossary: Vec<SeedTerm>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedTerm {
    term: String,
    definition: String,
}

#[derive(Debug, Error)]
enum SeedError {
    #[error("Could not read seed file")]
    Io(#[from] std::io::Error),

    #[error("Could not parse seed file")]
    Json(#[from] serde_json::Error),

    #[error("Database error")]
    Postgres(#[from] postgres::Error),

    #[error("Event {title:?} has an invalid image URL")]
    InvalidImageUrl {
        title: String,
        source: url::ParseError,
    },

    #[error("Event {0:?} has a glossary term with no text")]
    EmptyTerm(String),

    #[error("Event {0:?} has more than {} tags or glossary terms", i16::MAX)]
    TooManyEntries(String),

    #[error("Unknown seed mode {0:?} (expected \"replace\" or \"append\")")]
    UnknownMode(String),
}

/// How seeded events relate to the ones already stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SeedMode {
    /// Delete every stored event first.
    Replace,

    /// Keep stored events and their last-shown times.
    Append,
}

impl FromStr for SeedMode {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(SeedMode::Replace),
            "append" => Ok(SeedMode::Append),
            _ => Err(SeedError::UnknownMode(s.to_string())),
        }
    }
}

fn main() {
    dotenv::dotenv().ok();

    let logger = initialize_logger();
    let connection_string = env::var("CHRONOS_DB_CONNECTION_STRING")
        .expect("could not read CHRONOS_DB_CONNECTION_STRING");

    debug!(logger, "Connecting to database...");

    let client = Client::connect(&connection_string, NoTls).expect("could not connect to database");

    migrate(&logger, client, "./migrations");

    if let Ok(seed_file) = env::var("CHRONOS_SEED_FILE") {
        let mode = env::var("CHRONOS_SEED_MODE")
            .map_or(Ok(SeedMode::Replace), |mode| mode.parse())
            .expect("could not parse CHRONOS_SEED_MODE");
        let events = read_seed_file(&logger, Path::new(&seed_file)).expect("failed to read seed file");

        let mut client = Client::connect(&connection_string, NoTls).expect("could not connect to database");

        seed(&logger, &mut client, &events, mode).expect("failed to seed events");
    }

    debug!(logger, "Completed initialization.");
}

fn migrate(logger: &Logger, client: Client, migration_dir: &str) {
    let mut movine = Movine::new(client);
    movine.set_migration_dir(migration_dir);

    if movine.status().is_err() {
        debug!(logger, "Initializing movine...");
        movine.initialize().expect("failed to initialize movine")
    }

    debug!(logger, "Running migrations...");
    movine.up().expect("failed to run migrations");
}

fn read_seed_file(logger: &Logger, path: &Path) -> Result<Vec<SeedEvent>, SeedError> {
    debug!(logger, "Reading seed file..."; "path" => %path.display());

    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

/// Stores `events` in one transaction, after deleting every stored event
/// if `mode` is [`SeedMode::Replace`]. New events are never shown.
fn seed(logger: &Logger, client: &mut Client, events: &[SeedEvent], mode: SeedMode) -> Result<(), SeedError> {
    let mut transaction = client.transaction()?;

    if mode == SeedMode::Replace {
        debug!(logger, "Clearing existing events...");
        transaction.execute("DELETE FROM glossary_terms", &[])?;
        transaction.execute("DELETE FROM event_tags", &[])?;
        transaction.execute("DELETE FROM events", &[])?;
    }

    for event in events {
        let id = Uuid::new_v4();

        Url::parse(&event.image_url).map_err(|source| SeedError::InvalidImageUrl {
            title: event.title.clone(),
            source,
        })?;

        transaction.execute(
            include_str!("insert_event.sql"),
            &[
                &id,
                &event.date,
                &event.year,
                &event.title,
                &event.description,
                &event.category,
                &event.image_url,
                &event.image_credit,
                &event.image_position,
                &event.story,
                &event.fun_fact,
            ],
        )?;

        for (position, tag) in event.tags.iter().enumerate() {
            let position = position_of(&event.title, position)?;

            transaction.execute(include_str!("insert_tag.sql"), &[&id, &position, tag])?;
        }

        for (position, entry) in event.glossary.iter().enumerate() {
            if entry.term.is_empty() {
                return Err(SeedError::EmptyTerm(event.title.clone()));
            }

            let position = position_of(&event.title, position)?;

            transaction.execute(
                include_str!("insert_glossary_term.sql"),
                &[&id, &position, &entry.term, &entry.definition],
            )?;
        }

        debug!(logger, "Inserted event"; "id" => %id, "title" => &event.title);
    }

    transaction.commit()?;

    info!(logger, "Seeded events"; "count" => events.len(), "mode" => ?mode);

    Ok(())
}

fn position_of(title: &str, position: usize) -> Result<i16, SeedError> {
    i16::try_from(position).map_err(|_| SeedError::TooManyEntries(title.to_string()))
}
