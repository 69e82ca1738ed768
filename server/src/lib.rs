pub mod cache;
pub mod card;
pub mod config;
pub mod day;
pub mod db;
pub mod environment;
pub mod errors;
pub mod event;
pub mod glossary;
pub mod routes;
pub mod selector;
