#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for ingesting US mass-shooting incidents into the local cache.
//!
//! Sources are declared in embedded TOML ([`registry`]); each run fetches
//! one of them, cleans the rows, drops minor incidents, geocodes what is
//! left and writes the snapshot ([`pipeline`]). The add-record form
//! ([`form`]) appends single user-entered incidents to the same snapshot.

pub mod form;
pub mod pipeline;
pub mod registry;
pub mod source_def;

use shooting_map_database::DbError;
use shooting_map_scraper::ScrapeError;

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// No source is registered under this id.
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// The source could not be fetched or parsed. Nothing was written.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] ScrapeError),

    /// Reading or writing the cache failed.
    #[error("Cache error: {0}")]
    Cache(#[from] DbError),
}
