#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! On-disk cache for the cleaned incident set.
//!
//! The cache is a single CSV snapshot under the data directory (see
//! [`paths`]). It is written whole, via a temporary sibling file that is
//! renamed into place, so readers never observe a partial file.
//! Read-modify-write cycles across processes are serialized by an advisory
//! file lock ([`lock`]); [`store::RecordStore`] guards the in-memory copy
//! for long-running processes.

pub mod lock;
pub mod paths;
pub mod snapshot;
pub mod store;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Reading or writing the cache file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file is not valid CSV for the record schema.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
