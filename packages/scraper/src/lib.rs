#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source fetching for shooting incident tables.
//!
//! Provides the [`Scraper`] trait and implementations for the two table
//! shapes the pipeline ingests: Wikipedia-style HTML tables
//! ([`html_table`]) and flat CSV datasets ([`csv_table`]). Also loads the
//! census population reference ([`census`]).
//!
//! Scrapers return raw rows as [`serde_json::Value`] objects keyed by
//! column header. Mapping those columns onto incident fields is left to
//! the caller.

pub mod census;
pub mod csv_table;
pub mod html_table;
pub mod retry;

use std::path::PathBuf;
use std::str::FromStr;

/// User agent sent with every request. Wikipedia and Nominatim reject
/// anonymous clients.
pub const USER_AGENT: &str = concat!(
    "shooting-map/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/BSteffaniak/shooting-map)"
);

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status that is not worth retrying.
    #[error("HTTP status {status} from {url}")]
    Status {
        /// Response status code.
        status: reqwest::StatusCode,
        /// Requested URL.
        url: String,
    },

    /// Parsing the response body failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Where a table lives: a remote URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// An `http://` or `https://` URL.
    Url(String),
    /// A path on the local filesystem.
    Path(PathBuf),
}

impl FromStr for Resource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::Url(s.to_owned()))
        } else {
            Ok(Self::Path(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Builds the shared HTTP client.
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] if the client cannot be constructed.
pub fn build_client() -> Result<reqwest::Client, ScrapeError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .map_err(ScrapeError::Http)
}

/// Loads the full text of a resource, retrying transient HTTP failures.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the file cannot be read or the request fails
/// after all retries.
pub async fn fetch_text(
    client: &reqwest::Client,
    resource: &Resource,
) -> Result<String, ScrapeError> {
    match resource {
        Resource::Url(url) => {
            log::debug!("Fetching {url}");
            retry::send_text(|| client.get(url)).await
        }
        Resource::Path(path) => {
            log::debug!("Reading {}", path.display());
            Ok(tokio::fs::read_to_string(path).await?)
        }
    }
}

/// Trait for fetching the raw rows of an incident table.
///
/// Implementations handle one table format and return every row as a
/// [`serde_json::Value`] object keyed by column header. A failure aborts
/// the whole fetch; partial tables are never returned.
pub trait Scraper: Send + Sync {
    /// Fetches and parses every row of the table.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the resource cannot be loaded or parsed.
    fn fetch_rows(
        &self,
        client: &reqwest::Client,
    ) -> impl std::future::Future<Output = Result<Vec<serde_json::Value>, ScrapeError>> + Send;

    /// Returns the name of the scraping strategy (e.g. `"html_table"`).
    fn strategy(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_url_resource() {
        assert_eq!(
            "https://en.wikipedia.org/wiki/Foo".parse::<Resource>().unwrap(),
            Resource::Url("https://en.wikipedia.org/wiki/Foo".to_string())
        );
    }

    #[test]
    fn parses_path_resource() {
        assert_eq!(
            " data/mass_shootings.csv ".parse::<Resource>().unwrap(),
            Resource::Path(PathBuf::from("data/mass_shootings.csv"))
        );
    }

    #[tokio::test]
    async fn fetch_text_reads_local_file() {
        let path = std::env::temp_dir().join(format!(
            "shooting_map_scraper_fetch_{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let client = build_client().unwrap();
        let text = fetch_text(&client, &Resource::Path(path.clone()))
            .await
            .unwrap();
        assert_eq!(text, "a,b\n1,2\n");

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn fetch_text_missing_file_is_io_error() {
        let client = build_client().unwrap();
        let err = fetch_text(
            &client,
            &Resource::Path(PathBuf::from("/definitely/not/here.csv")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::Io(_)));
    }
}
