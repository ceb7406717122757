//! Config-driven incident source definition.
//!
//! [`SourceDefinition`] captures everything unique about an incident table:
//! where it lives, how to scrape it, and which columns feed which
//! [`RawRecord`] fields. One generic implementation serves every source.

use serde::Deserialize;
use shooting_map_incident_models::RawRecord;
use shooting_map_normalize::location::compose_location;
use shooting_map_scraper::csv_table::CsvTableScraper;
use shooting_map_scraper::html_table::HtmlTableScraper;
use shooting_map_scraper::{Resource, ScrapeError, Scraper as _};

// ── Top-level source definition ──────────────────────────────────────────

/// A complete, config-driven incident source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"wikipedia"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// URL or file path of the table.
    pub resource: String,
    /// How to scrape the table.
    pub fetcher: FetcherConfig,
    /// Column name mappings.
    pub fields: FieldMapping,
}

impl SourceDefinition {
    /// Returns the source's unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fetcher type name (e.g., `"html_table"`).
    #[must_use]
    pub const fn fetcher_type(&self) -> &'static str {
        match self.fetcher {
            FetcherConfig::HtmlTable { .. } => "html_table",
            FetcherConfig::Csv { .. } => "csv",
        }
    }

    /// Fetches every row of the table, keyed by column header.
    ///
    /// `resource` replaces the configured resource when given.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the table cannot be loaded or parsed.
    pub async fn fetch_rows(
        &self,
        client: &reqwest::Client,
        resource: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, ScrapeError> {
        let Ok(resource) = resource.unwrap_or(self.resource.as_str()).parse::<Resource>();
        log::info!("Fetching {} from {resource}", self.id);

        match &self.fetcher {
            FetcherConfig::HtmlTable {
                table_selector,
                skip_tables_with_header,
            } => {
                let mut scraper = HtmlTableScraper::new(resource);
                if let Some(selector) = table_selector {
                    scraper = scraper.with_table_selector(selector);
                }
                for header in skip_tables_with_header {
                    scraper = scraper.skip_tables_with_header(header);
                }
                scraper.fetch_rows(client).await
            }
            FetcherConfig::Csv {
                delimiter,
                max_records,
            } => {
                let mut scraper = CsvTableScraper::new(resource);
                if let Some(delimiter) = delimiter.as_deref().and_then(|d| d.bytes().next()) {
                    scraper = scraper.with_delimiter(delimiter);
                }
                if let Some(max) = max_records {
                    scraper = scraper.with_max_records(*max);
                }
                scraper.fetch_rows(client).await
            }
        }
    }
}

// ── Fetcher config ───────────────────────────────────────────────────────

/// How to scrape the source table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// Every matching HTML table on a page.
    HtmlTable {
        /// CSS selector for the tables (default `table.wikitable`).
        table_selector: Option<String>,
        /// Skip tables with any of these header cells.
        #[serde(default)]
        skip_tables_with_header: Vec<String>,
    },
    /// A CSV file with a header row.
    Csv {
        /// Field delimiter (default: comma).
        delimiter: Option<String>,
        /// Maximum records to read.
        max_records: Option<u64>,
    },
}

// ── Field mapping ────────────────────────────────────────────────────────

/// Maps source column names to [`RawRecord`] fields.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Column holding a source-assigned incident id.
    pub source_id: Option<String>,
    /// Date column.
    pub date: String,
    /// How to build the location text.
    pub location: LocationExtractor,
    /// Killed count column.
    pub dead: String,
    /// Injured count column.
    pub injured: String,
    /// Total victims column. When absent the total is derived.
    pub total: Option<String>,
    /// State column, for sources that carry one.
    pub state: Option<String>,
    /// Latitude column.
    pub latitude: Option<String>,
    /// Longitude column.
    pub longitude: Option<String>,
}

/// How to extract the location from a row.
///
/// Either a bare column name or a list of columns joined with `", "`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationExtractor {
    /// A single column (bare string in TOML: `location = "Location"`).
    Single(String),
    /// Non-blank values of several columns, in order.
    Combine(Vec<String>),
}

impl LocationExtractor {
    fn extract(&self, row: &serde_json::Value) -> String {
        match self {
            Self::Single(field) => text(row, field),
            Self::Combine(fields) => {
                let parts: Vec<String> = fields.iter().map(|f| text(row, f)).collect();
                let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                compose_location(&parts)
            }
        }
    }
}

impl FieldMapping {
    /// Maps one scraped row to a [`RawRecord`].
    ///
    /// Missing columns read as empty text; optional fields that come out
    /// empty become `None`.
    #[must_use]
    pub fn map_row(&self, row: &serde_json::Value) -> RawRecord {
        RawRecord {
            source_id: self.source_id.as_deref().and_then(|f| optional_text(row, f)),
            date: text(row, &self.date),
            location: self.location.extract(row),
            dead: text(row, &self.dead),
            injured: text(row, &self.injured),
            total: self.total.as_deref().and_then(|f| optional_text(row, f)),
            state: self.state.as_deref().and_then(|f| optional_text(row, f)),
            latitude: self.latitude.as_deref().and_then(|f| optional_text(row, f)),
            longitude: self.longitude.as_deref().and_then(|f| optional_text(row, f)),
        }
    }
}

/// Reads a field as text; numbers are formatted, anything else is empty.
fn text(row: &serde_json::Value, field: &str) -> String {
    match row.get(field) {
        Some(serde_json::Value::String(s)) => s.trim().to_owned(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn optional_text(row: &serde_json::Value, field: &str) -> Option<String> {
    Some(text(row, field)).filter(|s| !s.is_empty())
}

/// Parses a TOML string into a [`SourceDefinition`].
///
/// # Errors
///
/// Returns an error string if the TOML is malformed.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
