//! Census population reference.
//!
//! Loads per-state population from the Census Bureau estimates CSV. The
//! file mixes national and regional rows with state rows, so which rows and
//! columns to read is described by a [`CensusLayout`], embedded from
//! `census.toml` by default.

use serde::Deserialize;
use shooting_map_incident_models::PopulationTable;

use crate::{Resource, ScrapeError};

/// Embedded default layout.
const CENSUS_TOML: &str = include_str!("../census.toml");

/// Errors from loading the population table.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    /// The resource could not be fetched.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// The CSV itself is malformed.
    #[error("census CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No state row yielded a usable population.
    #[error("census data contains no usable state rows")]
    Empty,
}

/// Where the state rows live inside the census CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct CensusLayout {
    /// URL or path of the CSV.
    pub resource: String,
    /// Leading rows to skip, header included.
    pub skip_rows: usize,
    /// Number of rows to read after skipping.
    pub take_rows: usize,
    /// Zero-based column holding the state name.
    pub name_column: usize,
    /// Zero-based column holding the population figure.
    pub population_column: usize,
}

impl CensusLayout {
    /// Returns the embedded default layout.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `census.toml` is malformed.
    #[must_use]
    pub fn embedded() -> Self {
        toml::from_str(CENSUS_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded census.toml: {e}"))
    }
}

/// Parses the state rows of a census CSV into a [`PopulationTable`].
///
/// State names are stripped of leading and trailing `.` (the spreadsheet
/// variant of the file prefixes them). Rows with a missing or unparseable
/// population are skipped.
///
/// # Errors
///
/// Returns [`CensusError`] if the CSV is malformed or no row is usable.
pub fn parse_population(text: &str, layout: &CensusLayout) -> Result<PopulationTable, CensusError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut table = Vec::with_capacity(layout.take_rows);

    for result in reader
        .records()
        .skip(layout.skip_rows)
        .take(layout.take_rows)
    {
        let record = result?;

        let Some(name) = record
            .get(layout.name_column)
            .map(|n| n.trim().trim_matches('.').trim())
            .filter(|n| !n.is_empty())
        else {
            continue;
        };

        let Some(population) = record
            .get(layout.population_column)
            .and_then(|p| p.trim().replace(',', "").parse::<u64>().ok())
        else {
            log::debug!("Skipping census row for {name}: no population");
            continue;
        };

        table.push((name.to_owned(), population));
    }

    if table.is_empty() {
        return Err(CensusError::Empty);
    }

    Ok(table.into_iter().collect())
}

/// Fetches and parses the population table described by `layout`.
///
/// # Errors
///
/// Returns [`CensusError`] if the resource cannot be loaded or parsed.
pub async fn fetch_population(
    client: &reqwest::Client,
    layout: &CensusLayout,
) -> Result<PopulationTable, CensusError> {
    let Ok(resource) = layout.resource.parse::<Resource>();
    let text = crate::fetch_text(client, &resource).await?;
    let table = parse_population(&text, layout)?;
    log::info!("Loaded population for {} states", table.len());
    Ok(table)
}
