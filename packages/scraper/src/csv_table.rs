//! CSV table loader.
//!
//! Loads a CSV file from a URL or local path and returns every row as a
//! [`serde_json::Value`] object keyed by the column headers in the first
//! row.

use crate::{Resource, ScrapeError, Scraper};

/// Scraper that loads and parses a CSV file.
#[derive(Debug, Clone)]
pub struct CsvTableScraper {
    /// File to load.
    resource: Resource,
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
    /// Optional cap on the number of records to parse.
    max_records: Option<u64>,
}

impl CsvTableScraper {
    /// Creates a new `CsvTableScraper` with default settings
    /// (comma-delimited, no record limit).
    #[must_use]
    pub const fn new(resource: Resource) -> Self {
        Self {
            resource,
            delimiter: b',',
            max_records: None,
        }
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Limits the number of records that will be parsed from the file.
    #[must_use]
    pub const fn with_max_records(mut self, max: u64) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Parses CSV text into header-keyed row objects.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the CSV is malformed or has no header row.
    pub fn parse(&self, text: &str) -> Result<Vec<serde_json::Value>, ScrapeError> {
        parse_csv(text, self.delimiter, self.max_records)
    }
}

impl Scraper for CsvTableScraper {
    async fn fetch_rows(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<serde_json::Value>, ScrapeError> {
        let body = crate::fetch_text(client, &self.resource).await?;
        log::debug!("Loaded {} bytes from {}", body.len(), self.resource);

        let records = self.parse(&body)?;
        log::info!("Parsed {} CSV rows from {}", records.len(), self.resource);
        Ok(records)
    }

    fn strategy(&self) -> &'static str {
        "csv"
    }
}

/// Parses CSV text, keying every field by its trimmed header.
///
/// Short rows are padded with empty strings.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the CSV is malformed or has no header row.
pub fn parse_csv(
    text: &str,
    delimiter: u8,
    max_records: Option<u64>,
) -> Result<Vec<serde_json::Value>, ScrapeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(ScrapeError::Parse(
            "CSV file contains no header row".to_owned(),
        ));
    }

    let mut records = Vec::new();

    for result in reader.records() {
        let record = result?;

        let mut map = serde_json::Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").trim().to_owned();
            map.insert(header.clone(), serde_json::Value::String(value));
        }
        records.push(serde_json::Value::Object(map));

        if let Some(max) = max_records
            && records.len() as u64 >= max
        {
            log::debug!("Reached max_records limit ({max})");
            break;
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GVA: &str = "\
incident_id,date,state,city_or_county,address,n_killed,n_injured,latitude,longitude
461105,2013-01-01,Pennsylvania,Mckeesport,1506 Versailles Avenue and Coursin Street,0,4,40.3467,-79.8559
460726,2013-01-01,California,Hawthorne,13500 block of Cerise Avenue,1,3,33.909,-118.333
478855,2013-01-01,Ohio,Lorain,1776 East 28th Street,1,3
";

    #[test]
    fn keys_rows_by_header() {
        let rows = parse_csv(GVA, b',', None).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["state"], "Pennsylvania");
        assert_eq!(rows[1]["n_killed"], "1");
        assert_eq!(rows[1]["longitude"], "-118.333");
    }

    #[test]
    fn pads_short_rows() {
        let rows = parse_csv(GVA, b',', None).unwrap();
        assert_eq!(rows[2]["latitude"], "");
        assert_eq!(rows[2]["longitude"], "");
    }

    #[test]
    fn honors_max_records() {
        let rows = parse_csv(GVA, b',', Some(2)).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn parses_tab_delimited() {
        let rows = CsvTableScraper::new(Resource::Url("https://example.org/x.tsv".to_string()))
            .with_delimiter(b'\t')
            .parse("Date\tLocation\nMay 1, 2020\tAustin, Texas\n")
            .unwrap();
        assert_eq!(rows[0]["Location"], "Austin, Texas");
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = parse_csv("", b',', None).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }
}
