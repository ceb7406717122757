//! HTML table scraper.
//!
//! Fetches an HTML page, selects every table matching a CSS selector (by
//! default Wikipedia's `table.wikitable`), and extracts each body row into
//! a [`serde_json::Value`] object keyed by that table's header cells.
//! Tables from all matches are concatenated in document order.
//!
//! Cells spanning several rows or columns are copied into every position
//! they cover, so a shared date or location lines up with the right header
//! in each row.

use scraper::{ElementRef, Html, Selector};

use crate::{Resource, ScrapeError, Scraper};

/// Scraper that extracts records from one or more HTML tables on a page.
#[derive(Debug, Clone)]
pub struct HtmlTableScraper {
    /// Page to scrape.
    resource: Resource,
    /// CSS selector for the target table elements.
    table_selector: String,
    /// CSS selector for header cells inside a table.
    header_selector: String,
    /// CSS selector for rows inside a table.
    row_selector: String,
    /// CSS selector for data cells within a row.
    cell_selector: String,
    /// Tables with any of these headers are skipped (e.g. yearly summary
    /// tables mixed in with the incident tables).
    skip_tables_with_header: Vec<String>,
}

impl HtmlTableScraper {
    /// Creates a new `HtmlTableScraper` for the given page with the default
    /// Wikipedia selectors.
    #[must_use]
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            table_selector: "table.wikitable".to_owned(),
            header_selector: "tr th".to_owned(),
            row_selector: "tr".to_owned(),
            cell_selector: "td".to_owned(),
            skip_tables_with_header: Vec::new(),
        }
    }

    /// Overrides the CSS selector used to locate table elements.
    #[must_use]
    pub fn with_table_selector(mut self, selector: &str) -> Self {
        selector.clone_into(&mut self.table_selector);
        self
    }

    /// Overrides the CSS selector used to locate header cells.
    #[must_use]
    pub fn with_header_selector(mut self, selector: &str) -> Self {
        selector.clone_into(&mut self.header_selector);
        self
    }

    /// Overrides the CSS selector used to locate rows.
    #[must_use]
    pub fn with_row_selector(mut self, selector: &str) -> Self {
        selector.clone_into(&mut self.row_selector);
        self
    }

    /// Overrides the CSS selector used to locate cells within a row.
    #[must_use]
    pub fn with_cell_selector(mut self, selector: &str) -> Self {
        selector.clone_into(&mut self.cell_selector);
        self
    }

    /// Skips any table that has a header cell equal to `header`.
    #[must_use]
    pub fn skip_tables_with_header(mut self, header: &str) -> Self {
        self.skip_tables_with_header.push(header.to_owned());
        self
    }

    /// Parses every matching table in an HTML document.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a selector is invalid or no table
    /// matches.
    pub fn parse(&self, html: &str) -> Result<Vec<serde_json::Value>, ScrapeError> {
        let document = Html::parse_document(html);

        let table_sel = parse_selector(&self.table_selector)?;
        let header_sel = parse_selector(&self.header_selector)?;
        let row_sel = parse_selector(&self.row_selector)?;
        let cell_sel = parse_selector(&self.cell_selector)?;

        let tables: Vec<ElementRef<'_>> = document.select(&table_sel).collect();
        if tables.is_empty() {
            return Err(ScrapeError::Parse(format!(
                "no element matching '{}' found in document",
                self.table_selector
            )));
        }

        let mut records = Vec::new();

        for (index, table) in tables.into_iter().enumerate() {
            let headers: Vec<String> = table.select(&header_sel).map(cell_text).collect();

            if headers.is_empty() {
                log::debug!("Table {index}: no header cells, skipping");
                continue;
            }

            if headers
                .iter()
                .any(|h| self.skip_tables_with_header.contains(h))
            {
                log::debug!("Table {index}: skipped by header filter ({headers:?})");
                continue;
            }

            let before = records.len();
            let mut carried: Vec<Option<Carried>> = Vec::new();

            for row in table.select(&row_sel) {
                let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();

                // Header rows have no data cells.
                if cells.is_empty() {
                    continue;
                }

                let cells = expand_row(&cells, &mut carried);

                let mut map = serde_json::Map::new();
                for (i, header) in headers.iter().enumerate() {
                    let value = cells.get(i).cloned().unwrap_or_default();
                    map.insert(header.clone(), serde_json::Value::String(value));
                }
                records.push(serde_json::Value::Object(map));
            }

            log::debug!("Table {index}: {} rows", records.len() - before);
        }

        Ok(records)
    }
}

impl Scraper for HtmlTableScraper {
    async fn fetch_rows(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<serde_json::Value>, ScrapeError> {
        let body = crate::fetch_text(client, &self.resource).await?;
        let records = self.parse(&body)?;
        log::info!("Parsed {} table rows from {}", records.len(), self.resource);
        Ok(records)
    }

    fn strategy(&self) -> &'static str {
        "html_table"
    }
}

/// A cell still covering `remaining` rows below the current one.
#[derive(Debug, Clone)]
struct Carried {
    text: String,
    remaining: usize,
}

/// Lays out one row's cells by column, filling positions still covered by
/// a `rowspan` from an earlier row and repeating `colspan` cells.
fn expand_row(cells: &[ElementRef<'_>], carried: &mut Vec<Option<Carried>>) -> Vec<String> {
    let mut out = Vec::new();
    let mut cells = cells.iter();

    loop {
        if let Some(text) = take_carried(carried, out.len()) {
            out.push(text);
            continue;
        }

        let Some(cell) = cells.next() else {
            break;
        };

        let text = cell_text(*cell);
        let rowspan = span(*cell, "rowspan");
        for _ in 0..span(*cell, "colspan") {
            let col = out.len();
            if rowspan > 1 {
                if carried.len() <= col {
                    carried.resize(col + 1, None);
                }
                carried[col] = Some(Carried {
                    text: text.clone(),
                    remaining: rowspan - 1,
                });
            }
            out.push(text.clone());
        }
    }

    // Spans still open past this row's last cell.
    while out.len() < carried.len() {
        let text = take_carried(carried, out.len()).unwrap_or_default();
        out.push(text);
    }

    out
}

/// Takes one row's worth of the span covering `col`, if any.
fn take_carried(carried: &mut [Option<Carried>], col: usize) -> Option<String> {
    let slot = carried.get_mut(col)?;
    let cell = slot.as_mut()?;
    cell.remaining -= 1;
    if cell.remaining == 0 {
        slot.take().map(|cell| cell.text)
    } else {
        Some(cell.text.clone())
    }
}

/// Value of a `rowspan`/`colspan` attribute, at least 1.
fn span(el: ElementRef<'_>, attr: &str) -> usize {
    el.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// Guards against absurd span values in malformed markup.
const MAX_SPAN: usize = 1000;

/// Concatenated, trimmed text content of a cell.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join("").trim().to_owned()
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}
