//! Source registry: loads all source definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/ingest/sources/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a new source is as simple as
//! creating a new TOML file and adding it to the list below.

use shooting_map_ingest_models::{DEFAULT_SOURCE, SOURCE_ENV};

use crate::source_def::{SourceDefinition, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("wikipedia", include_str!("../sources/wikipedia.toml")),
    ("gva_csv", include_str!("../sources/gva_csv.toml")),
];

/// Total number of configured sources (used in tests).
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 2;

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a source by id.
#[must_use]
pub fn find_source(id: &str) -> Option<SourceDefinition> {
    all_sources().into_iter().find(|s| s.id() == id)
}

/// Picks the active source id: the CLI flag, then the `SHOOTING_MAP_SOURCE`
/// environment variable, then the default.
#[must_use]
pub fn selected_source_id(cli: Option<String>) -> String {
    cli.or_else(|| std::env::var(SOURCE_ENV).ok())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::source_def::{FetcherConfig, LocationExtractor};

    #[test]
    fn loads_all_sources() {
        assert_eq!(all_sources().len(), EXPECTED_SOURCE_COUNT);
    }

    #[test]
    fn source_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for source in &all_sources() {
            assert!(seen.insert(source.id.clone()), "Duplicate source ID: {}", source.id);
        }
    }

    #[test]
    fn embedded_file_names_match_ids() {
        for (name, toml) in SOURCE_TOMLS {
            assert_eq!(parse_source_toml(toml).unwrap().id, *name);
        }
    }

    #[test]
    fn default_source_is_registered() {
        let source = find_source(DEFAULT_SOURCE).unwrap();
        assert!(matches!(
            source.fetcher,
            FetcherConfig::HtmlTable { ref skip_tables_with_header, .. }
                if skip_tables_with_header.iter().any(|h| h == "Events")
        ));
        assert!(source.fields.total.is_some());
    }

    #[test]
    fn csv_source_composes_location() {
        let source = find_source("gva_csv").unwrap();
        assert_eq!(source.fetcher_type(), "csv");
        assert!(matches!(source.fields.location, LocationExtractor::Combine(ref f) if f.len() == 3));
        assert!(source.fields.total.is_none());
    }

    #[test]
    fn cli_flag_wins_over_default() {
        assert_eq!(selected_source_id(Some(" gva_csv ".to_string())), "gva_csv");
    }

    #[test]
    fn unknown_source_is_none() {
        assert!(find_source("nope").is_none());
    }
}
