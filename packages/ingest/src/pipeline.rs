//! The ingest pipeline: fetch → parse → clean → filter → geocode → persist.
//!
//! Stages run strictly in order over the whole batch. A row that fails a
//! cleaning stage is dropped and counted; only a failed fetch or a failed
//! cache write aborts the run. An existing snapshot short-circuits
//! everything, so a cached run never touches the network.
//!
//! The snapshot's writer lock is held for the whole run. A second run that
//! overlaps waits, then finds the fresh cache; an `add` from another
//! process waits until the new snapshot is in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use shooting_map_database::snapshot::Snapshot;
use shooting_map_geocoder::Geocoder;
use shooting_map_geocoder::orchestrator::GeocodingOrchestrator;
use shooting_map_geocoder::throttle::Clock;
use shooting_map_incident_models::{RawRecord, RecordSet};
use shooting_map_ingest_models::progress::ProgressCallback;
use shooting_map_ingest_models::{IngestOptions, IngestOutcome, PipelineStage, StageCount};
use shooting_map_normalize::CleaningReport;
use shooting_map_normalize::stages::{clean_dates, clean_numbers, drop_unknown_injured};

use crate::IngestError;
use crate::source_def::SourceDefinition;

/// Collaborators for a pipeline run.
pub struct Pipeline<'a, G: Geocoder, C: Clock> {
    /// HTTP client for the source fetch.
    pub client: &'a reqwest::Client,
    /// Cache location.
    pub snapshot: &'a Snapshot,
    /// Geocoder used for records without coordinates.
    pub geocoder: &'a mut GeocodingOrchestrator<G, C>,
    /// Receives geocoding progress.
    pub progress: Arc<dyn ProgressCallback>,
}

#[derive(Default)]
struct StageLog {
    stages: Vec<StageCount>,
}

impl StageLog {
    fn record(&mut self, stage: PipelineStage, survivors: usize) {
        log::info!("{stage}: {survivors} records");
        self.stages.push(StageCount {
            stage,
            survivors: survivors as u64,
        });
    }
}

impl<G: Geocoder, C: Clock> Pipeline<'_, G, C> {
    /// Runs the pipeline for one source.
    ///
    /// With `options.refresh` the snapshot is deleted first. If a snapshot
    /// exists afterwards it is returned as [`IngestOutcome::Cached`]
    /// without fetching or geocoding. Holds the snapshot lock throughout.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the source cannot be fetched or the
    /// snapshot cannot be read or written.
    pub async fn run(
        &mut self,
        source: &SourceDefinition,
        options: &IngestOptions,
    ) -> Result<IngestOutcome, IngestError> {
        let _lock = self.snapshot.lock_async().await?;

        if options.refresh && self.snapshot.remove()? {
            log::info!("Refresh requested, cache deleted");
        }

        if self.snapshot.exists() {
            let records = self.snapshot.load()?;
            log::info!(
                "Loaded {} records from cache {}",
                records.len(),
                self.snapshot.path().display()
            );
            return Ok(IngestOutcome::Cached { records });
        }

        let mut trail = StageLog::default();
        let mut report = CleaningReport::default();

        let rows = source
            .fetch_rows(self.client, options.resource.as_deref())
            .await
            .map_err(IngestError::Fetch)?;
        trail.record(PipelineStage::Fetched, rows.len());

        let raw: Vec<RawRecord> = rows.iter().map(|row| source.fields.map_row(row)).collect();
        trail.record(PipelineStage::Parsed, raw.len());

        let dated = clean_dates(raw, &mut report);
        trail.record(PipelineStage::DateCleaned, dated.len());

        let known = drop_unknown_injured(dated, &mut report);
        trail.record(PipelineStage::FilteredUnknown, known.len());

        let cleaned = clean_numbers(known, &mut report);
        trail.record(PipelineStage::NumbersCleaned, cleaned.len());

        let severe = RecordSet::new(cleaned).apply_severity_filter();
        trail.record(PipelineStage::SeverityFiltered, severe.len());

        let records = if options.geocode {
            self.geocode(severe).await
        } else {
            severe
        };
        trail.record(PipelineStage::Geocoded, records.len());

        self.snapshot.save(&records)?;
        trail.record(PipelineStage::Persisted, records.len());

        for (reason, count) in report.iter() {
            log::info!("Dropped {count} rows: {reason}");
        }

        let geocoded = records.iter().filter(|r| r.coordinates().is_some()).count() as u64;

        Ok(IngestOutcome::Ingested {
            records,
            stages: trail.stages,
            rejected: report
                .iter()
                .map(|(reason, count)| (reason.to_string(), count))
                .collect::<BTreeMap<_, _>>(),
            geocoded,
        })
    }

    /// Resolves coordinates for every record that lacks them, one call at
    /// a time.
    async fn geocode(&mut self, records: RecordSet) -> RecordSet {
        let pending = records
            .iter()
            .filter(|r| r.coordinates().is_none())
            .count();
        self.progress.set_total(pending as u64);
        self.progress.set_message("Geocoding".to_string());

        let mut resolved = 0u64;
        let mut out = Vec::with_capacity(records.len());

        for record in records {
            if record.coordinates().is_some() {
                out.push(record);
                continue;
            }
            let coordinates = self.geocoder.resolve_location(&record.location).await;
            if coordinates.is_some() {
                resolved += 1;
            }
            self.progress.inc(1);
            out.push(record.with_coordinates(coordinates));
        }

        self.progress
            .finish(format!("Geocoded {resolved}/{pending} records"));
        log::info!("Geocoded {resolved}/{pending} records");

        RecordSet::new(out)
    }
}
