#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the shooting incident ingestion tool.

use clap::{Parser, Subcommand};
use shooting_map_cli_utils::IndicatifProgress;
use shooting_map_database::snapshot::Snapshot;
use shooting_map_geocoder::nominatim::NominatimGeocoder;
use shooting_map_geocoder::orchestrator::{GeocodeOptions, GeocodingOrchestrator};
use shooting_map_geocoder::service_registry;
use shooting_map_ingest::pipeline::Pipeline;
use shooting_map_ingest::registry::{all_sources, find_source, selected_source_id};
use shooting_map_ingest::{IngestError, form};
use shooting_map_ingest_models::{IngestOptions, IngestOutcome, RecordForm};
use shooting_map_scraper::census::{CensusLayout, fetch_population};

#[derive(Parser)]
#[command(name = "shooting_map_ingest", about = "Mass shooting data ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, clean, geocode and cache incidents from a source
    Ingest {
        /// Source identifier (overrides `SHOOTING_MAP_SOURCE` env var)
        #[arg(long)]
        source: Option<String>,
        /// URL or file path to read instead of the source's default
        #[arg(long)]
        resource: Option<String>,
        /// Delete the existing cache before running
        #[arg(long)]
        refresh: bool,
        /// Skip geocoding; coordinates stay empty unless the source has them
        #[arg(long)]
        no_geocode: bool,
    },
    /// List all configured data sources
    Sources,
    /// Print aggregate statistics for the cached incidents
    Stats {
        /// Skip the census download and per-state rates
        #[arg(long)]
        no_rates: bool,
    },
    /// Add a single incident to the cache
    Add {
        /// Incident date (e.g. "2021-05-01" or "May 1, 2021")
        #[arg(long)]
        date: String,
        /// Street address
        #[arg(long)]
        address: String,
        /// Number of people injured
        #[arg(long)]
        injured: String,
        /// Number of people killed
        #[arg(long)]
        killed: String,
    },
}

fn geocoder() -> Result<GeocodingOrchestrator<NominatimGeocoder>, Box<dyn std::error::Error>> {
    let service = service_registry::default_service().ok_or("No geocoding service enabled")?;
    log::debug!("Geocoding with {} ({})", service.name, service.base_url());
    Ok(GeocodingOrchestrator::new(
        NominatimGeocoder::from_service(&service)?,
        GeocodeOptions::from_service(&service),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = shooting_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sources => {
            println!("{:<20} {:<12} NAME", "ID", "TYPE");
            println!("{}", "-".repeat(70));
            for source in &all_sources() {
                println!(
                    "{:<20} {:<12} {}",
                    source.id(),
                    source.fetcher_type(),
                    source.name()
                );
            }
        }
        Commands::Ingest {
            source,
            resource,
            refresh,
            no_geocode,
        } => {
            let options = IngestOptions {
                source_id: selected_source_id(source),
                resource,
                refresh,
                geocode: !no_geocode,
            };
            let source = find_source(&options.source_id)
                .ok_or_else(|| IngestError::UnknownSource(options.source_id.clone()))?;

            let client = shooting_map_scraper::build_client()?;
            let snapshot = Snapshot::default_location();
            let mut geocoder = geocoder()?;

            let mut pipeline = Pipeline {
                client: &client,
                snapshot: &snapshot,
                geocoder: &mut geocoder,
                progress: IndicatifProgress::batch_bar(&multi, "Geocoding"),
            };

            match pipeline.run(&source, &options).await? {
                IngestOutcome::Cached { records } => {
                    log::info!(
                        "Cache already present ({} records); pass --refresh to re-fetch",
                        records.len()
                    );
                }
                IngestOutcome::Ingested {
                    records,
                    rejected,
                    geocoded,
                    ..
                } => {
                    let dropped: u64 = rejected.values().sum();
                    log::info!(
                        "Ingested {} records from {} ({dropped} rows dropped, {geocoded} geocoded)",
                        records.len(),
                        source.id()
                    );
                }
            }
        }
        Commands::Stats { no_rates } => {
            let snapshot = Snapshot::default_location();
            if !snapshot.exists() {
                return Err(format!(
                    "No cache at {}; run `ingest` first",
                    snapshot.path().display()
                )
                .into());
            }
            let records = snapshot.load()?;
            print_stats(&records, no_rates).await?;
        }
        Commands::Add {
            date,
            address,
            injured,
            killed,
        } => {
            let snapshot = Snapshot::default_location();
            let mut records = if snapshot.exists() {
                snapshot.load()?
            } else {
                shooting_map_incident_models::RecordSet::default()
            };
            let mut geocoder = geocoder()?;
            let form = RecordForm {
                date,
                address,
                injured,
                killed,
            };
            let record = form::add_record(&form, &mut records, &mut geocoder, &snapshot).await?;
            println!(
                "Added {} at {} ({} records cached)",
                record.occurred_on,
                record.location,
                records.len()
            );
        }
    }

    Ok(())
}

async fn print_stats(
    records: &shooting_map_incident_models::RecordSet,
    no_rates: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = shooting_map_analytics::summary(records);
    println!(
        "{} incidents, {} dead, {} injured, {} geocoded",
        summary.incidents, summary.dead, summary.injured, summary.geocoded
    );
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("{first} to {last}");
    }

    println!();
    println!("{:<12} SHOOTINGS", "MONTH");
    println!("{}", "-".repeat(24));
    for row in shooting_map_analytics::shootings_by_month(records) {
        println!("{:<12} {}", row.month, row.shootings);
    }

    println!();
    println!("{:<12} SHOOTINGS", "WEEKDAY");
    println!("{}", "-".repeat(24));
    for row in shooting_map_analytics::shootings_by_weekday(records) {
        println!("{:<12} {}", row.weekday, row.shootings);
    }

    if no_rates {
        return Ok(());
    }

    let client = shooting_map_scraper::build_client()?;
    let population = fetch_population(&client, &CensusLayout::embedded()).await?;

    println!();
    println!("{:<22} {:>10} {:>14}", "STATE", "DEAD", "DEATHS PER 1M");
    println!("{}", "-".repeat(48));
    for row in shooting_map_analytics::rates_per_state(records, &population) {
        println!(
            "{:<22} {:>10} {:>14.3}",
            row.state, row.dead, row.deaths_per_1m
        );
    }

    Ok(())
}
