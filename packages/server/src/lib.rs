#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the shooting map dashboard.
//!
//! Serves the cached incidents and their aggregates as JSON under `/api`,
//! accepts new incidents from the add-record form, and serves a single
//! HTML dashboard page at `/`. Incidents are read from the snapshot
//! written by `shooting_map_ingest`; the server never scrapes.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use shooting_map_database::snapshot::Snapshot;
use shooting_map_database::store::RecordStore;
use shooting_map_geocoder::Geocoder;
use shooting_map_geocoder::nominatim::NominatimGeocoder;
use shooting_map_geocoder::orchestrator::{GeocodeOptions, GeocodingOrchestrator};
use shooting_map_geocoder::service_registry;
use shooting_map_incident_models::{PopulationTable, RecordSet};
use shooting_map_scraper::census::{CensusLayout, fetch_population};
use tokio::sync::Mutex;

/// Shared application state.
pub struct AppState<G: Geocoder = NominatimGeocoder> {
    /// Cached incidents and the snapshot they persist to.
    pub store: RecordStore,
    /// Geocoder for the add-record form. One request in flight at a time.
    pub geocoder: Mutex<GeocodingOrchestrator<G>>,
    /// State populations for per-capita rates. Empty if the census could
    /// not be loaded.
    pub population: PopulationTable,
}

/// Registers every route on `cfg`.
pub fn configure<G: Geocoder + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health::<G>))
            .route("/incidents", web::get().to(handlers::incidents::<G>))
            .route("/incidents", web::post().to(handlers::add_incident::<G>))
            .route("/stats/summary", web::get().to(handlers::summary::<G>))
            .route("/stats/states", web::get().to(handlers::states::<G>))
            .route("/stats/months", web::get().to(handlers::months::<G>))
            .route("/stats/weekdays", web::get().to(handlers::weekdays::<G>)),
    )
    .route("/", web::get().to(handlers::index));
}

fn load_records(snapshot: &Snapshot) -> std::io::Result<RecordSet> {
    if !snapshot.exists() {
        log::warn!(
            "No cache at {}; run `shooting_map_ingest ingest` first. Starting empty.",
            snapshot.path().display()
        );
        return Ok(RecordSet::default());
    }
    let records = snapshot.load().map_err(std::io::Error::other)?;
    log::info!(
        "Loaded {} incidents from {}",
        records.len(),
        snapshot.path().display()
    );
    Ok(records)
}

async fn load_population() -> PopulationTable {
    let client = match shooting_map_scraper::build_client() {
        Ok(client) => client,
        Err(e) => {
            log::warn!("Cannot build HTTP client for census download: {e}");
            return PopulationTable::default();
        }
    };
    match fetch_population(&client, &CensusLayout::embedded()).await {
        Ok(population) => {
            log::info!("Loaded population for {} states", population.len());
            population
        }
        Err(e) => {
            log::warn!("Census population unavailable, per-state rates disabled: {e}");
            PopulationTable::default()
        }
    }
}

/// Starts the shooting map server.
///
/// Loads the incident snapshot and the census population table, builds
/// the geocoder from the service registry, and starts the Actix-Web HTTP
/// server. This is a regular async function; the caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the snapshot cannot be read, no
/// geocoding service is enabled, or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let snapshot = Snapshot::default_location();
    let records = load_records(&snapshot)?;

    log::info!("Loading census population...");
    let population = load_population().await;

    let service = service_registry::default_service()
        .ok_or_else(|| std::io::Error::other("no geocoding service enabled"))?;
    let geocoder = NominatimGeocoder::from_service(&service).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState {
        store: RecordStore::new(snapshot, records),
        geocoder: Mutex::new(GeocodingOrchestrator::new(
            geocoder,
            GeocodeOptions::from_service(&service),
        )),
        population,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure::<NominatimGeocoder>)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
