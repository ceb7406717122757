//! HTTP handler functions for the shooting map API.

use actix_web::{HttpResponse, web};
use shooting_map_geocoder::Geocoder;
use shooting_map_ingest::form::{self, FormError};
use shooting_map_ingest_models::RecordForm;
use shooting_map_server_models::{ApiError, ApiHealth, ApiIncident, IncidentQueryParams};

use crate::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// `GET /api/health`
pub async fn health<G: Geocoder>(state: web::Data<AppState<G>>) -> HttpResponse {
    let incidents = state.store.lock().await.len();
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        incidents,
    })
}

/// `GET /api/incidents`
///
/// Lists cached incidents in snapshot order, filtered by state, date
/// range and geocoding status.
pub async fn incidents<G: Geocoder>(
    state: web::Data<AppState<G>>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let records = state.store.lock().await;
    let incidents: Vec<ApiIncident> = records
        .iter()
        .filter(|r| params.matches(r))
        .skip(params.offset.unwrap_or(0))
        .take(params.limit.unwrap_or(usize::MAX))
        .map(ApiIncident::from)
        .collect();
    drop(records);

    HttpResponse::Ok().json(incidents)
}

/// `POST /api/incidents`
///
/// Adds one incident from the dashboard form. Validation and address
/// problems are reported as 422 with the message in `error`.
pub async fn add_incident<G: Geocoder>(
    state: web::Data<AppState<G>>,
    body: web::Json<RecordForm>,
) -> HttpResponse {
    let mut records = state.store.lock().await;
    let mut geocoder = state.geocoder.lock().await;

    let result = form::add_record(&body, &mut records, &mut geocoder, state.store.snapshot()).await;
    drop(geocoder);
    drop(records);

    match result {
        Ok(record) => HttpResponse::Created().json(ApiIncident::from(&record)),
        Err(e @ FormError::Persist(_)) => {
            log::error!("Failed to persist new incident: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e))
        }
        Err(e) => {
            log::debug!("Rejected form submission: {e}");
            HttpResponse::UnprocessableEntity().json(ApiError::new(e))
        }
    }
}

/// `GET /api/stats/summary`
pub async fn summary<G: Geocoder>(state: web::Data<AppState<G>>) -> HttpResponse {
    let summary = shooting_map_analytics::summary(&*state.store.lock().await);
    HttpResponse::Ok().json(summary)
}

/// `GET /api/stats/states`
///
/// Victims and deaths per million residents for every state with both
/// incidents and a census population.
pub async fn states<G: Geocoder>(state: web::Data<AppState<G>>) -> HttpResponse {
    let rates =
        shooting_map_analytics::rates_per_state(&*state.store.lock().await, &state.population);
    HttpResponse::Ok().json(rates)
}

/// `GET /api/stats/months`
pub async fn months<G: Geocoder>(state: web::Data<AppState<G>>) -> HttpResponse {
    let months = shooting_map_analytics::shootings_by_month(&*state.store.lock().await);
    HttpResponse::Ok().json(months)
}

/// `GET /api/stats/weekdays`
pub async fn weekdays<G: Geocoder>(state: web::Data<AppState<G>>) -> HttpResponse {
    let weekdays = shooting_map_analytics::shootings_by_weekday(&*state.store.lock().await);
    HttpResponse::Ok().json(weekdays)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use shooting_map_database::snapshot::Snapshot;
    use shooting_map_database::store::RecordStore;
    use shooting_map_geocoder::orchestrator::{GeocodeOptions, GeocodingOrchestrator};
    use shooting_map_geocoder::{GeocodeError, GeocodedAddress};
    use shooting_map_incident_models::{NormalizedRecord, PopulationTable, RecordSet};
    use tokio::sync::Mutex;

    use super::*;
    use crate::configure;

    /// Places `Toronto` in Canada and everything else in Texas.
    struct FakeGeocoder;

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
            let (state, country) = if query.contains("Toronto") {
                ("Ontario", "Canada")
            } else {
                ("Texas", "United States")
            };
            Ok(Some(GeocodedAddress {
                latitude: 30.27,
                longitude: -97.74,
                display_name: Some(query.to_string()),
                state: Some(state.to_string()),
                country: Some(country.to_string()),
            }))
        }
    }

    fn record(date: (i32, u32, u32), location: &str, state: &str, dead: u32) -> NormalizedRecord {
        NormalizedRecord {
            occurred_on: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            location: location.to_string(),
            state: Some(state.to_string()),
            dead,
            injured: 3,
            total: dead + 3,
            latitude: None,
            longitude: None,
        }
    }

    fn app_state(name: &str) -> web::Data<AppState<FakeGeocoder>> {
        let dir = std::env::temp_dir().join(format!(
            "shooting_map_server_{}_{name}",
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();

        let records: RecordSet = vec![
            record((2019, 8, 3), "El Paso, Texas", "Texas", 23),
            record((2019, 8, 4), "Dayton, Ohio", "Ohio", 9),
        ]
        .into_iter()
        .collect();

        web::Data::new(AppState {
            store: RecordStore::new(Snapshot::at(dir.join("shootings.csv")), records),
            geocoder: Mutex::new(GeocodingOrchestrator::new(
                FakeGeocoder,
                GeocodeOptions {
                    min_interval: Duration::ZERO,
                    fallback: false,
                },
            )),
            population: [
                ("Texas".to_string(), 29_000_000),
                ("Ohio".to_string(), 11_700_000),
            ]
            .into_iter()
            .collect::<PopulationTable>(),
        })
    }

    fn form(date: &str, address: &str, injured: &str, killed: &str) -> RecordForm {
        RecordForm {
            date: date.to_string(),
            address: address.to_string(),
            injured: injured.to_string(),
            killed: killed.to_string(),
        }
    }

    #[actix_web::test]
    async fn serves_dashboard_page() {
        let app = test::init_service(
            App::new()
                .app_data(app_state("index"))
                .configure(configure::<FakeGeocoder>),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("<form"));
    }

    #[actix_web::test]
    async fn health_reports_incident_count() {
        let app = test::init_service(
            App::new()
                .app_data(app_state("health"))
                .configure(configure::<FakeGeocoder>),
        )
        .await;
        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["incidents"], 2);
    }

    #[actix_web::test]
    async fn lists_incidents_filtered_by_state() {
        let app = test::init_service(
            App::new()
                .app_data(app_state("list"))
                .configure(configure::<FakeGeocoder>),
        )
        .await;
        let body: Vec<ApiIncident> = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/incidents?state=Ohio")
                .to_request(),
        )
        .await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].location, "Dayton, Ohio");
    }

    #[actix_web::test]
    async fn serves_aggregates() {
        let app = test::init_service(
            App::new()
                .app_data(app_state("stats"))
                .configure(configure::<FakeGeocoder>),
        )
        .await;

        let states: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/stats/states").to_request(),
        )
        .await;
        assert_eq!(states.as_array().unwrap().len(), 2);
        assert_eq!(states[0]["state"], "Ohio");
        assert_eq!(states[1]["dead"], 23);

        let months: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/stats/months").to_request(),
        )
        .await;
        assert_eq!(months[0]["month"], "August");
        assert_eq!(months[0]["shootings"], 2);

        let weekdays: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/stats/weekdays").to_request(),
        )
        .await;
        // 2019-08-03 was a Saturday, 2019-08-04 a Sunday.
        assert_eq!(weekdays[0]["weekday"], "Saturday");
        assert_eq!(weekdays[1]["weekday"], "Sunday");

        let summary: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/stats/summary").to_request(),
        )
        .await;
        assert_eq!(summary["incidents"], 2);
        assert_eq!(summary["dead"], 32);
    }

    #[actix_web::test]
    async fn adding_incident_persists_it() {
        let state = app_state("add");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(configure::<FakeGeocoder>),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/incidents")
                .set_json(form("2021-05-01", "100 Congress Ave, Austin", "3", "1"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: ApiIncident = test::read_body_json(resp).await;
        assert_eq!(created.state.as_deref(), Some("Texas"));
        assert_eq!(created.total, 4);

        assert_eq!(state.store.lock().await.len(), 3);
        let saved = state.store.snapshot().load().unwrap();
        assert_eq!(saved.len(), 3);
    }

    #[actix_web::test]
    async fn invalid_form_is_unprocessable_and_not_saved() {
        let state = app_state("invalid");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(configure::<FakeGeocoder>),
        )
        .await;

        for (body, message) in [
            (form("", "Austin, Texas", "3", "1"), "date is required"),
            (
                form("2021-05-01", "Austin, Texas", "three", "1"),
                "injured must be a whole number",
            ),
            (
                form("2021-05-01", "1 Yonge St, Toronto", "3", "1"),
                "outside the United States",
            ),
        ] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/api/incidents")
                    .set_json(body)
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let error: ApiError = test::read_body_json(resp).await;
            assert!(error.error.contains(message), "{}", error.error);
        }

        assert_eq!(state.store.lock().await.len(), 2);
        assert!(!state.store.snapshot().exists());
    }

    #[actix_web::test]
    async fn adding_incident_keeps_records_saved_by_cli() {
        let state = app_state("reload");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(configure::<FakeGeocoder>),
        )
        .await;

        let cli_records: RecordSet = vec![
            record((2021, 1, 1), "Austin, Texas", "Texas", 1),
            record((2021, 1, 2), "Waco, Texas", "Texas", 2),
            record((2021, 1, 3), "Dayton, Ohio", "Ohio", 3),
        ]
        .into_iter()
        .collect();
        Snapshot::at(state.store.snapshot().path())
            .save(&cli_records)
            .unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/incidents")
                .set_json(form("2021-05-01", "100 Congress Ave, Austin", "3", "1"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let saved = state.store.snapshot().load().unwrap();
        assert_eq!(saved.len(), 4);
        assert_eq!(saved.records()[..3], cli_records.records()[..]);
        assert_eq!(*state.store.lock().await, saved);
    }
}
