use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App};
use serde_json::json;

use vibecheck_api::db::trip_store::TripStore;
use vibecheck_api::models::venue::Venue;
use vibecheck_api::routes;
use vibecheck_api::services::catalog_service::normalize_venues;
use vibecheck_api::services::narrative_service::NarrativeService;
use vibecheck_api::state::AppState;

pub struct TestApp {
    pub state: web::Data<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_catalog(fixture_catalog())
    }

    pub fn with_catalog(catalog: Vec<Venue>) -> Self {
        let state = AppState::new(catalog, TripStore::in_memory(), NarrativeService::offline());
        Self {
            state: web::Data::new(state),
        }
    }

    pub fn create_app(&self) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::configure)
    }
}

/// A small Scottsdale catalog in the name-keyed file shape.
pub fn fixture_catalog() -> Vec<Venue> {
    let raw = json!({
        "0": {"name": "Snooze", "category": "brunch", "price_tier": 1, "vibes": ["Relax"], "area": "Old Town"},
        "1": {"name": "Hash Kitchen", "category": "brunch", "price_tier": "2", "vibes": ["party"], "area": "Old Town"},
        "2": {"name": "Maple & Ash", "category": "dining", "price_tier": 4, "vibes": ["foodie", "party"], "area": "Old Town"},
        "3": {"name": "The Mission", "category": "dining", "price_tier": 3, "vibes": ["foodie"], "area": "Old Town"},
        "4": {"name": "Taco Guild", "category": "dining", "price_tier": 1, "vibes": ["chill"], "area": "Old Town"},
        "5": {"name": "Wasted Grain", "category": "nightlife", "price_tier": 2, "vibes": ["party"], "area": "Old Town"},
        "6": {"name": "Bottled Blonde", "category": "nightlife", "price_tier": 2, "vibes": ["party"], "area": "Old Town"},
        "7": {"name": "Sanctuary Spa", "category": "spa", "price_tier": 4, "vibes": ["relax"], "themes": ["bachelorette"], "area": "North Scottsdale"},
        "8": {"name": "Cabana Pool Club", "category": "pool", "price_tier": 3, "vibes": ["party"], "themes": ["bachelorette"], "area": "Old Town"},
        "9": {"name": "Old Town Boutiques", "category": "shopping", "price_tier": 2, "themes": ["bachelorette"], "area": "Old Town"},
        "10": {"name": "Sloan Park", "category": "activity", "price_tier": 2, "vibes": ["baseball"], "themes": ["spring_training"], "teams": ["Chicago Cubs"], "area": "Mesa"},
        "11": {"name": "Scottsdale Stadium", "category": "activity", "price_tier": 2, "vibes": ["baseball"], "themes": ["spring_training"], "teams": ["SF Giants"], "area": "Old Town"},
        "12": {"name": "TPC Scottsdale Stadium Course", "category": "golf", "price_tier": 5, "vibes": ["golf"], "themes": ["WMPO"], "area": "North Scottsdale"},
        "13": {"name": "Topgolf Scottsdale", "category": "activity", "price_tier": 2, "vibes": ["golf", "party"], "themes": ["wmpo"], "area": "Talking Stick"},
        "14": {"name": "Camelback Mountain", "category": "activity", "price_tier": 0, "vibes": ["hiking"], "area": "Old Town"},
        "15": {"name": "incomplete record", "price_tier": 2}
    });
    normalize_venues(&raw)
}
