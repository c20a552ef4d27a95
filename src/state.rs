use std::sync::Arc;

use log::{info, warn};

use crate::config::AppConfig;
use crate::db::trip_store::TripStore;
use crate::models::venue::Venue;
use crate::services::itinerary_generation_service::ItineraryGenerator;
use crate::services::narrative_service::{NarrativeService, Narrator, OpenAiNarrator};
use crate::services::trip_service::TripService;
use crate::services::venue_scoring::VenueScorer;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub trips: TripService,
    pub narrative: NarrativeService,
    pub scorer: VenueScorer,
}

impl AppState {
    pub fn new(catalog: Vec<Venue>, store: TripStore, narrative: NarrativeService) -> Self {
        Self {
            trips: TripService::new(store, ItineraryGenerator::new(), Arc::new(catalog)),
            narrative,
            scorer: VenueScorer::new(),
        }
    }

    pub fn catalog(&self) -> &[Venue] {
        self.trips.catalog()
    }
}

/// OpenAI-backed narrative when a key is configured, drafts otherwise.
pub fn narrative_from_env(config: &AppConfig) -> NarrativeService {
    match OpenAiNarrator::from_env(config.narrative_timeout) {
        Ok(narrator) => {
            info!("Narrative rewriting enabled");
            let narrator: Arc<dyn Narrator> = Arc::new(narrator);
            NarrativeService::new(Some(narrator), config.narrative_timeout)
        }
        Err(e) => {
            warn!("Narrative rewriting disabled: {}", e);
            NarrativeService::offline()
        }
    }
}
