//! Trip lifecycle: creation, group voting, plan generation and slot edits.
//!
//! Every mutation runs under the trip's lock as one load, modify, save cycle,
//! so concurrent votes on the same trip are applied one after another.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::trip_store::{StoreError, TripLocks, TripStore};
use crate::models::itinerary::{Itinerary, Variant};
use crate::models::trip::{CreateTripRequest, MustHave, PreferenceProfile, Trip, Vote, VoteSubmission};
use crate::models::venue::Venue;
use crate::services::itinerary_generation_service::{ItineraryError, ItineraryGenerator, TripContext};
use crate::services::plan_comparison_service::{compare_plans, PlanComparison};
use crate::services::preference_service::{
    aggregate_must_haves, normalize_vibes, recommended_cluster, reconcile_preferences,
};
use crate::services::swap_service::{
    apply_swap, confirm_slot, skip_slot, swap_alternatives, SwapError, DEFAULT_ALTERNATIVES,
};

pub const MAX_VIBES_PER_VOTE: usize = 3;
pub const MAX_GROUP_SIZE: u8 = 10;
/// Arrival and departure days included.
pub const MAX_TRIP_DAYS: i64 = 14;
const TRIP_ID_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum TripError {
    #[error("Trip not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Plan {0} has not been generated yet")]
    PlanNotGenerated(Variant),
    #[error(transparent)]
    Itinerary(#[from] ItineraryError),
    #[error(transparent)]
    Swap(#[from] SwapError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceSummary {
    pub vote_count: usize,
    pub profile: PreferenceProfile,
    pub active_vibes: Vec<String>,
    pub must_haves: BTreeSet<MustHave>,
    pub recommended_cluster: Option<String>,
}

pub struct TripService {
    store: TripStore,
    locks: TripLocks,
    generator: ItineraryGenerator,
    catalog: Arc<Vec<Venue>>,
}

impl TripService {
    pub fn new(store: TripStore, generator: ItineraryGenerator, catalog: Arc<Vec<Venue>>) -> Self {
        Self {
            store,
            locks: TripLocks::new(),
            generator,
            catalog,
        }
    }

    pub fn catalog(&self) -> &[Venue] {
        &self.catalog
    }

    pub fn store(&self) -> &TripStore {
        &self.store
    }

    pub async fn create_trip(&self, request: CreateTripRequest) -> Result<Trip, TripError> {
        if request.departure <= request.arrival {
            return Err(ItineraryError::InvalidDates {
                arrival: request.arrival,
                departure: request.departure,
            }
            .into());
        }
        let trip_days = request.departure.signed_duration_since(request.arrival).num_days() + 1;
        if trip_days > MAX_TRIP_DAYS {
            return Err(TripError::InvalidInput(format!(
                "Trips can last at most {} days",
                MAX_TRIP_DAYS
            )));
        }
        if request.group_size == 0 || request.group_size > MAX_GROUP_SIZE {
            return Err(TripError::InvalidInput(format!(
                "group_size must be between 1 and {}",
                MAX_GROUP_SIZE
            )));
        }
        if request.budget_min > request.budget_max {
            return Err(TripError::InvalidInput(
                "budget_min cannot exceed budget_max".to_string(),
            ));
        }

        let trip_name = request
            .trip_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} Trip", request.theme.title()));

        let trip = Trip {
            trip_id: generate_trip_id(),
            created_at: Utc::now(),
            theme: request.theme,
            arrival: request.arrival,
            departure: request.departure,
            group_size: request.group_size,
            budget_min: request.budget_min,
            budget_max: request.budget_max,
            team: request.team,
            trip_name,
            vibes: normalize_vibes(&request.vibes),
            votes: Vec::new(),
            reconciled_preferences: None,
            plan_a: None,
            plan_b: None,
            selected_plan: None,
        };

        self.store.save(&trip).await?;
        info!("Created trip {} ({})", trip.trip_id, trip.theme);
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<Trip, TripError> {
        self.store
            .load(trip_id)
            .await?
            .ok_or_else(|| TripError::NotFound(trip_id.to_string()))
    }

    /// Record a vote, replacing any earlier vote under the same name, and
    /// recompute the group profile.
    pub async fn submit_vote(&self, trip_id: &str, submission: VoteSubmission) -> Result<Trip, TripError> {
        let voter_name = submission.voter_name.trim().to_string();
        if voter_name.is_empty() {
            return Err(TripError::InvalidInput("voter_name is required".to_string()));
        }
        let vibes = normalize_vibes(&submission.vibes);
        if vibes.len() > MAX_VIBES_PER_VOTE {
            return Err(TripError::InvalidInput(format!(
                "A vote can include at most {} vibes",
                MAX_VIBES_PER_VOTE
            )));
        }

        let vote = Vote {
            voter_name,
            vibes,
            free_text: submission
                .free_text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            submitted_at: Utc::now(),
        };

        self.update(trip_id, move |trip| {
            let key = vote.voter_name.to_lowercase();
            match trip
                .votes
                .iter()
                .position(|v| v.voter_name.trim().to_lowercase() == key)
            {
                Some(index) => trip.votes[index] = vote,
                None => trip.votes.push(vote),
            }
            trip.reconciled_preferences = Some(reconcile_preferences(&trip.votes));
            Ok(trip.clone())
        })
        .await
    }

    pub async fn preferences(&self, trip_id: &str) -> Result<PreferenceSummary, TripError> {
        let trip = self.get_trip(trip_id).await?;
        Ok(PreferenceSummary {
            vote_count: trip.votes.len(),
            profile: reconcile_preferences(&trip.votes),
            active_vibes: trip.active_vibes(),
            must_haves: aggregate_must_haves(&trip.votes),
            recommended_cluster: recommended_cluster(trip.theme, &self.catalog),
        })
    }

    /// Build the premium plan (A) and the balanced plan (B) from the current
    /// votes. Regenerating discards earlier swaps and slot statuses.
    pub async fn generate_plans(&self, trip_id: &str) -> Result<Trip, TripError> {
        let catalog = self.catalog.clone();
        let generator = &self.generator;

        self.update(trip_id, move |trip| {
            let base = generation_context(trip, Variant::Premium);
            let plan_a = generator.build_itinerary(&catalog, &base)?;
            let plan_b = generator.build_itinerary(
                &catalog,
                &TripContext {
                    variant: Variant::Balanced,
                    ..base
                },
            )?;

            trip.plan_a = Some(plan_a);
            trip.plan_b = Some(plan_b);
            trip.selected_plan = None;
            info!("Generated plans for trip {}", trip.trip_id);
            Ok(trip.clone())
        })
        .await
    }

    pub async fn compare(&self, trip_id: &str) -> Result<PlanComparison, TripError> {
        let trip = self.get_trip(trip_id).await?;
        let plan_a = trip
            .plan(Variant::Premium)
            .ok_or(TripError::PlanNotGenerated(Variant::Premium))?;
        let plan_b = trip
            .plan(Variant::Balanced)
            .ok_or(TripError::PlanNotGenerated(Variant::Balanced))?;
        Ok(compare_plans(plan_a, plan_b, &self.catalog))
    }

    pub async fn select_plan(&self, trip_id: &str, variant: Variant) -> Result<Trip, TripError> {
        self.update(trip_id, move |trip| {
            if trip.plan(variant).is_none() {
                return Err(TripError::PlanNotGenerated(variant));
            }
            trip.selected_plan = Some(variant);
            Ok(trip.clone())
        })
        .await
    }

    pub async fn plan(&self, trip_id: &str, variant: Variant) -> Result<(Trip, Itinerary), TripError> {
        let trip = self.get_trip(trip_id).await?;
        let itinerary = trip
            .plan(variant)
            .cloned()
            .ok_or(TripError::PlanNotGenerated(variant))?;
        Ok((trip, itinerary))
    }

    pub async fn alternatives(
        &self,
        trip_id: &str,
        variant: Variant,
        slot_id: &str,
        k: Option<usize>,
    ) -> Result<Vec<Venue>, TripError> {
        let (trip, itinerary) = self.plan(trip_id, variant).await?;
        let slot = itinerary
            .slot(slot_id)
            .ok_or_else(|| SwapError::UnknownSlot(slot_id.to_string()))?;

        let vibes = trip.active_vibes();
        Ok(swap_alternatives(
            &self.catalog,
            Some(trip.theme),
            &vibes,
            slot,
            k.unwrap_or(DEFAULT_ALTERNATIVES),
        )
        .into_iter()
        .cloned()
        .collect())
    }

    pub async fn swap_slot(
        &self,
        trip_id: &str,
        variant: Variant,
        slot_id: &str,
        venue_name: &str,
    ) -> Result<Itinerary, TripError> {
        let catalog = self.catalog.clone();
        self.update(trip_id, move |trip| {
            let theme = Some(trip.theme);
            let vibes = trip.active_vibes();
            let itinerary = trip
                .plan_mut(variant)
                .ok_or(TripError::PlanNotGenerated(variant))?;
            apply_swap(itinerary, slot_id, venue_name, &catalog, theme, &vibes)?;
            Ok(itinerary.clone())
        })
        .await
    }

    pub async fn confirm_slot(&self, trip_id: &str, variant: Variant, slot_id: &str) -> Result<Itinerary, TripError> {
        let catalog = self.catalog.clone();
        self.update(trip_id, move |trip| {
            let theme = Some(trip.theme);
            let vibes = trip.active_vibes();
            let itinerary = trip
                .plan_mut(variant)
                .ok_or(TripError::PlanNotGenerated(variant))?;
            confirm_slot(itinerary, slot_id, &catalog, theme, &vibes)?;
            Ok(itinerary.clone())
        })
        .await
    }

    pub async fn skip_slot(&self, trip_id: &str, variant: Variant, slot_id: &str) -> Result<Itinerary, TripError> {
        self.update(trip_id, move |trip| {
            let itinerary = trip
                .plan_mut(variant)
                .ok_or(TripError::PlanNotGenerated(variant))?;
            skip_slot(itinerary, slot_id)?;
            Ok(itinerary.clone())
        })
        .await
    }

    /// Load, mutate, and save one trip while holding its lock. Nothing is
    /// saved when `apply` fails.
    async fn update<T, F>(&self, trip_id: &str, apply: F) -> Result<T, TripError>
    where
        F: FnOnce(&mut Trip) -> Result<T, TripError>,
    {
        let _guard = self.locks.acquire(trip_id).await;
        let mut trip = self.get_trip(trip_id).await?;
        let out = apply(&mut trip)?;
        if let Err(e) = self.store.save(&trip).await {
            warn!("Failed to save trip {}: {}", trip_id, e);
            return Err(e.into());
        }
        Ok(out)
    }
}

pub fn generation_context(trip: &Trip, variant: Variant) -> TripContext {
    TripContext {
        theme: Some(trip.theme),
        vibes: trip.active_vibes(),
        arrival: trip.arrival,
        departure: trip.departure,
        team: trip.team,
        variant,
        must_haves: aggregate_must_haves(&trip.votes),
    }
}

fn generate_trip_id() -> String {
    Uuid::new_v4().simple().to_string()[..TRIP_ID_LENGTH].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::itinerary::SlotStatus;
    use crate::models::trip::Team;
    use crate::models::venue::Theme;
    use crate::services::itinerary_generation_service::ItineraryGenerationConfig;
    use chrono::NaiveDate;

    fn venue(name: &str, category: &str, tier: u8, vibes: &[&str]) -> Venue {
        let mut v = Venue::placeholder(name, category.into()).with_vibes(vibes);
        v.price_tier = tier;
        v.themes = Theme::ALL.to_vec();
        v
    }

    fn service() -> TripService {
        let catalog = vec![
            venue("Cafe One", "brunch", 1, &["relax"]),
            venue("Cafe Two", "brunch", 2, &["relax"]),
            venue("Taco Spot", "dining", 1, &["foodie"]),
            venue("Canal Club", "dining", 4, &["party"]),
            venue("Dive Bar", "nightlife", 1, &["party"]),
            venue("Rooftop", "nightlife", 3, &["drinks"]),
            venue("Camelback Hike", "activity", 0, &["hiking"]),
        ];
        TripService::new(
            TripStore::in_memory(),
            ItineraryGenerator::with_config(ItineraryGenerationConfig::default()),
            Arc::new(catalog),
        )
    }

    fn request() -> CreateTripRequest {
        CreateTripRequest {
            theme: Theme::Bachelorette,
            arrival: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            departure: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
            group_size: 6,
            budget_min: 500,
            budget_max: 1500,
            team: Team::default(),
            trip_name: None,
            vibes: vec!["Party".to_string()],
        }
    }

    fn vote(name: &str, vibes: &[&str], free_text: Option<&str>) -> VoteSubmission {
        VoteSubmission {
            voter_name: name.to_string(),
            vibes: vibes.iter().map(|v| v.to_string()).collect(),
            free_text: free_text.map(|t| t.to_string()),
        }
    }

    #[actix_rt::test]
    async fn test_create_trip_defaults_and_validation() {
        let service = service();
        let trip = service.create_trip(request()).await.unwrap();

        assert_eq!(trip.trip_id.len(), 8);
        assert_eq!(trip.trip_name, "Bachelorette Trip");
        assert_eq!(trip.vibes, vec!["party"]);
        assert_eq!(service.get_trip(&trip.trip_id).await.unwrap(), trip);

        let mut bad = request();
        bad.departure = bad.arrival;
        assert!(matches!(service.create_trip(bad).await, Err(TripError::Itinerary(_))));

        let mut bad = request();
        bad.departure = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        assert!(matches!(service.create_trip(bad).await, Err(TripError::InvalidInput(_))));

        let mut longest = request();
        longest.departure = longest.arrival + chrono::Duration::days(MAX_TRIP_DAYS - 1);
        assert!(service.create_trip(longest).await.is_ok());

        let mut bad = request();
        bad.group_size = 11;
        assert!(matches!(service.create_trip(bad).await, Err(TripError::InvalidInput(_))));

        let mut bad = request();
        bad.budget_min = 2000;
        assert!(matches!(service.create_trip(bad).await, Err(TripError::InvalidInput(_))));
    }

    #[actix_rt::test]
    async fn test_votes_replace_by_name_and_reconcile() {
        let service = service();
        let trip = service.create_trip(request()).await.unwrap();
        let id = trip.trip_id.as_str();

        service.submit_vote(id, vote("Ava", &["relax"], None)).await.unwrap();
        service.submit_vote(id, vote("Mia", &["party"], Some("one nice dinner"))).await.unwrap();
        let trip = service.submit_vote(id, vote(" ava ", &["party", "foodie"], None)).await.unwrap();

        assert_eq!(trip.votes.len(), 2);
        assert_eq!(trip.votes[0].voter_name, "ava");
        let profile = trip.reconciled_preferences.unwrap();
        assert_eq!(profile.weight("party"), Some(1.0));
        assert_eq!(profile.weight("relax"), None);

        let summary = service.preferences(id).await.unwrap();
        assert_eq!(summary.vote_count, 2);
        assert!(summary.must_haves.contains(&MustHave::NiceDinner));
        assert_eq!(summary.active_vibes[0], "party");
    }

    #[actix_rt::test]
    async fn test_vote_validation() {
        let service = service();
        let trip = service.create_trip(request()).await.unwrap();

        let too_many = vote("Ava", &["party", "relax", "foodie", "golf"], None);
        assert!(matches!(
            service.submit_vote(&trip.trip_id, too_many).await,
            Err(TripError::InvalidInput(_))
        ));
        assert!(matches!(
            service.submit_vote(&trip.trip_id, vote("  ", &["party"], None)).await,
            Err(TripError::InvalidInput(_))
        ));
        assert!(matches!(
            service.submit_vote("missing", vote("Ava", &["party"], None)).await,
            Err(TripError::NotFound(_))
        ));
    }

    #[actix_rt::test]
    async fn test_concurrent_votes_are_all_kept() {
        let service = Arc::new(service());
        let trip = service.create_trip(request()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            let id = trip.trip_id.clone();
            handles.push(actix_rt::spawn(async move {
                service
                    .submit_vote(&id, vote(&format!("voter{}", i), &["party"], None))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(service.get_trip(&trip.trip_id).await.unwrap().votes.len(), 8);
    }

    #[actix_rt::test]
    async fn test_generate_select_and_edit_plans() {
        let service = service();
        let trip = service.create_trip(request()).await.unwrap();
        let id = trip.trip_id.as_str();

        assert!(matches!(
            service.select_plan(id, Variant::Premium).await,
            Err(TripError::PlanNotGenerated(Variant::Premium))
        ));

        let trip = service.generate_plans(id).await.unwrap();
        let plan_a = trip.plan_a.as_ref().unwrap();
        assert_eq!(plan_a.variant, Variant::Premium);
        assert_eq!(trip.plan_b.as_ref().unwrap().variant, Variant::Balanced);

        let trip = service.select_plan(id, Variant::Balanced).await.unwrap();
        assert_eq!(trip.selected_plan, Some(Variant::Balanced));

        let comparison = service.compare(id).await.unwrap();
        assert_eq!(comparison.plan_b_label, "Balanced & Value");

        // First dinner of the balanced plan, swapped to the other restaurant
        let plan_b = trip.plan_b.unwrap();
        let dinner = plan_b.slots.iter().find(|s| s.slot_type == "Dinner").unwrap();
        let other = if dinner.display_name() == "Canal Club" { "Taco Spot" } else { "Canal Club" };

        let alternatives = service.alternatives(id, Variant::Balanced, &dinner.id, None).await.unwrap();
        assert!(alternatives.iter().all(|v| v.name != dinner.display_name()));

        let updated = service.swap_slot(id, Variant::Balanced, &dinner.id, other).await.unwrap();
        assert_eq!(updated.slot(&dinner.id).unwrap().display_name(), other);
        assert_eq!(updated.status_of(&dinner.id), SlotStatus::Confirmed);

        let position = updated.slots.iter().position(|s| s.id == dinner.id).unwrap();
        assert!(updated.slots[position + 1..]
            .iter()
            .filter(|s| !s.is_transport())
            .all(|s| s.display_name() != other));

        let skipped = service.skip_slot(id, Variant::Balanced, "s1").await.unwrap();
        assert_eq!(skipped.status_of("s1"), SlotStatus::Skipped);

        assert!(matches!(
            service.confirm_slot(id, Variant::Balanced, "s999").await,
            Err(TripError::Swap(SwapError::UnknownSlot(_)))
        ));
    }
}
