use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::trip::{PreferenceProfile, VibeWeight};
use crate::models::venue::{Category, Theme, Venue};
use crate::services::preference_service::normalize_vibes;
use crate::services::venue_filter::filter_with_fallback;
use crate::services::venue_scoring::{
    filter_by_budget_tier, filter_by_must_haves, filter_by_theme, pick_top_by_category,
    ranked_alternatives,
};
use crate::state::AppState;

const DEFAULT_LIMIT_PER_CATEGORY: usize = 3;
const DEFAULT_MAX_TOTAL: usize = 10;

#[derive(Debug, Deserialize)]
pub struct VenueQuery {
    pub theme: Option<String>,
    pub category: Option<String>,
    /// Comma separated
    pub vibes: Option<String>,
}

/*
    GET /api/venues?theme=&category=&vibes=a,b
*/
pub async fn list_venues(query: web::Query<VenueQuery>, state: web::Data<AppState>) -> impl Responder {
    let query = query.into_inner();

    let theme = match query.theme.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(label) => match Theme::from_label(label) {
            Some(theme) => Some(theme),
            None => return HttpResponse::BadRequest().body(format!("Unknown theme: {}", label)),
        },
        None => None,
    };
    let category: Category = match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(label) => label.into(),
        None => return HttpResponse::BadRequest().body("category is required"),
    };
    let vibes: Vec<String> = normalize_vibes(
        &query
            .vibes
            .unwrap_or_default()
            .split(',')
            .map(str::to_string)
            .collect::<Vec<_>>(),
    );

    let venues: Vec<&Venue> = filter_with_fallback(state.catalog(), theme, &vibes, &category);
    HttpResponse::Ok().json(venues)
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub theme: Option<Theme>,
    /// Explicit weights. When absent, every listed vibe counts 1.0.
    pub profile: Option<PreferenceProfile>,
    #[serde(default)]
    pub vibes: Vec<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub limit_per_category: Option<usize>,
    pub max_total: Option<usize>,
    pub max_price_tier: Option<u8>,
    #[serde(default)]
    pub must_haves: Vec<String>,
    #[serde(default)]
    pub exclude_names: Vec<String>,
}

/*
    POST /api/venues/rank
*/
pub async fn rank_venues(body: web::Json<RankRequest>, state: web::Data<AppState>) -> impl Responder {
    let request = body.into_inner();
    let profile = request.profile.unwrap_or_else(|| PreferenceProfile {
        weights: normalize_vibes(&request.vibes)
            .into_iter()
            .map(|vibe| VibeWeight { vibe, weight: 1.0 })
            .collect(),
    });

    let all: Vec<&Venue> = state.catalog().iter().collect();
    let mut candidates = filter_by_theme(&all, request.theme);
    if let Some(max_tier) = request.max_price_tier {
        candidates = filter_by_budget_tier(&candidates, max_tier);
    }
    candidates = filter_by_must_haves(&candidates, &request.must_haves);

    let max_total = request.max_total.unwrap_or(DEFAULT_MAX_TOTAL);
    let ranked = state.scorer.rank_venues(&candidates, &profile, request.theme);
    let ranked = ranked_alternatives(&ranked, &request.exclude_names, ranked.len());

    let picked = if request.categories.is_empty() {
        ranked.into_iter().take(max_total).collect()
    } else {
        pick_top_by_category(
            &ranked,
            &request.categories,
            request.limit_per_category.unwrap_or(DEFAULT_LIMIT_PER_CATEGORY),
            max_total,
        )
    };

    HttpResponse::Ok().json(picked)
}
