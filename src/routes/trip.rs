use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::Deserialize;

use crate::models::itinerary::Variant;
use crate::models::trip::{CreateTripRequest, VoteSubmission};
use crate::services::swap_service::SwapError;
use crate::services::trip_service::TripError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AlternativesQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    pub venue_name: String,
}

fn error_response(err: TripError) -> HttpResponse {
    match &err {
        TripError::NotFound(_) => HttpResponse::NotFound().body(err.to_string()),
        TripError::Swap(SwapError::UnknownSlot(_)) => HttpResponse::NotFound().body(err.to_string()),
        TripError::InvalidInput(_) | TripError::Itinerary(_) | TripError::Swap(_) => {
            HttpResponse::BadRequest().body(err.to_string())
        }
        TripError::PlanNotGenerated(_) => HttpResponse::Conflict().body(err.to_string()),
        TripError::Store(e) => {
            error!("Trip store failure: {}", e);
            HttpResponse::InternalServerError().body("Failed to access trip storage")
        }
    }
}

fn parse_variant(label: &str) -> Result<Variant, HttpResponse> {
    Variant::from_label(label)
        .ok_or_else(|| HttpResponse::BadRequest().body(format!("Unknown plan: {}", label)))
}

/*
    POST /api/trips
*/
pub async fn create_trip(body: web::Json<CreateTripRequest>, state: web::Data<AppState>) -> impl Responder {
    match state.trips.create_trip(body.into_inner()).await {
        Ok(trip) => HttpResponse::Created().json(trip),
        Err(e) => error_response(e),
    }
}

/*
    GET /api/trips/{id}
*/
pub async fn get_trip(path: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    match state.trips.get_trip(&path.into_inner()).await {
        Ok(trip) => HttpResponse::Ok().json(trip),
        Err(e) => error_response(e),
    }
}

/*
    POST /api/trips/{id}/votes
*/
pub async fn submit_vote(
    path: web::Path<String>,
    body: web::Json<VoteSubmission>,
    state: web::Data<AppState>,
) -> impl Responder {
    match state.trips.submit_vote(&path.into_inner(), body.into_inner()).await {
        Ok(trip) => HttpResponse::Ok().json(trip),
        Err(e) => error_response(e),
    }
}

/*
    GET /api/trips/{id}/preferences
*/
pub async fn get_preferences(path: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    match state.trips.preferences(&path.into_inner()).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => error_response(e),
    }
}

/*
    POST /api/trips/{id}/plans
*/
pub async fn generate_plans(path: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    match state.trips.generate_plans(&path.into_inner()).await {
        Ok(trip) => HttpResponse::Ok().json(trip),
        Err(e) => error_response(e),
    }
}

/*
    GET /api/trips/{id}/comparison
*/
pub async fn get_comparison(path: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    match state.trips.compare(&path.into_inner()).await {
        Ok(comparison) => HttpResponse::Ok().json(comparison),
        Err(e) => error_response(e),
    }
}

/*
    GET /api/trips/{id}/plans/{variant}
*/
pub async fn get_plan(path: web::Path<(String, String)>, state: web::Data<AppState>) -> impl Responder {
    let (trip_id, variant) = path.into_inner();
    let variant = match parse_variant(&variant) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.trips.plan(&trip_id, variant).await {
        Ok((_, itinerary)) => HttpResponse::Ok().json(itinerary),
        Err(e) => error_response(e),
    }
}

/*
    PUT /api/trips/{id}/plans/{variant}/select
*/
pub async fn select_plan(path: web::Path<(String, String)>, state: web::Data<AppState>) -> impl Responder {
    let (trip_id, variant) = path.into_inner();
    let variant = match parse_variant(&variant) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.trips.select_plan(&trip_id, variant).await {
        Ok(trip) => HttpResponse::Ok().json(trip),
        Err(e) => error_response(e),
    }
}

/*
    GET /api/trips/{id}/plans/{variant}/slots/{slot_id}/alternatives?k=
*/
pub async fn get_alternatives(
    path: web::Path<(String, String, String)>,
    query: web::Query<AlternativesQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (trip_id, variant, slot_id) = path.into_inner();
    let variant = match parse_variant(&variant) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.trips.alternatives(&trip_id, variant, &slot_id, query.k).await {
        Ok(venues) => HttpResponse::Ok().json(venues),
        Err(e) => error_response(e),
    }
}

/*
    POST /api/trips/{id}/plans/{variant}/slots/{slot_id}/swap
*/
pub async fn swap_slot(
    path: web::Path<(String, String, String)>,
    body: web::Json<SwapRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (trip_id, variant, slot_id) = path.into_inner();
    let variant = match parse_variant(&variant) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state
        .trips
        .swap_slot(&trip_id, variant, &slot_id, &body.venue_name)
        .await
    {
        Ok(itinerary) => HttpResponse::Ok().json(itinerary),
        Err(e) => error_response(e),
    }
}

/*
    POST /api/trips/{id}/plans/{variant}/slots/{slot_id}/confirm
*/
pub async fn confirm_slot(path: web::Path<(String, String, String)>, state: web::Data<AppState>) -> impl Responder {
    let (trip_id, variant, slot_id) = path.into_inner();
    let variant = match parse_variant(&variant) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.trips.confirm_slot(&trip_id, variant, &slot_id).await {
        Ok(itinerary) => HttpResponse::Ok().json(itinerary),
        Err(e) => error_response(e),
    }
}

/*
    POST /api/trips/{id}/plans/{variant}/slots/{slot_id}/skip
*/
pub async fn skip_slot(path: web::Path<(String, String, String)>, state: web::Data<AppState>) -> impl Responder {
    let (trip_id, variant, slot_id) = path.into_inner();
    let variant = match parse_variant(&variant) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.trips.skip_slot(&trip_id, variant, &slot_id).await {
        Ok(itinerary) => HttpResponse::Ok().json(itinerary),
        Err(e) => error_response(e),
    }
}

/*
    GET /api/trips/{id}/plans/{variant}/narrative
*/
pub async fn get_narrative(path: web::Path<(String, String)>, state: web::Data<AppState>) -> impl Responder {
    let (trip_id, variant) = path.into_inner();
    let variant = match parse_variant(&variant) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.trips.plan(&trip_id, variant).await {
        Ok((trip, itinerary)) => {
            let narrative = state.narrative.plan_narrative(&trip, &itinerary).await;
            HttpResponse::Ok().json(narrative)
        }
        Err(e) => error_response(e),
    }
}
