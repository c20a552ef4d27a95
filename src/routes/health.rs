use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::Serialize;
use std::collections::HashMap;
use std::env;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let store_result = check_trip_store(&state).await;
    health
        .services
        .insert("trip_store".to_string(), store_result.clone());

    let catalog_result = check_catalog(&state);
    health
        .services
        .insert("catalog".to_string(), catalog_result.clone());

    health.services.insert(
        "narrative".to_string(),
        ServiceStatus {
            status: "ok".to_string(),
            details: Some(if state.narrative.has_narrator() {
                "Rewriting enabled".to_string()
            } else {
                "Drafts only".to_string()
            }),
        },
    );

    if store_result.status != "ok" || catalog_result.status != "ok" {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_trip_store(state: &AppState) -> ServiceStatus {
    let store = state.trips.store();
    match store.ping().await {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("Using {} trip store", store.backend_name())),
        },
        Err(e) => {
            error!("Trip store health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("Failed to reach {}: {}", store.backend_name(), e)),
            }
        }
    }
}

fn check_catalog(state: &AppState) -> ServiceStatus {
    let count = state.catalog().len();
    if count == 0 {
        ServiceStatus {
            status: "error".to_string(),
            details: Some("Venue catalog is empty".to_string()),
        }
    } else {
        ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("{} venues loaded", count)),
        }
    }
}
