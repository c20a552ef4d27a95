mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use common::{fixture_catalog, TestApp};

fn names(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap().to_string())
        .collect()
}

#[core::prelude::v1::test]
fn test_fixture_catalog_is_normalized() {
    let catalog = fixture_catalog();

    // the record without a category is dropped
    assert_eq!(catalog.len(), 15);
    let boutiques = catalog.iter().find(|v| v.name == "Old Town Boutiques").unwrap();
    assert_eq!(boutiques.category.as_str(), "activity");
    assert!(boutiques.has_vibe("shopping"));
    let hash = catalog.iter().find(|v| v.name == "Hash Kitchen").unwrap();
    assert_eq!(hash.price_tier, 2);
}

#[actix_rt::test]
async fn test_health_check() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["trip_store"]["details"], "Using memory trip store");
    assert_eq!(body["services"]["narrative"]["details"], "Drafts only");
}

#[actix_rt::test]
async fn test_health_degraded_with_empty_catalog() {
    let test_app = TestApp::with_catalog(Vec::new());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "degraded");
}

#[actix_rt::test]
async fn test_list_venues_filters_and_falls_back() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/venues?theme=bachelorette&category=dining&vibes=party")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(names(&body), vec!["Maple & Ash"]);

    let req = test::TestRequest::get()
        .uri("/api/venues?theme=wmpo&category=dining&vibes=karaoke")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(names(&body), vec!["Maple & Ash", "The Mission", "Taco Guild"]);

    // activities are not slot critical, so no fallback
    let req = test::TestRequest::get()
        .uri("/api/venues?category=activity&vibes=karaoke")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_list_venues_rejects_bad_query() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/venues?theme=prom&category=dining").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/venues?theme=wmpo").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_rank_venues_by_category() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/venues/rank")
        .set_json(json!({
            "theme": "wmpo",
            "vibes": ["golf"],
            "categories": ["golf", "activity"],
            "limit_per_category": 1
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let ranked: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["venue"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(ranked, vec!["TPC Scottsdale Stadium Course", "Topgolf Scottsdale"]);
    assert!(body[0]["score_breakdown"]["theme_score"].as_f64().unwrap() > 0.0);
}

#[actix_rt::test]
async fn test_rank_venues_respects_budget_and_exclusions() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/venues/rank")
        .set_json(json!({
            "profile": {"party": 1.0},
            "max_price_tier": 2,
            "exclude_names": ["WASTED GRAIN"],
            "max_total": 3
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let ranked = body.as_array().unwrap();
    assert_eq!(ranked.len(), 3);
    assert!(ranked
        .iter()
        .all(|s| s["venue"]["price_tier"].as_u64().unwrap() <= 2));
    assert!(ranked.iter().all(|s| s["venue"]["name"] != "Wasted Grain"));
}
