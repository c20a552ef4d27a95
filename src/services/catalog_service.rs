//! Venue catalog normalization.
//!
//! Catalog files come in three shapes and this module is the only place that
//! knows about them:
//! - a plain list of venue objects
//! - an object wrapping the list under `"venues"` (other keys are ignored)
//! - a name-keyed object (`{"0": {...}, "1": {...}}`), read in document order
//!
//! Every record is validated and rewritten into a canonical [`Venue`].
//! Incomplete records are dropped; legacy labels are rewritten.

use std::path::Path;

use log::{debug, info};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::venue::{Category, Theme, Venue};

const MAX_PRICE_TIER: u8 = 5;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read and normalize a catalog file.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Venue>, CatalogError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&contents)?;
    let venues = normalize_venues(&raw);
    info!("Loaded {} venues from {}", venues.len(), path.display());
    Ok(venues)
}

/// Normalize any accepted catalog shape into the canonical venue list.
pub fn normalize_venues(raw: &Value) -> Vec<Venue> {
    let records: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("venues") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => map.values().collect(),
        },
        _ => Vec::new(),
    };

    let total = records.len();
    let venues: Vec<Venue> = records
        .into_iter()
        .filter_map(|record| record.as_object().and_then(normalize_record))
        .collect();

    if venues.len() < total {
        debug!(
            "Dropped {} malformed venue records during normalization",
            total - venues.len()
        );
    }
    venues
}

fn normalize_record(record: &Map<String, Value>) -> Option<Venue> {
    let name = record.get("name").and_then(scalar_to_string)?;
    let category_raw = record
        .get("category")
        .and_then(scalar_to_string)?
        .to_lowercase();
    if name.is_empty() || category_raw.is_empty() {
        return None;
    }

    let mut vibes: Vec<String> = Vec::new();
    for vibe in string_list(record.get("vibes")) {
        let vibe = vibe.to_lowercase();
        if !vibe.is_empty() && !vibes.contains(&vibe) {
            vibes.push(vibe);
        }
    }

    // Legacy "shopping" category lives in the daytime activity pool.
    let category = if category_raw == "shopping" {
        if !vibes.iter().any(|v| v == "shopping") {
            vibes.push("shopping".to_string());
        }
        Category::Activity
    } else {
        Category::from(category_raw)
    };

    let mut themes: Vec<Theme> = Vec::new();
    for label in string_list(record.get("themes")) {
        if let Some(theme) = Theme::from_label(&label) {
            if !themes.contains(&theme) {
                themes.push(theme);
            }
        }
    }
    if themes.is_empty() {
        themes = Theme::ALL.to_vec();
    }

    let (lat, lon) = match (
        record.get("lat").and_then(number_value),
        record.get("lon").and_then(number_value),
    ) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    };

    let area = record
        .get("area")
        .and_then(scalar_to_string)
        .filter(|a| !a.is_empty());

    Some(Venue {
        name,
        category,
        price_tier: record.get("price_tier").map(price_tier).unwrap_or(0),
        vibes,
        themes,
        teams: string_list(record.get("teams")),
        area,
        lat,
        lon,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Fractional tiers round up, capped at 5. Anything non-numeric or below zero is 0.
fn price_tier(value: &Value) -> u8 {
    match number_value(value) {
        Some(f) if f.is_finite() && f > 0.0 => (f.ceil() as u64).min(MAX_PRICE_TIER as u64) as u8,
        _ => 0,
    }
}
