use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::trip::PreferenceProfile;
use crate::models::venue::{Category, Theme, Venue};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueScoringWeights {
    /// Weight for the summed profile weights of the venue's vibes
    pub vibe_weight: f64,
    /// Weight for an explicit theme declaration
    pub theme_weight: f64,
    /// Weight for budget friendliness (lower price tier scores higher)
    pub budget_weight: f64,
}

impl Default for VenueScoringWeights {
    fn default() -> Self {
        Self {
            vibe_weight: 0.55,
            theme_weight: 0.35,
            budget_weight: 0.10,
        }
    }
}

impl VenueScoringWeights {
    /// Create weights from environment variables or use defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            vibe_weight: std::env::var("VENUE_VIBE_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.vibe_weight),
            theme_weight: std::env::var("VENUE_THEME_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.theme_weight),
            budget_weight: std::env::var("VENUE_BUDGET_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.budget_weight),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub vibe_score: f64,
    pub theme_score: f64,
    pub budget_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredVenue {
    pub venue: Venue,
    pub total_score: f64,
    pub score_breakdown: ScoreBreakdown,
}

#[derive(Default)]
pub struct VenueScorer {
    pub weights: VenueScoringWeights,
}

impl VenueScorer {
    pub fn new() -> Self {
        let weights = VenueScoringWeights::from_env();
        debug!("VenueScorer initialized with weights: {:?}", weights);
        Self { weights }
    }

    pub fn with_weights(weights: VenueScoringWeights) -> Self {
        Self { weights }
    }

    /// Deterministic relevance: vibes + theme relevance + budget friendliness.
    pub fn score_venue(
        &self,
        venue: &Venue,
        profile: &PreferenceProfile,
        theme: Option<Theme>,
    ) -> ScoredVenue {
        let vibe_score: f64 = venue
            .vibes
            .iter()
            .filter_map(|vibe| profile.weight(vibe))
            .sum::<f64>()
            * self.weights.vibe_weight;

        let theme_score = match theme {
            Some(theme) if venue.themes.contains(&theme) => self.weights.theme_weight,
            _ => 0.0,
        };

        let budget_friendliness = ((5.0 - venue.price_tier as f64) / 4.0).max(0.0);
        let budget_score = budget_friendliness * self.weights.budget_weight;

        ScoredVenue {
            venue: venue.clone(),
            total_score: vibe_score + theme_score + budget_score,
            score_breakdown: ScoreBreakdown {
                vibe_score,
                theme_score,
                budget_score,
            },
        }
    }

    /// Score every venue and sort by score descending; equal scores keep catalog order.
    pub fn rank_venues(
        &self,
        venues: &[&Venue],
        profile: &PreferenceProfile,
        theme: Option<Theme>,
    ) -> Vec<ScoredVenue> {
        let mut scored: Vec<ScoredVenue> = venues
            .iter()
            .map(|venue| self.score_venue(venue, profile, theme))
            .collect();

        scored.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored
    }
}

/// Take the top `limit_per_category` venues per category, in category order.
pub fn pick_top_by_category(
    ranked: &[ScoredVenue],
    category_targets: &[Category],
    limit_per_category: usize,
    max_total: usize,
) -> Vec<ScoredVenue> {
    let mut picked: Vec<ScoredVenue> = Vec::new();
    for category in category_targets {
        picked.extend(
            ranked
                .iter()
                .filter(|s| &s.venue.category == category)
                .take(limit_per_category)
                .cloned(),
        );
        if picked.len() >= max_total {
            break;
        }
    }
    picked.truncate(max_total);
    picked
}

pub fn ranked_alternatives(
    ranked: &[ScoredVenue],
    exclude_names: &[String],
    k: usize,
) -> Vec<ScoredVenue> {
    let excluded: HashSet<String> = exclude_names.iter().map(|n| n.to_lowercase()).collect();
    ranked
        .iter()
        .filter(|s| !excluded.contains(&s.venue.lowercase_name()))
        .take(k)
        .cloned()
        .collect()
}

pub fn filter_by_theme<'a>(venues: &[&'a Venue], theme: Option<Theme>) -> Vec<&'a Venue> {
    match theme {
        Some(theme) => venues
            .iter()
            .copied()
            .filter(|v| v.themes.contains(&theme))
            .collect(),
        None => venues.to_vec(),
    }
}

pub fn filter_by_budget_tier<'a>(venues: &[&'a Venue], max_price_tier: u8) -> Vec<&'a Venue> {
    venues
        .iter()
        .copied()
        .filter(|v| v.price_tier <= max_price_tier)
        .collect()
}

/// Keep venues whose name, category, vibes, or themes mention any of the tokens.
pub fn filter_by_must_haves<'a>(venues: &[&'a Venue], tokens: &[String]) -> Vec<&'a Venue> {
    let tokens: Vec<String> = tokens
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return venues.to_vec();
    }

    venues
        .iter()
        .copied()
        .filter(|v| {
            let themes: Vec<&str> = v.themes.iter().map(|t| t.as_str()).collect();
            let haystack = format!(
                "{} {} {} {}",
                v.name,
                v.category,
                v.vibes.join(" "),
                themes.join(" ")
            )
            .to_lowercase();
            tokens.iter().any(|t| haystack.contains(t.as_str()))
        })
        .collect()
}
