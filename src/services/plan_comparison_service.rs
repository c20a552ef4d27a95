use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::itinerary::Itinerary;
use crate::models::venue::Venue;

/// Rough per-person dollars for one step of average price tier.
const DOLLARS_PER_TIER_STEP: f64 = 50.0;

pub const PLAN_A_LABEL: &str = "Premium Experience";
pub const PLAN_B_LABEL: &str = "Balanced & Value";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanComparison {
    pub plan_a_avg_price_tier: f64,
    pub plan_b_avg_price_tier: f64,
    pub budget_difference_per_person: i64,
    pub plan_a_label: String,
    pub plan_b_label: String,
    pub key_differences: Vec<String>,
    pub plan_a_categories: BTreeMap<String, usize>,
    pub plan_b_categories: BTreeMap<String, usize>,
}

pub fn compare_plans(plan_a: &Itinerary, plan_b: &Itinerary, catalog: &[Venue]) -> PlanComparison {
    let tiers: HashMap<&str, u8> = catalog
        .iter()
        .map(|v| (v.name.trim(), v.price_tier))
        .collect();

    let avg_a = average_price_tier(plan_a, &tiers);
    let avg_b = average_price_tier(plan_b, &tiers);
    let delta = ((avg_a - avg_b) * DOLLARS_PER_TIER_STEP) as i64;

    let budget_line = if delta != 0 {
        format!("Estimated difference: ${}/person", delta.abs())
    } else {
        "Similar budget impact".to_string()
    };

    PlanComparison {
        plan_a_avg_price_tier: round_one_decimal(avg_a),
        plan_b_avg_price_tier: round_one_decimal(avg_b),
        budget_difference_per_person: delta,
        plan_a_label: PLAN_A_LABEL.to_string(),
        plan_b_label: PLAN_B_LABEL.to_string(),
        key_differences: vec![
            format!("Plan A focuses on higher-end venues (avg tier {:.1})", avg_a),
            format!("Plan B balances quality and value (avg tier {:.1})", avg_b),
            budget_line,
        ],
        plan_a_categories: category_counts(plan_a),
        plan_b_categories: category_counts(plan_b),
    }
}

/// Unresolved slots are left out rather than counted as tier zero.
fn average_price_tier(plan: &Itinerary, catalog_tiers: &HashMap<&str, u8>) -> f64 {
    let tiers: Vec<u8> = plan
        .slots
        .iter()
        .filter_map(|slot| slot.venue.as_ref())
        .map(|venue| {
            catalog_tiers
                .get(venue.name.trim())
                .copied()
                .unwrap_or(venue.price_tier)
        })
        .collect();

    if tiers.is_empty() {
        return 0.0;
    }
    tiers.iter().map(|t| *t as f64).sum::<f64>() / tiers.len() as f64
}

fn category_counts(plan: &Itinerary) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for venue in plan.slots.iter().filter_map(|s| s.venue.as_ref()) {
        *counts.entry(venue.category.to_string()).or_insert(0) += 1;
    }
    counts
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
