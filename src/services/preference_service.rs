use std::collections::{BTreeSet, HashMap};

use crate::models::trip::{MustHave, PreferenceProfile, VibeWeight, Vote};
use crate::models::venue::{Theme, Venue};

/// Multiplier applied to each vibe's vote share before rescaling.
const CONSENSUS_BOOST: f64 = 1.2;

const MUST_HAVE_KEYWORDS: &[(MustHave, &[&str])] = &[
    (MustHave::Pool, &["pool", "pool day", "must have pool"]),
    (MustHave::Spa, &["spa", "spa day", "must have spa"]),
    (
        MustHave::NiceDinner,
        &["nice dinner", "fancy dinner", "one nice dinner", "upscale dinner", "fine dining"],
    ),
    (MustHave::Golf, &["golf", "tee time", "round of golf"]),
    (MustHave::Baseball, &["baseball", "game", "spring training", "ball game"]),
    (MustHave::Brunch, &["brunch", "must have brunch"]),
];

struct TripCluster {
    theme: Theme,
    area: &'static str,
    label: &'static str,
}

const TRIP_CLUSTERS: &[TripCluster] = &[
    TripCluster { theme: Theme::Wmpo, area: "North Scottsdale", label: "WMPO + North Scottsdale" },
    TripCluster { theme: Theme::Wmpo, area: "Old Town", label: "WMPO + Old Town" },
    TripCluster { theme: Theme::Bachelorette, area: "Old Town", label: "Bachelorette + Old Town" },
    TripCluster { theme: Theme::Bachelorette, area: "North Scottsdale", label: "Bachelorette + North Scottsdale" },
    TripCluster { theme: Theme::SpringTraining, area: "Old Town", label: "Spring Training + Old Town" },
    TripCluster { theme: Theme::SpringTraining, area: "Talking Stick", label: "Spring Training + Talking Stick" },
];

/// Fold the group's votes into one weighted vibe profile.
///
/// Each vibe gets `min(1, share * 1.2)` where `share` is the fraction of voters
/// who picked it, then every weight is divided by the largest so the leading
/// vibe is exactly 1.0. No votes yields an empty profile.
pub fn reconcile_preferences(votes: &[Vote]) -> PreferenceProfile {
    if votes.is_empty() {
        return PreferenceProfile::default();
    }

    let total_voters = votes.len() as f64;
    let mut counts: Vec<(String, usize)> = Vec::new();
    for vote in votes {
        for vibe in &vote.vibes {
            match counts.iter_mut().find(|(v, _)| v == vibe) {
                Some((_, count)) => *count += 1,
                None => counts.push((vibe.clone(), 1)),
            }
        }
    }

    let mut weights: Vec<VibeWeight> = counts
        .into_iter()
        .map(|(vibe, count)| VibeWeight {
            vibe,
            weight: (count as f64 / total_voters * CONSENSUS_BOOST).min(1.0),
        })
        .collect();

    let max_weight = weights.iter().map(|w| w.weight).fold(0.0, f64::max);
    if max_weight > 0.0 {
        for w in weights.iter_mut() {
            w.weight /= max_weight;
        }
    }

    PreferenceProfile { weights }
}

/// Trim and lowercase vibe tags, dropping blanks and duplicates.
pub fn normalize_vibes(vibes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for vibe in vibes {
        let vibe = vibe.trim().to_lowercase();
        if !vibe.is_empty() && !out.contains(&vibe) {
            out.push(vibe);
        }
    }
    out
}

pub fn extract_must_haves(text: &str) -> BTreeSet<MustHave> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return BTreeSet::new();
    }
    MUST_HAVE_KEYWORDS
        .iter()
        .filter(|(_, phrases)| phrases.iter().any(|p| text.contains(p)))
        .map(|(key, _)| *key)
        .collect()
}

/// Union of must-haves across every voter's free text.
pub fn aggregate_must_haves(votes: &[Vote]) -> BTreeSet<MustHave> {
    votes
        .iter()
        .filter_map(|vote| vote.free_text.as_deref())
        .flat_map(extract_must_haves)
        .collect()
}

/// Suggest a theme + neighbourhood pairing from where the theme's venues cluster.
pub fn recommended_cluster(theme: Theme, catalog: &[Venue]) -> Option<String> {
    let mut area_order: Vec<&str> = Vec::new();
    let mut area_counts: HashMap<&str, usize> = HashMap::new();
    for venue in catalog.iter().filter(|v| v.themes.contains(&theme)) {
        let Some(area) = venue.area.as_deref().map(str::trim).filter(|a| !a.is_empty()) else {
            continue;
        };
        let count = area_counts.entry(area).or_insert(0);
        if *count == 0 {
            area_order.push(area);
        }
        *count += 1;
    }

    // First area seen wins ties.
    let mut best: Option<(&str, usize)> = None;
    for area in area_order {
        let count = area_counts[area];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((area, count));
        }
    }
    let (best_area, _) = best?;

    let label = TRIP_CLUSTERS
        .iter()
        .find(|c| c.theme == theme && c.area == best_area)
        .map(|c| c.label.to_string())
        .unwrap_or_else(|| format!("{} + {}", theme.title(), best_area));
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn vote(name: &str, vibes: &[&str], free_text: Option<&str>) -> Vote {
        Vote {
            voter_name: name.to_string(),
            vibes: vibes.iter().map(|v| v.to_string()).collect(),
            free_text: free_text.map(|t| t.to_string()),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_reconcile_boosts_then_rescales() {
        let votes = vec![
            vote("a", &["party"], None),
            vote("b", &["party"], None),
            vote("c", &["relax"], None),
        ];
        let profile = reconcile_preferences(&votes);

        // party: 2/3 * 1.2 = 0.8, relax: 1/3 * 1.2 = 0.4, rescaled by 0.8
        assert!((profile.weight("party").unwrap() - 1.0).abs() < 1e-9);
        assert!((profile.weight("relax").unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(profile.top_vibes(1), vec!["party"]);
    }

    #[test]
    fn test_reconcile_bounds_and_empty() {
        assert!(reconcile_preferences(&[]).is_empty());

        let votes = vec![
            vote("a", &["party", "foodie", "relax"], None),
            vote("b", &["party", "golf"], None),
            vote("c", &["foodie"], None),
            vote("d", &["party"], None),
        ];
        let profile = reconcile_preferences(&votes);
        assert!(profile.weights.iter().all(|w| (0.0..=1.0).contains(&w.weight)));
        let max = profile.weights.iter().map(|w| w.weight).fold(0.0, f64::max);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_single_voter_vibe_reaches_full_weight() {
        let profile = reconcile_preferences(&[vote("solo", &["relax"], None)]);
        assert_eq!(profile.weight("relax"), Some(1.0));
    }

    #[test]
    fn test_top_vibes_ties_keep_first_appearance() {
        let votes = vec![vote("a", &["foodie", "party", "relax", "golf"], None)];
        let profile = reconcile_preferences(&votes);
        assert_eq!(profile.top_vibes(3), vec!["foodie", "party", "relax"]);
    }

    #[test]
    fn test_extract_must_haves() {
        let found = extract_must_haves("We MUST have a pool day and one nice dinner");
        assert!(found.contains(&MustHave::Pool));
        assert!(found.contains(&MustHave::NiceDinner));
        assert!(!found.contains(&MustHave::Spa));
        assert!(extract_must_haves("   ").is_empty());
    }

    #[test]
    fn test_aggregate_must_haves_is_union() {
        let votes = vec![
            vote("a", &[], Some("spa please")),
            vote("b", &[], None),
            vote("c", &[], Some("tee time on friday, and a spa")),
        ];
        let keys: Vec<MustHave> = aggregate_must_haves(&votes).into_iter().collect();
        assert_eq!(keys, vec![MustHave::Spa, MustHave::Golf]);
    }

    #[test]
    fn test_recommended_cluster() {
        let mut a = Venue::placeholder("A", "dining".into());
        a.themes = vec![Theme::Wmpo];
        a.area = Some("North Scottsdale".to_string());
        let mut b = a.clone();
        b.name = "B".to_string();
        let mut c = a.clone();
        c.name = "C".to_string();
        c.area = Some("Tempe".to_string());

        assert_eq!(
            recommended_cluster(Theme::Wmpo, &[c.clone(), a, b]).as_deref(),
            Some("WMPO + North Scottsdale")
        );
        assert_eq!(
            recommended_cluster(Theme::Wmpo, &[c]).as_deref(),
            Some("Wmpo + Tempe")
        );
        assert_eq!(recommended_cluster(Theme::Bachelorette, &[]), None);
    }
}
