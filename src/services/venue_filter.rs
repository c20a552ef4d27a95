use log::debug;

use crate::models::venue::{Category, Theme, Venue};

const ACTIVE_ALIASES: [&str; 5] = ["active", "hiking", "gym", "outdoor", "fitness"];
const PARTY_ALIASES: [&str; 3] = ["party", "drinks", "dancing"];

/// Name fragments that mark golf, baseball, or stadium content unsuitable for
/// a bachelorette weekend.
const BACHELORETTE_DENY_NAMES: [&str; 16] = [
    "golf",
    "baseball",
    "popstroke",
    "topgolf",
    "puttshack",
    "stadium",
    "sloan",
    "salt river",
    "talking stick",
    "hohokam",
    "diablo",
    "dback",
    "octane",
    "dbat",
    "taroko",
    "baseballism",
];

/// Select catalog venues of `category` matching the theme and any of the vibes.
/// Catalog order is preserved.
pub fn filter_venues<'a>(
    catalog: &'a [Venue],
    theme: Option<Theme>,
    vibes: &[String],
    category: &Category,
) -> Vec<&'a Venue> {
    let requested: Vec<String> = vibes.iter().map(|v| v.trim().to_lowercase()).collect();

    catalog
        .iter()
        .filter(|venue| &venue.category == category)
        .filter(|venue| {
            // Brunch is theme-agnostic.
            *category == Category::Brunch
                || match theme {
                    Some(theme) => venue.supports_theme(theme),
                    None => true,
                }
        })
        .filter(|venue| requested.is_empty() || requested.iter().any(|v| vibe_matches(v, venue)))
        .collect()
}

/// Like [`filter_venues`], but meal and transport categories fall back to an
/// unfiltered scan of the category when nothing matches.
pub fn filter_with_fallback<'a>(
    catalog: &'a [Venue],
    theme: Option<Theme>,
    vibes: &[String],
    category: &Category,
) -> Vec<&'a Venue> {
    let filtered = filter_venues(catalog, theme, vibes, category);
    if filtered.is_empty() && category.is_slot_critical() {
        debug!(
            "No {} venues match theme/vibes, falling back to the full category",
            category
        );
        return venues_in_category(catalog, category);
    }
    filtered
}

pub fn venues_in_category<'a>(catalog: &'a [Venue], category: &Category) -> Vec<&'a Venue> {
    catalog.iter().filter(|v| &v.category == category).collect()
}

pub fn find_by_name<'a>(catalog: &'a [Venue], name: &str) -> Option<&'a Venue> {
    let name = name.trim();
    catalog.iter().find(|v| v.name == name)
}

fn vibe_matches(requested: &str, venue: &Venue) -> bool {
    if venue.has_vibe(requested) {
        return true;
    }
    match requested {
        "active" => ACTIVE_ALIASES.iter().any(|alias| venue.has_vibe(alias)),
        "party" => PARTY_ALIASES.iter().any(|alias| venue.has_vibe(alias)),
        _ => false,
    }
}

pub fn is_bachelorette_safe(venue: &Venue) -> bool {
    let name = venue.lowercase_name();
    if BACHELORETTE_DENY_NAMES.iter().any(|s| name.contains(s)) {
        return false;
    }
    !(venue.has_vibe("golf") || venue.has_vibe("baseball"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(name: &str, category: Category, vibes: &[&str], themes: &[Theme]) -> Venue {
        let mut v = Venue::placeholder(name, category).with_vibes(vibes);
        v.themes = themes.to_vec();
        v
    }

    fn vibes(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_filter_matches_category_theme_and_vibes_in_catalog_order() {
        let catalog = vec![
            venue("Club", Category::Nightlife, &["dancing"], &[Theme::Bachelorette]),
            venue("Sports Bar", Category::Nightlife, &["party"], &[Theme::Wmpo]),
            venue("Lounge", Category::Nightlife, &["relax"], &[]),
            venue("Rooftop", Category::Nightlife, &["drinks"], &[Theme::Bachelorette]),
        ];

        let names: Vec<&str> = filter_venues(
            &catalog,
            Some(Theme::Bachelorette),
            &vibes(&["party"]),
            &Category::Nightlife,
        )
        .iter()
        .map(|v| v.name.as_str())
        .collect();

        assert_eq!(names, vec!["Club", "Rooftop"]);
    }

    #[test]
    fn test_active_alias_and_no_vibes() {
        let catalog = vec![
            venue("Camelback Hike", Category::Activity, &["hiking"], &[]),
            venue("Spa", Category::Activity, &["relax"], &[]),
        ];

        let active = filter_venues(&catalog, None, &vibes(&["Active"]), &Category::Activity);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Camelback Hike");

        let all = filter_venues(&catalog, None, &[], &Category::Activity);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_brunch_ignores_theme() {
        let catalog = vec![venue("Cafe", Category::Brunch, &[], &[Theme::Wmpo])];
        let found = filter_venues(&catalog, Some(Theme::Bachelorette), &[], &Category::Brunch);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_critical_categories_fall_back_to_full_category() {
        let catalog = vec![
            venue("Steakhouse", Category::Dining, &["foodie"], &[Theme::Wmpo]),
            venue("Hike", Category::Activity, &["active"], &[Theme::Wmpo]),
        ];
        let party = vibes(&["party"]);

        let dining = filter_with_fallback(&catalog, Some(Theme::Bachelorette), &party, &Category::Dining);
        assert_eq!(dining.len(), 1);

        let activity = filter_with_fallback(&catalog, Some(Theme::Bachelorette), &party, &Category::Activity);
        assert!(activity.is_empty());
    }

    #[test]
    fn test_bachelorette_safety() {
        assert!(!is_bachelorette_safe(&venue("Topgolf Scottsdale", Category::Activity, &[], &[])));
        assert!(!is_bachelorette_safe(&venue("Pool Party", Category::Pool, &["baseball"], &[])));
        assert!(!is_bachelorette_safe(&venue("Salt River Fields", Category::Activity, &[], &[])));
        assert!(is_bachelorette_safe(&venue("Rancher Hat Bar", Category::Activity, &["shopping"], &[])));
    }
}
