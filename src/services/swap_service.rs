//! Swap candidates and forward de-duplication for generated plans.

use log::{debug, warn};
use thiserror::Error;

use crate::models::itinerary::{Itinerary, Slot, SlotStatus};
use crate::models::venue::{Category, Theme, Venue};
use crate::services::itinerary_generation_service::is_tournament_venue;
use crate::services::venue_filter::{filter_venues, find_by_name, is_bachelorette_safe, venues_in_category};

pub const DEFAULT_ALTERNATIVES: usize = 2;
pub const DEDUP_ALTERNATIVES: usize = 3;
pub const OPEN_CHOICE_NAME: &str = "Your choice";

const GOLF_ENTERTAINMENT_NAMES: [&str; 4] = ["topgolf", "popstroke", "putt", "puttshack"];

#[derive(Debug, Error, PartialEq)]
pub enum SwapError {
    #[error("Slot not found: {0}")]
    UnknownSlot(String),
    #[error("Venue not found in catalog: {0}")]
    UnknownVenue(String),
}

/// Catalog category a slot label draws from.
pub fn category_for_slot_type(slot_type: &str) -> Category {
    let label = slot_type.to_lowercase();
    if label.contains("breakfast") || label.contains("brunch") {
        Category::Brunch
    } else if label.contains("dinner") {
        Category::Dining
    } else if label.contains("nightlife") {
        Category::Nightlife
    } else if label.contains("transport") {
        Category::Transport
    } else {
        Category::Activity
    }
}

/// Up to `k` replacement venues for a slot, in catalog order, never the
/// slot's current venue.
pub fn swap_alternatives<'a>(
    catalog: &'a [Venue],
    theme: Option<Theme>,
    vibes: &[String],
    slot: &Slot,
    k: usize,
) -> Vec<&'a Venue> {
    let current = slot.venue_name().unwrap_or("");
    let is_current = |v: &Venue| !current.is_empty() && v.name.trim() == current;

    if theme == Some(Theme::Wmpo) && is_tournament_slot(slot) {
        let candidates = tournament_alternatives(catalog);
        let mut out: Vec<&Venue> = Vec::new();
        push_until(&mut out, candidates, k, is_current);
        if out.len() < k {
            let fallback = filter_venues(catalog, theme, vibes, &Category::Activity);
            push_until(&mut out, fallback, k, is_current);
        }
        return out;
    }

    let category = category_for_slot_type(&slot.slot_type);
    let bachelorette = theme == Some(Theme::Bachelorette);
    let safe = |venues: Vec<&'a Venue>| -> Vec<&'a Venue> {
        if bachelorette {
            venues.into_iter().filter(|v| is_bachelorette_safe(v)).collect()
        } else {
            venues
        }
    };

    let mut out: Vec<&Venue> = Vec::new();
    push_until(&mut out, safe(filter_venues(catalog, theme, vibes, &category)), k, is_current);
    if out.len() < k {
        push_until(&mut out, safe(venues_in_category(catalog, &category)), k, is_current);
    }
    out
}

fn is_tournament_slot(slot: &Slot) -> bool {
    slot.slot_type.to_lowercase().contains("wm phoenix open")
        || slot.venue.as_ref().map_or(false, is_tournament_venue)
}

/// Golf entertainment first, then real golf courses, without duplicates.
fn tournament_alternatives(catalog: &[Venue]) -> Vec<&Venue> {
    let entertainment_name =
        |v: &Venue| GOLF_ENTERTAINMENT_NAMES.iter().any(|g| v.lowercase_name().contains(g));

    let golf_entertainment = catalog.iter().filter(|v| {
        v.category == Category::Activity
            && v.supports_theme(Theme::Wmpo)
            && (v.has_vibe("golf") || entertainment_name(v))
    });
    let golf_courses = catalog.iter().filter(|v| {
        v.category == Category::Golf
            || (v.category == Category::Activity
                && v.has_vibe("golf")
                && v.supports_theme(Theme::Wmpo)
                && !entertainment_name(v))
    });

    golf_entertainment.chain(golf_courses).collect()
}

fn push_until<'a>(
    out: &mut Vec<&'a Venue>,
    candidates: Vec<&'a Venue>,
    k: usize,
    is_current: impl Fn(&Venue) -> bool,
) {
    for venue in candidates {
        if out.len() >= k {
            break;
        }
        if is_current(venue) || out.iter().any(|v| v.name == venue.name) {
            continue;
        }
        out.push(venue);
    }
}

/// After `chosen` is committed to `anchor_slot_id`, replace any later
/// non-transport slot holding the same venue with its first alternative, or
/// an open "Your choice" placeholder when none exists.
///
/// Never fails: on an internal error the itinerary is left untouched.
pub fn dedupe_forward(
    itinerary: &mut Itinerary,
    anchor_slot_id: &str,
    chosen: &Venue,
    catalog: &[Venue],
    theme: Option<Theme>,
    vibes: &[String],
) {
    match deduped_slots(&itinerary.slots, anchor_slot_id, chosen, catalog, theme, vibes) {
        Ok(Some(slots)) => itinerary.slots = slots,
        Ok(None) => {}
        Err(e) => warn!("Skipping forward de-duplication: {}", e),
    }
}

fn deduped_slots(
    slots: &[Slot],
    anchor_slot_id: &str,
    chosen: &Venue,
    catalog: &[Venue],
    theme: Option<Theme>,
    vibes: &[String],
) -> Result<Option<Vec<Slot>>, SwapError> {
    let chosen_name = chosen.name.trim();
    if chosen_name.is_empty() || chosen.category == Category::Transport {
        return Ok(None);
    }

    let anchor = slots
        .iter()
        .position(|s| s.id == anchor_slot_id)
        .ok_or_else(|| SwapError::UnknownSlot(anchor_slot_id.to_string()))?;

    let mut updated = slots.to_vec();
    let mut replaced = 0;
    for slot in updated.iter_mut().skip(anchor + 1) {
        if slot.is_transport() || slot.venue_name() != Some(chosen_name) {
            continue;
        }
        let replacement = swap_alternatives(catalog, theme, vibes, slot, DEDUP_ALTERNATIVES)
            .into_iter()
            .find(|v| v.name.trim() != chosen_name)
            .cloned();
        let original_category = slot
            .venue
            .as_ref()
            .map(|v| v.category.clone())
            .unwrap_or_else(|| category_for_slot_type(&slot.slot_type));

        slot.venue = Some(replacement.unwrap_or_else(|| Venue::placeholder(OPEN_CHOICE_NAME, original_category)));
        replaced += 1;
    }

    if replaced == 0 {
        return Ok(None);
    }
    debug!("Replaced {} later occurrences of {}", replaced, chosen_name);
    Ok(Some(updated))
}

/// Put a catalog venue into a slot, confirm it, and de-duplicate later slots.
pub fn apply_swap(
    itinerary: &mut Itinerary,
    slot_id: &str,
    venue_name: &str,
    catalog: &[Venue],
    theme: Option<Theme>,
    vibes: &[String],
) -> Result<Venue, SwapError> {
    let venue = find_by_name(catalog, venue_name)
        .cloned()
        .ok_or_else(|| SwapError::UnknownVenue(venue_name.trim().to_string()))?;
    let slot = itinerary
        .slots
        .iter_mut()
        .find(|s| s.id == slot_id)
        .ok_or_else(|| SwapError::UnknownSlot(slot_id.to_string()))?;

    slot.venue = Some(venue.clone());
    itinerary
        .slot_status
        .insert(slot_id.to_string(), SlotStatus::Confirmed);
    dedupe_forward(itinerary, slot_id, &venue, catalog, theme, vibes);
    Ok(venue)
}

/// Confirm the slot's current venue. Open placeholders and unresolved slots
/// are confirmed without touching later slots.
pub fn confirm_slot(
    itinerary: &mut Itinerary,
    slot_id: &str,
    catalog: &[Venue],
    theme: Option<Theme>,
    vibes: &[String],
) -> Result<(), SwapError> {
    let chosen = itinerary
        .slot(slot_id)
        .ok_or_else(|| SwapError::UnknownSlot(slot_id.to_string()))?
        .venue
        .clone();

    itinerary
        .slot_status
        .insert(slot_id.to_string(), SlotStatus::Confirmed);
    if let Some(venue) = chosen.filter(|v| v.name != OPEN_CHOICE_NAME) {
        dedupe_forward(itinerary, slot_id, &venue, catalog, theme, vibes);
    }
    Ok(())
}

pub fn skip_slot(itinerary: &mut Itinerary, slot_id: &str) -> Result<(), SwapError> {
    if itinerary.slot(slot_id).is_none() {
        return Err(SwapError::UnknownSlot(slot_id.to_string()));
    }
    itinerary
        .slot_status
        .insert(slot_id.to_string(), SlotStatus::Skipped);
    Ok(())
}
