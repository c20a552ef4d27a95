//! Travel Time Estimates
//!
//! Fills `travel_minutes` on transport slots from the straight-line distance
//! between the venue before and the venue after the ride. Slot venues are
//! often minimal records, so coordinates are looked up in the catalog by name.

use std::collections::HashMap;

use crate::models::itinerary::Slot;
use crate::models::venue::Venue;

const EARTH_RADIUS_MILES: f64 = 3959.0;
const AVERAGE_METRO_MPH: f64 = 25.0;
const MIN_TRAVEL_MINUTES: u32 = 5;

pub fn add_travel_times_to_slots(slots: &mut [Slot], catalog: &[Venue]) {
    let by_name: HashMap<&str, &Venue> = catalog.iter().map(|v| (v.name.trim(), v)).collect();

    for i in 0..slots.len() {
        if !slots[i].is_transport() {
            continue;
        }
        let prev = if i > 0 { slots[i - 1].venue.as_ref() } else { None };
        let next = slots.get(i + 1).and_then(|s| s.venue.as_ref());

        let from = prev.map(|v| by_name.get(v.name.trim()).copied().unwrap_or(v));
        let to = next.map(|v| by_name.get(v.name.trim()).copied().unwrap_or(v));

        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };
        let (Some(from_coords), Some(to_coords)) = (from.coordinates(), to.coordinates()) else {
            continue;
        };

        let minutes = estimate_drive_minutes(haversine_miles(from_coords, to_coords));
        let from_name = from.name.clone();
        let to_name = to.name.clone();

        let slot = &mut slots[i];
        slot.travel_minutes = Some(minutes);
        slot.from_venue_name = Some(from_name);
        slot.to_venue_name = Some(to_name);
    }
}

/// Calculate distance between two points using Haversine formula
pub fn haversine_miles(from: (f64, f64), to: (f64, f64)) -> f64 {
    let lat1_rad = from.0.to_radians();
    let lat2_rad = to.0.to_radians();
    let delta_lat = (to.0 - from.0).to_radians();
    let delta_lon = (to.1 - from.1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

pub fn estimate_drive_minutes(miles: f64) -> u32 {
    if miles <= 0.0 {
        return 0;
    }
    let minutes = (miles / AVERAGE_METRO_MPH * 60.0).round() as u32;
    minutes.max(MIN_TRAVEL_MINUTES)
}
