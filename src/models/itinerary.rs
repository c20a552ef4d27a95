use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::venue::Venue;

/// Display labels for generated slots. Exports and the swap engine key off these.
pub mod slot_type {
    pub const WELCOME: &str = "Welcome drinks at accommodations";
    pub const TRANSPORTATION: &str = "Transportation";
    pub const DEPARTURE_TRANSPORTATION: &str = "Transportation (departure)";
    pub const BRUNCH: &str = "Breakfast / Brunch";
    pub const DINNER: &str = "Dinner";
    pub const NIGHTLIFE: &str = "Nightlife";
    pub const ACTIVITY: &str = "Activity";
    pub const BASEBALL_GAME: &str = "Baseball Game";
    pub const WMPO_TOURNAMENT: &str = "WM Phoenix Open — Tournament Day";
    pub const WMPO_GOLF: &str = "Golf / WM Phoenix Open Day";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Premium,
    Balanced,
}

impl Variant {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "premium" | "a" => Some(Variant::Premium),
            "balanced" | "b" => Some(Variant::Balanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Premium => "premium",
            Variant::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub day: NaiveDate,
    pub day_label: String,
    pub time: String,
    #[serde(rename = "type")]
    pub slot_type: String,
    pub venue: Option<Venue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_venue_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_venue_name: Option<String>,
}

impl Slot {
    pub fn venue_name(&self) -> Option<&str> {
        self.venue.as_ref().map(|v| v.name.trim())
    }

    /// Name shown to the user; unresolved slots render as "TBD".
    pub fn display_name(&self) -> &str {
        self.venue_name().unwrap_or("TBD")
    }

    pub fn is_transport(&self) -> bool {
        self.slot_type.starts_with("Transport")
    }

    pub fn start_minutes(&self) -> Option<u32> {
        time_label_minutes(&self.time)
    }
}

/// Minutes after midnight for a clock label such as "1:00 PM" or "10:15 p.m.".
pub fn time_label_minutes(label: &str) -> Option<u32> {
    let re = Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*([AaPp])\.?[Mm]\.?\s*$").ok()?;
    let caps = re.captures(label)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour == 0 || hour > 12 || minute > 59 {
        return None;
    }

    let pm = caps[3].eq_ignore_ascii_case("p");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    Some(hour * 60 + minute)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Pending,
    Confirmed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub variant: Variant,
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub slot_status: BTreeMap<String, SlotStatus>,
}

impl Itinerary {
    pub fn new(variant: Variant, slots: Vec<Slot>) -> Self {
        Self {
            variant,
            slots,
            slot_status: BTreeMap::new(),
        }
    }

    pub fn slot(&self, slot_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }

    pub fn status_of(&self, slot_id: &str) -> SlotStatus {
        self.slot_status
            .get(slot_id)
            .copied()
            .unwrap_or(SlotStatus::Pending)
    }

    /// Calendar dates in plan order, one entry per day.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = Vec::new();
        for slot in &self.slots {
            if days.last() != Some(&slot.day) {
                days.push(slot.day);
            }
        }
        days
    }

    pub fn slots_on(&self, day: NaiveDate) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(move |s| s.day == day)
    }
}
