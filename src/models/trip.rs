use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::itinerary::{Itinerary, Variant};
use super::venue::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Dbacks,
    Rockies,
    #[default]
    Cubs,
    As,
    Giants,
}

impl Team {
    pub fn label(&self) -> &'static str {
        match self {
            Team::Dbacks => "Diamondbacks",
            Team::Rockies => "Rockies",
            Team::Cubs => "Cubs",
            Team::As => "A's",
            Team::Giants => "SF Giants",
        }
    }

    /// Team identifiers as they appear in a baseball venue's `teams` list.
    pub fn venue_names(&self) -> &'static [&'static str] {
        match self {
            Team::Dbacks => &["AZ Diamondbacks"],
            Team::Rockies => &["CO Rockies"],
            Team::Cubs => &["Chicago Cubs"],
            Team::As => &["A's"],
            Team::Giants => &["SF Giants"],
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MustHave {
    Pool,
    Spa,
    NiceDinner,
    Golf,
    Baseball,
    Brunch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_name: String,
    pub vibes: Vec<String>,
    #[serde(default)]
    pub free_text: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteSubmission {
    pub voter_name: String,
    #[serde(default)]
    pub vibes: Vec<String>,
    #[serde(default)]
    pub free_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibeWeight {
    pub vibe: String,
    pub weight: f64,
}

/// Vibe weights in order of first appearance across the votes. Stored as a
/// `{vibe: weight}` document whose key order is that appearance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PreferenceProfile {
    pub weights: Vec<VibeWeight>,
}

impl PreferenceProfile {
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weight(&self, vibe: &str) -> Option<f64> {
        self.weights.iter().find(|w| w.vibe == vibe).map(|w| w.weight)
    }

    /// Top `n` vibes by weight; equal weights keep first-appearance order.
    pub fn top_vibes(&self, n: usize) -> Vec<String> {
        let mut sorted: Vec<&VibeWeight> = self.weights.iter().collect();
        sorted.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.into_iter().take(n).map(|w| w.vibe.clone()).collect()
    }
}

impl TryFrom<Map<String, Value>> for PreferenceProfile {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let weights = map
            .into_iter()
            .map(|(vibe, value)| match value.as_f64() {
                Some(weight) => Ok(VibeWeight { vibe, weight }),
                None => Err(format!("weight for vibe '{}' is not a number", vibe)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { weights })
    }
}

impl From<PreferenceProfile> for Map<String, Value> {
    fn from(profile: PreferenceProfile) -> Self {
        profile
            .weights
            .into_iter()
            .map(|w| (w.vibe, Value::from(w.weight)))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTripRequest {
    pub theme: Theme,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    pub group_size: u8,
    pub budget_min: u32,
    pub budget_max: u32,
    #[serde(default)]
    pub team: Team,
    #[serde(default)]
    pub trip_name: Option<String>,
    #[serde(default)]
    pub vibes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub created_at: DateTime<Utc>,
    pub theme: Theme,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    pub group_size: u8,
    pub budget_min: u32,
    pub budget_max: u32,
    pub team: Team,
    pub trip_name: String,
    #[serde(default)]
    pub vibes: Vec<String>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default)]
    pub reconciled_preferences: Option<PreferenceProfile>,
    #[serde(default)]
    pub plan_a: Option<Itinerary>,
    #[serde(default)]
    pub plan_b: Option<Itinerary>,
    #[serde(default)]
    pub selected_plan: Option<Variant>,
}

impl Trip {
    pub fn plan(&self, variant: Variant) -> Option<&Itinerary> {
        match variant {
            Variant::Premium => self.plan_a.as_ref(),
            Variant::Balanced => self.plan_b.as_ref(),
        }
    }

    pub fn plan_mut(&mut self, variant: Variant) -> Option<&mut Itinerary> {
        match variant {
            Variant::Premium => self.plan_a.as_mut(),
            Variant::Balanced => self.plan_b.as_mut(),
        }
    }

    /// Reconciled group vibes when anyone has voted, otherwise the organizer's pick.
    pub fn active_vibes(&self) -> Vec<String> {
        match &self.reconciled_preferences {
            Some(profile) if !profile.is_empty() => profile.top_vibes(3),
            _ => self.vibes.clone(),
        }
    }
}
