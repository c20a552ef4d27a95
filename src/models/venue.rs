use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    #[serde(rename = "spring_training")]
    SpringTraining,
    #[serde(rename = "bachelorette")]
    Bachelorette,
    #[serde(rename = "wmpo")]
    Wmpo,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::SpringTraining, Theme::Bachelorette, Theme::Wmpo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::SpringTraining => "spring_training",
            Theme::Bachelorette => "bachelorette",
            Theme::Wmpo => "wmpo",
        }
    }

    /// Parse a theme label as it appears in catalog files or query strings.
    /// The legacy upper-case "WMPO" label maps to `Wmpo`; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "spring_training" => Some(Theme::SpringTraining),
            "bachelorette" => Some(Theme::Bachelorette),
            "wmpo" => Some(Theme::Wmpo),
            _ => None,
        }
    }

    /// "spring_training" -> "Spring Training"
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Brunch,
    Dining,
    Nightlife,
    Activity,
    Transport,
    Golf,
    Spa,
    Pool,
    Welcome,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Brunch => "brunch",
            Category::Dining => "dining",
            Category::Nightlife => "nightlife",
            Category::Activity => "activity",
            Category::Transport => "transport",
            Category::Golf => "golf",
            Category::Spa => "spa",
            Category::Pool => "pool",
            Category::Welcome => "welcome",
            Category::Other(raw) => raw.as_str(),
        }
    }

    /// Meal and transport categories never end up with an empty pool: the
    /// filter falls back to every venue of the category.
    pub fn is_slot_critical(&self) -> bool {
        matches!(
            self,
            Category::Brunch | Category::Dining | Category::Nightlife | Category::Transport
        )
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "brunch" => Category::Brunch,
            "dining" => Category::Dining,
            "nightlife" => Category::Nightlife,
            "activity" => Category::Activity,
            "transport" => Category::Transport,
            "golf" => Category::Golf,
            "spa" => Category::Spa,
            "pool" => Category::Pool,
            "welcome" => Category::Welcome,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Category::from(raw.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub price_tier: u8,
    #[serde(default)]
    pub vibes: Vec<String>,
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl Venue {
    /// Minimal record used for synthetic slots (welcome drinks, rideshare,
    /// "Your choice") that never came from the catalog.
    pub fn placeholder(name: &str, category: Category) -> Self {
        Self {
            name: name.to_string(),
            category,
            price_tier: 0,
            vibes: Vec::new(),
            themes: Vec::new(),
            teams: Vec::new(),
            area: None,
            lat: None,
            lon: None,
        }
    }

    pub fn with_vibes(mut self, vibes: &[&str]) -> Self {
        self.vibes = vibes.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn has_vibe(&self, vibe: &str) -> bool {
        self.vibes.iter().any(|v| v == vibe)
    }

    /// A venue without theme tags is valid for every theme.
    pub fn supports_theme(&self, theme: Theme) -> bool {
        self.themes.is_empty() || self.themes.contains(&theme)
    }

    pub fn lowercase_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
