//! Day descriptions and trip summaries.
//!
//! Every text starts from a deterministic draft. When a [`Narrator`] is
//! configured the draft is handed to it for a rewrite under a timeout; any
//! failure returns the draft unchanged.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::{join, join_all, BoxFuture};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::itinerary::Itinerary;
use crate::models::trip::Trip;
use crate::models::venue::Theme;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DAY_MAX_TOKENS: u32 = 120;
const SUMMARY_MAX_TOKENS: u32 = 400;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingCredentials,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Narrator returned status {0}")]
    Status(u16),
    #[error("Narrator returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativePrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// Text-generation collaborator. Implementations may fail freely; callers
/// always hold a fallback.
pub trait Narrator: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a NarrativePrompt) -> BoxFuture<'a, Result<String, NarrativeError>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiNarrator {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiNarrator {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NarrativeError> {
        if api_key.trim().is_empty() {
            return Err(NarrativeError::MissingCredentials);
        }
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        })
    }

    pub fn from_env(timeout: Duration) -> Result<Self, NarrativeError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| NarrativeError::MissingCredentials)?;
        Self::new(
            api_key,
            std::env::var("OPENAI_BASE_URL").ok(),
            std::env::var("OPENAI_MODEL").ok(),
            timeout,
        )
    }

    async fn chat(&self, prompt: &NarrativePrompt) -> Result<String, NarrativeError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            max_tokens: prompt.max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NarrativeError::Status(response.status().as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(NarrativeError::EmptyResponse)
    }
}

impl Narrator for OpenAiNarrator {
    fn complete<'a>(&'a self, prompt: &'a NarrativePrompt) -> BoxFuture<'a, Result<String, NarrativeError>> {
        Box::pin(self.chat(prompt))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayNarrative {
    pub day: NaiveDate,
    pub day_label: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanNarrative {
    pub summary: String,
    pub days: Vec<DayNarrative>,
}

#[derive(Clone)]
pub struct NarrativeService {
    narrator: Option<Arc<dyn Narrator>>,
    timeout: Duration,
}

impl NarrativeService {
    pub fn new(narrator: Option<Arc<dyn Narrator>>, timeout: Duration) -> Self {
        Self { narrator, timeout }
    }

    /// Drafts only.
    pub fn offline() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    pub fn has_narrator(&self) -> bool {
        self.narrator.is_some()
    }

    pub async fn describe_day(&self, theme: Theme, day_index: usize, total_days: usize) -> String {
        let is_arrival = day_index == 0;
        let is_departure = total_days > 1 && day_index + 1 == total_days;
        let draft = day_draft(theme, day_index, is_arrival, is_departure).to_string();

        let prompt = NarrativePrompt {
            system: format!(
                "You write exactly two short sentences (each under 25 words) describing this upcoming day of a Scottsdale {}. No bullet points. Output only two sentences separated by a newline.",
                theme_description(theme)
            ),
            user: format!(
                "Day {} of {}. Arrival: {}, Departure: {}. Current draft: {}",
                day_index + 1,
                total_days,
                is_arrival,
                is_departure,
                draft
            ),
            max_tokens: DAY_MAX_TOKENS,
        };
        self.rewrite(prompt, draft).await
    }

    pub async fn summarize_trip(&self, trip: &Trip, itinerary: &Itinerary) -> String {
        let draft = trip_summary_draft(trip);
        let prompt = NarrativePrompt {
            system: summary_system_prompt(trip.theme),
            user: format!(
                "Write the upcoming trip summary in the tone described. Give 2-3 lines with the big highlights: golf, the baseball game (name the team), spa or pool party, using what's actually in the itinerary.\n\nBase context: {}\n\nItinerary by day:\n{}",
                draft,
                itinerary_by_day(itinerary)
            ),
            max_tokens: SUMMARY_MAX_TOKENS,
        };
        self.rewrite(prompt, draft).await
    }

    /// The summary and every day description are requested together, so a
    /// slow narrator costs one timeout rather than one per day.
    pub async fn plan_narrative(&self, trip: &Trip, itinerary: &Itinerary) -> PlanNarrative {
        let days = itinerary.days();
        let total = days.len();

        let descriptions = join_all((0..total).map(|index| self.describe_day(trip.theme, index, total)));
        let (summary, descriptions) = join(self.summarize_trip(trip, itinerary), descriptions).await;

        let days = days
            .into_iter()
            .zip(descriptions)
            .map(|(day, description)| DayNarrative {
                day,
                day_label: itinerary
                    .slots_on(day)
                    .next()
                    .map(|s| s.day_label.clone())
                    .unwrap_or_default(),
                description,
            })
            .collect();

        PlanNarrative { summary, days }
    }

    async fn rewrite(&self, prompt: NarrativePrompt, draft: String) -> String {
        let Some(narrator) = &self.narrator else {
            return draft;
        };

        match tokio::time::timeout(self.timeout, narrator.complete(&prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                debug!("Narrator returned empty text, keeping draft");
                draft
            }
            Ok(Err(e)) => {
                warn!("Narrator failed, keeping draft: {}", e);
                draft
            }
            Err(_) => {
                warn!("Narrator timed out after {:?}, keeping draft", self.timeout);
                draft
            }
        }
    }
}

fn theme_description(theme: Theme) -> &'static str {
    match theme {
        Theme::SpringTraining => "Spring Training baseball trip",
        Theme::Wmpo => "WM Phoenix Open golf trip",
        Theme::Bachelorette => "bachelorette weekend",
    }
}

pub fn day_draft(theme: Theme, day_index: usize, is_arrival: bool, is_departure: bool) -> &'static str {
    match theme {
        Theme::Bachelorette => {
            if is_arrival {
                "Welcome drinks at the place, then we're hitting dinner and going out. The ultimate Scottsdale weekend starts now."
            } else if is_departure {
                "Final brunch and one more photo op. Don't forget Old Town or a cactus pic on the way."
            } else if day_index == 1 {
                "The full day: brunch, pool or cabana, then dinner and going out. This is what we came for."
            } else {
                "Spa or chill time, then dinner and nightlife. We can go hard or take it easy, your call."
            }
        }
        Theme::SpringTraining => {
            if is_arrival {
                "Welcome to Scottsdale. Check in, then dinner and a night out to start the trip.\nGet some rest, game day is tomorrow."
            } else if is_departure {
                "Final brunch and hit the road.\nSafe travels, see you next spring."
            } else if day_index == 1 {
                "Brunch, then head to the ballpark for a 1 PM game.\nAfter the game, dinner and nightlife."
            } else if day_index == 2 {
                "Brunch and activity or rest during the day.\n6 PM game, then dinner and nightlife."
            } else {
                "Brunch, baseball, dinner, and nightlife.\nFull day at the ballpark and around town."
            }
        }
        Theme::Wmpo => {
            if is_arrival {
                "You'll roll in, grab dinner, and get ready for golf and the tournament. Think of this as your warm-up day before the WM Phoenix Open action."
            } else if is_departure {
                "You'll squeeze in one more round or brunch, then head out after an easy morning. Travel day, with one last Scottsdale stop if you want it."
            } else if day_index == 1 {
                "You'll spend the day at the WM Phoenix Open with on-course food, drinks, cabanas, and party tents, then head to the Coors Light Birds Nest or another concert that night."
            } else if day_index == 2 {
                "You'll be back at the WM Phoenix Open or on the course all day with plenty of food and drinks on-site, then go out for a concert, Birds Nest, or Old Town afterward."
            } else {
                "You'll mix tee times or tournament time with dinners and nightlife around Scottsdale, keeping the WM Phoenix Open energy going."
            }
        }
    }
}

pub fn trip_summary_draft(trip: &Trip) -> String {
    let days = (trip.departure - trip.arrival).num_days() + 1;
    let vibes = trip.active_vibes();
    let vibe_text = if vibes.is_empty() {
        "Balanced".to_string()
    } else {
        vibes.iter().map(|v| title_case(v)).collect::<Vec<_>>().join(", ")
    };

    match trip.theme {
        Theme::SpringTraining => format!(
            "Your {}-day Scottsdale trip will be a mix of a friends trip and baseball. Spring Training with {}, team: {}. Games, dinners, and nightlife. Confirm or swap any slot, then lock in tickets and reservations.",
            days,
            vibe_text,
            trip.team.label()
        ),
        Theme::Bachelorette => format!(
            "Your {}-day Scottsdale bachelorette will be planned for the ultimate weekend. Welcome drinks, brunch, pool, spa, dinner, and nightlife will all be lined up so you and the squad can focus on having the best time.",
            days
        ),
        Theme::Wmpo => format!(
            "Your {}-day Scottsdale trip will be built for the WM Phoenix Open: golf, watching golf, and going out. Tee times, dinners, and nightlife will be set up for the crew. Confirm or swap slots, then lock in reservations.",
            days
        ),
    }
}

fn summary_system_prompt(theme: Theme) -> String {
    let highlights = "Write 2-3 sentences (2-3 lines) that call out the big highlights from the itinerary: e.g. golf (if present), the baseball game and which team (if present), spa or pool party (if present). Use the exact team/venue names from the itinerary. No bullet points.";
    let persona = match theme {
        Theme::Bachelorette => "You are the maid of honor writing an upcoming trip summary for the bachelorette squad. Tone: fun, excited, warm and inclusive.",
        Theme::Wmpo => "You write upcoming trip summaries for a guys trip to the WM Phoenix Open. Tone: laid-back, not cringe.",
        Theme::SpringTraining => "You write upcoming trip summaries for a Scottsdale Spring Training trip. Tone: sports + good times.",
    };
    format!("{} {}", persona, highlights)
}

fn itinerary_by_day(itinerary: &Itinerary) -> String {
    itinerary
        .days()
        .into_iter()
        .map(|day| {
            let items: Vec<String> = itinerary
                .slots_on(day)
                .map(|s| format!("{} {}: {}", s.time, s.slot_type, s.display_name()))
                .collect();
            let label = itinerary
                .slots_on(day)
                .next()
                .map(|s| s.day_label.as_str())
                .unwrap_or("");
            format!("{}: {}", label, items.join("; "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::Team;
    use chrono::Utc;

    struct FixedNarrator(&'static str);

    impl Narrator for FixedNarrator {
        fn complete<'a>(&'a self, _prompt: &'a NarrativePrompt) -> BoxFuture<'a, Result<String, NarrativeError>> {
            Box::pin(async move { Ok(self.0.to_string()) })
        }
    }

    struct FailingNarrator;

    impl Narrator for FailingNarrator {
        fn complete<'a>(&'a self, _prompt: &'a NarrativePrompt) -> BoxFuture<'a, Result<String, NarrativeError>> {
            Box::pin(async { Err(NarrativeError::EmptyResponse) })
        }
    }

    struct StalledNarrator;

    impl Narrator for StalledNarrator {
        fn complete<'a>(&'a self, _prompt: &'a NarrativePrompt) -> BoxFuture<'a, Result<String, NarrativeError>> {
            Box::pin(futures::future::pending())
        }
    }

    fn trip(theme: Theme) -> Trip {
        Trip {
            trip_id: "abcd1234".to_string(),
            created_at: Utc::now(),
            theme,
            arrival: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            departure: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            group_size: 6,
            budget_min: 500,
            budget_max: 1500,
            team: Team::Giants,
            trip_name: "Spring Training Trip".to_string(),
            vibes: vec!["party".to_string(), "foodie".to_string()],
            votes: Vec::new(),
            reconciled_preferences: None,
            plan_a: None,
            plan_b: None,
            selected_plan: None,
        }
    }

    #[test]
    fn test_offline_service_returns_drafts() {
        let service = NarrativeService::offline();
        let text = tokio_test::block_on(service.describe_day(Theme::SpringTraining, 1, 4));
        assert_eq!(text, day_draft(Theme::SpringTraining, 1, false, false));
        assert!(text.contains("1 PM game"));
    }

    #[test]
    fn test_departure_day_uses_departure_draft() {
        let service = NarrativeService::offline();
        let text = tokio_test::block_on(service.describe_day(Theme::Bachelorette, 3, 4));
        assert!(text.starts_with("Final brunch"));
    }

    #[test]
    fn test_narrator_text_replaces_draft() {
        let service = NarrativeService::new(Some(Arc::new(FixedNarrator("  Big day.\nBigger night.  "))), Duration::from_secs(1));
        let text = tokio_test::block_on(service.describe_day(Theme::Wmpo, 1, 3));
        assert_eq!(text, "Big day.\nBigger night.");
    }

    #[test]
    fn test_failures_fall_back_to_draft() {
        let failing = NarrativeService::new(Some(Arc::new(FailingNarrator)), Duration::from_secs(1));
        let empty = NarrativeService::new(Some(Arc::new(FixedNarrator("   "))), Duration::from_secs(1));
        let draft = day_draft(Theme::Wmpo, 0, true, false);

        assert_eq!(tokio_test::block_on(failing.describe_day(Theme::Wmpo, 0, 3)), draft);
        assert_eq!(tokio_test::block_on(empty.describe_day(Theme::Wmpo, 0, 3)), draft);
    }

    #[test]
    fn test_timeout_falls_back_to_draft() {
        let service = NarrativeService::new(Some(Arc::new(StalledNarrator)), Duration::from_millis(20));
        let trip = trip(Theme::SpringTraining);
        let itinerary = Itinerary::new(crate::models::itinerary::Variant::Premium, Vec::new());

        let summary = tokio_test::block_on(service.summarize_trip(&trip, &itinerary));
        assert_eq!(summary, trip_summary_draft(&trip));
    }

    #[test]
    fn test_plan_narrative_waits_one_timeout_for_all_days() {
        use crate::models::itinerary::Variant;
        use crate::services::itinerary_generation_service::{ItineraryGenerator, TripContext};

        let timeout = Duration::from_millis(200);
        let service = NarrativeService::new(Some(Arc::new(StalledNarrator)), timeout);
        let trip = trip(Theme::SpringTraining);
        let context = TripContext {
            theme: Some(trip.theme),
            vibes: trip.vibes.clone(),
            arrival: trip.arrival,
            departure: trip.departure,
            team: trip.team,
            variant: Variant::Premium,
            must_haves: Default::default(),
        };
        let itinerary = ItineraryGenerator::default().build_itinerary(&[], &context).unwrap();

        let started = std::time::Instant::now();
        let narrative = tokio_test::block_on(service.plan_narrative(&trip, &itinerary));
        let elapsed = started.elapsed();

        assert_eq!(narrative.days.len(), 4);
        assert_eq!(narrative.summary, trip_summary_draft(&trip));
        assert_eq!(narrative.days[3].description, day_draft(Theme::SpringTraining, 3, false, true));
        // five stalled calls, one shared timeout
        assert!(elapsed < timeout * 3, "took {:?}", elapsed);
    }

    #[test]
    fn test_summary_draft_mentions_days_vibes_and_team() {
        let summary = trip_summary_draft(&trip(Theme::SpringTraining));
        assert!(summary.starts_with("Your 4-day Scottsdale trip"));
        assert!(summary.contains("Party, Foodie"));
        assert!(summary.contains("team: SF Giants"));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = OpenAiNarrator::new(" ".to_string(), None, None, Duration::from_secs(1));
        assert!(matches!(result, Err(NarrativeError::MissingCredentials)));
    }
}
