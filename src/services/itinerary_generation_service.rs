use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use log::debug;
use thiserror::Error;

use crate::models::itinerary::{slot_type, Itinerary, Slot, Variant};
use crate::models::trip::{MustHave, Team};
use crate::models::venue::{Category, Theme, Venue};
use crate::services::travel_time_service::add_travel_times_to_slots;
use crate::services::venue_filter::{filter_venues, filter_with_fallback, is_bachelorette_safe};

const DEFAULT_TRANSPORT_OPTIONS: [&str; 4] = ["Lyft", "Uber", "Party Bus", "Private SUV"];
const DEFAULT_GAME_TIMES: [&str; 2] = ["1:00 PM", "6:00 PM"];
const NICE_DINNER_MIN_TIER: u8 = 3;

const TOURNAMENT_MARKER: &str = "wm phoenix open";
const GOLF_ENTERTAINMENT_NAMES: [&str; 5] = ["golf", "topgolf", "popstroke", "putt", "puttshack"];

#[derive(Debug, Error, PartialEq)]
pub enum ItineraryError {
    #[error("Departure date must be after arrival date (arrival {arrival}, departure {departure})")]
    InvalidDates {
        arrival: NaiveDate,
        departure: NaiveDate,
    },
}

#[derive(Debug, Clone)]
pub struct ItineraryGenerationConfig {
    /// Rideshare options cycled through transport slots, one step per slot
    pub transport_options: Vec<String>,
    /// First pitch times for the first full days of a spring training trip
    pub game_times: Vec<String>,
    /// Minimum price tier counted as a "nice dinner"
    pub nice_dinner_min_tier: u8,
    pub include_travel_times: bool,
}

impl Default for ItineraryGenerationConfig {
    fn default() -> Self {
        Self {
            transport_options: DEFAULT_TRANSPORT_OPTIONS.iter().map(|s| s.to_string()).collect(),
            game_times: DEFAULT_GAME_TIMES.iter().map(|s| s.to_string()).collect(),
            nice_dinner_min_tier: NICE_DINNER_MIN_TIER,
            include_travel_times: true,
        }
    }
}

impl ItineraryGenerationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            transport_options: std::env::var("ITINERARY_TRANSPORT_OPTIONS")
                .ok()
                .map(|s| split_list(&s))
                .unwrap_or(defaults.transport_options),
            game_times: std::env::var("ITINERARY_GAME_TIMES")
                .ok()
                .map(|s| split_list(&s))
                .filter(|times| !times.is_empty())
                .unwrap_or(defaults.game_times),
            nice_dinner_min_tier: std::env::var("NICE_DINNER_MIN_TIER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.nice_dinner_min_tier),
            include_travel_times: std::env::var("ITINERARY_TRAVEL_TIMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_travel_times),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Everything one generation run needs to know about the trip.
#[derive(Debug, Clone)]
pub struct TripContext {
    pub theme: Option<Theme>,
    pub vibes: Vec<String>,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    pub team: Team,
    pub variant: Variant,
    pub must_haves: BTreeSet<MustHave>,
}

pub struct ItineraryGenerator {
    config: ItineraryGenerationConfig,
}

impl Default for ItineraryGenerator {
    fn default() -> Self {
        Self::with_config(ItineraryGenerationConfig::default())
    }
}

impl ItineraryGenerator {
    pub fn new() -> Self {
        let config = ItineraryGenerationConfig::from_env();
        debug!("ItineraryGenerator initialized with config: {:?}", config);
        Self { config }
    }

    pub fn with_config(config: ItineraryGenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ItineraryGenerationConfig {
        &self.config
    }

    /// Schedule every day from arrival through departure.
    ///
    /// The only failure is a departure that is not after the arrival. Missing
    /// catalog data degrades to fallback pools or unresolved (`None`) venues.
    /// Rotation state lives for this call only, so two variants built from the
    /// same inputs rotate independently.
    pub fn build_itinerary(
        &self,
        catalog: &[Venue],
        ctx: &TripContext,
    ) -> Result<Itinerary, ItineraryError> {
        if ctx.departure <= ctx.arrival {
            return Err(ItineraryError::InvalidDates {
                arrival: ctx.arrival,
                departure: ctx.departure,
            });
        }

        let mut days: Vec<NaiveDate> = Vec::new();
        let mut next = Some(ctx.arrival);
        while let Some(day) = next.filter(|d| *d <= ctx.departure) {
            days.push(day);
            next = day.succ_opt();
        }

        let fallback_activities = default_bachelorette_activities();
        let pools = VenuePools::build(catalog, ctx, &fallback_activities);
        let mut planner = DayPlanner::new(&self.config, ctx, pools);

        let last = days.len() - 1;
        for (i, day) in days.iter().copied().enumerate() {
            if i == 0 {
                planner.plan_arrival_day(day, i);
            } else if i == last {
                planner.plan_departure_day(day, i);
            } else {
                // Full days are indexed from zero, starting the day after arrival.
                planner.plan_full_day(day, i, i - 1);
            }
        }

        let mut slots = planner.slots;
        if self.config.include_travel_times {
            add_travel_times_to_slots(&mut slots, catalog);
        }

        Ok(Itinerary::new(ctx.variant, slots))
    }
}

/// Pick from a candidate pool without repeating venues across days.
///
/// Unused venues come first, indexed by `day_index` modulo the pool size. The
/// previous day's venue is skipped when another unused one exists. Once every
/// candidate is used the whole pool cycles, still avoiding `last_used` when it
/// can. Returns `None` only for an empty pool.
pub fn pick_best_rotating<'a>(
    candidates: &[&'a Venue],
    used: &HashSet<String>,
    day_index: usize,
    last_used: Option<&str>,
) -> Option<&'a Venue> {
    if candidates.is_empty() {
        return None;
    }

    let mut available: Vec<&Venue> = candidates
        .iter()
        .copied()
        .filter(|v| !used.contains(&v.name))
        .collect();
    if !available.is_empty() {
        if let Some(last) = last_used {
            if available.len() > 1 {
                let fresh: Vec<&Venue> =
                    available.iter().copied().filter(|v| v.name != last).collect();
                if !fresh.is_empty() {
                    available = fresh;
                }
            }
        }
        return Some(available[day_index % available.len()]);
    }

    if let Some(last) = last_used {
        let others: Vec<&Venue> = candidates.iter().copied().filter(|v| v.name != last).collect();
        if !others.is_empty() {
            return Some(others[day_index % others.len()]);
        }
    }
    Some(candidates[day_index % candidates.len()])
}

/// First candidate not in `exclude`, else the first candidate.
pub fn pick_best<'a>(candidates: &[&'a Venue], exclude: &HashSet<String>) -> Option<&'a Venue> {
    candidates
        .iter()
        .copied()
        .find(|v| !exclude.contains(&v.name))
        .or_else(|| candidates.first().copied())
}

pub fn is_tournament_venue(venue: &Venue) -> bool {
    venue.lowercase_name().contains(TOURNAMENT_MARKER)
}

fn default_bachelorette_activities() -> Vec<Venue> {
    vec![
        Venue::placeholder("Hiking", Category::Activity),
        Venue::placeholder("Pool Day", Category::Pool),
        Venue::placeholder("Shopping at Fashion Square Mall", Category::Activity)
            .with_vibes(&["shopping"]),
        Venue::placeholder("Rancher Hat Bar", Category::Activity),
    ]
}

/// Candidate pools, computed once per generation.
struct VenuePools<'a> {
    brunch: Vec<&'a Venue>,
    dining: Vec<&'a Venue>,
    nightlife: Vec<&'a Venue>,
    activities: Vec<&'a Venue>,
    transport: Vec<&'a Venue>,
    baseball: Vec<&'a Venue>,
    bachelorette_pool: Vec<&'a Venue>,
    bachelorette_spa: Vec<&'a Venue>,
    bachelorette_midday: Vec<&'a Venue>,
    tournament: Vec<&'a Venue>,
    golf_entertainment: Vec<&'a Venue>,
}

impl<'a> VenuePools<'a> {
    fn build(catalog: &'a [Venue], ctx: &TripContext, fallback_activities: &'a [Venue]) -> Self {
        let theme = ctx.theme;
        let vibes = &ctx.vibes;
        let premium = ctx.variant == Variant::Premium;

        // Premium ordering applies before the critical-category fallback, so a
        // fallback pool keeps catalog order.
        let meal_pool = |category: Category| -> Vec<&'a Venue> {
            let mut pool = filter_venues(catalog, theme, vibes, &category);
            if premium {
                sort_by_tier_desc(&mut pool);
            }
            if pool.is_empty() {
                pool = filter_with_fallback(catalog, theme, vibes, &category);
            }
            pool
        };

        let brunch = meal_pool(Category::Brunch);
        let dining = meal_pool(Category::Dining);
        let nightlife = meal_pool(Category::Nightlife);
        let transport = filter_with_fallback(catalog, theme, vibes, &Category::Transport);

        let mut activities = filter_venues(catalog, theme, vibes, &Category::Activity);
        if premium {
            sort_by_tier_desc(&mut activities);
        }

        let mut pools = VenuePools {
            brunch,
            dining,
            nightlife,
            activities,
            transport,
            baseball: Vec::new(),
            bachelorette_pool: Vec::new(),
            bachelorette_spa: Vec::new(),
            bachelorette_midday: Vec::new(),
            tournament: Vec::new(),
            golf_entertainment: Vec::new(),
        };

        match theme {
            Some(Theme::SpringTraining) => {
                pools.baseball = baseball_pool(catalog, ctx.team);
            }
            Some(Theme::Bachelorette) => {
                let themed = |category: Category| -> Vec<&'a Venue> {
                    catalog
                        .iter()
                        .filter(|v| v.category == category && v.supports_theme(Theme::Bachelorette))
                        .collect()
                };
                pools.bachelorette_pool = themed(Category::Pool);
                pools.bachelorette_spa = themed(Category::Spa);

                let shopping: Vec<&'a Venue> = filter_venues(
                    catalog,
                    theme,
                    &["shopping".to_string()],
                    &Category::Activity,
                )
                .into_iter()
                .filter(|v| v.has_vibe("shopping"))
                .collect();

                let mut midday: Vec<&'a Venue> = Vec::new();
                let mut seen: HashSet<&str> = HashSet::new();
                for venue in pools
                    .activities
                    .iter()
                    .chain(pools.bachelorette_pool.iter())
                    .chain(shopping.iter())
                    .copied()
                {
                    if is_bachelorette_safe(venue) && seen.insert(venue.name.as_str()) {
                        midday.push(venue);
                    }
                }
                if midday.is_empty() {
                    debug!("No bachelorette-safe activities in catalog, using default activities");
                    midday = fallback_activities.iter().collect();
                }
                pools.bachelorette_midday = midday;
            }
            Some(Theme::Wmpo) => {
                let activity_venues = catalog.iter().filter(|v| v.category == Category::Activity);
                for venue in activity_venues {
                    if is_tournament_venue(venue) {
                        pools.tournament.push(venue);
                    } else if is_golf_entertainment(venue) {
                        pools.golf_entertainment.push(venue);
                    }
                }
                if pools.tournament.is_empty() {
                    debug!("No WM Phoenix Open venues in catalog, falling back to golf entertainment");
                }
            }
            None => {}
        }

        pools
    }
}

fn sort_by_tier_desc(pool: &mut [&Venue]) {
    pool.sort_by(|a, b| b.price_tier.cmp(&a.price_tier));
}

fn is_golf_entertainment(venue: &Venue) -> bool {
    let name = venue.lowercase_name();
    venue.has_vibe("golf") || GOLF_ENTERTAINMENT_NAMES.iter().any(|g| name.contains(g))
}

/// Baseball activities for the theme, narrowed to the selected team's home
/// park when the catalog lists one; any baseball activity otherwise.
fn baseball_pool(catalog: &[Venue], team: Team) -> Vec<&Venue> {
    let team_names = team.venue_names();
    let is_baseball = |v: &&Venue| v.category == Category::Activity && v.has_vibe("baseball");

    let for_team: Vec<&Venue> = catalog
        .iter()
        .filter(is_baseball)
        .filter(|v| v.supports_theme(Theme::SpringTraining))
        .filter(|v| {
            team_names.is_empty()
                || v.teams.iter().any(|t| team_names.contains(&t.as_str()))
        })
        .collect();
    if !for_team.is_empty() {
        return for_team;
    }
    catalog.iter().filter(is_baseball).collect()
}

#[derive(Default)]
struct Rotation {
    used: HashSet<String>,
    last: Option<String>,
}

impl Rotation {
    fn pick<'a>(&self, candidates: &[&'a Venue], day_index: usize) -> Option<&'a Venue> {
        pick_best_rotating(candidates, &self.used, day_index, self.last.as_deref())
    }

    fn record(&mut self, venue: &Venue) {
        self.used.insert(venue.name.clone());
        self.last = Some(venue.name.clone());
    }
}

/// Walks the trip's days in order, carrying rotation state forward.
struct DayPlanner<'a, 'c> {
    config: &'c ItineraryGenerationConfig,
    ctx: &'c TripContext,
    pools: VenuePools<'a>,
    brunch: Rotation,
    dining: Rotation,
    nightlife: Rotation,
    activity: Rotation,
    golf: Rotation,
    transport: Rotation,
    transport_index: usize,
    tournament_last_day: HashMap<String, usize>,
    placed_nice_dinner: bool,
    placed_pool: bool,
    placed_spa: bool,
    slots: Vec<Slot>,
}

impl<'a, 'c> DayPlanner<'a, 'c> {
    fn new(config: &'c ItineraryGenerationConfig, ctx: &'c TripContext, pools: VenuePools<'a>) -> Self {
        Self {
            config,
            ctx,
            pools,
            brunch: Rotation::default(),
            dining: Rotation::default(),
            nightlife: Rotation::default(),
            activity: Rotation::default(),
            golf: Rotation::default(),
            transport: Rotation::default(),
            transport_index: 0,
            tournament_last_day: HashMap::new(),
            placed_nice_dinner: false,
            placed_pool: false,
            placed_spa: false,
            slots: Vec::new(),
        }
    }

    fn plan_arrival_day(&mut self, day: NaiveDate, i: usize) {
        self.add_slot(
            day,
            "5:30 PM",
            slot_type::WELCOME,
            Some(Venue::placeholder("At your accommodations", Category::Welcome)),
        );
        // Dinner is chosen before the first ride so the rotation matches full days.
        let dinner = self.pick_dinner(i);
        let ride = self.next_transport();
        self.add_slot(day, "6:00 PM", slot_type::TRANSPORTATION, ride);
        self.add_slot(day, "7:30 PM", slot_type::DINNER, dinner);
        let night = self.pick_nightlife(i);
        self.add_slot(day, "10:15 PM", slot_type::NIGHTLIFE, night);
        let ride = self.next_transport();
        self.add_slot(day, "11:30 PM", slot_type::TRANSPORTATION, ride);
    }

    fn plan_departure_day(&mut self, day: NaiveDate, i: usize) {
        let brunch = self.pick_brunch(i);
        self.add_slot(day, "9:00 AM", slot_type::BRUNCH, brunch);
        let ride = self.next_transport();
        self.add_slot(day, "10:30 AM", slot_type::DEPARTURE_TRANSPORTATION, ride);
    }

    fn plan_full_day(&mut self, day: NaiveDate, i: usize, full_day_index: usize) {
        let brunch = self.pick_brunch(i);
        self.add_slot(day, "10:00 AM", slot_type::BRUNCH, brunch);
        let ride = self.next_transport();
        self.add_slot(day, "11:45 AM", slot_type::TRANSPORTATION, ride);

        self.plan_midday(day, i, full_day_index);

        let dinner = self.pick_dinner(i);
        self.add_slot(day, "7:30 PM", slot_type::DINNER, dinner);
        let night = self.pick_nightlife(i);
        self.add_slot(day, "10:15 PM", slot_type::NIGHTLIFE, night);
        let ride = self.next_transport();
        self.add_slot(day, "11:30 PM", slot_type::TRANSPORTATION, ride);
    }

    fn plan_midday(&mut self, day: NaiveDate, i: usize, full_day_index: usize) {
        match self.ctx.theme {
            Some(Theme::SpringTraining)
                if !self.pools.baseball.is_empty()
                    && full_day_index < self.config.game_times.len() =>
            {
                let game_time = self.config.game_times[full_day_index].clone();
                let game = pick_best(&self.pools.baseball, &HashSet::new()).cloned();
                self.add_slot(day, &game_time, slot_type::BASEBALL_GAME, game);
            }
            Some(Theme::Bachelorette) => {
                let venue = self.pick_bachelorette_activity(i);
                self.add_slot(day, "12:30 PM", slot_type::ACTIVITY, venue);
            }
            Some(Theme::Wmpo) => {
                let venue = self.pick_wmpo_day(i);
                let label = match &venue {
                    Some(v) if is_tournament_venue(v) => slot_type::WMPO_TOURNAMENT,
                    _ => slot_type::WMPO_GOLF,
                };
                self.add_slot(day, "12:30 PM", label, venue);
            }
            _ => {
                let venue = pick_best(&self.pools.activities, &self.activity.used);
                if let Some(v) = venue {
                    self.activity.record(v);
                }
                self.add_slot(day, "12:30 PM", slot_type::ACTIVITY, venue.cloned());
            }
        }
    }

    fn pick_bachelorette_activity(&mut self, i: usize) -> Option<Venue> {
        let must_haves = &self.ctx.must_haves;
        let mut venue: Option<&Venue> = None;

        // One pool day and one spa day at most, pool first.
        if must_haves.contains(&MustHave::Pool)
            && !self.placed_pool
            && !self.pools.bachelorette_pool.is_empty()
        {
            venue = pick_best(&self.pools.bachelorette_pool, &self.activity.used);
            self.placed_pool = venue.is_some();
        } else if must_haves.contains(&MustHave::Spa)
            && !self.placed_spa
            && !self.pools.bachelorette_spa.is_empty()
        {
            venue = pick_best(&self.pools.bachelorette_spa, &self.activity.used);
            self.placed_spa = venue.is_some();
        }

        if venue.is_none() {
            venue = self.activity.pick(&self.pools.bachelorette_midday, i);
        }
        if let Some(v) = venue {
            self.activity.record(v);
        }
        venue.cloned()
    }

    fn pick_wmpo_day(&mut self, i: usize) -> Option<Venue> {
        let mut venue: Option<&Venue> = None;

        if !self.pools.tournament.is_empty() {
            let unused: Vec<&Venue> = self
                .pools
                .tournament
                .iter()
                .copied()
                .filter(|v| !self.golf.used.contains(&v.name))
                .collect();
            venue = if unused.is_empty() {
                self.least_recently_used_tournament()
            } else {
                Some(unused[i % unused.len()])
            };
        }

        if venue.is_none() && !self.pools.golf_entertainment.is_empty() {
            venue = self.golf.pick(&self.pools.golf_entertainment, i);
        }
        if venue.is_none() {
            venue = pick_best(&self.pools.activities, &HashSet::new());
        }

        if let Some(v) = venue {
            self.golf.record(v);
            self.tournament_last_day.insert(v.name.clone(), i);
        }
        venue.cloned()
    }

    fn least_recently_used_tournament(&self) -> Option<&'a Venue> {
        self.pools
            .tournament
            .iter()
            .copied()
            .min_by_key(|v| self.tournament_last_day.get(&v.name).copied().unwrap_or(0))
    }

    fn pick_brunch(&mut self, i: usize) -> Option<Venue> {
        let venue = self.brunch.pick(&self.pools.brunch, i);
        if let Some(v) = venue {
            self.brunch.record(v);
        }
        venue.cloned()
    }

    fn pick_nightlife(&mut self, i: usize) -> Option<Venue> {
        let venue = self.nightlife.pick(&self.pools.nightlife, i);
        if let Some(v) = venue {
            self.nightlife.record(v);
        }
        venue.cloned()
    }

    /// Dinner honours a "nice dinner" request once per trip by narrowing the
    /// pool to upscale venues when any exist.
    fn pick_dinner(&mut self, i: usize) -> Option<Venue> {
        let venue = if self.ctx.must_haves.contains(&MustHave::NiceDinner) && !self.placed_nice_dinner {
            let upscale: Vec<&Venue> = self
                .pools
                .dining
                .iter()
                .copied()
                .filter(|v| v.price_tier >= self.config.nice_dinner_min_tier)
                .collect();
            let pool = if upscale.is_empty() { &self.pools.dining } else { &upscale };
            let venue = self.dining.pick(pool, i);
            self.placed_nice_dinner = venue.is_some();
            venue
        } else {
            self.dining.pick(&self.pools.dining, i)
        };

        if let Some(v) = venue {
            self.dining.record(v);
        }
        venue.cloned()
    }

    /// Rideshare options advance one step per transport slot, independent of
    /// the day. Without configured options the catalog's transport venues rotate.
    fn next_transport(&mut self) -> Option<Venue> {
        let index = self.transport_index;
        self.transport_index += 1;

        if !self.config.transport_options.is_empty() {
            let name = &self.config.transport_options[index % self.config.transport_options.len()];
            let venue = Venue::placeholder(name, Category::Transport);
            self.transport.record(&venue);
            return Some(venue);
        }

        let venue = self.transport.pick(&self.pools.transport, index);
        if let Some(v) = venue {
            self.transport.record(v);
        }
        venue.cloned()
    }

    fn add_slot(&mut self, day: NaiveDate, time: &str, slot_type: &str, venue: Option<Venue>) {
        let id = format!("s{}", self.slots.len() + 1);
        self.slots.push(Slot {
            id,
            day,
            day_label: day.format("%a %b %-d").to_string(),
            time: time.to_string(),
            slot_type: slot_type.to_string(),
            venue,
            travel_minutes: None,
            from_venue_name: None,
            to_venue_name: None,
        });
    }
}
