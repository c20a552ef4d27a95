pub mod catalog_service;
pub mod itinerary_generation_service;
pub mod narrative_service;
pub mod plan_comparison_service;
pub mod preference_service;
pub mod swap_service;
pub mod travel_time_service;
pub mod trip_service;
pub mod venue_filter;
pub mod venue_scoring;
