pub mod itinerary;
pub mod trip;
pub mod venue;
