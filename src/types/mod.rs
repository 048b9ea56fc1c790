pub mod itinerary;
pub mod request;

pub use itinerary::{
    Accommodation, Activity, DayPlan, ItineraryOutcome, ItineraryReport, Location, Transportation,
};
pub use request::TripRequest;
