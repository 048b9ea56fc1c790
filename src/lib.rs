pub mod cli;
pub mod config;
pub mod generator;
pub mod llm;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use generator::workflow::{launch, ItineraryService};
pub use types::{ItineraryOutcome, ItineraryReport, TripRequest};
