pub mod schedule;
pub mod settings;

pub use settings::AvailabilityService;
