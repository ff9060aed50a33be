pub mod access;
pub mod booking;

pub use access::Actor;
pub use booking::AppointmentBookingService;
