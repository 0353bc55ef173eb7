pub mod booking;
pub mod lifecycle;
pub mod types;

pub use booking::BookingService;
pub use lifecycle::StatusTransitionService;
pub use types::AppointmentTypeService;
