pub mod booking;
pub mod confirmation;
pub mod lifecycle;

pub use booking::AppointmentBookingService;
pub use confirmation::AppointmentConfirmationService;
pub use lifecycle::AppointmentLifecycleService;
