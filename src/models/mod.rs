pub mod client;
pub mod organization;
pub mod visit;
pub mod working_hours;

pub use client::{Client, NewClient, PUBLIC_BOOKING_NOTE};
pub use organization::{BookingSettings, Organization, Service};
pub use visit::{NewVisit, Reservation, Visit, VisitStatus, DEFAULT_VISIT_MINUTES};
pub use working_hours::{DayHours, WorkingHours};
