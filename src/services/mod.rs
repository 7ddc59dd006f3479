pub mod booking;
pub mod calendar;
pub mod clock;
pub mod notify;
pub mod repository;
pub mod slots;
