pub mod calendar;
pub mod tasks;
