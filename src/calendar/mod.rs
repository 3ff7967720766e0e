pub mod client;
pub mod event;

pub use client::{CalendarClient, GoogleCalendarClient};
pub use event::{CalendarEvent, EventTime};
