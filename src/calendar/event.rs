//! Task → Google Calendar event mapping.

use crate::service::task_store::Task;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_COMPLETED: &str = "Completed";
pub const STATUS_PENDING: &str = "Pending";

/// Start or end of an event in the Calendar API's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    Timed {
        #[serde(rename = "dateTime")]
        date_time: DateTime<Utc>,
    },
    AllDay {
        date: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
}

impl CalendarEvent {
    /// Build the event for `task`; tasks without a due time become an
    /// all-day event on `today`.
    pub fn from_task(task: &Task, today: NaiveDate) -> Self {
        let (start, end) = match task.due_at {
            Some(due) => (
                EventTime::Timed { date_time: due },
                EventTime::Timed { date_time: due },
            ),
            None => {
                // end date is exclusive
                let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
                (
                    EventTime::AllDay { date: today },
                    EventTime::AllDay { date: tomorrow },
                )
            }
        };

        Self {
            summary: task.title.clone(),
            description: describe(task),
            start,
            end,
        }
    }
}

fn describe(task: &Task) -> String {
    let status = if task.completed {
        STATUS_COMPLETED
    } else {
        STATUS_PENDING
    };
    format!(
        "{}\n\nStatus: {}",
        task.description.as_deref().unwrap_or_default(),
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> Task {
        Task {
            id: 1,
            owner_id: 9,
            title: "Write report".into(),
            description: Some("Q3 numbers".into()),
            due_at: None,
            completed: false,
            external_event_id: None,
        }
    }

    #[test]
    fn due_task_becomes_point_event() {
        let due: DateTime<Utc> = "2025-01-01T10:00:00Z".parse().unwrap();
        let t = Task {
            due_at: Some(due),
            ..task()
        };
        let event = CalendarEvent::from_task(&t, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        assert_eq!(event.start, event.end);
        assert_eq!(
            serde_json::to_value(&event.start).unwrap(),
            json!({"dateTime": "2025-01-01T10:00:00Z"})
        );
    }

    #[test]
    fn undated_task_is_all_day_today() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let event = CalendarEvent::from_task(&task(), today);

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "summary": "Write report",
                "description": "Q3 numbers\n\nStatus: Pending",
                "start": {"date": "2024-12-31"},
                "end": {"date": "2025-01-01"},
            })
        );
    }

    #[test]
    fn description_reflects_completion() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let done = Task {
            completed: true,
            description: None,
            ..task()
        };
        let event = CalendarEvent::from_task(&done, today);
        assert_eq!(event.description, "\n\nStatus: Completed");
        assert!(event.description.ends_with(STATUS_COMPLETED));
    }
}
