use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum duration recorded for a time entry, in minutes.
pub const MIN_DURATION_MINUTES: i64 = 1;

/// A stopwatch interval logged against a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    /// Elapsed minutes, never below [`MIN_DURATION_MINUTES`].
    pub duration_minutes: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl TimeEntry {
    /// Create an entry from a start/end pair. A zero-elapsed interval is
    /// floored to one minute so the entry still counts as logged time.
    pub fn new(task_id: Uuid, start_time: NaiveDateTime, end_time: Option<NaiveDateTime>) -> Self {
        let duration_minutes = end_time
            .map(|end| (end - start_time).num_minutes())
            .unwrap_or(0)
            .max(MIN_DURATION_MINUTES);
        Self {
            id: Uuid::new_v4(),
            task_id,
            start_time,
            end_time,
            duration_minutes,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn zero_elapsed_floors_to_one_minute() {
        let entry = TimeEntry::new(Uuid::new_v4(), at(10, 0), Some(at(10, 0)));
        assert_eq!(entry.duration_minutes, 1);
    }

    #[test]
    fn open_entry_records_minimum_duration() {
        let entry = TimeEntry::new(Uuid::new_v4(), at(10, 0), None);
        assert_eq!(entry.duration_minutes, 1);
        assert!(entry.end_time.is_none());
    }

    #[test]
    fn elapsed_minutes_are_kept() {
        let entry = TimeEntry::new(Uuid::new_v4(), at(10, 0), Some(at(11, 30)));
        assert_eq!(entry.duration_minutes, 90);
    }
}
