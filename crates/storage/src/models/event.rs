use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub long_name: Option<String>,
    pub place: Option<String>,
    pub venue: Option<String>,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub event_type: Option<String>,
    pub competition_type: Option<String>,
    pub status: Option<String>,
    pub calculation_time: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Event {
    /// The date used to order an event on the timeline.
    pub fn date(&self) -> Option<NaiveDate> {
        self.begin_date.or(self.end_date)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub external_id: Option<String>,
    pub name: String,
    pub long_name: Option<String>,
    pub place: Option<String>,
    pub venue: Option<String>,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub event_type: Option<String>,
    pub competition_type: Option<String>,
    pub status: Option<String>,
    pub calculation_time: Option<NaiveDateTime>,
}
