use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Coach {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewCoach {
    pub name: String,
    pub normalized_name: String,
}

/// One period of an athlete training with a coach. Periods are closed by the
/// date of the event where a different coach first appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CoachAssignment {
    pub id: i64,
    pub coach_id: i64,
    pub athlete_id: i64,
    pub participant_id: i64,
    pub event_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

impl CoachAssignment {
    /// Whether `date` falls inside `[start_date, end_date)`; open periods
    /// cover every date from their start on.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date < end)
    }
}

#[derive(Debug, Clone)]
pub struct NewCoachAssignment {
    pub coach_id: i64,
    pub athlete_id: i64,
    pub participant_id: i64,
    pub event_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}
