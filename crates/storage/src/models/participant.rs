use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: i64,
    pub external_id: Option<String>,
    pub event_id: i64,
    pub category_id: i64,
    pub athlete_id: i64,
    pub bib_number: Option<i32>,
    pub total_place: Option<i32>,
    pub total_points: Option<Decimal>,
    pub status: Option<String>,
    /// Status per segment slot, index 0 holds segment 1.
    pub segment_statuses: Json<Vec<Option<String>>>,
    pub pct_ppname: Option<String>,
    pub coach: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewParticipant {
    pub external_id: Option<String>,
    pub event_id: i64,
    pub category_id: i64,
    pub athlete_id: i64,
    pub bib_number: Option<i32>,
    pub total_place: Option<i32>,
    pub total_points: Option<Decimal>,
    pub status: Option<String>,
    pub segment_statuses: Vec<Option<String>>,
    pub pct_ppname: Option<String>,
    pub coach: Option<String>,
}

/// A participation row carrying a non-empty coach name, joined with the
/// event date. Input of the coach history builder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoachedParticipation {
    pub participant_id: i64,
    pub athlete_id: i64,
    pub event_id: i64,
    pub event_date: Option<NaiveDate>,
    pub coach: String,
}
