use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Athlete {
    pub id: i64,
    pub external_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: Option<String>,
    pub full_name_xml: Option<String>,
    pub lookup_key: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub club_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl Athlete {
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name_xml.as_deref().filter(|s| !s.is_empty()) {
            return full.to_string();
        }
        format!("{} {}", self.last_name, self.first_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewAthlete {
    pub external_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: Option<String>,
    pub full_name_xml: Option<String>,
    pub lookup_key: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub club_id: Option<i64>,
}
