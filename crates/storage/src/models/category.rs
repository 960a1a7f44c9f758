use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub event_id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub tv_name: Option<String>,
    pub normalized_name: Option<String>,
    pub num_entries: Option<i32>,
    pub num_participants: Option<i32>,
    pub level: Option<String>,
    pub gender: Option<String>,
    pub category_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub event_id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub tv_name: Option<String>,
    pub normalized_name: Option<String>,
    pub num_entries: Option<i32>,
    pub num_participants: Option<i32>,
    pub level: Option<String>,
    pub gender: Option<String>,
    pub category_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Segment {
    pub id: i64,
    pub category_id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub tv_name: Option<String>,
    pub short_name: Option<String>,
    pub segment_type: Option<String>,
    pub factor: Option<Decimal>,
    pub status: Option<String>,
    /// Program-component weights, index 0 holds component 1.
    pub component_factors: Json<Vec<Option<Decimal>>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSegment {
    pub category_id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub tv_name: Option<String>,
    pub short_name: Option<String>,
    pub segment_type: Option<String>,
    pub factor: Option<Decimal>,
    pub status: Option<String>,
    pub component_factors: Vec<Option<Decimal>>,
}
