use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Performance {
    pub id: i64,
    pub participant_id: i64,
    pub segment_id: i64,
    pub starting_number: Option<i32>,
    pub status: Option<String>,
    pub qualification: Option<String>,
    pub place: Option<i32>,
    pub points: Option<Decimal>,
    pub tes_total: Option<i32>,
    pub pcs_total: Option<i32>,
    /// `None` means no deduction was recorded, `Some(0)` a recorded zero.
    pub deductions: Option<i32>,
    pub details: Json<PerformanceDetails>,
}

/// Secondary scoring fields kept alongside a performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDetails {
    pub start_group: Option<i32>,
    pub performance_index: Option<i32>,
    pub locked: bool,
    pub tes_sum: Option<i32>,
    pub tes_result: Option<i32>,
    pub pcs_sum: Option<i32>,
    pub pcs_result: Option<i32>,
    pub tech_target: Option<i32>,
    pub points_needed: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPerformance {
    pub participant_id: i64,
    pub segment_id: i64,
    pub starting_number: Option<i32>,
    pub status: Option<String>,
    pub qualification: Option<String>,
    pub place: Option<i32>,
    pub points: Option<Decimal>,
    pub tes_total: Option<i32>,
    pub pcs_total: Option<i32>,
    pub deductions: Option<i32>,
    pub details: PerformanceDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Element {
    pub id: i64,
    pub performance_id: i64,
    pub order_num: i32,
    pub planned_code: Option<String>,
    pub planned_norm: Option<String>,
    pub executed_code: Option<String>,
    pub info_code: Option<String>,
    pub confirmed: Option<String>,
    pub time_code: Option<String>,
    pub base_value: Option<i32>,
    pub penalty: Option<i32>,
    pub result: Option<i32>,
    pub goe_result: Option<i32>,
    /// Decoded grade per judge slot; unscored slots are `null`.
    pub judge_scores: Json<Vec<Option<i8>>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewElement {
    pub performance_id: i64,
    pub order_num: i32,
    pub planned_code: Option<String>,
    pub planned_norm: Option<String>,
    pub executed_code: Option<String>,
    pub info_code: Option<String>,
    pub confirmed: Option<String>,
    pub time_code: Option<String>,
    pub base_value: Option<i32>,
    pub penalty: Option<i32>,
    pub result: Option<i32>,
    pub goe_result: Option<i32>,
    pub judge_scores: Vec<Option<i8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComponentScore {
    pub id: i64,
    pub performance_id: i64,
    pub component_type: String,
    pub factor: Option<Decimal>,
    pub penalty: Option<i32>,
    pub result: Option<i32>,
    pub judge_scores: Json<Vec<Option<i32>>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewComponentScore {
    pub performance_id: i64,
    pub component_type: String,
    pub factor: Option<Decimal>,
    pub penalty: Option<i32>,
    pub result: Option<i32>,
    pub judge_scores: Vec<Option<i32>>,
}
