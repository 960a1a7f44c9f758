use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Judge {
    pub id: i64,
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name_xml: Option<String>,
    pub short_name: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewJudge {
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name_xml: Option<String>,
    pub short_name: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JudgePanel {
    pub id: i64,
    pub segment_id: i64,
    pub category_id: Option<i64>,
    pub judge_id: i64,
    pub role_code: Option<String>,
    pub panel_group: Option<String>,
    /// 1-based position of the judge within the segment's panel.
    pub order_num: i32,
}

impl JudgePanel {
    /// Generic judge codes that carry no functional role yet.
    pub fn has_unassigned_role(&self) -> bool {
        matches!(self.role_code.as_deref(), None | Some("") | Some("J") | Some("JDG"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewJudgePanel {
    pub segment_id: i64,
    pub category_id: Option<i64>,
    pub judge_id: i64,
    pub role_code: Option<String>,
    pub panel_group: Option<String>,
    pub order_num: i32,
}
