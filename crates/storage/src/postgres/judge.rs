use async_trait::async_trait;

use super::PgStore;
use crate::error::Result;
use crate::models::{Judge, JudgePanel, NewJudge, NewJudgePanel};
use crate::repository::JudgeStore;

const JUDGE_COLUMNS: &str = "id, external_id, first_name, last_name, full_name_xml, short_name, \
     gender, country, city, qualification";

const PANEL_COLUMNS: &str = "id, segment_id, category_id, judge_id, role_code, panel_group, order_num";

#[async_trait]
impl JudgeStore for PgStore {
    async fn find_judge(
        &mut self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        full_name_xml: Option<&str>,
    ) -> Result<Option<Judge>> {
        let judge = sqlx::query_as::<_, Judge>(&format!(
            "SELECT {JUDGE_COLUMNS} FROM judges \
             WHERE first_name IS NOT DISTINCT FROM $1 \
               AND last_name IS NOT DISTINCT FROM $2 \
               AND full_name_xml IS NOT DISTINCT FROM $3 \
             ORDER BY id LIMIT 1"
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(full_name_xml)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(judge)
    }

    async fn insert_judge(&mut self, judge: NewJudge) -> Result<Judge> {
        let judge = sqlx::query_as::<_, Judge>(&format!(
            "INSERT INTO judges (external_id, first_name, last_name, full_name_xml, short_name, \
                 gender, country, city, qualification) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {JUDGE_COLUMNS}"
        ))
        .bind(judge.external_id)
        .bind(judge.first_name)
        .bind(judge.last_name)
        .bind(judge.full_name_xml)
        .bind(judge.short_name)
        .bind(judge.gender)
        .bind(judge.country)
        .bind(judge.city)
        .bind(judge.qualification)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(judge)
    }

    async fn find_panel(&mut self, segment_id: i64, judge_id: i64) -> Result<Option<JudgePanel>> {
        let panel = sqlx::query_as::<_, JudgePanel>(&format!(
            "SELECT {PANEL_COLUMNS} FROM judge_panels WHERE segment_id = $1 AND judge_id = $2"
        ))
        .bind(segment_id)
        .bind(judge_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(panel)
    }

    async fn insert_panel(&mut self, panel: NewJudgePanel) -> Result<JudgePanel> {
        let panel = sqlx::query_as::<_, JudgePanel>(&format!(
            "INSERT INTO judge_panels (segment_id, category_id, judge_id, role_code, panel_group, \
                 order_num) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PANEL_COLUMNS}"
        ))
        .bind(panel.segment_id)
        .bind(panel.category_id)
        .bind(panel.judge_id)
        .bind(panel.role_code)
        .bind(panel.panel_group)
        .bind(panel.order_num)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(panel)
    }

    async fn list_panels(&mut self) -> Result<Vec<JudgePanel>> {
        let panels = sqlx::query_as::<_, JudgePanel>(&format!(
            "SELECT {PANEL_COLUMNS} FROM judge_panels ORDER BY segment_id, order_num, id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(panels)
    }

    async fn update_panel_role(&mut self, panel_id: i64, role_code: &str) -> Result<()> {
        sqlx::query("UPDATE judge_panels SET role_code = $1 WHERE id = $2")
            .bind(role_code)
            .bind(panel_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }
}
