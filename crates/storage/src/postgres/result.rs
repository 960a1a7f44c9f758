use async_trait::async_trait;
use sqlx::types::Json;

use super::PgStore;
use crate::error::Result;
use crate::models::{
    CoachedParticipation, ComponentScore, Element, NewComponentScore, NewElement, NewParticipant,
    NewPerformance, Participant, Performance,
};
use crate::repository::ResultStore;

const PARTICIPANT_COLUMNS: &str = "id, external_id, event_id, category_id, athlete_id, bib_number, \
     total_place, total_points, status, segment_statuses, pct_ppname, coach";

const PERFORMANCE_COLUMNS: &str = "id, participant_id, segment_id, starting_number, status, \
     qualification, place, points, tes_total, pcs_total, deductions, details";

const ELEMENT_COLUMNS: &str = "id, performance_id, order_num, planned_code, planned_norm, \
     executed_code, info_code, confirmed, time_code, base_value, penalty, result, goe_result, \
     judge_scores";

const COMPONENT_COLUMNS: &str =
    "id, performance_id, component_type, factor, penalty, result, judge_scores";

#[async_trait]
impl ResultStore for PgStore {
    async fn find_participant(
        &mut self,
        event_id: i64,
        category_id: i64,
        athlete_id: i64,
    ) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants \
             WHERE event_id = $1 AND category_id = $2 AND athlete_id = $3"
        ))
        .bind(event_id)
        .bind(category_id)
        .bind(athlete_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(participant)
    }

    async fn insert_participant(&mut self, participant: NewParticipant) -> Result<Participant> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "INSERT INTO participants (external_id, event_id, category_id, athlete_id, bib_number, \
                 total_place, total_points, status, segment_statuses, pct_ppname, coach) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(participant.external_id)
        .bind(participant.event_id)
        .bind(participant.category_id)
        .bind(participant.athlete_id)
        .bind(participant.bib_number)
        .bind(participant.total_place)
        .bind(participant.total_points)
        .bind(participant.status)
        .bind(Json(participant.segment_statuses))
        .bind(participant.pct_ppname)
        .bind(participant.coach)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(participant)
    }

    async fn update_participant(&mut self, participant: &Participant) -> Result<()> {
        sqlx::query(
            "UPDATE participants SET external_id = $1, bib_number = $2, total_place = $3, \
                 total_points = $4, status = $5, segment_statuses = $6, pct_ppname = $7, \
                 coach = $8 \
             WHERE id = $9",
        )
        .bind(&participant.external_id)
        .bind(participant.bib_number)
        .bind(participant.total_place)
        .bind(participant.total_points)
        .bind(&participant.status)
        .bind(&participant.segment_statuses)
        .bind(&participant.pct_ppname)
        .bind(&participant.coach)
        .bind(participant.id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_performance(
        &mut self,
        participant_id: i64,
        segment_id: i64,
    ) -> Result<Option<Performance>> {
        let performance = sqlx::query_as::<_, Performance>(&format!(
            "SELECT {PERFORMANCE_COLUMNS} FROM performances \
             WHERE participant_id = $1 AND segment_id = $2"
        ))
        .bind(participant_id)
        .bind(segment_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(performance)
    }

    async fn insert_performance(&mut self, performance: NewPerformance) -> Result<Performance> {
        let performance = sqlx::query_as::<_, Performance>(&format!(
            "INSERT INTO performances (participant_id, segment_id, starting_number, status, \
                 qualification, place, points, tes_total, pcs_total, deductions, details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {PERFORMANCE_COLUMNS}"
        ))
        .bind(performance.participant_id)
        .bind(performance.segment_id)
        .bind(performance.starting_number)
        .bind(performance.status)
        .bind(performance.qualification)
        .bind(performance.place)
        .bind(performance.points)
        .bind(performance.tes_total)
        .bind(performance.pcs_total)
        .bind(performance.deductions)
        .bind(Json(performance.details))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(performance)
    }

    async fn update_performance(&mut self, performance: &Performance) -> Result<()> {
        sqlx::query(
            "UPDATE performances SET starting_number = $1, status = $2, qualification = $3, \
                 place = $4, points = $5, tes_total = $6, pcs_total = $7, deductions = $8, \
                 details = $9 \
             WHERE id = $10",
        )
        .bind(performance.starting_number)
        .bind(&performance.status)
        .bind(&performance.qualification)
        .bind(performance.place)
        .bind(performance.points)
        .bind(performance.tes_total)
        .bind(performance.pcs_total)
        .bind(performance.deductions)
        .bind(&performance.details)
        .bind(performance.id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_element(&mut self, element: NewElement) -> Result<Element> {
        let element = sqlx::query_as::<_, Element>(&format!(
            "INSERT INTO elements (performance_id, order_num, planned_code, planned_norm, \
                 executed_code, info_code, confirmed, time_code, base_value, penalty, result, \
                 goe_result, judge_scores) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {ELEMENT_COLUMNS}"
        ))
        .bind(element.performance_id)
        .bind(element.order_num)
        .bind(element.planned_code)
        .bind(element.planned_norm)
        .bind(element.executed_code)
        .bind(element.info_code)
        .bind(element.confirmed)
        .bind(element.time_code)
        .bind(element.base_value)
        .bind(element.penalty)
        .bind(element.result)
        .bind(element.goe_result)
        .bind(Json(element.judge_scores))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(element)
    }

    async fn insert_component_score(
        &mut self,
        component: NewComponentScore,
    ) -> Result<ComponentScore> {
        let component = sqlx::query_as::<_, ComponentScore>(&format!(
            "INSERT INTO component_scores (performance_id, component_type, factor, penalty, \
                 result, judge_scores) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COMPONENT_COLUMNS}"
        ))
        .bind(component.performance_id)
        .bind(component.component_type)
        .bind(component.factor)
        .bind(component.penalty)
        .bind(component.result)
        .bind(Json(component.judge_scores))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(component)
    }

    async fn list_coached_participations(&mut self) -> Result<Vec<CoachedParticipation>> {
        let rows = sqlx::query_as::<_, CoachedParticipation>(
            "SELECT p.id AS participant_id, p.athlete_id, p.event_id, \
                 COALESCE(e.begin_date, e.end_date) AS event_date, p.coach AS coach \
             FROM participants p \
             JOIN events e ON e.id = p.event_id \
             WHERE p.coach IS NOT NULL AND TRIM(p.coach) <> '' \
             ORDER BY COALESCE(e.begin_date, e.end_date) ASC NULLS LAST, p.athlete_id, p.id",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }
}
