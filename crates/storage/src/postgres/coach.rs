use async_trait::async_trait;

use super::PgStore;
use crate::error::Result;
use crate::models::{Coach, CoachAssignment, NewCoach, NewCoachAssignment};
use crate::repository::{CoachAssignmentStore, CoachStore};

const COACH_COLUMNS: &str = "id, name, normalized_name, created_at";

const ASSIGNMENT_COLUMNS: &str =
    "id, coach_id, athlete_id, participant_id, event_id, start_date, end_date, is_current";

#[async_trait]
impl CoachStore for PgStore {
    async fn find_coach_by_normalized_name(
        &mut self,
        normalized_name: &str,
    ) -> Result<Option<Coach>> {
        let coach = sqlx::query_as::<_, Coach>(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches WHERE normalized_name = $1"
        ))
        .bind(normalized_name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(coach)
    }

    async fn insert_coach(&mut self, coach: NewCoach) -> Result<Coach> {
        let coach = sqlx::query_as::<_, Coach>(&format!(
            "INSERT INTO coaches (name, normalized_name) VALUES ($1, $2) \
             RETURNING {COACH_COLUMNS}"
        ))
        .bind(coach.name)
        .bind(coach.normalized_name)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(coach)
    }
}

#[async_trait]
impl CoachAssignmentStore for PgStore {
    async fn find_assignment(
        &mut self,
        athlete_id: i64,
        coach_id: i64,
        event_id: i64,
    ) -> Result<Option<CoachAssignment>> {
        let assignment = sqlx::query_as::<_, CoachAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM coach_assignments \
             WHERE athlete_id = $1 AND coach_id = $2 AND event_id = $3"
        ))
        .bind(athlete_id)
        .bind(coach_id)
        .bind(event_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(assignment)
    }

    async fn current_assignment(&mut self, athlete_id: i64) -> Result<Option<CoachAssignment>> {
        let assignment = sqlx::query_as::<_, CoachAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM coach_assignments \
             WHERE athlete_id = $1 AND is_current \
             ORDER BY start_date DESC, id DESC LIMIT 1"
        ))
        .bind(athlete_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(assignment)
    }

    async fn list_assignments(&mut self, athlete_id: i64) -> Result<Vec<CoachAssignment>> {
        let assignments = sqlx::query_as::<_, CoachAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM coach_assignments \
             WHERE athlete_id = $1 ORDER BY start_date, id"
        ))
        .bind(athlete_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(assignments)
    }

    async fn insert_assignment(
        &mut self,
        assignment: NewCoachAssignment,
    ) -> Result<CoachAssignment> {
        let assignment = sqlx::query_as::<_, CoachAssignment>(&format!(
            "INSERT INTO coach_assignments (coach_id, athlete_id, participant_id, event_id, \
                 start_date, end_date, is_current) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(assignment.coach_id)
        .bind(assignment.athlete_id)
        .bind(assignment.participant_id)
        .bind(assignment.event_id)
        .bind(assignment.start_date)
        .bind(assignment.end_date)
        .bind(assignment.is_current)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(assignment)
    }

    async fn update_assignment(&mut self, assignment: &CoachAssignment) -> Result<()> {
        sqlx::query(
            "UPDATE coach_assignments \
             SET participant_id = $1, event_id = $2, start_date = $3, end_date = $4, is_current = $5 \
             WHERE id = $6",
        )
        .bind(assignment.participant_id)
        .bind(assignment.event_id)
        .bind(assignment.start_date)
        .bind(assignment.end_date)
        .bind(assignment.is_current)
        .bind(assignment.id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}
