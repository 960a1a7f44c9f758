//! Derives per-athlete coach periods from the free-text coach names stored on
//! participations. Runs after imports, over everything in the store.

use chrono::NaiveDate;
use serde::Serialize;
use skating_storage::models::{CoachAssignment, CoachedParticipation, NewCoachAssignment};
use skating_storage::{CoachAssignmentStore, CoachStore, Database, ResultStore, Store};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::registry::{CoachRegistry, ImportSession};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionReport {
    pub processed: usize,
    /// Assignments inserted, first ones and transitions alike.
    pub created: usize,
    pub transitions: usize,
    pub backdated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoachTransitionBuilder {
    coaches: CoachRegistry,
}

impl CoachTransitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the history in a transaction of its own.
    pub async fn run<D: Database>(&self, db: &D) -> Result<TransitionReport> {
        let mut store = db.begin().await?;
        match self.apply(&mut store).await {
            Ok(report) => {
                store.commit().await?;
                info!(
                    processed = report.processed,
                    created = report.created,
                    transitions = report.transitions,
                    backdated = report.backdated,
                    skipped = report.skipped,
                    "Coach history built"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback) = store.rollback().await {
                    error!("Rollback after failed coach history run failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    /// Builds the history inside an already open store. Running it again over
    /// the same participations changes nothing.
    pub async fn apply<St>(&self, store: &mut St) -> Result<TransitionReport>
    where
        St: ResultStore + CoachStore + CoachAssignmentStore + ?Sized,
    {
        let mut session = ImportSession::new();
        let mut report = TransitionReport::default();

        for participation in store.list_coached_participations().await? {
            report.processed += 1;
            if !self.apply_one(store, &mut session, &participation, &mut report).await? {
                report.skipped += 1;
            }
        }
        Ok(report)
    }

    /// Returns `false` when the participation changed nothing.
    async fn apply_one<St>(
        &self,
        store: &mut St,
        session: &mut ImportSession,
        participation: &CoachedParticipation,
        report: &mut TransitionReport,
    ) -> Result<bool>
    where
        St: CoachStore + CoachAssignmentStore + ?Sized,
    {
        let Some(date) = participation.event_date else {
            debug!(participant_id = participation.participant_id, "Undated participation skipped");
            return Ok(false);
        };
        let Some(coach) = self
            .coaches
            .get_or_create(store, session, &participation.coach)
            .await?
        else {
            return Ok(false);
        };
        let athlete_id = participation.athlete_id;

        if store
            .find_assignment(athlete_id, coach.id, participation.event_id)
            .await?
            .is_some()
        {
            return Ok(false);
        }
        let history = store.list_assignments(athlete_id).await?;
        if history
            .iter()
            .any(|period| period.coach_id == coach.id && period.covers(date))
        {
            return Ok(false);
        }

        let new_period = NewCoachAssignment {
            coach_id: coach.id,
            athlete_id,
            participant_id: participation.participant_id,
            event_id: participation.event_id,
            start_date: date,
            end_date: None,
            is_current: true,
        };

        match store.current_assignment(athlete_id).await? {
            None => {
                store.insert_assignment(new_period).await?;
                report.created += 1;
                Ok(true)
            }
            Some(mut current) if current.coach_id == coach.id => {
                if date >= current.start_date {
                    return Ok(false);
                }
                current.start_date = date;
                current.participant_id = participation.participant_id;
                current.event_id = participation.event_id;
                store.update_assignment(&current).await?;
                report.backdated += 1;
                debug!(athlete_id, coach_id = coach.id, %date, "Coach period backdated");
                Ok(true)
            }
            Some(current) if date < current.start_date => {
                warn!(
                    athlete_id,
                    coach = %coach.name,
                    %date,
                    current_start = %current.start_date,
                    "Coach change predates the current period, ignored"
                );
                Ok(false)
            }
            Some(current) => {
                let previous_coach = current.coach_id;
                close_period(store, current, date).await?;
                store.insert_assignment(new_period).await?;
                report.created += 1;
                report.transitions += 1;
                info!(
                    athlete_id,
                    from_coach = previous_coach,
                    to_coach = coach.id,
                    %date,
                    "Coach transition"
                );
                Ok(true)
            }
        }
    }
}

async fn close_period<St>(store: &mut St, mut period: CoachAssignment, end: NaiveDate) -> Result<()>
where
    St: CoachAssignmentStore + ?Sized,
{
    period.end_date = Some(end);
    period.is_current = false;
    store.update_assignment(&period).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use skating_storage::models::{NewAthlete, NewCategory, NewEvent, NewParticipant};
    use skating_storage::{AthleteStore, EventStore, MemoryDatabase};

    use super::*;

    fn date(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 3, day)
    }

    async fn seed(db: &MemoryDatabase, entries: &[(Option<NaiveDate>, &str)]) -> i64 {
        let mut store = db.begin().await.unwrap();
        let athlete = store
            .insert_athlete(NewAthlete {
                first_name: "Анна".to_string(),
                last_name: "Иванова".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        for (index, (begin_date, coach)) in entries.iter().enumerate() {
            let event = store
                .insert_event(NewEvent {
                    name: format!("Кубок {index}"),
                    begin_date: *begin_date,
                    ..Default::default()
                })
                .await
                .unwrap();
            let category = store
                .insert_category(NewCategory {
                    event_id: event.id,
                    name: "КМС, Девушки".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            store
                .insert_participant(NewParticipant {
                    event_id: event.id,
                    category_id: category.id,
                    athlete_id: athlete.id,
                    coach: Some(coach.to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        store.commit().await.unwrap();
        athlete.id
    }

    #[tokio::test]
    async fn test_coach_change_closes_previous_period() {
        let db = MemoryDatabase::new();
        let athlete_id = seed(
            &db,
            &[(date(1), "Петров П.П."), (date(10), "Петров П.П."), (date(20), "Сидоров С.С.")],
        )
        .await;

        let report = CoachTransitionBuilder::new().run(&db).await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.transitions, 1);
        assert_eq!(report.skipped, 1);

        let state = db.snapshot();
        let periods: Vec<_> = state
            .coach_assignments
            .iter()
            .filter(|a| a.athlete_id == athlete_id)
            .collect();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].start_date, date(1).unwrap());
        assert_eq!(periods[0].end_date, date(20));
        assert!(!periods[0].is_current);
        assert_eq!(periods[1].start_date, date(20).unwrap());
        assert_eq!(periods[1].end_date, None);
        assert!(periods[1].is_current);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let db = MemoryDatabase::new();
        seed(
            &db,
            &[(date(1), "Петров П.П."), (date(10), "Петров П.П."), (date(20), "Сидоров С.С.")],
        )
        .await;

        CoachTransitionBuilder::new().run(&db).await.unwrap();
        let before = db.snapshot().coach_assignments;
        let report = CoachTransitionBuilder::new().run(&db).await.unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(db.snapshot().coach_assignments, before);
    }

    #[tokio::test]
    async fn test_undated_participation_is_skipped() {
        let db = MemoryDatabase::new();
        seed(&db, &[(None, "Петров П.П.")]).await;

        let report = CoachTransitionBuilder::new().run(&db).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
        assert!(db.snapshot().coach_assignments.is_empty());
    }

    #[tokio::test]
    async fn test_earlier_event_backdates_current_period() {
        let db = MemoryDatabase::new();
        let athlete_id = seed(&db, &[(date(10), "Петров П.П.")]).await;
        CoachTransitionBuilder::new().run(&db).await.unwrap();

        // A file for an older event arrives later.
        let mut store = db.begin().await.unwrap();
        let event = store
            .insert_event(NewEvent {
                name: "Первенство".to_string(),
                begin_date: date(2),
                ..Default::default()
            })
            .await
            .unwrap();
        let category = store
            .insert_category(NewCategory {
                event_id: event.id,
                name: "КМС, Девушки".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .insert_participant(NewParticipant {
                event_id: event.id,
                category_id: category.id,
                athlete_id,
                coach: Some("Петров П.П.".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store.commit().await.unwrap();

        let report = CoachTransitionBuilder::new().run(&db).await.unwrap();
        assert_eq!(report.backdated, 1);
        let periods = db.snapshot().coach_assignments;
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].start_date, date(2).unwrap());
        assert_eq!(periods[0].event_id, event.id);
        assert!(periods[0].is_current);

        let again = CoachTransitionBuilder::new().run(&db).await.unwrap();
        assert_eq!(again.backdated, 0);
        assert_eq!(again.created, 0);
    }
}
