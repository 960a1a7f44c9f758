//! In-memory store with the same all-or-nothing semantics as the PostgreSQL
//! one: `begin` snapshots the shared state, `commit` swaps the snapshot back
//! in, `rollback` (or dropping the store) discards it. Used for dry runs and
//! tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::types::Json;

use crate::error::{Result, StorageError};
use crate::models::{
    Athlete, Category, Club, Coach, CoachAssignment, CoachedParticipation, ComponentScore,
    Element, Event, Judge, JudgePanel, NewAthlete, NewCategory, NewClub, NewCoach,
    NewCoachAssignment, NewComponentScore, NewElement, NewEvent, NewJudge, NewJudgePanel,
    NewParticipant, NewPerformance, NewSegment, Participant, Performance, Segment,
};
use crate::repository::{
    AthleteStore, ClubStore, CoachAssignmentStore, CoachStore, Database, EventStore, JudgeStore,
    ResultStore, Store,
};

/// Every table of the schema, held as plain vectors in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub events: Vec<Event>,
    pub categories: Vec<Category>,
    pub segments: Vec<Segment>,
    pub clubs: Vec<Club>,
    pub athletes: Vec<Athlete>,
    pub participants: Vec<Participant>,
    pub performances: Vec<Performance>,
    pub elements: Vec<Element>,
    pub component_scores: Vec<ComponentScore>,
    pub judges: Vec<Judge>,
    pub judge_panels: Vec<JudgePanel>,
    pub coaches: Vec<Coach>,
    pub coach_assignments: Vec<CoachAssignment>,
    last_id: i64,
    failing_table: Option<&'static str>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn check_insert(&self, table: &'static str) -> Result<()> {
        if self.failing_table == Some(table) {
            return Err(StorageError::ConstraintViolation(format!(
                "insert into {table} rejected"
            )));
        }
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the committed state.
    pub fn snapshot(&self) -> MemoryState {
        self.lock().clone()
    }

    /// Makes every later insert into `table` fail with a constraint
    /// violation. Lets callers exercise their rollback paths.
    pub fn reject_inserts_into(&self, table: &'static str) {
        self.lock().failing_table = Some(table);
    }

    pub fn accept_all_inserts(&self) {
        self.lock().failing_table = None;
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Store = MemoryStore;

    async fn begin(&self) -> Result<MemoryStore> {
        Ok(MemoryStore {
            working: self.snapshot(),
            shared: Arc::clone(&self.state),
        })
    }
}

/// Working copy of the state for one transaction.
#[derive(Debug)]
pub struct MemoryStore {
    working: MemoryState,
    shared: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn commit(self) -> Result<()> {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        *shared = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_event(
        &mut self,
        name: &str,
        begin_date: Option<NaiveDate>,
    ) -> Result<Option<Event>> {
        Ok(self
            .working
            .events
            .iter()
            .find(|e| e.name == name && e.begin_date == begin_date)
            .cloned())
    }

    async fn insert_event(&mut self, event: NewEvent) -> Result<Event> {
        self.working.check_insert("events")?;
        let event = Event {
            id: self.working.next_id(),
            external_id: event.external_id,
            name: event.name,
            long_name: event.long_name,
            place: event.place,
            venue: event.venue,
            begin_date: event.begin_date,
            end_date: event.end_date,
            language: event.language,
            event_type: event.event_type,
            competition_type: event.competition_type,
            status: event.status,
            calculation_time: event.calculation_time,
            created_at: now(),
        };
        self.working.events.push(event.clone());
        Ok(event)
    }

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category> {
        self.working.check_insert("categories")?;
        if !self.working.events.iter().any(|e| e.id == category.event_id) {
            return Err(StorageError::NotFound(format!("event {}", category.event_id)));
        }
        let category = Category {
            id: self.working.next_id(),
            event_id: category.event_id,
            external_id: category.external_id,
            name: category.name,
            tv_name: category.tv_name,
            normalized_name: category.normalized_name,
            num_entries: category.num_entries,
            num_participants: category.num_participants,
            level: category.level,
            gender: category.gender,
            category_type: category.category_type,
            status: category.status,
        };
        self.working.categories.push(category.clone());
        Ok(category)
    }

    async fn insert_segment(&mut self, segment: NewSegment) -> Result<Segment> {
        self.working.check_insert("segments")?;
        let segment = Segment {
            id: self.working.next_id(),
            category_id: segment.category_id,
            external_id: segment.external_id,
            name: segment.name,
            tv_name: segment.tv_name,
            short_name: segment.short_name,
            segment_type: segment.segment_type,
            factor: segment.factor,
            status: segment.status,
            component_factors: Json(segment.component_factors),
        };
        self.working.segments.push(segment.clone());
        Ok(segment)
    }
}

#[async_trait]
impl ClubStore for MemoryStore {
    async fn list_clubs(&mut self) -> Result<Vec<Club>> {
        Ok(self.working.clubs.clone())
    }

    async fn find_club_by_name(&mut self, name: &str) -> Result<Option<Club>> {
        Ok(self.working.clubs.iter().find(|c| c.name == name).cloned())
    }

    async fn insert_club(&mut self, club: NewClub) -> Result<Club> {
        self.working.check_insert("clubs")?;
        let club = Club {
            id: self.working.next_id(),
            external_id: club.external_id,
            name: club.name,
            short_name: club.short_name,
            country: club.country,
            city: club.city,
            created_at: now(),
        };
        self.working.clubs.push(club.clone());
        Ok(club)
    }

    async fn update_club(&mut self, club: &Club) -> Result<()> {
        let stored = self
            .working
            .clubs
            .iter_mut()
            .find(|c| c.id == club.id)
            .ok_or_else(|| StorageError::NotFound(format!("club {}", club.id)))?;
        *stored = club.clone();
        Ok(())
    }

    async fn count_club_athletes(&mut self, club_id: i64) -> Result<i64> {
        let count = self
            .working
            .athletes
            .iter()
            .filter(|a| a.club_id == Some(club_id))
            .count();
        Ok(count as i64)
    }

    async fn reassign_club_athletes(&mut self, from: i64, to: i64) -> Result<u64> {
        let mut moved = 0;
        for athlete in self.working.athletes.iter_mut() {
            if athlete.club_id == Some(from) {
                athlete.club_id = Some(to);
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn delete_club(&mut self, club_id: i64) -> Result<()> {
        self.working.clubs.retain(|c| c.id != club_id);
        for athlete in self.working.athletes.iter_mut() {
            if athlete.club_id == Some(club_id) {
                athlete.club_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AthleteStore for MemoryStore {
    async fn find_athlete_by_lookup_key(&mut self, key: &str) -> Result<Option<Athlete>> {
        Ok(self
            .working
            .athletes
            .iter()
            .find(|a| a.lookup_key.as_deref() == Some(key))
            .cloned())
    }

    async fn insert_athlete(&mut self, athlete: NewAthlete) -> Result<Athlete> {
        self.working.check_insert("athletes")?;
        let athlete = Athlete {
            id: self.working.next_id(),
            external_id: athlete.external_id,
            first_name: athlete.first_name,
            last_name: athlete.last_name,
            patronymic: athlete.patronymic,
            full_name_xml: athlete.full_name_xml,
            lookup_key: athlete.lookup_key,
            birth_date: athlete.birth_date,
            gender: athlete.gender,
            country: athlete.country,
            club_id: athlete.club_id,
            created_at: now(),
        };
        self.working.athletes.push(athlete.clone());
        Ok(athlete)
    }

    async fn update_athlete(&mut self, athlete: &Athlete) -> Result<()> {
        let stored = self
            .working
            .athletes
            .iter_mut()
            .find(|a| a.id == athlete.id)
            .ok_or_else(|| StorageError::NotFound(format!("athlete {}", athlete.id)))?;
        *stored = athlete.clone();
        Ok(())
    }
}

#[async_trait]
impl JudgeStore for MemoryStore {
    async fn find_judge(
        &mut self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        full_name_xml: Option<&str>,
    ) -> Result<Option<Judge>> {
        Ok(self
            .working
            .judges
            .iter()
            .find(|j| {
                j.first_name.as_deref() == first_name
                    && j.last_name.as_deref() == last_name
                    && j.full_name_xml.as_deref() == full_name_xml
            })
            .cloned())
    }

    async fn insert_judge(&mut self, judge: NewJudge) -> Result<Judge> {
        self.working.check_insert("judges")?;
        let judge = Judge {
            id: self.working.next_id(),
            external_id: judge.external_id,
            first_name: judge.first_name,
            last_name: judge.last_name,
            full_name_xml: judge.full_name_xml,
            short_name: judge.short_name,
            gender: judge.gender,
            country: judge.country,
            city: judge.city,
            qualification: judge.qualification,
        };
        self.working.judges.push(judge.clone());
        Ok(judge)
    }

    async fn find_panel(&mut self, segment_id: i64, judge_id: i64) -> Result<Option<JudgePanel>> {
        Ok(self
            .working
            .judge_panels
            .iter()
            .find(|p| p.segment_id == segment_id && p.judge_id == judge_id)
            .cloned())
    }

    async fn insert_panel(&mut self, panel: NewJudgePanel) -> Result<JudgePanel> {
        self.working.check_insert("judge_panels")?;
        let exists = self
            .working
            .judge_panels
            .iter()
            .any(|p| p.segment_id == panel.segment_id && p.judge_id == panel.judge_id);
        if exists {
            return Err(StorageError::ConstraintViolation(format!(
                "judge {} already on panel of segment {}",
                panel.judge_id, panel.segment_id
            )));
        }
        let panel = JudgePanel {
            id: self.working.next_id(),
            segment_id: panel.segment_id,
            category_id: panel.category_id,
            judge_id: panel.judge_id,
            role_code: panel.role_code,
            panel_group: panel.panel_group,
            order_num: panel.order_num,
        };
        self.working.judge_panels.push(panel.clone());
        Ok(panel)
    }

    async fn list_panels(&mut self) -> Result<Vec<JudgePanel>> {
        let mut panels = self.working.judge_panels.clone();
        panels.sort_by_key(|p| (p.segment_id, p.order_num, p.id));
        Ok(panels)
    }

    async fn update_panel_role(&mut self, panel_id: i64, role_code: &str) -> Result<()> {
        let panel = self
            .working
            .judge_panels
            .iter_mut()
            .find(|p| p.id == panel_id)
            .ok_or_else(|| StorageError::NotFound(format!("judge panel {panel_id}")))?;
        panel.role_code = Some(role_code.to_string());
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn find_participant(
        &mut self,
        event_id: i64,
        category_id: i64,
        athlete_id: i64,
    ) -> Result<Option<Participant>> {
        Ok(self
            .working
            .participants
            .iter()
            .find(|p| {
                p.event_id == event_id && p.category_id == category_id && p.athlete_id == athlete_id
            })
            .cloned())
    }

    async fn insert_participant(&mut self, participant: NewParticipant) -> Result<Participant> {
        self.working.check_insert("participants")?;
        let exists = self.working.participants.iter().any(|p| {
            p.event_id == participant.event_id
                && p.category_id == participant.category_id
                && p.athlete_id == participant.athlete_id
        });
        if exists {
            return Err(StorageError::ConstraintViolation(format!(
                "athlete {} already entered in category {}",
                participant.athlete_id, participant.category_id
            )));
        }
        let participant = Participant {
            id: self.working.next_id(),
            external_id: participant.external_id,
            event_id: participant.event_id,
            category_id: participant.category_id,
            athlete_id: participant.athlete_id,
            bib_number: participant.bib_number,
            total_place: participant.total_place,
            total_points: participant.total_points,
            status: participant.status,
            segment_statuses: Json(participant.segment_statuses),
            pct_ppname: participant.pct_ppname,
            coach: participant.coach,
        };
        self.working.participants.push(participant.clone());
        Ok(participant)
    }

    async fn update_participant(&mut self, participant: &Participant) -> Result<()> {
        let stored = self
            .working
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
            .ok_or_else(|| StorageError::NotFound(format!("participant {}", participant.id)))?;
        *stored = participant.clone();
        Ok(())
    }

    async fn find_performance(
        &mut self,
        participant_id: i64,
        segment_id: i64,
    ) -> Result<Option<Performance>> {
        Ok(self
            .working
            .performances
            .iter()
            .find(|p| p.participant_id == participant_id && p.segment_id == segment_id)
            .cloned())
    }

    async fn insert_performance(&mut self, performance: NewPerformance) -> Result<Performance> {
        self.working.check_insert("performances")?;
        let exists = self.working.performances.iter().any(|p| {
            p.participant_id == performance.participant_id && p.segment_id == performance.segment_id
        });
        if exists {
            return Err(StorageError::ConstraintViolation(format!(
                "participant {} already has a performance in segment {}",
                performance.participant_id, performance.segment_id
            )));
        }
        let performance = Performance {
            id: self.working.next_id(),
            participant_id: performance.participant_id,
            segment_id: performance.segment_id,
            starting_number: performance.starting_number,
            status: performance.status,
            qualification: performance.qualification,
            place: performance.place,
            points: performance.points,
            tes_total: performance.tes_total,
            pcs_total: performance.pcs_total,
            deductions: performance.deductions,
            details: Json(performance.details),
        };
        self.working.performances.push(performance.clone());
        Ok(performance)
    }

    async fn update_performance(&mut self, performance: &Performance) -> Result<()> {
        let stored = self
            .working
            .performances
            .iter_mut()
            .find(|p| p.id == performance.id)
            .ok_or_else(|| StorageError::NotFound(format!("performance {}", performance.id)))?;
        *stored = performance.clone();
        Ok(())
    }

    async fn insert_element(&mut self, element: NewElement) -> Result<Element> {
        self.working.check_insert("elements")?;
        let element = Element {
            id: self.working.next_id(),
            performance_id: element.performance_id,
            order_num: element.order_num,
            planned_code: element.planned_code,
            planned_norm: element.planned_norm,
            executed_code: element.executed_code,
            info_code: element.info_code,
            confirmed: element.confirmed,
            time_code: element.time_code,
            base_value: element.base_value,
            penalty: element.penalty,
            result: element.result,
            goe_result: element.goe_result,
            judge_scores: Json(element.judge_scores),
        };
        self.working.elements.push(element.clone());
        Ok(element)
    }

    async fn insert_component_score(
        &mut self,
        component: NewComponentScore,
    ) -> Result<ComponentScore> {
        self.working.check_insert("component_scores")?;
        let component = ComponentScore {
            id: self.working.next_id(),
            performance_id: component.performance_id,
            component_type: component.component_type,
            factor: component.factor,
            penalty: component.penalty,
            result: component.result,
            judge_scores: Json(component.judge_scores),
        };
        self.working.component_scores.push(component.clone());
        Ok(component)
    }

    async fn list_coached_participations(&mut self) -> Result<Vec<CoachedParticipation>> {
        let mut rows: Vec<CoachedParticipation> = self
            .working
            .participants
            .iter()
            .filter_map(|p| {
                let coach = p.coach.as_deref().filter(|c| !c.trim().is_empty())?;
                let event_date = self
                    .working
                    .events
                    .iter()
                    .find(|e| e.id == p.event_id)
                    .and_then(Event::date);
                Some(CoachedParticipation {
                    participant_id: p.id,
                    athlete_id: p.athlete_id,
                    event_id: p.event_id,
                    event_date,
                    coach: coach.to_string(),
                })
            })
            .collect();

        rows.sort_by_key(|r| {
            (
                r.event_date.is_none(),
                r.event_date,
                r.athlete_id,
                r.participant_id,
            )
        });
        Ok(rows)
    }
}

#[async_trait]
impl CoachStore for MemoryStore {
    async fn find_coach_by_normalized_name(
        &mut self,
        normalized_name: &str,
    ) -> Result<Option<Coach>> {
        Ok(self
            .working
            .coaches
            .iter()
            .find(|c| c.normalized_name == normalized_name)
            .cloned())
    }

    async fn insert_coach(&mut self, coach: NewCoach) -> Result<Coach> {
        self.working.check_insert("coaches")?;
        if self
            .working
            .coaches
            .iter()
            .any(|c| c.normalized_name == coach.normalized_name)
        {
            return Err(StorageError::ConstraintViolation(format!(
                "coach {} already exists",
                coach.normalized_name
            )));
        }
        let coach = Coach {
            id: self.working.next_id(),
            name: coach.name,
            normalized_name: coach.normalized_name,
            created_at: now(),
        };
        self.working.coaches.push(coach.clone());
        Ok(coach)
    }
}

#[async_trait]
impl CoachAssignmentStore for MemoryStore {
    async fn find_assignment(
        &mut self,
        athlete_id: i64,
        coach_id: i64,
        event_id: i64,
    ) -> Result<Option<CoachAssignment>> {
        Ok(self
            .working
            .coach_assignments
            .iter()
            .find(|a| a.athlete_id == athlete_id && a.coach_id == coach_id && a.event_id == event_id)
            .cloned())
    }

    async fn current_assignment(&mut self, athlete_id: i64) -> Result<Option<CoachAssignment>> {
        Ok(self
            .working
            .coach_assignments
            .iter()
            .filter(|a| a.athlete_id == athlete_id && a.is_current)
            .max_by_key(|a| (a.start_date, a.id))
            .cloned())
    }

    async fn list_assignments(&mut self, athlete_id: i64) -> Result<Vec<CoachAssignment>> {
        let mut assignments: Vec<CoachAssignment> = self
            .working
            .coach_assignments
            .iter()
            .filter(|a| a.athlete_id == athlete_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| (a.start_date, a.id));
        Ok(assignments)
    }

    async fn insert_assignment(
        &mut self,
        assignment: NewCoachAssignment,
    ) -> Result<CoachAssignment> {
        self.working.check_insert("coach_assignments")?;
        let exists = self.working.coach_assignments.iter().any(|a| {
            a.athlete_id == assignment.athlete_id
                && a.coach_id == assignment.coach_id
                && a.event_id == assignment.event_id
        });
        if exists {
            return Err(StorageError::ConstraintViolation(format!(
                "assignment of coach {} to athlete {} at event {} already exists",
                assignment.coach_id, assignment.athlete_id, assignment.event_id
            )));
        }
        let assignment = CoachAssignment {
            id: self.working.next_id(),
            coach_id: assignment.coach_id,
            athlete_id: assignment.athlete_id,
            participant_id: assignment.participant_id,
            event_id: assignment.event_id,
            start_date: assignment.start_date,
            end_date: assignment.end_date,
            is_current: assignment.is_current,
        };
        self.working.coach_assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn update_assignment(&mut self, assignment: &CoachAssignment) -> Result<()> {
        let stored = self
            .working
            .coach_assignments
            .iter_mut()
            .find(|a| a.id == assignment.id)
            .ok_or_else(|| StorageError::NotFound(format!("coach assignment {}", assignment.id)))?;
        *stored = assignment.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_event(name: &str, begin: Option<NaiveDate>) -> NewEvent {
        NewEvent {
            name: name.to_string(),
            begin_date: begin,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        store
            .insert_event(new_event("Кубок города", Some(date(2024, 3, 1))))
            .await
            .unwrap();
        assert!(db.snapshot().events.is_empty());

        store.commit().await.unwrap();
        assert_eq!(db.snapshot().events.len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_changes() {
        let db = MemoryDatabase::new();

        let mut store = db.begin().await.unwrap();
        store.insert_event(new_event("A", None)).await.unwrap();
        store.rollback().await.unwrap();

        {
            let mut store = db.begin().await.unwrap();
            store.insert_event(new_event("B", None)).await.unwrap();
        }

        assert!(db.snapshot().events.is_empty());
    }

    #[tokio::test]
    async fn test_find_event_matches_missing_date() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        store.insert_event(new_event("Первенство", None)).await.unwrap();

        assert!(store.find_event("Первенство", None).await.unwrap().is_some());
        assert!(
            store
                .find_event("Первенство", Some(date(2024, 1, 1)))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_coach_names_are_unique() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        let coach = NewCoach {
            name: "Иванова Мария".to_string(),
            normalized_name: "иванова мария".to_string(),
        };
        store.insert_coach(coach.clone()).await.unwrap();

        let err = store.insert_coach(coach).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_rejected_table_fails_inserts() {
        let db = MemoryDatabase::new();
        db.reject_inserts_into("events");
        let mut store = db.begin().await.unwrap();

        let err = store.insert_event(new_event("A", None)).await.unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_coached_participations_order_undated_last() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        let late = store
            .insert_event(new_event("Late", Some(date(2024, 5, 1))))
            .await
            .unwrap();
        let undated = store.insert_event(new_event("Undated", None)).await.unwrap();
        let early = store
            .insert_event(new_event("Early", Some(date(2023, 5, 1))))
            .await
            .unwrap();

        for (event_id, athlete_id, coach) in [
            (late.id, 1, "Петров"),
            (undated.id, 1, "Петров"),
            (early.id, 2, "Сидоров"),
            (early.id, 1, "Петров"),
            (early.id, 3, "  "),
        ] {
            let category = store
                .insert_category(NewCategory {
                    event_id,
                    name: "МС".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            store
                .insert_participant(NewParticipant {
                    event_id,
                    category_id: category.id,
                    athlete_id,
                    coach: Some(coach.to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let rows = store.list_coached_participations().await.unwrap();
        let order: Vec<(i64, i64)> = rows.iter().map(|r| (r.event_id, r.athlete_id)).collect();
        assert_eq!(
            order,
            vec![
                (early.id, 1),
                (early.id, 2),
                (late.id, 1),
                (undated.id, 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_club_detaches_athletes() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        let club = store
            .insert_club(NewClub {
                name: "Звезда".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let athlete = store
            .insert_athlete(NewAthlete {
                first_name: "Анна".to_string(),
                last_name: "Котова".to_string(),
                club_id: Some(club.id),
                ..Default::default()
            })
            .await
            .unwrap();

        store.delete_club(club.id).await.unwrap();
        store.commit().await.unwrap();

        let state = db.snapshot();
        assert!(state.clubs.is_empty());
        let stored = state.athletes.iter().find(|a| a.id == athlete.id).unwrap();
        assert_eq!(stored.club_id, None);
    }
}
