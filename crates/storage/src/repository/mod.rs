//! Persistence interfaces used by the ingestion core.
//!
//! Every method works inside the transaction owned by the store value, so an
//! import that fails halfway leaves nothing behind once the store is rolled
//! back (or simply dropped).

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    Athlete, Category, Club, Coach, CoachAssignment, CoachedParticipation, ComponentScore,
    Element, Event, Judge, JudgePanel, NewAthlete, NewCategory, NewClub, NewCoach,
    NewCoachAssignment, NewComponentScore, NewElement, NewEvent, NewJudge, NewJudgePanel,
    NewParticipant, NewPerformance, NewSegment, Participant, Performance, Segment,
};

#[async_trait]
pub trait EventStore: Send {
    async fn find_event(&mut self, name: &str, begin_date: Option<NaiveDate>)
    -> Result<Option<Event>>;

    async fn insert_event(&mut self, event: NewEvent) -> Result<Event>;

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category>;

    async fn insert_segment(&mut self, segment: NewSegment) -> Result<Segment>;
}

#[async_trait]
pub trait ClubStore: Send {
    async fn list_clubs(&mut self) -> Result<Vec<Club>>;

    async fn find_club_by_name(&mut self, name: &str) -> Result<Option<Club>>;

    async fn insert_club(&mut self, club: NewClub) -> Result<Club>;

    async fn update_club(&mut self, club: &Club) -> Result<()>;

    async fn count_club_athletes(&mut self, club_id: i64) -> Result<i64>;

    /// Points every athlete of `from` at `to`, returning how many moved.
    async fn reassign_club_athletes(&mut self, from: i64, to: i64) -> Result<u64>;

    async fn delete_club(&mut self, club_id: i64) -> Result<()>;
}

#[async_trait]
pub trait AthleteStore: Send {
    async fn find_athlete_by_lookup_key(&mut self, key: &str) -> Result<Option<Athlete>>;

    async fn insert_athlete(&mut self, athlete: NewAthlete) -> Result<Athlete>;

    async fn update_athlete(&mut self, athlete: &Athlete) -> Result<()>;
}

#[async_trait]
pub trait JudgeStore: Send {
    async fn find_judge(
        &mut self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        full_name_xml: Option<&str>,
    ) -> Result<Option<Judge>>;

    async fn insert_judge(&mut self, judge: NewJudge) -> Result<Judge>;

    async fn find_panel(&mut self, segment_id: i64, judge_id: i64) -> Result<Option<JudgePanel>>;

    async fn insert_panel(&mut self, panel: NewJudgePanel) -> Result<JudgePanel>;

    async fn list_panels(&mut self) -> Result<Vec<JudgePanel>>;

    async fn update_panel_role(&mut self, panel_id: i64, role_code: &str) -> Result<()>;
}

#[async_trait]
pub trait ResultStore: Send {
    async fn find_participant(
        &mut self,
        event_id: i64,
        category_id: i64,
        athlete_id: i64,
    ) -> Result<Option<Participant>>;

    async fn insert_participant(&mut self, participant: NewParticipant) -> Result<Participant>;

    async fn update_participant(&mut self, participant: &Participant) -> Result<()>;

    async fn find_performance(
        &mut self,
        participant_id: i64,
        segment_id: i64,
    ) -> Result<Option<Performance>>;

    async fn insert_performance(&mut self, performance: NewPerformance) -> Result<Performance>;

    async fn update_performance(&mut self, performance: &Performance) -> Result<()>;

    async fn insert_element(&mut self, element: NewElement) -> Result<Element>;

    async fn insert_component_score(
        &mut self,
        component: NewComponentScore,
    ) -> Result<ComponentScore>;

    /// Participations with a non-empty coach name, ordered by event date
    /// (undated last), then athlete id.
    async fn list_coached_participations(&mut self) -> Result<Vec<CoachedParticipation>>;
}

#[async_trait]
pub trait CoachStore: Send {
    async fn find_coach_by_normalized_name(&mut self, normalized_name: &str)
    -> Result<Option<Coach>>;

    async fn insert_coach(&mut self, coach: NewCoach) -> Result<Coach>;
}

#[async_trait]
pub trait CoachAssignmentStore: Send {
    async fn find_assignment(
        &mut self,
        athlete_id: i64,
        coach_id: i64,
        event_id: i64,
    ) -> Result<Option<CoachAssignment>>;

    async fn current_assignment(&mut self, athlete_id: i64) -> Result<Option<CoachAssignment>>;

    /// All periods of an athlete, oldest first.
    async fn list_assignments(&mut self, athlete_id: i64) -> Result<Vec<CoachAssignment>>;

    async fn insert_assignment(&mut self, assignment: NewCoachAssignment)
    -> Result<CoachAssignment>;

    async fn update_assignment(&mut self, assignment: &CoachAssignment) -> Result<()>;
}

/// One transactional unit of work over the whole schema.
#[async_trait]
pub trait Store:
    EventStore
    + ClubStore
    + AthleteStore
    + JudgeStore
    + ResultStore
    + CoachStore
    + CoachAssignmentStore
    + Sized
{
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Hands out transactional stores.
#[async_trait]
pub trait Database: Send + Sync {
    type Store: Store;

    async fn begin(&self) -> Result<Self::Store>;
}
