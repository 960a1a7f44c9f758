mod athlete;
mod category;
mod club;
mod coach;
mod event;
mod judge;
mod lookup_key;
mod participant;
mod performance;

pub use athlete::{Athlete, NewAthlete};
pub use category::{Category, NewCategory, NewSegment, Segment};
pub use club::{Club, NewClub};
pub use coach::{Coach, CoachAssignment, NewCoach, NewCoachAssignment};
pub use event::{Event, NewEvent};
pub use judge::{Judge, JudgePanel, NewJudge, NewJudgePanel};
pub use lookup_key::AthleteLookupKey;
pub use participant::{CoachedParticipation, NewParticipant, Participant};
pub use performance::{
    ComponentScore, Element, NewComponentScore, NewElement, NewPerformance, Performance,
    PerformanceDetails,
};
