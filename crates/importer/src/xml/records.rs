//! In-memory records produced by one parse pass. Identifiers are the
//! export's own ids (strings scoped to the file), not store ids.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

pub const JUDGE_SLOTS: usize = 15;
pub const ELEMENT_SLOTS: usize = 20;
pub const COMPONENT_SLOTS: usize = 5;
pub const DEDUCTION_SLOTS: usize = 17;
pub const SEGMENT_STATUS_SLOTS: usize = 6;
pub const POINTS_NEEDED_SLOTS: usize = 3;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventRecord {
    pub id: Option<String>,
    pub external_id: Option<String>,
    pub name: String,
    pub long_name: Option<String>,
    pub place: Option<String>,
    pub venue: Option<String>,
    /// Falls back to `end_date` when the export only carries an end date.
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub event_type: Option<String>,
    pub competition_type: Option<String>,
    pub status: Option<String>,
    pub calculation_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryRecord {
    pub id: Option<String>,
    pub event_id: Option<String>,
    pub external_id: Option<String>,
    /// Normalized, with Latin look-alikes repaired.
    pub name: String,
    pub tv_name: Option<String>,
    pub gender: Option<String>,
    pub category_type: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub num_entries: Option<i32>,
    pub num_participants: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SegmentRecord {
    pub id: Option<String>,
    pub category_id: Option<String>,
    pub name: String,
    pub tv_name: Option<String>,
    pub short_name: Option<String>,
    pub segment_type: Option<String>,
    pub factor: Option<Decimal>,
    pub status: Option<String>,
    /// Weight of program component 1..=5, index 0 holds component 1.
    pub component_factors: [Option<Decimal>; COMPONENT_SLOTS],
}

impl SegmentRecord {
    /// Weight of the 1-based component `index`.
    pub fn component_factor(&self, index: usize) -> Option<Decimal> {
        index
            .checked_sub(1)
            .and_then(|slot| self.component_factors.get(slot))
            .copied()
            .flatten()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JudgeRecord {
    pub id: String,
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

#[derive(Debug, Clone, Default, Serialize)]
pub struct JudgePanelRecord {
    pub segment_id: Option<String>,
    pub category_id: Option<String>,
    pub judge_id: Option<String>,
    pub role_code: Option<String>,
    pub panel_group: Option<String>,
    /// 1-based position within the segment's judges list.
    pub order_num: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum PersonKind {
    /// `PER`
    #[default]
    Individual,
    /// `COU`: a pair or dance couple carrying one composite name.
    Couple,
    Other(String),
}

impl PersonKind {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("PER") | None | Some("") => Self::Individual,
            Some("COU") => Self::Couple,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Gender code stored for couples and teams.
pub const COUPLE_GENDER: &str = "P";

#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonRecord {
    pub id: Option<String>,
    pub external_id: Option<String>,
    pub kind: PersonKind,
    pub nationality: Option<String>,
    pub club_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub full_name_xml: Option<String>,
    /// Name used on printed protocols; preferred for display.
    pub full_name: Option<String>,
    pub short_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub patronymic: Option<String>,
    pub first_name_cyrillic: Option<String>,
    pub last_name_cyrillic: Option<String>,
    pub patronymic_cyrillic: Option<String>,
    pub coach: Option<String>,
    pub music_short: Option<String>,
    pub music_free: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClubRecord {
    pub id: String,
    pub external_id: Option<String>,
    pub name: String,
    pub short_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParticipantRecord {
    pub id: Option<String>,
    pub category_id: Option<String>,
    pub person_id: Option<String>,
    pub club_id: Option<String>,
    pub bib_number: Option<i32>,
    pub place: Option<i32>,
    pub total_points: Option<Decimal>,
    pub status: Option<String>,
    pub segment_statuses: Vec<Option<String>>,
    /// Looked up on the referenced person; `None` when the reference dangles.
    pub pct_ppname: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComponentType {
    Composition,
    Transitions,
    Presentation,
    Interpretation,
    SkatingSkills,
}

impl ComponentType {
    /// Maps the 1-based component slot to its type.
    pub fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            1 => Some(Self::Composition),
            2 => Some(Self::Transitions),
            3 => Some(Self::Presentation),
            4 => Some(Self::Interpretation),
            5 => Some(Self::SkatingSkills),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Composition => "CO",
            Self::Transitions => "TR",
            Self::Presentation => "PR",
            Self::Interpretation => "IN",
            Self::SkatingSkills => "SK",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ElementRecord {
    /// Slot number 1..=20 the element was read from.
    pub order_num: i32,
    pub planned_code: Option<String>,
    pub planned_norm: Option<String>,
    pub executed_code: String,
    pub info_code: Option<String>,
    pub confirmed: Option<String>,
    pub time_code: Option<String>,
    pub base_value: Option<i32>,
    pub penalty: Option<i32>,
    pub result: Option<i32>,
    pub goe_result: Option<i32>,
    /// One entry per judge slot; unscored slots are `None`.
    pub judge_scores: Vec<Option<i8>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentRecord {
    pub component_type: ComponentType,
    pub factor: Option<Decimal>,
    pub penalty: Option<i32>,
    pub result: Option<i32>,
    pub judge_scores: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceRecord {
    pub id: Option<String>,
    pub segment_id: Option<String>,
    pub participant_id: Option<String>,
    pub place: Option<i32>,
    pub points: Option<Decimal>,
    pub status: Option<String>,
    pub qualification: Option<String>,
    pub starting_number: Option<i32>,
    pub start_group: Option<i32>,
    pub performance_index: Option<i32>,
    pub locked: bool,
    /// `None` when neither a total nor any slot was recorded.
    pub deductions: Option<i32>,
    pub factor: Option<Decimal>,
    pub tes_sum: Option<i32>,
    pub tes_result: Option<i32>,
    pub pcs_sum: Option<i32>,
    pub pcs_result: Option<i32>,
    pub tech_target: Option<i32>,
    pub points_needed: Vec<Option<i32>>,
    pub elements: Vec<ElementRecord>,
    pub components: Vec<ComponentRecord>,
}

/// Everything one export file yields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedFile {
    pub events: Vec<EventRecord>,
    pub categories: Vec<CategoryRecord>,
    pub segments: Vec<SegmentRecord>,
    pub judges: Vec<JudgeRecord>,
    pub judge_panels: Vec<JudgePanelRecord>,
    pub persons: Vec<PersonRecord>,
    pub clubs: Vec<ClubRecord>,
    pub participants: Vec<ParticipantRecord>,
    pub performances: Vec<PerformanceRecord>,
}

impl ParsedFile {
    pub fn event(&self) -> Option<&EventRecord> {
        self.events.first()
    }

    pub fn person(&self, id: &str) -> Option<&PersonRecord> {
        self.persons.iter().find(|p| p.id.as_deref() == Some(id))
    }

    pub fn segment(&self, id: &str) -> Option<&SegmentRecord> {
        self.segments.iter().find(|s| s.id.as_deref() == Some(id))
    }

    pub fn performances_of<'a>(
        &'a self,
        participant_id: &'a str,
    ) -> impl Iterator<Item = &'a PerformanceRecord> + 'a {
        self.performances
            .iter()
            .filter(move |p| p.participant_id.as_deref() == Some(participant_id))
    }
}
