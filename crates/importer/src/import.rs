//! Persists parsed export files. Every file is saved in one transaction:
//! either all of its rows land or none do.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skating_storage::models::{
    Event, NewCategory, NewComponentScore, NewElement, NewEvent, NewJudge, NewJudgePanel,
    NewParticipant, NewPerformance, NewSegment, Participant, PerformanceDetails,
};
use skating_storage::{Database, EventStore, JudgeStore, ResultStore, Store};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::category::{CategoryAnalyzer, RankDictionary};
use crate::coach_history::{CoachTransitionBuilder, TransitionReport};
use crate::error::{ImporterError, Result};
use crate::normalize::{normalize_string, remove_duplication};
use crate::registry::{AthletePayload, AthleteRegistry, ClubRegistry, ImportSession, fill};
use crate::similarity::{ClubNameSimilarity, SequenceMatcher, SimilarityThresholds};
use crate::xml::{
    self, ParsedFile, ParticipantRecord, PerformanceRecord, PersonKind, PersonRecord,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub thresholds: SimilarityThresholds,
    pub merge_clubs_after_import: bool,
    /// Runs the coach history builder inside each file's transaction.
    pub build_coach_history: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            thresholds: SimilarityThresholds::default(),
            merge_clubs_after_import: true,
            build_coach_history: false,
        }
    }
}

/// Reviewed category names of one file, keyed by category index.
pub type CategoryCorrections = HashMap<usize, String>;

/// Category corrections for a batch, keyed by file name.
pub type BatchCorrections = HashMap<String, CategoryCorrections>;

/// A category saved with an unconfirmed name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingCategory {
    pub index: usize,
    pub name: String,
    pub suggested_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub file: String,
    pub session_id: Uuid,
    pub event_id: i64,
    /// Distinct athletes the file resolved to.
    pub athletes: usize,
    /// Distinct clubs the file resolved to, after merging.
    pub clubs: usize,
    pub participants: usize,
    /// Performances created; already stored ones are only topped up.
    pub performances: usize,
    pub clubs_merged: usize,
    pub pending_categories: Vec<PendingCategory>,
    pub coach_history: Option<TransitionReport>,
}

#[derive(Debug)]
pub struct FailedFile {
    pub file: String,
    pub error: ImporterError,
}

/// Outcome of one file in a batch.
pub type FileOutcome = std::result::Result<ImportSummary, FailedFile>;

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<ImportSummary>,
    pub failed: Vec<FailedFile>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: FileOutcome) {
        match outcome {
            Ok(summary) => self.succeeded.push(summary),
            Err(failed) => self.failed.push(failed),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Export ids of the file mapped to store ids.
#[derive(Debug, Default)]
struct IdMap {
    clubs: HashMap<String, i64>,
    categories: HashMap<String, i64>,
    category_genders: HashMap<String, String>,
    segments: HashMap<String, i64>,
    judges: HashMap<String, i64>,
}

#[derive(Debug, Default)]
struct Counters {
    athletes: HashSet<i64>,
    participants: usize,
    performances: usize,
}

pub struct ImportService<'a, D> {
    db: &'a D,
    analyzer: CategoryAnalyzer<'a>,
    clubs: ClubRegistry,
    athletes: AthleteRegistry,
    config: ImportConfig,
}

impl<'a, D: Database> ImportService<'a, D> {
    pub fn new(db: &'a D, dictionary: &'a RankDictionary, config: ImportConfig) -> Self {
        Self {
            db,
            analyzer: CategoryAnalyzer::new(dictionary),
            clubs: ClubRegistry::new(ClubNameSimilarity::new(SequenceMatcher, config.thresholds)),
            athletes: AthleteRegistry,
            config,
        }
    }

    /// Imports files one after another, each in its own transaction. A
    /// failing file is reported and does not undo the files before it.
    pub async fn import_batch(&self, files: &[PathBuf], corrections: &BatchCorrections) -> BatchReport {
        let mut report = BatchReport::default();
        let none = CategoryCorrections::new();

        for (idx, path) in files.iter().enumerate() {
            let label = file_label(path);
            info!("[{}/{}] Importing {}", idx + 1, files.len(), label);
            let file_corrections = corrections.get(&label).unwrap_or(&none);

            let outcome = self
                .import_file(path, file_corrections)
                .await
                .map_err(|error| FailedFile {
                    file: label.clone(),
                    error,
                });
            match &outcome {
                Ok(summary) => info!(
                    event_id = summary.event_id,
                    athletes = summary.athletes,
                    performances = summary.performances,
                    "Imported {}",
                    label
                ),
                Err(failed) if failed.error.is_conflict() => error!(
                    "Failed to import {}: conflicts with stored data: {}",
                    failed.file, failed.error
                ),
                Err(failed) => error!("Failed to import {}: {}", failed.file, failed.error),
            }
            report.push(outcome);
        }

        info!(
            "Summary: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }

    pub async fn import_file(&self, path: &Path, corrections: &CategoryCorrections) -> Result<ImportSummary> {
        let parsed = xml::parse_file(path).await?;
        self.import_parsed(&file_label(path), &parsed, corrections)
            .await
    }

    /// Saves one parsed file in a single transaction.
    pub async fn import_parsed(
        &self,
        file: &str,
        parsed: &ParsedFile,
        corrections: &CategoryCorrections,
    ) -> Result<ImportSummary> {
        let mut session = ImportSession::new();
        let span = info_span!("import_file", file, session = %session.id());

        async {
            let mut store = self.db.begin().await?;
            match self.save(&mut store, &mut session, file, parsed, corrections).await {
                Ok(summary) => {
                    store.commit().await?;
                    info!(
                        event_id = summary.event_id,
                        athletes = summary.athletes,
                        clubs = summary.clubs,
                        participants = summary.participants,
                        performances = summary.performances,
                        "File committed"
                    );
                    Ok(summary)
                }
                Err(e) => {
                    if let Err(rollback) = store.rollback().await {
                        error!("Rollback failed: {}", rollback);
                    }
                    warn!("File rolled back: {}", e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn save(
        &self,
        store: &mut D::Store,
        session: &mut ImportSession,
        file: &str,
        parsed: &ParsedFile,
        corrections: &CategoryCorrections,
    ) -> Result<ImportSummary> {
        let event = self.save_event(store, parsed).await?;
        let mut ids = IdMap::default();

        let clubs_merged = self.save_clubs(store, session, parsed, &mut ids).await?;
        let pending_categories = self
            .save_categories(store, event.id, parsed, corrections, &mut ids)
            .await?;
        self.save_segments(store, parsed, &mut ids).await?;
        self.save_judges(store, parsed, &mut ids).await?;

        let mut counters = Counters::default();
        for participant in &parsed.participants {
            self.save_participant(store, &event, parsed, participant, &ids, &mut counters)
                .await?;
        }

        let coach_history = if self.config.build_coach_history {
            Some(CoachTransitionBuilder::new().apply(store).await?)
        } else {
            None
        };

        let clubs: HashSet<i64> = ids.clubs.values().copied().collect();
        Ok(ImportSummary {
            file: file.to_string(),
            session_id: session.id(),
            event_id: event.id,
            athletes: counters.athletes.len(),
            clubs: clubs.len(),
            participants: counters.participants,
            performances: counters.performances,
            clubs_merged,
            pending_categories,
            coach_history,
        })
    }

    async fn save_event(&self, store: &mut D::Store, parsed: &ParsedFile) -> Result<Event> {
        let record = parsed.event().ok_or(ImporterError::MissingEvent)?;

        if store
            .find_event(&record.name, record.begin_date)
            .await?
            .is_some()
        {
            return Err(ImporterError::DuplicateEvent {
                name: record.name.clone(),
                date: record.begin_date,
            });
        }

        let event = store
            .insert_event(NewEvent {
                external_id: record.external_id.clone(),
                name: record.name.clone(),
                long_name: record.long_name.clone(),
                place: record.place.clone(),
                venue: record.venue.clone(),
                begin_date: record.begin_date,
                end_date: record.end_date,
                language: record.language.clone(),
                event_type: record.event_type.clone(),
                competition_type: record.competition_type.clone(),
                status: record.status.clone(),
                calculation_time: record.calculation_time,
            })
            .await?;
        info!(event_id = event.id, name = %event.name, "Event created");
        Ok(event)
    }

    /// Returns how many clubs were merged away.
    async fn save_clubs(
        &self,
        store: &mut D::Store,
        session: &mut ImportSession,
        parsed: &ParsedFile,
        ids: &mut IdMap,
    ) -> Result<usize> {
        for record in &parsed.clubs {
            if let Some(club) = self.clubs.register(store, session, record).await? {
                ids.clubs.insert(record.id.clone(), club.id);
            }
        }

        if !self.config.merge_clubs_after_import {
            return Ok(0);
        }
        let merges = self.clubs.merge_all_duplicates(store, session).await?;
        for merge in &merges {
            for club_id in ids.clubs.values_mut() {
                if *club_id == merge.removed_id {
                    *club_id = merge.kept_id;
                }
            }
        }
        Ok(merges.len())
    }

    async fn save_categories(
        &self,
        store: &mut D::Store,
        event_id: i64,
        parsed: &ParsedFile,
        corrections: &CategoryCorrections,
        ids: &mut IdMap,
    ) -> Result<Vec<PendingCategory>> {
        let mut pending = Vec::new();

        for suggestion in self.analyzer.analyze(&parsed.categories) {
            let record = &parsed.categories[suggestion.index];
            let corrected = corrections
                .get(&suggestion.index)
                .map(|name| normalize_string(name))
                .filter(|name| !name.is_empty());

            let normalized_name = match corrected {
                Some(name) => name,
                None => {
                    if suggestion.needs_review {
                        pending.push(PendingCategory {
                            index: suggestion.index,
                            name: record.name.clone(),
                            suggested_name: suggestion.suggested_name.clone(),
                        });
                    }
                    suggestion.suggested_name
                }
            };

            let category = store
                .insert_category(NewCategory {
                    event_id,
                    external_id: record.external_id.clone(),
                    name: record.name.clone(),
                    tv_name: record.tv_name.clone(),
                    normalized_name: Some(normalized_name),
                    num_entries: record.num_entries,
                    num_participants: record.num_participants,
                    level: record.level.clone(),
                    gender: record.gender.clone(),
                    category_type: record.category_type.clone(),
                    status: record.status.clone(),
                })
                .await?;

            if let Some(id) = &record.id {
                ids.categories.insert(id.clone(), category.id);
                if let Some(gender) = &record.gender {
                    ids.category_genders.insert(id.clone(), gender.clone());
                }
            }
        }

        if !pending.is_empty() {
            info!(pending = pending.len(), "Categories awaiting review");
        }
        Ok(pending)
    }

    async fn save_segments(&self, store: &mut D::Store, parsed: &ParsedFile, ids: &mut IdMap) -> Result<()> {
        for record in &parsed.segments {
            let Some(category_id) = lookup(&ids.categories, record.category_id.as_deref()) else {
                warn!(segment = ?record.id, "Segment references an unknown category, skipped");
                continue;
            };
            let segment = store
                .insert_segment(NewSegment {
                    category_id,
                    external_id: record.id.clone(),
                    name: record.name.clone(),
                    tv_name: record.tv_name.clone(),
                    short_name: record.short_name.clone(),
                    segment_type: record.segment_type.clone(),
                    factor: record.factor,
                    status: record.status.clone(),
                    component_factors: record.component_factors.to_vec(),
                })
                .await?;
            if let Some(id) = &record.id {
                ids.segments.insert(id.clone(), segment.id);
            }
        }
        Ok(())
    }

    async fn save_judges(&self, store: &mut D::Store, parsed: &ParsedFile, ids: &mut IdMap) -> Result<()> {
        for record in &parsed.judges {
            let existing = store
                .find_judge(
                    record.first_name.as_deref(),
                    record.last_name.as_deref(),
                    record.full_name_xml.as_deref(),
                )
                .await?;
            let judge = match existing {
                Some(judge) => judge,
                None => {
                    store
                        .insert_judge(NewJudge {
                            external_id: record.external_id.clone(),
                            first_name: record.first_name.clone(),
                            last_name: record.last_name.clone(),
                            full_name_xml: record.full_name_xml.clone(),
                            short_name: record.short_name.clone(),
                            gender: record.gender.clone(),
                            country: record.country.clone(),
                            city: record.city.clone(),
                            qualification: record.qualification.clone(),
                        })
                        .await?
                }
            };
            ids.judges.insert(record.id.clone(), judge.id);
        }

        let mut seated = 0;
        for panel in &parsed.judge_panels {
            let segment_id = lookup(&ids.segments, panel.segment_id.as_deref());
            let judge_id = lookup(&ids.judges, panel.judge_id.as_deref());
            let (Some(segment_id), Some(judge_id)) = (segment_id, judge_id) else {
                continue;
            };
            if store.find_panel(segment_id, judge_id).await?.is_some() {
                continue;
            }
            store
                .insert_panel(NewJudgePanel {
                    segment_id,
                    category_id: lookup(&ids.categories, panel.category_id.as_deref()),
                    judge_id,
                    role_code: panel.role_code.clone(),
                    panel_group: panel.panel_group.clone(),
                    order_num: panel.order_num,
                })
                .await?;
            seated += 1;
        }
        debug!(judges = ids.judges.len(), seated, "Judges saved");
        Ok(())
    }

    async fn save_participant(
        &self,
        store: &mut D::Store,
        event: &Event,
        parsed: &ParsedFile,
        record: &ParticipantRecord,
        ids: &IdMap,
        counters: &mut Counters,
    ) -> Result<()> {
        let Some(person) = record.person_id.as_deref().and_then(|id| parsed.person(id)) else {
            debug!(participant = ?record.id, "Participant without a person, skipped");
            return Ok(());
        };
        let Some(category_id) = lookup(&ids.categories, record.category_id.as_deref()) else {
            warn!(participant = ?record.id, "Participant references an unknown category, skipped");
            return Ok(());
        };

        let category_gender = record
            .category_id
            .as_deref()
            .and_then(|id| ids.category_genders.get(id));
        let payload = athlete_payload(person, record, category_gender.map(String::as_str), ids);
        let athlete = self.athletes.get_or_create(store, payload).await?;
        counters.athletes.insert(athlete.id);

        let existing = store
            .find_participant(event.id, category_id, athlete.id)
            .await?;
        let participant = match existing {
            Some(mut participant) => {
                if top_up_participant(&mut participant, record, person.coach.as_deref()) {
                    store.update_participant(&participant).await?;
                }
                participant
            }
            None => {
                store
                    .insert_participant(NewParticipant {
                        external_id: record.id.clone(),
                        event_id: event.id,
                        category_id,
                        athlete_id: athlete.id,
                        bib_number: record.bib_number,
                        total_place: record.place,
                        total_points: record.total_points,
                        status: record.status.clone(),
                        segment_statuses: record.segment_statuses.clone(),
                        pct_ppname: record.pct_ppname.clone(),
                        coach: person.coach.clone(),
                    })
                    .await?
            }
        };
        counters.participants += 1;

        let Some(participant_key) = record.id.as_deref() else {
            return Ok(());
        };
        for performance in parsed.performances_of(participant_key) {
            if self
                .save_performance(store, &participant, performance, ids)
                .await?
            {
                counters.performances += 1;
            }
        }
        Ok(())
    }

    /// Returns `true` when the performance was created.
    async fn save_performance(
        &self,
        store: &mut D::Store,
        participant: &Participant,
        record: &PerformanceRecord,
        ids: &IdMap,
    ) -> Result<bool> {
        let Some(segment_id) = lookup(&ids.segments, record.segment_id.as_deref()) else {
            warn!(performance = ?record.id, "Performance references an unknown segment, skipped");
            return Ok(false);
        };

        if let Some(mut existing) = store.find_performance(participant.id, segment_id).await? {
            let mut changed = false;
            changed |= fill(&mut existing.status, record.status.as_ref());
            changed |= fill(&mut existing.qualification, record.qualification.as_ref());
            changed |= fill(&mut existing.place, record.place.as_ref());
            changed |= fill(&mut existing.points, record.points.as_ref());
            if changed {
                store.update_performance(&existing).await?;
            }
            return Ok(false);
        }

        let performance = store
            .insert_performance(NewPerformance {
                participant_id: participant.id,
                segment_id,
                starting_number: record.starting_number,
                status: record.status.clone(),
                qualification: record.qualification.clone(),
                place: record.place,
                points: record.points,
                tes_total: record.tes_sum.or(record.tes_result),
                pcs_total: record.pcs_sum.or(record.pcs_result),
                deductions: record.deductions,
                details: PerformanceDetails {
                    start_group: record.start_group,
                    performance_index: record.performance_index,
                    locked: record.locked,
                    tes_sum: record.tes_sum,
                    tes_result: record.tes_result,
                    pcs_sum: record.pcs_sum,
                    pcs_result: record.pcs_result,
                    tech_target: record.tech_target,
                    points_needed: record.points_needed.clone(),
                },
            })
            .await?;

        for element in &record.elements {
            store
                .insert_element(NewElement {
                    performance_id: performance.id,
                    order_num: element.order_num,
                    planned_code: element.planned_code.clone(),
                    planned_norm: element.planned_norm.clone(),
                    executed_code: Some(element.executed_code.clone()),
                    info_code: element.info_code.clone(),
                    confirmed: element.confirmed.clone(),
                    time_code: element.time_code.clone(),
                    base_value: element.base_value,
                    penalty: element.penalty,
                    result: element.result,
                    goe_result: element.goe_result,
                    judge_scores: element.judge_scores.clone(),
                })
                .await?;
        }
        for component in &record.components {
            store
                .insert_component_score(NewComponentScore {
                    performance_id: performance.id,
                    component_type: component.component_type.as_code().to_string(),
                    factor: component.factor,
                    penalty: component.penalty,
                    result: component.result,
                    judge_scores: component.judge_scores.clone(),
                })
                .await?;
        }
        debug!(
            performance_id = performance.id,
            elements = record.elements.len(),
            components = record.components.len(),
            "Performance created"
        );
        Ok(true)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn lookup(map: &HashMap<String, i64>, key: Option<&str>) -> Option<i64> {
    key.and_then(|key| map.get(key)).copied()
}

/// Builds the athlete payload for a participant. Individuals take the
/// category's gender when it has one; couples keep their pair code.
fn athlete_payload(
    person: &PersonRecord,
    participant: &ParticipantRecord,
    category_gender: Option<&str>,
    ids: &IdMap,
) -> AthletePayload {
    let gender = match person.kind {
        PersonKind::Individual => category_gender
            .map(str::to_string)
            .or_else(|| person.gender.clone()),
        _ => person.gender.clone(),
    };
    let club_id = lookup(&ids.clubs, person.club_id.as_deref())
        .or_else(|| lookup(&ids.clubs, participant.club_id.as_deref()));
    let name = |cyrillic: &Option<String>, plain: &Option<String>| {
        cyrillic
            .as_deref()
            .or(plain.as_deref())
            .map(remove_duplication)
    };

    AthletePayload {
        external_id: person.external_id.clone(),
        first_name: name(&person.first_name_cyrillic, &person.first_name),
        last_name: name(&person.last_name_cyrillic, &person.last_name),
        patronymic: name(&person.patronymic_cyrillic, &person.patronymic),
        full_name_xml: person.full_name.clone().or_else(|| person.full_name_xml.clone()),
        birth_date: person.birth_date,
        gender,
        country: person.nationality.clone(),
        club_id,
    }
}

/// Fills empty participant fields from a later sighting. A new, different
/// coach name replaces the stored one.
fn top_up_participant(participant: &mut Participant, record: &ParticipantRecord, coach: Option<&str>) -> bool {
    let mut changed = false;
    changed |= fill(&mut participant.bib_number, record.bib_number.as_ref());
    changed |= fill(&mut participant.total_place, record.place.as_ref());
    changed |= fill(&mut participant.total_points, record.total_points.as_ref());
    changed |= fill(&mut participant.status, record.status.as_ref());
    changed |= fill(&mut participant.pct_ppname, record.pct_ppname.as_ref());

    let statuses = &mut participant.segment_statuses.0;
    if statuses.len() < record.segment_statuses.len() {
        statuses.resize(record.segment_statuses.len(), None);
    }
    for (slot, status) in statuses.iter_mut().zip(&record.segment_statuses) {
        changed |= fill(slot, status.as_ref());
    }

    if let Some(coach) = coach.filter(|c| !c.trim().is_empty()) {
        if participant.coach.as_deref() != Some(coach) {
            participant.coach = Some(coach.to_string());
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report() {
        let mut report = BatchReport::default();
        report.push(Err(FailedFile {
            file: "a.xml".to_string(),
            error: ImporterError::MissingEvent,
        }));
        assert!(!report.is_success());
        assert!(report.succeeded.is_empty());
        assert_eq!(report.failed[0].file, "a.xml");
    }

    #[test]
    fn test_file_label_uses_file_name() {
        assert_eq!(file_label(Path::new("/tmp/exports/cup.xml")), "cup.xml");
    }

    #[test]
    fn test_payload_prefers_cyrillic_names_and_category_gender() {
        let mut ids = IdMap::default();
        ids.clubs.insert("C1".to_string(), 7);
        let person = PersonRecord {
            first_name: Some("Sofia".to_string()),
            first_name_cyrillic: Some("Софья Софья".to_string()),
            last_name: Some("Petrova".to_string()),
            full_name_xml: Some("PETROVA Sofia".to_string()),
            full_name: Some("Софья ПЕТРОВА".to_string()),
            gender: Some("M".to_string()),
            club_id: Some("C1".to_string()),
            ..Default::default()
        };
        let participant = ParticipantRecord {
            club_id: Some("C2".to_string()),
            ..Default::default()
        };

        let payload = athlete_payload(&person, &participant, Some("F"), &ids);
        assert_eq!(payload.first_name.as_deref(), Some("Софья"));
        assert_eq!(payload.last_name.as_deref(), Some("Petrova"));
        assert_eq!(payload.full_name_xml.as_deref(), Some("Софья ПЕТРОВА"));
        assert_eq!(payload.gender.as_deref(), Some("F"));
        assert_eq!(payload.club_id, Some(7));
    }

    #[test]
    fn test_payload_couple_keeps_pair_gender() {
        let ids = IdMap::default();
        let person = PersonRecord {
            kind: PersonKind::Couple,
            gender: Some(xml::COUPLE_GENDER.to_string()),
            ..Default::default()
        };
        let payload = athlete_payload(&person, &ParticipantRecord::default(), Some("F"), &ids);
        assert_eq!(payload.gender.as_deref(), Some("P"));
        assert_eq!(payload.club_id, None);
    }

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert!(config.merge_clubs_after_import);
        assert!(!config.build_coach_history);
        assert_eq!(config.thresholds.merge, 0.85);
    }
}
