use std::collections::{HashMap, HashSet};
use std::path::Path;

use roxmltree::{Document, Node};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::attrs::Attrs;
use super::records::*;
use crate::Result;
use crate::decode;
use crate::normalize::{fix_latin_to_cyrillic, normalize_optional, normalize_string};

/// Reads and parses one export file.
pub async fn parse_file(path: &Path) -> Result<ParsedFile> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_document(&content)
}

/// Parses an export document in one pass over the tree. Only structurally
/// invalid XML is an error; missing attributes decode to absent values.
pub fn parse_document(xml: &str) -> Result<ParsedFile> {
    let doc = Document::parse(xml)?;

    let segments = parse_segments(&doc);
    let (judges, judge_panels) = parse_judges(&doc);
    let performances = parse_performances(&doc, &segments);

    let parsed = ParsedFile {
        events: parse_events(&doc),
        categories: parse_categories(&doc),
        segments,
        judges,
        judge_panels,
        persons: parse_persons(&doc),
        clubs: parse_clubs(&doc),
        participants: parse_participants(&doc),
        performances,
    };

    info!(
        events = parsed.events.len(),
        categories = parsed.categories.len(),
        segments = parsed.segments.len(),
        persons = parsed.persons.len(),
        clubs = parsed.clubs.len(),
        participants = parsed.participants.len(),
        performances = parsed.performances.len(),
        "Parsed export"
    );

    Ok(parsed)
}

fn elements<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants().filter(move |n| n.has_tag_name(tag))
}

fn slot(index: usize) -> String {
    format!("{index:02}")
}

fn parse_events(doc: &Document) -> Vec<EventRecord> {
    elements(doc, "Event")
        .map(|node| {
            let a = Attrs::of(node);
            let end_date = a.date("EVT_ENDDAT");
            let begin_date = a.date("EVT_BEGDAT").or(end_date);
            let calculation_time = decode::parse_datetime(a.raw("EVT_CALCTM")).or_else(|| {
                let time = decode::parse_time(a.raw("EVT_CALCTM"))?;
                Some(begin_date?.and_time(time))
            });

            EventRecord {
                id: a.id("EVT_ID"),
                external_id: a.text("EVT_EXTDT"),
                name: normalize_string(a.raw("EVT_NAME").unwrap_or_default()),
                long_name: a.text("EVT_LNAME"),
                place: a.text("EVT_PLACE"),
                venue: a.text("EVT_R1NAM"),
                begin_date,
                end_date,
                language: a.text("EVT_PLANG"),
                event_type: a.text("EVT_TYPE"),
                competition_type: a.text("EVT_CMPTYP"),
                status: a.text("EVT_STAT"),
                calculation_time,
            }
        })
        .collect()
}

fn parse_categories(doc: &Document) -> Vec<CategoryRecord> {
    elements(doc, "Category")
        .map(|node| {
            let a = Attrs::of(node);
            let name = normalize_string(a.raw("CAT_NAME").unwrap_or_default());

            CategoryRecord {
                id: a.id("CAT_ID"),
                event_id: a.id("EVT_ID"),
                external_id: a.text("CAT_EXTDT"),
                name: fix_latin_to_cyrillic(&name),
                tv_name: a.text("CAT_TVNAME"),
                gender: a.text("CAT_GENDER"),
                category_type: a.text("CAT_TYPE"),
                level: a.text("CAT_LEVEL"),
                status: a.text("CAT_STAT"),
                num_entries: a.int("CAT_NENT"),
                num_participants: a.int("CAT_NPAR"),
            }
        })
        .collect()
}

fn parse_segments(doc: &Document) -> Vec<SegmentRecord> {
    elements(doc, "Segment")
        .map(|node| {
            let a = Attrs::of(node);
            let mut component_factors = [None; COMPONENT_SLOTS];
            for (index, factor) in component_factors.iter_mut().enumerate() {
                *factor = a.factor(&format!("SCP_CRFR{}", slot(index + 1)));
            }

            SegmentRecord {
                id: a.id("SCP_ID"),
                category_id: a.id("CAT_ID"),
                name: normalize_string(a.raw("SCP_NAME").unwrap_or_default()),
                tv_name: a.text("SCP_TVNAME"),
                short_name: a.text("SCP_SNAM"),
                segment_type: a.text("SCP_TYPE"),
                factor: a.factor("SCP_FACTOR"),
                status: a.text("SCP_STAT"),
                component_factors,
            }
        })
        .collect()
}

/// Judges come from each segment's `Judges_List`. A judge sitting on several
/// panels is recorded once; every seat becomes a panel entry numbered by its
/// position in the list.
fn parse_judges(doc: &Document) -> (Vec<JudgeRecord>, Vec<JudgePanelRecord>) {
    let mut seen = HashSet::new();
    let mut judges = Vec::new();
    let mut panels = Vec::new();

    for segment in elements(doc, "Segment") {
        let segment_attrs = Attrs::of(segment);
        let Some(list) = segment.children().find(|n| n.has_tag_name("Judges_List")) else {
            continue;
        };

        let seats = list.children().filter(|n| n.has_tag_name("Person"));
        for (position, person) in seats.enumerate() {
            let a = Attrs::of(person);
            let judge_id = a.id("PCT_ID");

            if let Some(id) = &judge_id {
                if seen.insert(id.clone()) {
                    judges.push(JudgeRecord {
                        id: id.clone(),
                        external_id: a.text("PCT_EXTDT"),
                        first_name: a.text("PCT_GNAME"),
                        last_name: a.text_any(&["PCT_FNAMEC", "PCT_FNAME"]),
                        full_name_xml: a.text("PCT_CNAME"),
                        short_name: a.text("PCT_SNAME"),
                        gender: a.text("PCT_GENDER"),
                        country: a.text("PCT_NAT"),
                        city: a.text("PCT_CITY"),
                        qualification: a.text("PCT_COANAM"),
                    });
                }
            }

            panels.push(JudgePanelRecord {
                segment_id: segment_attrs.id("SCP_ID"),
                category_id: segment_attrs.id("CAT_ID"),
                judge_id,
                role_code: a.text("PCT_AFUNCT"),
                panel_group: a.text("PCT_COMPOF"),
                order_num: i32::try_from(position + 1).unwrap_or(i32::MAX),
            });
        }
    }

    (judges, panels)
}

fn is_within(node: Node, tag: &str) -> bool {
    node.ancestors().skip(1).any(|n| n.has_tag_name(tag))
}

/// Competitors listed under `Participants_List`. Members nested inside a
/// couple or team entry are part of that entry and are not read on their own.
fn parse_persons(doc: &Document) -> Vec<PersonRecord> {
    elements(doc, "Person_Couple_Team")
        .filter(|node| is_within(*node, "Participants_List"))
        .filter(|node| !is_within(*node, "Person_Couple_Team"))
        .map(|node| {
            let a = Attrs::of(node);
            let kind = PersonKind::from_code(a.raw("PCT_TYPE"));

            let mut person = PersonRecord {
                id: a.id("PCT_ID"),
                external_id: a.text("PCT_EXTDT"),
                kind: kind.clone(),
                nationality: a.text("PCT_NAT"),
                club_id: a.id("PCT_CLBID"),
                birth_date: a.date("PCT_BDAY"),
                gender: a.text("PCT_GENDER"),
                full_name_xml: a.text("PCT_CNAME"),
                coach: a.text("PCT_COANAM"),
                music_short: a.text("PCT_SPMNAM"),
                music_free: a.text("PCT_FSMNAM"),
                ..Default::default()
            };

            match kind {
                PersonKind::Individual => {
                    person.first_name = a.text("PCT_GNAME");
                    person.first_name_cyrillic = a.text("PCT_GNAME");
                    person.last_name = a.text_any(&["PCT_FNAMEC", "PCT_FNAME"]);
                    person.last_name_cyrillic = a.text("PCT_FNAMEC");
                    person.patronymic = a.text("PCT_TLNAME");
                    person.patronymic_cyrillic = a.text("PCT_TLNAMEC");
                    person.full_name = a.text("PCT_PLNAME");
                    person.short_name = a.text("PCT_PSNAME");
                }
                PersonKind::Couple => {
                    person.first_name = a.text("PCT_CNAME");
                    person.first_name_cyrillic = a.text("PCT_CNAME");
                    person.last_name = a.text("PCT_PSNAME");
                    person.last_name_cyrillic = a.text("PCT_PSNAME");
                    person.full_name = a.text("PCT_PLNAME");
                    person.short_name = a.text("PCT_CNAME");
                    person.gender = Some(COUPLE_GENDER.to_string());
                }
                PersonKind::Other(ref code) => {
                    debug!(code = %code, id = ?person.id, "Person of unknown type, names left empty");
                }
            }

            person
        })
        .collect()
}

fn parse_clubs(doc: &Document) -> Vec<ClubRecord> {
    let mut seen = HashSet::new();
    let mut clubs = Vec::new();

    for node in elements(doc, "Club") {
        let a = Attrs::of(node);
        let Some(id) = a.id("PCT_ID") else {
            continue;
        };
        if seen.contains(&id) {
            continue;
        }
        let Some(name) = a.text_any(&["PCT_PLNAME", "PCT_CNAME"]) else {
            continue;
        };
        seen.insert(id.clone());

        clubs.push(ClubRecord {
            id,
            external_id: a.text("PCT_EXTDT"),
            name,
            short_name: a.text("PCT_SNAME"),
            country: a.text("PCT_NAT"),
            city: a.text("PCT_CITY"),
        });
    }

    clubs
}

fn parse_participants(doc: &Document) -> Vec<ParticipantRecord> {
    let mut pp_names: HashMap<&str, Option<String>> = HashMap::new();
    for node in elements(doc, "Person_Couple_Team") {
        if let Some(id) = node.attribute("PCT_ID") {
            pp_names
                .entry(id.trim())
                .or_insert_with(|| normalize_optional(node.attribute("PCT_PPNAME")));
        }
    }

    elements(doc, "Participant")
        .map(|node| {
            let a = Attrs::of(node);
            let person_id = a.id("PCT_ID");
            let pct_ppname = person_id
                .as_deref()
                .and_then(|id| pp_names.get(id).cloned().flatten());

            ParticipantRecord {
                id: a.id("PAR_ID"),
                category_id: a.id("CAT_ID"),
                person_id,
                club_id: a.id("PAR_CLBID"),
                bib_number: a.int("PAR_ENTNUM"),
                place: a.int("PAR_TPLACE"),
                total_points: a.score("PAR_TPOINT"),
                status: a.text("PAR_STAT"),
                segment_statuses: (1..=SEGMENT_STATUS_SLOTS)
                    .map(|i| a.text(&format!("PAR_STAT{i}")))
                    .collect(),
                pct_ppname,
            }
        })
        .collect()
}

fn parse_performances(doc: &Document, segments: &[SegmentRecord]) -> Vec<PerformanceRecord> {
    let factors: HashMap<&str, &SegmentRecord> = segments
        .iter()
        .filter_map(|s| s.id.as_deref().map(|id| (id, s)))
        .collect();

    elements(doc, "Performance")
        .map(|node| {
            let a = Attrs::of(node);
            let segment_id = a.id("SCP_ID");
            let segment = segment_id.as_deref().and_then(|id| factors.get(id)).copied();

            PerformanceRecord {
                id: a.id("PRF_ID"),
                participant_id: a.id("PAR_ID"),
                place: a.int("PRF_PLACE"),
                points: a.score("PRF_POINTS"),
                status: a.text("PRF_STAT"),
                qualification: a.text("PRF_QUALIF"),
                starting_number: a.int("PRF_STNUM"),
                start_group: a.int("PRF_STGNUM"),
                performance_index: a.int("PRF_INDEX"),
                locked: a.flag("PRF_LOCK"),
                deductions: parse_deductions(a),
                factor: a.factor("SCP_FACTOR"),
                tes_sum: a.int("PRF_M1TOT"),
                tes_result: a.int("PRF_M1RES"),
                pcs_sum: a.int("PRF_M2TOT"),
                pcs_result: a.int("PRF_M2RES"),
                tech_target: a.int("PRF_PTOSKA"),
                points_needed: (1..=POINTS_NEEDED_SLOTS)
                    .map(|i| a.int(&format!("PRF_PNEED{i}")))
                    .collect(),
                elements: parse_elements(a),
                components: parse_components(a, segment),
                segment_id,
            }
        })
        .collect()
}

/// The explicit total wins. Without one the individual slots are summed,
/// skipping entries that are not integers; no readable slot at all means no
/// deduction was recorded.
fn parse_deductions(a: Attrs) -> Option<i32> {
    if a.has("PRF_DEDTOT") {
        match a.int("PRF_DEDTOT") {
            Some(total) => return Some(total),
            None => warn!(
                value = ?a.raw("PRF_DEDTOT"),
                "Unreadable deduction total, summing individual deductions"
            ),
        }
    }

    let mut total: Option<i32> = None;
    for index in 1..=DEDUCTION_SLOTS {
        let name = format!("PRF_DED{}", slot(index));
        let Some(raw) = a.raw(&name) else {
            continue;
        };
        match decode::parse_int(Some(raw)) {
            Some(value) => total = Some(total.unwrap_or(0) + value),
            None => warn!(slot = %name, value = raw, "Ignoring unreadable deduction"),
        }
    }
    total
}

fn parse_elements(a: Attrs) -> Vec<ElementRecord> {
    let mut elements = Vec::new();

    for index in 1..=ELEMENT_SLOTS {
        let i = slot(index);
        let xnae = format!("PRF_XNAE{i}");
        let inae = format!("PRF_INAE{i}");
        let Some(executed) = a.text_any(&[xnae.as_str(), inae.as_str()]) else {
            continue;
        };

        let base_value = a.int(&format!("PRF_XBVE{i}"));
        let penalty = a.int(&format!("PRF_E{i}PNL"));
        let result = a.int(&format!("PRF_E{i}RES"));
        let judge_scores = (1..=JUDGE_SLOTS)
            .map(|j| a.goe(&format!("PRF_E{i}J{}", slot(j))))
            .collect();

        elements.push(ElementRecord {
            order_num: index as i32,
            planned_code: a.text(&format!("PRF_PNAE{i}")),
            planned_norm: a.text(&format!("PRF_PNWE{i}")),
            executed_code: executed,
            info_code: a.text(&inae),
            confirmed: a.text(&format!("PRF_XCFE{i}")),
            time_code: a.text(&format!("PRF_XTCE{i}")),
            base_value,
            penalty,
            result,
            goe_result: decode::goe_result(penalty, result, base_value),
            judge_scores,
        });
    }

    elements
}

fn parse_components(a: Attrs, segment: Option<&SegmentRecord>) -> Vec<ComponentRecord> {
    let mut components = Vec::new();

    for index in 1..=COMPONENT_SLOTS {
        let c = slot(index);
        let Some(result) = a.raw(&format!("PRF_C{c}RES")) else {
            continue;
        };
        let Some(component_type) = ComponentType::from_slot(index) else {
            continue;
        };

        let factor: Option<Decimal> = segment.and_then(|s| s.component_factor(index));
        components.push(ComponentRecord {
            component_type,
            factor,
            penalty: a.int(&format!("PRF_C{c}PNL")),
            result: decode::parse_int(Some(result)),
            judge_scores: (1..=JUDGE_SLOTS)
                .map(|j| a.int(&format!("PRF_C{c}J{}", slot(j))))
                .collect(),
        });
    }

    components
}
