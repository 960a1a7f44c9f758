use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use skating_importer::xml::{ParsedFile, parse_document};
use skating_importer::{
    CategoryCorrections, CoachTransitionBuilder, ImportConfig, ImportService, ImporterError,
    RankDictionary, assign_judge_roles,
};
use skating_storage::{Database, MemoryDatabase, Store};

/// One export with two categories, two clubs, two skaters and two scored
/// performances. The second category's name is not in the rank dictionary.
fn export(event: &str, date: &str, coach: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ISUCalcFS>
  <Event EVT_ID="1" EVT_NAME="{event}" EVT_BEGDAT="{date}" EVT_PLACE="Москва">
    <Category_List>
      <Category CAT_ID="10" CAT_NAME="KМС, Девушки" CAT_GENDER="F">
        <Segment_List>
          <Segment SCP_ID="100" CAT_ID="10" SCP_NAME="Короткая программа" SCP_FACTOR="100" SCP_CRFR01="80">
            <Judges_List>
              <Person PCT_ID="J1" PCT_GNAME="Ольга" PCT_FNAME="Судьина" PCT_AFUNCT="JDG"/>
              <Person PCT_ID="J2" PCT_GNAME="Пётр" PCT_FNAME="Арбитров" PCT_AFUNCT="JDG"/>
              <Person PCT_ID="J3" PCT_GNAME="Ирина" PCT_FNAME="Операторова" PCT_AFUNCT="JDG"/>
            </Judges_List>
          </Segment>
        </Segment_List>
      </Category>
      <Category CAT_ID="11" CAT_NAME="Открытый класс" CAT_GENDER="F"/>
    </Category_List>
    <Participants_List>
      <Person_Couple_Team PCT_ID="P1" PCT_TYPE="PER" PCT_GNAME="Анна" PCT_FNAMEC="Иванова" PCT_FNAME="Ivanova"
          PCT_BDAY="20100101" PCT_GENDER="M" PCT_CLBID="C1" PCT_COANAM="{coach}"/>
      <Person_Couple_Team PCT_ID="P2" PCT_TYPE="PER" PCT_GNAME="Мария" PCT_FNAMEC="Смирнова Смирнова"
          PCT_BDAY="20110202" PCT_GENDER="F" PCT_CLBID="C2" PCT_COANAM="Сидоров С.С."/>
    </Participants_List>
    <Club_List>
      <Club PCT_ID="C1" PCT_PLNAME="СШОР ЦСКА Москва" PCT_CITY="Москва"/>
      <Club PCT_ID="C2" PCT_PLNAME="Ледовая школа Звезда"/>
    </Club_List>
    <Participant PAR_ID="1000" CAT_ID="10" PCT_ID="P1" PAR_TPOINT="4525" PAR_TPLACE="1" PAR_STAT1="OK"/>
    <Participant PAR_ID="1001" CAT_ID="10" PCT_ID="P2" PAR_TPLACE="2"/>
    <Participant PAR_ID="1002" CAT_ID="11" PCT_ID="P1"/>
    <Performance PRF_ID="5000" SCP_ID="100" PAR_ID="1000" PRF_POINTS="4525" PRF_M1TOT="2800"
        PRF_XNAE01="3Lz" PRF_XBVE01="590" PRF_E01RES="649" PRF_E01J01="6" PRF_E01J02="9"
        PRF_XNAE05="" PRF_XNAE06="2A" PRF_XBVE06="330" PRF_E06RES="280"
        PRF_C01RES="725" PRF_C01J01="700" PRF_C01J02="750"
        PRF_DED01="1" PRF_DED02="2" PRF_DED03="bad" PRF_DED04="0"/>
    <Performance PRF_ID="5001" SCP_ID="100" PAR_ID="1001" PRF_POINTS="3010" PRF_XNAE01="2Lz"/>
  </Event>
</ISUCalcFS>"#
    )
}

fn parsed(event: &str, date: &str, coach: &str) -> ParsedFile {
    parse_document(&export(event, date, coach)).unwrap()
}

fn service(db: &MemoryDatabase) -> ImportService<'_, MemoryDatabase> {
    ImportService::new(db, RankDictionary::builtin(), ImportConfig::default())
}

fn temp_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("skate-import-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_full_import() {
    let db = MemoryDatabase::new();
    let summary = service(&db)
        .import_parsed("cup.xml", &parsed("Кубок", "20240301", "Петров П.П."), &CategoryCorrections::new())
        .await
        .unwrap();

    assert_eq!(summary.file, "cup.xml");
    assert_eq!(summary.athletes, 2);
    assert_eq!(summary.clubs, 2);
    assert_eq!(summary.participants, 3);
    assert_eq!(summary.performances, 2);
    assert_eq!(summary.clubs_merged, 0);
    assert_eq!(summary.pending_categories.len(), 1);
    assert_eq!(summary.pending_categories[0].index, 1);
    assert_eq!(summary.pending_categories[0].suggested_name, "Другой, Девочки");
    assert!(summary.coach_history.is_none());

    let state = db.snapshot();
    assert_eq!(state.events.len(), 1);
    assert_eq!(state.events[0].id, summary.event_id);

    let names: Vec<Option<&str>> = state
        .categories
        .iter()
        .map(|c| c.normalized_name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("КМС, Девушки"), Some("Другой, Девочки")]);

    let segment = &state.segments[0];
    assert_eq!(segment.factor, Some(Decimal::ONE));
    assert_eq!(segment.component_factors.0[0], Some(Decimal::new(80, 2)));

    assert_eq!(state.judges.len(), 3);
    let seats: Vec<i32> = state.judge_panels.iter().map(|p| p.order_num).collect();
    assert_eq!(seats, vec![1, 2, 3]);

    // Category gender wins over the person's for individuals; doubled
    // tokens are collapsed.
    let anna = state.athletes.iter().find(|a| a.first_name == "Анна").unwrap();
    assert_eq!(anna.last_name, "Иванова");
    assert_eq!(anna.gender.as_deref(), Some("F"));
    assert_eq!(anna.birth_date, NaiveDate::from_ymd_opt(2010, 1, 1));
    let maria = state.athletes.iter().find(|a| a.first_name == "Мария").unwrap();
    assert_eq!(maria.last_name, "Смирнова");

    let club = state.clubs.iter().find(|c| c.id == anna.club_id.unwrap()).unwrap();
    assert_eq!(club.name, "СШОР ЦСКА Москва");
    assert_eq!(club.city.as_deref(), Some("Москва"));

    let participant = state
        .participants
        .iter()
        .find(|p| p.external_id.as_deref() == Some("1000"))
        .unwrap();
    assert_eq!(participant.total_points, Some(Decimal::new(4525, 2)));
    assert_eq!(participant.coach.as_deref(), Some("Петров П.П."));
    assert_eq!(participant.segment_statuses.0[0].as_deref(), Some("OK"));
}

#[tokio::test]
async fn test_performance_grids_are_stored() {
    let db = MemoryDatabase::new();
    service(&db)
        .import_parsed("cup.xml", &parsed("Кубок", "20240301", "Петров П.П."), &CategoryCorrections::new())
        .await
        .unwrap();
    let state = db.snapshot();

    let first = &state.performances[0];
    assert_eq!(first.points, Some(Decimal::new(4525, 2)));
    assert_eq!(first.tes_total, Some(2800));
    assert_eq!(first.deductions, Some(3));
    assert_eq!(state.performances[1].deductions, None);

    // Slot 5 is blank, so the element list jumps from 1 to 6.
    let elements: Vec<_> = state
        .elements
        .iter()
        .filter(|e| e.performance_id == first.id)
        .collect();
    let slots: Vec<i32> = elements.iter().map(|e| e.order_num).collect();
    assert_eq!(slots, vec![1, 6]);
    assert_eq!(elements[0].goe_result, Some(59));
    assert_eq!(elements[0].judge_scores.0.len(), 15);
    assert_eq!(elements[0].judge_scores.0[0], Some(1));
    assert_eq!(elements[0].judge_scores.0[1], None);
    assert_eq!(elements[1].goe_result, Some(-50));

    let component = &state.component_scores[0];
    assert_eq!(component.component_type, "CO");
    assert_eq!(component.factor, Some(Decimal::new(80, 2)));
    assert_eq!(component.result, Some(725));
    assert_eq!(&component.judge_scores.0[..3], &[Some(700), Some(750), None]);
}

#[tokio::test]
async fn test_corrections_clear_pending_categories() {
    let db = MemoryDatabase::new();
    let corrections: CategoryCorrections = HashMap::from([(1, " Открытый  класс, Девушки ".to_string())]);
    let summary = service(&db)
        .import_parsed("cup.xml", &parsed("Кубок", "20240301", "Петров П.П."), &corrections)
        .await
        .unwrap();

    assert!(summary.pending_categories.is_empty());
    let state = db.snapshot();
    assert_eq!(
        state.categories[1].normalized_name.as_deref(),
        Some("Открытый класс, Девушки")
    );
}

#[tokio::test]
async fn test_duplicate_event_is_rejected() {
    let db = MemoryDatabase::new();
    let file = parsed("Кубок", "20240301", "Петров П.П.");
    service(&db)
        .import_parsed("cup.xml", &file, &CategoryCorrections::new())
        .await
        .unwrap();
    let before = db.snapshot();

    let err = service(&db)
        .import_parsed("cup-again.xml", &file, &CategoryCorrections::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ImporterError::DuplicateEvent { ref name, .. } if name == "Кубок"));
    let after = db.snapshot();
    assert_eq!(after.events.len(), before.events.len());
    assert_eq!(after.athletes.len(), before.athletes.len());
    assert_eq!(after.clubs.len(), before.clubs.len());
}

#[tokio::test]
async fn test_failed_save_rolls_back_the_whole_file() {
    let db = MemoryDatabase::new();
    db.reject_inserts_into("performances");

    let result = service(&db)
        .import_parsed("cup.xml", &parsed("Кубок", "20240301", "Петров П.П."), &CategoryCorrections::new())
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, ImporterError::Storage(_)));
    assert!(err.is_conflict());

    let state = db.snapshot();
    assert!(state.events.is_empty());
    assert!(state.clubs.is_empty());
    assert!(state.athletes.is_empty());
    assert!(state.participants.is_empty());

    // The same file goes through once the store accepts it.
    db.accept_all_inserts();
    service(&db)
        .import_parsed("cup.xml", &parsed("Кубок", "20240301", "Петров П.П."), &CategoryCorrections::new())
        .await
        .unwrap();
    assert_eq!(db.snapshot().events.len(), 1);
}

#[tokio::test]
async fn test_missing_event() {
    let db = MemoryDatabase::new();
    let file = parse_document("<ISUCalcFS><Club PCT_ID=\"C1\" PCT_PLNAME=\"Звезда\"/></ISUCalcFS>").unwrap();
    let err = service(&db)
        .import_parsed("empty.xml", &file, &CategoryCorrections::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ImporterError::MissingEvent));
    assert!(db.snapshot().clubs.is_empty());
}

#[tokio::test]
async fn test_batch_reports_partial_success() {
    let db = MemoryDatabase::new();
    let files = vec![
        temp_file("spring.xml", &export("Весенний кубок", "20240301", "Петров П.П.")),
        temp_file("broken.xml", "<ISUCalcFS><Event EVT_NAME=\"x\">"),
        temp_file("autumn.xml", &export("Осенний кубок", "20241001", "Петров П.П.")),
    ];

    let report = service(&db).import_batch(&files, &HashMap::new()).await;

    assert!(!report.is_success());
    let succeeded: Vec<&str> = report.succeeded.iter().map(|s| s.file.as_str()).collect();
    assert_eq!(succeeded, vec!["spring.xml", "autumn.xml"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file, "broken.xml");
    assert!(matches!(report.failed[0].error, ImporterError::Xml(_)));
    assert!(!report.failed[0].error.is_conflict());

    // The second file reuses athletes and clubs from the first.
    let state = db.snapshot();
    assert_eq!(state.events.len(), 2);
    assert_eq!(state.athletes.len(), 2);
    assert_eq!(state.clubs.len(), 2);
    assert_eq!(report.succeeded[1].athletes, 2);
}

#[tokio::test]
async fn test_batch_applies_corrections_by_file_name() {
    let db = MemoryDatabase::new();
    let files = vec![temp_file("spring.xml", &export("Весенний кубок", "20240301", "Петров П.П."))];
    let corrections = HashMap::from([(
        "spring.xml".to_string(),
        HashMap::from([(1, "Открытый класс, Девушки".to_string())]),
    )]);

    let report = service(&db).import_batch(&files, &corrections).await;
    assert!(report.is_success());
    assert!(report.succeeded[0].pending_categories.is_empty());
}

#[tokio::test]
async fn test_coach_history_across_imports() {
    let db = MemoryDatabase::new();
    let none = CategoryCorrections::new();
    for (name, date, coach) in [
        ("Первенство", "20240101", "Петров П.П."),
        ("Кубок", "20240201", "Петров П.П."),
        ("Финал", "20240301", "Козлов К.К."),
    ] {
        service(&db)
            .import_parsed(name, &parsed(name, date, coach), &none)
            .await
            .unwrap();
    }

    let report = CoachTransitionBuilder::new().run(&db).await.unwrap();
    assert_eq!(report.transitions, 1);

    let state = db.snapshot();
    let anna = state.athletes.iter().find(|a| a.first_name == "Анна").unwrap();
    let periods: Vec<_> = state
        .coach_assignments
        .iter()
        .filter(|a| a.athlete_id == anna.id)
        .collect();
    assert_eq!(periods.len(), 2);
    let petrov = state.coaches.iter().find(|c| c.name == "Петров П.П.").unwrap();
    assert_eq!(periods[0].coach_id, petrov.id);
    assert_eq!(periods[0].end_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert!(!periods[0].is_current);
    assert!(periods[1].is_current);
    assert_eq!(periods[1].end_date, None);

    let again = CoachTransitionBuilder::new().run(&db).await.unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(db.snapshot().coach_assignments.len(), state.coach_assignments.len());
}

#[tokio::test]
async fn test_inline_coach_history() {
    let db = MemoryDatabase::new();
    let config = ImportConfig {
        build_coach_history: true,
        ..Default::default()
    };
    let summary = ImportService::new(&db, RankDictionary::builtin(), config)
        .import_parsed("cup.xml", &parsed("Кубок", "20240301", "Петров П.П."), &CategoryCorrections::new())
        .await
        .unwrap();

    let history = summary.coach_history.unwrap();
    // Anna appears in two categories of the same event under one coach.
    assert_eq!(history.processed, 3);
    assert_eq!(history.created, 2);
    assert_eq!(db.snapshot().coach_assignments.len(), 2);
}

#[tokio::test]
async fn test_judge_roles_after_import() {
    let db = MemoryDatabase::new();
    service(&db)
        .import_parsed("cup.xml", &parsed("Кубок", "20240301", "Петров П.П."), &CategoryCorrections::new())
        .await
        .unwrap();

    let mut store = db.begin().await.unwrap();
    let changes = assign_judge_roles(&mut store, false).await.unwrap();
    store.commit().await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].order_num, 3);
    let roles: Vec<Option<String>> = db
        .snapshot()
        .judge_panels
        .into_iter()
        .map(|p| p.role_code)
        .collect();
    assert_eq!(
        roles,
        vec![Some("JDG".to_string()), Some("JDG".to_string()), Some("DO".to_string())]
    );
}
