//! Workspace integration tests: syllabus text through drafting, editing,
//! reporting and the stored library.

use lessonplan_ingest::{
    draft_for_week, extract_draft_block, parse_syllabus_text, reconcile, DraftOptions,
    ExtractorChain, InferredFields, OutlineCodeMap, PdfError, SegmenterConfig, TextBackend,
};
use lessonplan_storage::{StorageConfig, SyllabusLibrary};

const SYLLABUS: &str = "\
2026학년도 Life Science 강의계획서
대상: G11

제1주차 3/2(월) ~ 3/6(금) 11A반, 11B반
오리엔테이션, 실험실 안전 교육
제2주차 3/9 ~ 3/13 11A
세포 소기관 관찰 (B1.2)
제3주차 3/16 ~ 3/20
대체휴일 3/17(화), 광합성 개념
";

struct Utf8Backend;

impl TextBackend for Utf8Backend {
    fn name(&self) -> &'static str {
        "utf8"
    }

    fn extract(&self, data: &[u8]) -> Result<String, PdfError> {
        String::from_utf8(data.to_vec()).map_err(|e| PdfError::ExtractionFailed(e.to_string()))
    }
}

#[test]
fn pipeline_from_text_to_report() {
    let parse = parse_syllabus_text(SYLLABUS, &SegmenterConfig::default());
    assert_eq!(parse.weeks.len(), 3);

    let week1 = parse.week(1).expect("week 1");
    assert!(week1.class_labels.contains("11A") && week1.class_labels.contains("11B"));
    assert_eq!(week1.label(), "1주 (3.02-3.06)");

    let mut outline = OutlineCodeMap::new();
    outline.insert("B1.2", "세포 소기관", Some("세포 소기관의 기능을 구분한다"));

    let context = parse.context_for(Some("life_science.pdf"));
    let week2 = parse.week(2).expect("week 2");
    let draft = draft_for_week(
        &parse,
        week2,
        Some(&outline),
        &context,
        &InferredFields::default(),
        &DraftOptions::default(),
    );
    assert_eq!(draft.fields.topic.as_deref(), Some("세포 소기관"));
    assert_eq!(draft.rows.len(), 3);

    // The teacher edits the development row and breaks one line.
    let mut edited = draft.text().replace("세포 소기관 설명 및 활동", "현미경 관찰 실습");
    edited.push_str("\n추가 메모 줄");
    let rows = reconcile(&edited);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].content, "현미경 관찰 실습");
    assert_eq!(rows[3].content, "추가 메모 줄");

    let mut report = draft.report().with_teacher("김교사");
    report.draft_text = edited;
    let composed = report.compose_text();
    assert!(composed.contains("수업 주제: 세포 소기관"));
    assert_eq!(
        reconcile(&extract_draft_block(&composed).expect("plan section")),
        rows
    );
}

#[test]
fn week_with_holiday_and_explicit_date() {
    let parse = parse_syllabus_text(SYLLABUS, &SegmenterConfig::default());
    let week3 = parse.week(3).expect("week 3");
    let draft = draft_for_week(
        &parse,
        week3,
        None,
        &parse.context_for(Some("life_science.pdf")),
        &InferredFields::default(),
        &DraftOptions::default(),
    );

    assert!(draft.fields.schedule_notice);
    assert_eq!(draft.fields.class_date.as_deref(), Some("2026.03.17(화)"));
    assert_eq!(draft.fields.topic.as_deref(), Some("광합성"));
    assert_eq!(draft.fields.class_name.as_deref(), Some("Life Science"));
}

#[test]
fn library_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let library = SyllabusLibrary::open(StorageConfig::at(dir.path()))
        .unwrap()
        .with_extractor(ExtractorChain::empty().with_backend(Utf8Backend));

    let entry = library.add("life_science.pdf", SYLLABUS.as_bytes()).unwrap();
    assert_eq!(entry.weeks.len(), 3);

    let reopened = SyllabusLibrary::open(StorageConfig::at(dir.path())).unwrap();
    let stored = reopened.get(&entry.id.to_string()).unwrap();
    assert_eq!(stored.weeks, entry.weeks);

    let parse = stored.as_parse();
    let week1 = parse.week(1).expect("week 1");
    let draft = draft_for_week(
        &parse,
        week1,
        None,
        &parse.context_for(Some(&stored.name)),
        &InferredFields::default(),
        &DraftOptions::default(),
    );
    assert_eq!(draft.fields.topic.as_deref(), Some("오리엔테이션"));
    assert_eq!(draft.fields.audience.as_deref(), Some("G11"));

    reopened.remove(&entry.id.to_string()).unwrap();
    assert!(library.list().is_empty());
}
