use lessonplan_ingest::{
    draft_for_week, extract_draft_block, parse_extraction, parse_syllabus_text, reconcile,
    reconcile_detailed, segment, DraftOptions, Extraction, ExtractorChain, FieldSource,
    InferredFields, MonthDay, OutlineCodeMap, SegmenterConfig,
};
#[cfg(feature = "pdf")]
use lessonplan_ingest::LopdfBackend;

const SYLLABUS: &str = "\
2026학년도 1학기 Life Science 수업 계획
L1.1: 세포의 구조 | 세포 소기관의 기능을 설명한다
L1.2: 세포막 | 물질 이동 방식을 비교한다

1주 2.23-2.27 11A, 11B
세부내용: 오리엔테이션 및 L1.1 소개
2주 3.02-3.06 11A
L1.2 실험, 3.03(화) 관찰 보고서
3주 3.09-3.13 11A, 11B
주제: 현미경 사용법
8주 4.20-4.24
중간고사
";

#[test]
fn two_week_scenario_segments_exactly() {
    let text = "1주 2.23-2.27 수업 11A\n세부내용: 소개\n2주 3.02-3.06 수업 11B\n세부내용: 전개";
    let weeks = segment(text);

    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0].week_index, 1);
    assert_eq!(weeks[1].week_index, 2);

    let range = weeks[0].date_range.expect("week 1 dates");
    assert_eq!(range.start, MonthDay::new(2, 23));
    assert_eq!(range.end, MonthDay::new(2, 27));
    let range = weeks[1].date_range.expect("week 2 dates");
    assert_eq!(range.start, MonthDay::new(3, 2));
    assert_eq!(range.end, MonthDay::new(3, 6));

    assert_eq!(weeks[0].class_labels.iter().collect::<Vec<_>>(), vec!["11A"]);
    assert_eq!(weeks[1].class_labels.iter().collect::<Vec<_>>(), vec!["11B"]);
    assert_eq!(weeks[0].body_text, "세부내용: 소개");
}

#[test]
fn week_marker_with_several_labels() {
    let weeks = segment("3주 3.09-3.13 수업 11A, 11B\n실험");
    assert_eq!(weeks[0].week_index, 3);
    assert!(weeks[0].date_range.is_some());
    assert!(weeks[0].class_labels.contains("11A"));
    assert!(weeks[0].class_labels.contains("11B"));
}

#[test]
fn failed_extraction_means_no_weeks() {
    let extraction = ExtractorChain::default().extract(b"%PDF-1.4 truncated");
    assert!(extraction.failed());
    assert!(segment(&extraction.text).is_empty());

    let parse = parse_extraction(Extraction::default(), &SegmenterConfig::default());
    assert!(parse.extraction_failed);
    assert!(parse.no_weeks_found());
}

#[test]
fn full_syllabus_parse_and_drafts() {
    let parse = parse_syllabus_text(SYLLABUS, &SegmenterConfig::default());
    assert_eq!(parse.year, Some(2026));
    assert_eq!(
        parse.weeks.iter().map(|w| w.week_index).collect::<Vec<_>>(),
        vec![1, 2, 3, 8]
    );
    assert_eq!(parse.outline_map.len(), 2);

    let context = parse.context_for(Some("2026_Life_Science_syllabus.pdf"));
    let options = DraftOptions::default();
    let no_overrides = InferredFields::default();

    let week1 = parse.week(1).expect("week 1");
    let draft = draft_for_week(&parse, week1, None, &context, &no_overrides, &options);
    assert_eq!(draft.fields.topic.as_deref(), Some("세포의 구조"));
    assert_eq!(draft.fields.audience.as_deref(), Some("G11"));
    assert_eq!(draft.fields.class_name.as_deref(), Some("Life Science"));
    assert_eq!(draft.week_label, "1주 (2.23-2.27)");

    let week2 = parse.week(2).expect("week 2");
    let draft = draft_for_week(&parse, week2, None, &context, &no_overrides, &options);
    assert_eq!(draft.fields.topic.as_deref(), Some("세포막"));
    assert_eq!(draft.fields.class_date.as_deref(), Some("2026.03.03(화)"));

    let week3 = parse.week(3).expect("week 3");
    let draft = draft_for_week(&parse, week3, None, &context, &no_overrides, &options);
    assert_eq!(draft.fields.topic.as_deref(), Some("현미경 사용법"));
    assert_eq!(draft.fields.objective, None);
    assert!(draft.rows[0].content.contains("[OBJECTIVE]"));

    let week8 = parse.week(8).expect("week 8");
    let draft = draft_for_week(&parse, week8, None, &context, &no_overrides, &options);
    assert!(draft.fields.schedule_notice);
    assert_eq!(draft.fields.audience, None);
    assert!(draft.fields.missing().contains(&"audience"));
}

#[test]
fn caller_outline_overrides_embedded_codes() {
    let parse = parse_syllabus_text(SYLLABUS, &SegmenterConfig::default());
    let mut extra = OutlineCodeMap::new();
    extra.insert("l1.1", "세포 이론", None);

    let week1 = parse.week(1).expect("week 1");
    let draft = draft_for_week(
        &parse,
        week1,
        Some(&extra),
        &parse.context_for(None),
        &InferredFields::default(),
        &DraftOptions::default(),
    );
    assert_eq!(draft.fields.topic.as_deref(), Some("세포 이론"));
    assert_eq!(
        draft.fields.topic_source,
        Some(FieldSource::OutlineCode("L1.1".to_string()))
    );
    // No objective on the caller's entry; the theme keyword supplies one.
    assert!(draft.fields.objective.is_some());
}

#[test]
fn edited_draft_keeps_malformed_row() {
    let edited = "도입|10분|기도 및 출석 확인|\n전개 실험 활동 메모만 남김\n정리|5분|형성평가|";
    let rows = reconcile(edited);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].content, "전개 실험 활동 메모만 남김");
    assert!(rows[1].stage.is_empty() && rows[1].time.is_empty() && rows[1].note.is_empty());
    assert!(reconcile_detailed(edited)[1].malformed);
}

#[test]
fn report_round_trips_the_draft_block() {
    let parse = parse_syllabus_text(SYLLABUS, &SegmenterConfig::default());
    let week = parse.week(2).expect("week 2");
    let draft = draft_for_week(
        &parse,
        week,
        None,
        &parse.context_for(None),
        &InferredFields::default(),
        &DraftOptions::default(),
    );

    let composed = draft.report().compose_text();
    let block = extract_draft_block(&composed).expect("plan section");
    assert_eq!(reconcile(&block), draft.rows);
}

/// One-page PDF whose only text line is a week marker.
#[cfg(feature = "pdf")]
fn week_one_pdf() -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Week 1 3.02-3.06 11A")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

#[cfg(feature = "pdf")]
fn assert_week_one(parse: &lessonplan_ingest::SyllabusParse) {
    assert!(!parse.extraction_failed);
    assert_eq!(parse.weeks.len(), 1);
    let week = &parse.weeks[0];
    assert_eq!(week.week_index, 1);
    let range = week.date_range.expect("week 1 dates");
    assert_eq!(range.start, MonthDay::new(3, 2));
    assert_eq!(range.end, MonthDay::new(3, 6));
    assert_eq!(week.class_labels.iter().collect::<Vec<_>>(), vec!["11A"]);
}

#[cfg(feature = "pdf")]
#[test]
fn generated_pdf_goes_through_the_chain() {
    let extraction = ExtractorChain::default().extract(&week_one_pdf());
    assert_eq!(extraction.backend.as_deref(), Some("pdf-extract"));

    let parse = parse_extraction(extraction, &SegmenterConfig::default());
    assert_week_one(&parse);
}

#[cfg(feature = "pdf")]
#[test]
fn lopdf_backend_reads_generated_pdf() {
    let chain = ExtractorChain::empty().with_backend(LopdfBackend);
    let extraction = chain.extract(&week_one_pdf());
    assert_eq!(extraction.backend.as_deref(), Some("lopdf"));

    let parse = parse_extraction(extraction, &SegmenterConfig::default());
    assert_week_one(&parse);
}
