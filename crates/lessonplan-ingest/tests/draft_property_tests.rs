use lessonplan_ingest::{
    generate, generate_with, infer, reconcile, serialize, DraftOptions, InferredFields,
    OutlineCodeMap, WeekRecord,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn optional_text() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(any::<String>())
}

fn fields() -> impl Strategy<Value = InferredFields> {
    (
        optional_text(),
        optional_text(),
        optional_text(),
        optional_text(),
        optional_text(),
    )
        .prop_map(|(class_name, class_date, audience, topic, objective)| InferredFields {
            class_name,
            class_date,
            audience,
            topic,
            objective,
            ..Default::default()
        })
}

fn options() -> impl Strategy<Value = DraftOptions> {
    (any::<bool>(), optional_text()).prop_map(|(include_prayer, plan_note)| DraftOptions {
        include_prayer,
        plan_note,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn generated_rows_survive_serialize_and_reconcile(f in fields(), o in options()) {
        let rows = generate_with(&f, &o);
        prop_assert_eq!(reconcile(&serialize(&rows)), rows);
    }

    #[test]
    fn generate_always_yields_three_rows(f in fields()) {
        let rows = generate(&f);
        prop_assert_eq!(rows.len(), 3);
        prop_assert!(rows.iter().all(|r| !r.stage.is_empty() && !r.time.is_empty()));
    }

    // None of the theme keywords or labelled-line prefixes can be spelled
    // with this alphabet.
    #[test]
    fn unrecognized_body_never_gets_a_topic(body in "[q-z0-9 \n]{0,200}") {
        let record = WeekRecord {
            week_index: 1,
            date_range: None,
            class_labels: BTreeSet::new(),
            heading: String::new(),
            body_text: body,
        };
        let fields = infer(&record, Some(&OutlineCodeMap::new()));
        prop_assert_eq!(fields.topic, None);
        prop_assert_eq!(fields.objective, None);
    }
}
