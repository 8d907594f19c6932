use serde_json::json;

use auditboard::protocol::{classify, DecodeError, PipelineEvent, StartCommand};

mod common;

/********************
 * Well-formed frames
 ********************/

#[test]
fn classifies_system_frame() {
    let ev = classify(br#"{"kind": "system", "message": "Audit started"}"#).unwrap();
    assert_eq!(ev, PipelineEvent::system("Audit started"));
}

#[test]
fn classifies_stage_start_frame() {
    let ev = classify(br#"{"kind": "stage-start", "name": "indexer"}"#).unwrap();
    assert_eq!(ev, PipelineEvent::stage_start("indexer"));
    assert_eq!(ev.stage_name(), Some("indexer"));
}

#[test]
fn classifies_stage_end_with_output() {
    let frame = json!({
        "kind": "stage-end",
        "name": "auditor",
        "data": { "output": { "final_status": "PASS" } },
    });
    let ev = classify(frame.to_string().as_bytes()).unwrap();
    match ev {
        PipelineEvent::StageEnd { name, data } => {
            assert_eq!(name, "auditor");
            assert_eq!(data.output, Some(json!({ "final_status": "PASS" })));
        }
        other => panic!("expected StageEnd, got {other:?}"),
    }
}

#[test]
fn classifies_stage_end_without_payload() {
    let ev = classify(br#"{"kind": "stage-end", "name": "indexer"}"#).unwrap();
    assert_eq!(ev, PipelineEvent::stage_end("indexer", None));
}

#[test]
fn classifies_stage_error_with_all_fields_optional() {
    let ev = classify(br#"{"kind": "stage-error"}"#).unwrap();
    assert_eq!(ev, PipelineEvent::stage_error(None, None));

    let ev = classify(br#"{"kind": "stage-error", "name": "auditor", "error": "timeout"}"#)
        .unwrap();
    assert_eq!(
        ev,
        PipelineEvent::stage_error(Some("auditor".into()), Some("timeout".into()))
    );
}

#[test]
fn unknown_kind_is_unrecognized_not_an_error() {
    let ev = classify(br#"{"kind": "heartbeat", "seq": 17}"#).unwrap();
    assert_eq!(
        ev,
        PipelineEvent::Unrecognized {
            kind: "heartbeat".into()
        }
    );
}

#[test]
fn extra_fields_are_tolerated() {
    // The backend decorates frames with ids the dashboard does not use.
    let frame = json!({
        "kind": "stage-start",
        "name": "auditor",
        "timestamp": "b2f9",
        "session_id": "1234",
    });
    let ev = classify(frame.to_string().as_bytes()).unwrap();
    assert_eq!(ev, PipelineEvent::stage_start("auditor"));
}

/********************
 * Malformed frames
 ********************/

#[test]
fn rejects_invalid_json() {
    assert!(matches!(
        classify(b"not json at all"),
        Err(DecodeError::Json { .. })
    ));
}

#[test]
fn rejects_invalid_utf8() {
    assert!(matches!(
        classify(&[0xff, 0xfe, 0x80]),
        Err(DecodeError::Utf8(_))
    ));
}

#[test]
fn rejects_non_object_frames() {
    assert!(matches!(classify(b"[1, 2, 3]"), Err(DecodeError::NotAnObject)));
    assert!(matches!(classify(b"\"system\""), Err(DecodeError::NotAnObject)));
}

#[test]
fn rejects_missing_kind_tag() {
    assert!(matches!(
        classify(br#"{"message": "hello"}"#),
        Err(DecodeError::MissingKind)
    ));
    // A non-string kind is as good as absent.
    assert!(matches!(
        classify(br#"{"kind": 7}"#),
        Err(DecodeError::MissingKind)
    ));
}

#[test]
fn rejects_missing_required_fields() {
    let err = classify(br#"{"kind": "stage-start"}"#).unwrap_err();
    match err {
        DecodeError::MissingField { kind, field } => {
            assert_eq!(kind, "stage-start");
            assert_eq!(field, "name");
        }
        other => panic!("expected MissingField, got {other:?}"),
    }

    assert!(matches!(
        classify(br#"{"kind": "system"}"#),
        Err(DecodeError::MissingField { .. })
    ));
    assert!(matches!(
        classify(br#"{"kind": "stage-end"}"#),
        Err(DecodeError::MissingField { .. })
    ));
}

/********************
 * Wire round-trips
 ********************/

#[test]
fn events_round_trip_through_wire_json() {
    let events = vec![
        PipelineEvent::system("Audit started"),
        PipelineEvent::stage_start("indexer"),
        PipelineEvent::stage_end("auditor", Some(common::pass_output())),
        PipelineEvent::stage_error(Some("auditor".into()), Some("timeout".into())),
    ];
    for event in events {
        let raw = common::frame(&event);
        assert_eq!(classify(&raw).unwrap(), event);
    }
}

#[test]
fn start_command_wire_shape() {
    let command = StartCommand::new("https://example.com/clip");
    let frame = serde_json::to_value(&command).unwrap();
    assert_eq!(
        frame,
        json!({ "resource_locator": "https://example.com/clip" })
    );
}

/********************
 * Robustness
 ********************/

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Arbitrary bytes never panic the classifier.
        #[test]
        fn classify_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = classify(&raw);
        }

        /// Arbitrary JSON objects with a string kind always classify.
        #[test]
        fn string_kinds_always_classify(kind in "[a-z-]{1,24}") {
            let frame = json!({
                "kind": kind,
                "name": "indexer",
                "message": "m",
            });
            prop_assert!(classify(frame.to_string().as_bytes()).is_ok());
        }
    }
}
