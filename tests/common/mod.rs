#![allow(dead_code)]

use serde_json::{json, Value};

use auditboard::board::{StageName, StageStatus};
use auditboard::protocol::PipelineEvent;
use auditboard::session::AuditSession;
use auditboard::verdict::PIPELINE_ROOT_STAGE;

/// The canonical happy-path event sequence for one full audit run.
pub fn happy_path_events(output: Value) -> Vec<PipelineEvent> {
    vec![
        PipelineEvent::stage_start(StageName::Indexer.as_str()),
        PipelineEvent::stage_end(StageName::Indexer.as_str(), None),
        PipelineEvent::stage_start(StageName::Auditor.as_str()),
        PipelineEvent::stage_end(StageName::Auditor.as_str(), Some(output)),
        PipelineEvent::system("Audit complete"),
    ]
}

/// A well-formed PASS output payload.
pub fn pass_output() -> Value {
    json!({
        "final_status": "PASS",
        "final_report": "ok",
        "compliance_results": [],
    })
}

/// A FAIL output payload with one violation.
pub fn fail_output() -> Value {
    json!({
        "final_status": "FAIL",
        "final_report": "two violations found",
        "compliance_results": [
            {
                "severity": "critical",
                "category": "trademark",
                "description": "unlicensed logo at 00:12",
            },
        ],
    })
}

/// Wire frame bytes for an event.
pub fn frame(event: &PipelineEvent) -> Vec<u8> {
    event.to_json_value().to_string().into_bytes()
}

/// Wire frame for a pipeline-root sentinel `stage-end` carrying `output`.
pub fn root_sentinel_end(output: Value) -> PipelineEvent {
    PipelineEvent::stage_end(PIPELINE_ROOT_STAGE, Some(output))
}

pub fn assert_initial_topology(session: &AuditSession) {
    for stage in StageName::ALL {
        assert_eq!(session.board().status(stage), StageStatus::Idle);
        assert!(!session.board().highlight_into(stage).active);
    }
    assert!(session.log().is_empty());
    assert!(session.verdict().is_none());
}
