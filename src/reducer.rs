//! The event-stream reducer.
//!
//! Projects the loosely-ordered stream of classified backend events onto
//! session state: stage statuses, edge highlights, the log feed, the final
//! verdict, and the running flag. One synchronous step per event, applied in
//! receipt order; the reducer never blocks and never reorders.
//!
//! Rule priority, per event:
//! 1. System frame carrying the completion sentinel ends the run (and is
//!    logged, like every system frame).
//! 2. Other system frames are logged only.
//! 3. Stage lifecycle frames for a recognized stage drive the board:
//!    start → Running plus highlight, end → Done plus highlight cleared plus
//!    verdict extraction, error → Error plus error log plus run ended.
//! 4. Stage lifecycle frames for unrecognized names leave the board alone;
//!    only `stage-end` still feeds the verdict extractor (the pipeline-root
//!    sentinel is not a board stage), and only `stage-error` is still logged.
//!
//! Unrecognized kinds are ignored outright so the protocol can grow without
//! breaking deployed dashboards.

use crate::board::{StageName, StageStatus};
use crate::log_feed::LogClass;
use crate::protocol::{
    classify, PipelineEvent, StagePayload, AUDIT_COMPLETE_MESSAGE, KIND_STAGE_END,
    KIND_STAGE_START,
};
use crate::session::AuditSession;
use crate::verdict::{AuditVerdict, PIPELINE_ROOT_STAGE};

/// Apply one raw inbound frame to the session.
///
/// Decode failures are routed to the log feed as system-classed diagnostics
/// and the frame is otherwise discarded; they never touch stage, edge,
/// verdict, or running state, and never desynchronize later frames.
pub fn apply_raw(session: &mut AuditSession, raw: &[u8]) {
    match classify(raw) {
        Ok(event) => apply(session, &event),
        Err(err) => {
            tracing::warn!(error = %err, "discarding undecodable frame");
            session
                .log_mut()
                .append(LogClass::System, format!("SYSTEM: dropped frame ({err})"));
        }
    }
}

/// Apply one classified event to the session.
pub fn apply(session: &mut AuditSession, event: &PipelineEvent) {
    match event {
        PipelineEvent::System { message } => {
            session
                .log_mut()
                .append(LogClass::System, format!("SYSTEM: {message}"));
            if message == AUDIT_COMPLETE_MESSAGE {
                tracing::info!(session = %session.session_id(), "audit complete");
                session.set_running(false);
            }
        }
        PipelineEvent::StageStart { name } => {
            if let Some(stage) = StageName::recognize(name) {
                session.board_mut().set_status(stage, StageStatus::Running);
                session.board_mut().highlight_edges_into(stage, true);
                session
                    .log_mut()
                    .append(LogClass::Start, format!("[{KIND_STAGE_START}] {name}"));
            }
        }
        PipelineEvent::StageEnd { name, data } => {
            if let Some(stage) = StageName::recognize(name) {
                session.board_mut().set_status(stage, StageStatus::Done);
                session.board_mut().highlight_edges_into(stage, false);
                session
                    .log_mut()
                    .append(LogClass::End, format!("[{KIND_STAGE_END}] {name}"));
            }
            extract_verdict(session, name, data);
        }
        PipelineEvent::StageError { name, error } => {
            let detail = error.as_deref().unwrap_or("unknown error");
            session
                .log_mut()
                .append(LogClass::Error, format!("ERROR: {detail}"));
            if let Some(stage) = name.as_deref().and_then(StageName::recognize) {
                session.board_mut().set_status(stage, StageStatus::Error);
            }
            // A single stage failure aborts the whole run.
            tracing::warn!(
                session = %session.session_id(),
                stage = name.as_deref().unwrap_or("?"),
                error = detail,
                "stage failed, ending session"
            );
            session.set_running(false);
        }
        PipelineEvent::Unrecognized { kind } => {
            tracing::trace!(kind, "ignoring unrecognized event kind");
        }
    }
}

/// Lift the final verdict out of a `stage-end` payload.
///
/// Two independent rules, both applied:
/// - primary: the pipeline-root sentinel carries the aggregate result and
///   ends the run;
/// - fallback: the auditing stage may carry the same result directly,
///   without ending the run (only the sentinel does that).
///
/// If both fire within one session the later write wins; no merge or
/// precedence rule beyond that.
fn extract_verdict(session: &mut AuditSession, name: &str, data: &StagePayload) {
    let Some(output) = &data.output else {
        return;
    };

    if name == PIPELINE_ROOT_STAGE {
        if let Some(verdict) = AuditVerdict::from_output(output) {
            tracing::info!(
                session = %session.session_id(),
                status = %verdict.final_status,
                "final verdict received from pipeline root"
            );
            session.set_verdict(verdict);
            session.set_running(false);
        }
    }

    if name == StageName::Auditor.as_str() {
        if let Some(verdict) = AuditVerdict::from_output(output) {
            tracing::debug!(
                session = %session.session_id(),
                status = %verdict.final_status,
                "verdict attached to auditor stage"
            );
            session.set_verdict(verdict);
        }
    }
}
