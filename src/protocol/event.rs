use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Wire tag for system/informational frames.
pub const KIND_SYSTEM: &str = "system";
/// Wire tag for a stage entering execution.
pub const KIND_STAGE_START: &str = "stage-start";
/// Wire tag for a stage finishing successfully.
pub const KIND_STAGE_END: &str = "stage-end";
/// Wire tag for a stage failing.
pub const KIND_STAGE_ERROR: &str = "stage-error";

/// System sentinel message that marks the end of an audit run.
pub const AUDIT_COMPLETE_MESSAGE: &str = "Audit complete";

/// A classified server-pushed event.
///
/// One variant per recognized wire `kind`, plus [`Unrecognized`](Self::Unrecognized)
/// for tags this build does not know about. Unknown tags are a supported
/// outcome (the protocol is expected to grow), not a decode failure.
///
/// # Examples
///
/// ```
/// use auditboard::protocol::PipelineEvent;
///
/// let ev = PipelineEvent::stage_start("indexer");
/// assert_eq!(ev.stage_name(), Some("indexer"));
/// assert_eq!(ev.kind_label(), "stage-start");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Informational frame from the backend itself rather than a stage.
    System { message: String },
    /// A named stage began executing.
    StageStart { name: String },
    /// A named stage finished; `data.output` may carry its result.
    StageEnd { name: String, data: StagePayload },
    /// A stage failed. The backend may omit both the name and the error text.
    StageError {
        name: Option<String>,
        error: Option<String>,
    },
    /// Parsed fine, but the `kind` tag is outside the recognized set.
    Unrecognized { kind: String },
}

impl PipelineEvent {
    pub fn system(message: impl Into<String>) -> Self {
        PipelineEvent::System {
            message: message.into(),
        }
    }

    pub fn stage_start(name: impl Into<String>) -> Self {
        PipelineEvent::StageStart { name: name.into() }
    }

    pub fn stage_end(name: impl Into<String>, output: Option<Value>) -> Self {
        PipelineEvent::StageEnd {
            name: name.into(),
            data: StagePayload { output },
        }
    }

    pub fn stage_error(name: Option<String>, error: Option<String>) -> Self {
        PipelineEvent::StageError { name, error }
    }

    /// The wire tag this event was (or would be) carried under.
    pub fn kind_label(&self) -> &str {
        match self {
            PipelineEvent::System { .. } => KIND_SYSTEM,
            PipelineEvent::StageStart { .. } => KIND_STAGE_START,
            PipelineEvent::StageEnd { .. } => KIND_STAGE_END,
            PipelineEvent::StageError { .. } => KIND_STAGE_ERROR,
            PipelineEvent::Unrecognized { kind } => kind,
        }
    }

    /// Stage name carried by this event, if any.
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            PipelineEvent::StageStart { name } | PipelineEvent::StageEnd { name, .. } => {
                Some(name.as_str())
            }
            PipelineEvent::StageError { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Render this event back into its wire JSON object.
    ///
    /// The inverse of [`classify`](super::classify) for well-formed frames;
    /// used by in-memory transports and tests to fabricate backend traffic.
    pub fn to_json_value(&self) -> Value {
        match self {
            PipelineEvent::System { message } => json!({
                "kind": KIND_SYSTEM,
                "message": message,
            }),
            PipelineEvent::StageStart { name } => json!({
                "kind": KIND_STAGE_START,
                "name": name,
            }),
            PipelineEvent::StageEnd { name, data } => {
                let mut frame = json!({
                    "kind": KIND_STAGE_END,
                    "name": name,
                });
                if let Some(output) = &data.output {
                    frame["data"] = json!({ "output": output });
                }
                frame
            }
            PipelineEvent::StageError { name, error } => {
                let mut frame = json!({ "kind": KIND_STAGE_ERROR });
                if let Some(name) = name {
                    frame["name"] = json!(name);
                }
                if let Some(error) = error {
                    frame["error"] = json!(error);
                }
                frame
            }
            PipelineEvent::Unrecognized { kind } => json!({ "kind": kind }),
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::System { message } => write!(f, "[system] {message}"),
            PipelineEvent::StageStart { name } => write!(f, "[{KIND_STAGE_START}] {name}"),
            PipelineEvent::StageEnd { name, .. } => write!(f, "[{KIND_STAGE_END}] {name}"),
            PipelineEvent::StageError { name, error } => match (name, error) {
                (Some(name), Some(error)) => write!(f, "[{KIND_STAGE_ERROR}] {name}: {error}"),
                (Some(name), None) => write!(f, "[{KIND_STAGE_ERROR}] {name}"),
                (None, Some(error)) => write!(f, "[{KIND_STAGE_ERROR}] {error}"),
                (None, None) => write!(f, "[{KIND_STAGE_ERROR}]"),
            },
            PipelineEvent::Unrecognized { kind } => write!(f, "[{kind}] (unrecognized)"),
        }
    }
}

/// Payload attached to a `stage-end` frame.
///
/// Only `output` is interesting to the dashboard; its shape varies by stage
/// and is left opaque until the verdict extractor looks inside.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

/// The single client→server message: kicks off one audit run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCommand {
    pub resource_locator: String,
}

impl StartCommand {
    pub fn new(resource_locator: impl Into<String>) -> Self {
        Self {
            resource_locator: resource_locator.into(),
        }
    }
}
