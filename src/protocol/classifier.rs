use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use super::event::{
    PipelineEvent, KIND_STAGE_END, KIND_STAGE_ERROR, KIND_STAGE_START, KIND_SYSTEM,
};

/// Reasons a raw frame could not be turned into a [`PipelineEvent`].
///
/// Every variant is locally recoverable: the caller logs a diagnostic,
/// drops the frame, and keeps consuming the stream.
#[derive(Debug, Error, Diagnostic)]
pub enum DecodeError {
    /// Frame bytes are not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    #[diagnostic(code(auditboard::protocol::utf8))]
    Utf8(#[from] std::str::Utf8Error),

    /// Frame text is not valid JSON.
    #[error("frame is not valid JSON: {source}")]
    #[diagnostic(code(auditboard::protocol::json))]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Frame decoded to a non-object JSON value.
    #[error("frame is not a JSON object")]
    #[diagnostic(code(auditboard::protocol::not_an_object))]
    NotAnObject,

    /// Frame object has no string `kind` tag.
    #[error("frame has no \"kind\" tag")]
    #[diagnostic(
        code(auditboard::protocol::missing_kind),
        help("every backend frame must carry a string \"kind\" field")
    )]
    MissingKind,

    /// A recognized `kind` is missing one of its required fields.
    #[error("\"{kind}\" frame missing required string field \"{field}\"")]
    #[diagnostic(code(auditboard::protocol::missing_field))]
    MissingField { kind: String, field: &'static str },
}

/// Parse one raw inbound frame into a typed [`PipelineEvent`].
///
/// Unknown `kind` tags decode successfully to
/// [`PipelineEvent::Unrecognized`]; only malformed frames (bad encoding, bad
/// JSON, missing required fields) return an error.
///
/// # Examples
///
/// ```
/// use auditboard::protocol::{classify, PipelineEvent};
///
/// let ev = classify(br#"{"kind": "stage-start", "name": "indexer"}"#).unwrap();
/// assert_eq!(ev, PipelineEvent::stage_start("indexer"));
///
/// let ev = classify(br#"{"kind": "heartbeat"}"#).unwrap();
/// assert!(matches!(ev, PipelineEvent::Unrecognized { .. }));
///
/// assert!(classify(b"not json").is_err());
/// ```
pub fn classify(raw: &[u8]) -> Result<PipelineEvent, DecodeError> {
    let text = std::str::from_utf8(raw)?;
    let value: Value = serde_json::from_str(text)?;
    let frame = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let kind = frame
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingKind)?;

    match kind {
        KIND_SYSTEM => {
            let message = required_str(frame, kind, "message")?;
            Ok(PipelineEvent::system(message))
        }
        KIND_STAGE_START => {
            let name = required_str(frame, kind, "name")?;
            Ok(PipelineEvent::stage_start(name))
        }
        KIND_STAGE_END => {
            let name = required_str(frame, kind, "name")?;
            // data.output is optional and its shape varies by stage, so it is
            // carried opaquely rather than validated here.
            let output = frame
                .get("data")
                .and_then(|data| data.get("output"))
                .cloned();
            Ok(PipelineEvent::stage_end(name, output))
        }
        KIND_STAGE_ERROR => {
            let name = optional_str(frame, "name");
            let error = optional_str(frame, "error");
            Ok(PipelineEvent::stage_error(name, error))
        }
        other => {
            tracing::trace!(kind = other, "unrecognized frame kind");
            Ok(PipelineEvent::Unrecognized {
                kind: other.to_string(),
            })
        }
    }
}

fn required_str(
    frame: &serde_json::Map<String, Value>,
    kind: &str,
    field: &'static str,
) -> Result<String, DecodeError> {
    frame
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DecodeError::MissingField {
            kind: kind.to_string(),
            field,
        })
}

fn optional_str(frame: &serde_json::Map<String, Value>, field: &str) -> Option<String> {
    frame.get(field).and_then(Value::as_str).map(str::to_string)
}
