//! Wire protocol for the audit backend.
//!
//! The backend pushes JSON frames over a persistent channel, tagged by a
//! `kind` field. This module owns the typed view of those frames
//! ([`PipelineEvent`]) and the classifier that turns raw bytes into it
//! ([`classify`]). Decoding failure is a first-class outcome: one bad frame
//! must never take the stream down.

mod classifier;
mod event;

pub use classifier::{classify, DecodeError};
pub use event::{
    PipelineEvent, StagePayload, StartCommand, AUDIT_COMPLETE_MESSAGE, KIND_STAGE_END,
    KIND_STAGE_ERROR, KIND_STAGE_START, KIND_SYSTEM,
};
