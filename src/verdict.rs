//! Final verdict types and extraction out of `stage-end` payloads.
//!
//! The backend surfaces the aggregate result in one of two places: wrapped at
//! the top of the whole pipeline run (a `stage-end` named after the pipeline
//! root), or attached directly to the terminal auditing stage. Which one
//! fires depends on the backend build, so the reducer accepts both; if both
//! arrive in one session the later write wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stage name the backend reports for the whole pipeline run, distinct from
/// both real stage names. Only the verdict extractor's primary rule looks at
/// it.
pub const PIPELINE_ROOT_STAGE: &str = "pipeline";

const STATUS_PASS: &str = "PASS";

/// One detected compliance violation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// The structured final result of an audit run.
///
/// `final_status` is whatever string the backend reports; `"PASS"` and
/// `"FAIL"` are the usual values but others must round-trip untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditVerdict {
    #[serde(default)]
    pub final_status: String,
    #[serde(default)]
    pub final_report: String,
    #[serde(default)]
    pub compliance_results: Vec<ComplianceIssue>,
}

impl AuditVerdict {
    /// Lift a verdict out of a `stage-end` `data.output` value.
    ///
    /// The output object *is* the verdict; anything that is not an object
    /// (or whose fields are ill-typed) extracts nothing rather than failing
    /// the stream.
    pub fn from_output(output: &Value) -> Option<AuditVerdict> {
        if !output.is_object() {
            return None;
        }
        serde_json::from_value(output.clone()).ok()
    }

    pub fn is_pass(&self) -> bool {
        self.final_status == STATUS_PASS
    }
}
