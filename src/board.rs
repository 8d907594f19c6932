//! Node/edge state store for the pipeline board.
//!
//! The board holds the reducer's belief about each pipeline stage and the
//! highlight state of the dependency arrows between them. Its topology is
//! fixed at build time and mirrors the rendered graph: an entry node, the
//! two real stages, and a terminal node, chained by three directed edges.
//!
//! Status transitions deliberately trust stream order: a later event for a
//! stage always overwrites whatever came before. That policy lives in
//! [`resolve_transition`] so a causal-ordering guard could replace it
//! without touching the reducer.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The fixed set of recognized pipeline stages.
///
/// Exactly two names are ever applied to board state; everything else on the
/// wire is informational. [`recognize`](Self::recognize) is the single place
/// that maps wire names onto this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    /// Media-indexing stage: ingests and indexes the submitted resource.
    Indexer,
    /// Compliance-review stage: audits the indexed material.
    Auditor,
}

impl StageName {
    pub const ALL: [StageName; 2] = [StageName::Indexer, StageName::Auditor];

    /// Wire name of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Indexer => "indexer",
            StageName::Auditor => "auditor",
        }
    }

    /// Map a wire stage name onto the recognized set.
    pub fn recognize(name: &str) -> Option<StageName> {
        match name {
            "indexer" => Some(StageName::Indexer),
            "auditor" => Some(StageName::Auditor),
            _ => None,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reducer's belief about a stage's execution phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageStatus::Idle => "idle",
            StageStatus::Running => "running",
            StageStatus::Done => "done",
            StageStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Status overwrite policy: trust stream order.
///
/// The incoming status always wins, even if it looks like a regression
/// (e.g. Done back to Running). The transport gives no causal ordering
/// guarantee and the reducer does not invent one; if the backend delivers
/// events out of order the board shows that.
pub fn resolve_transition(_current: StageStatus, incoming: StageStatus) -> StageStatus {
    incoming
}

/// A node endpoint on the board: real stages plus the entry/terminal chrome
/// nodes that bracket them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRef {
    Entry,
    Stage(StageName),
    Terminal,
}

/// Visual emphasis on a dependency arrow.
///
/// Derived from the *target* stage only: an edge lights up while its target
/// runs and dims when the target leaves the running state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeHighlight {
    pub active: bool,
    pub emphasized: bool,
    pub weight: u32,
}

impl EdgeHighlight {
    const ACTIVE_WEIGHT: u32 = 3;
    const INACTIVE_WEIGHT: u32 = 2;

    pub fn active() -> Self {
        Self {
            active: true,
            emphasized: true,
            weight: Self::ACTIVE_WEIGHT,
        }
    }

    pub fn inactive() -> Self {
        Self {
            active: false,
            emphasized: false,
            weight: Self::INACTIVE_WEIGHT,
        }
    }
}

impl Default for EdgeHighlight {
    fn default() -> Self {
        Self::inactive()
    }
}

/// A directed dependency edge between two board nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardEdge {
    pub id: &'static str,
    pub source: NodeRef,
    pub target: NodeRef,
    pub highlight: EdgeHighlight,
}

impl BoardEdge {
    fn new(id: &'static str, source: NodeRef, target: NodeRef) -> Self {
        Self {
            id,
            source,
            target,
            highlight: EdgeHighlight::inactive(),
        }
    }
}

/// Per-stage status plus per-edge highlight, in the fixed initial topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageBoard {
    statuses: FxHashMap<StageName, StageStatus>,
    edges: Vec<BoardEdge>,
}

impl StageBoard {
    /// Build the initial topology: every stage Idle, every highlight off.
    pub fn new() -> Self {
        let mut statuses = FxHashMap::default();
        for stage in StageName::ALL {
            statuses.insert(stage, StageStatus::Idle);
        }
        let edges = vec![
            BoardEdge::new(
                "entry-indexer",
                NodeRef::Entry,
                NodeRef::Stage(StageName::Indexer),
            ),
            BoardEdge::new(
                "indexer-auditor",
                NodeRef::Stage(StageName::Indexer),
                NodeRef::Stage(StageName::Auditor),
            ),
            BoardEdge::new(
                "auditor-terminal",
                NodeRef::Stage(StageName::Auditor),
                NodeRef::Terminal,
            ),
        ];
        Self { statuses, edges }
    }

    pub fn status(&self, stage: StageName) -> StageStatus {
        self.statuses.get(&stage).copied().unwrap_or_default()
    }

    /// Overwrite a stage's status through the transition policy.
    pub fn set_status(&mut self, stage: StageName, status: StageStatus) {
        let current = self.status(stage);
        let next = resolve_transition(current, status);
        tracing::debug!(stage = %stage, previous = %current, next = %next, "stage status");
        self.statuses.insert(stage, next);
    }

    /// Set or clear the highlight on every edge whose target is `stage`.
    pub fn highlight_edges_into(&mut self, stage: StageName, active: bool) {
        let highlight = if active {
            EdgeHighlight::active()
        } else {
            EdgeHighlight::inactive()
        };
        for edge in &mut self.edges {
            if edge.target == NodeRef::Stage(stage) {
                edge.highlight = highlight;
            }
        }
    }

    pub fn edges(&self) -> &[BoardEdge] {
        &self.edges
    }

    /// Highlight of the (single) edge pointing at `stage`.
    pub fn highlight_into(&self, stage: StageName) -> EdgeHighlight {
        self.edges
            .iter()
            .find(|edge| edge.target == NodeRef::Stage(stage))
            .map(|edge| edge.highlight)
            .unwrap_or_default()
    }

    /// True when every stage is Idle and every highlight is off.
    pub fn is_initial(&self) -> bool {
        self.statuses.values().all(|s| *s == StageStatus::Idle)
            && self.edges.iter().all(|e| !e.highlight.active)
    }

    /// Restore the full initial topology.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for StageBoard {
    fn default() -> Self {
        Self::new()
    }
}
