//! Audit session state and the start/reset controller.
//!
//! [`AuditSession`] is an explicit value handed by reference to the reducer;
//! there is no ambient or static session, so unit tests run isolated sessions
//! freely. The session controller ([`AuditSession::start`]) is the only
//! writer that resets the substores back to the initial topology; the
//! `running` flag otherwise only drops through reducer rules (completion
//! sentinel, stage failure, or the primary verdict extraction).

use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::board::StageBoard;
use crate::log_feed::{LogEntry, LogFeed};
use crate::protocol::StartCommand;
use crate::transport::{ConnectionManager, ReadyState, TransportError};
use crate::verdict::AuditVerdict;

/// Why a `start` call was rejected. No state mutates on rejection.
#[derive(Debug, Error, Diagnostic)]
pub enum StartError {
    /// The backend channel is not open yet.
    #[error("backend channel is not open")]
    #[diagnostic(
        code(auditboard::session::not_ready),
        help("wait for the connection indicator to show Open")
    )]
    NotReady,

    /// A session is already in flight; it is never preempted.
    #[error("an audit session is already running")]
    #[diagnostic(code(auditboard::session::already_running))]
    AlreadyRunning,

    /// The start command could not be delivered.
    #[error(transparent)]
    #[diagnostic(code(auditboard::session::transport))]
    Transport(#[from] TransportError),
}

/// One end-to-end audit run, from `start` to a terminal outcome.
///
/// Holds the four substores the rendering layer reads: the stage board, the
/// log feed, the extracted verdict, and the running flag. At most one
/// session is running per process; starting a new one discards in-flight
/// state of the previous run (no cancellation signal goes to the backend).
#[derive(Clone, Debug)]
pub struct AuditSession {
    resource_locator: String,
    session_id: Uuid,
    running: bool,
    verdict: Option<AuditVerdict>,
    board: StageBoard,
    log: LogFeed,
}

impl AuditSession {
    /// A fresh session in the idle configuration.
    pub fn new() -> Self {
        Self {
            resource_locator: String::new(),
            session_id: Uuid::new_v4(),
            running: false,
            verdict: None,
            board: StageBoard::new(),
            log: LogFeed::new(),
        }
    }

    pub fn resource_locator(&self) -> &str {
        &self.resource_locator
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn verdict(&self) -> Option<&AuditVerdict> {
        self.verdict.as_ref()
    }

    pub fn board(&self) -> &StageBoard {
        &self.board
    }

    pub fn log(&self) -> &LogFeed {
        &self.log
    }

    /// Begin a new audit run for `resource_locator`.
    ///
    /// Rejected while the channel is not open or a run is in flight. On
    /// success the substores are reset to the initial topology (log empty,
    /// verdict absent, every stage Idle, every highlight off), the running
    /// flag is raised, and the start command goes over the wire.
    pub fn start(
        &mut self,
        connection: &ConnectionManager,
        resource_locator: impl Into<String>,
    ) -> Result<(), StartError> {
        if connection.ready_state() != ReadyState::Open {
            return Err(StartError::NotReady);
        }
        if self.running {
            return Err(StartError::AlreadyRunning);
        }

        let resource_locator = resource_locator.into();
        let command = StartCommand::new(resource_locator.clone());
        let frame = serde_json::to_string(&command).map_err(TransportError::from)?;

        self.reset_for(resource_locator);

        if let Err(err) = connection.send_frame(frame) {
            // The channel raced shut between the readiness check and the
            // send; leave the session idle rather than stuck running.
            self.running = false;
            return Err(err.into());
        }

        tracing::info!(
            session = %self.session_id,
            locator = %self.resource_locator,
            "audit session started"
        );
        Ok(())
    }

    /// Produce an immutable view of the visible state for subscribers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            resource_locator: self.resource_locator.clone(),
            session_id: self.session_id,
            running: self.running,
            verdict: self.verdict.clone(),
            board: self.board.clone(),
            log: self.log.entries().to_vec(),
        }
    }

    fn reset_for(&mut self, resource_locator: String) {
        self.resource_locator = resource_locator;
        self.session_id = Uuid::new_v4();
        self.running = true;
        self.verdict = None;
        self.board.reset();
        self.log.clear();
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub(crate) fn set_verdict(&mut self, verdict: AuditVerdict) {
        self.verdict = Some(verdict);
    }

    pub(crate) fn board_mut(&mut self) -> &mut StageBoard {
        &mut self.board
    }

    pub(crate) fn log_mut(&mut self) -> &mut LogFeed {
        &mut self.log
    }
}

impl Default for AuditSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of session state, produced after every reducer step.
///
/// The rendering layer subscribes to these instead of reaching into shared
/// mutable structures.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub resource_locator: String,
    pub session_id: Uuid,
    pub running: bool,
    pub verdict: Option<AuditVerdict>,
    pub board: StageBoard,
    pub log: Vec<LogEntry>,
}
