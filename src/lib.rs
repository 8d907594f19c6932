//! # Auditboard: session core for a live compliance audit dashboard
//!
//! Auditboard consumes the event stream of a two-stage media audit pipeline
//! (an indexing stage followed by a compliance-review stage) and projects it
//! deterministically onto dashboard state: per-stage status, per-edge
//! highlight, a scrolling diagnostic log, the structured final verdict, and
//! a single running/idle flag.
//!
//! ## Core pieces
//!
//! - [`protocol`]: wire types and the classifier that turns raw frames into
//!   typed [`PipelineEvent`](protocol::PipelineEvent)s; malformed frames are
//!   a recoverable outcome, never a crash
//! - [`board`]: the node/edge state store with its fixed two-stage topology
//! - [`log_feed`]: the append-only, client-timestamped diagnostic log
//! - [`verdict`]: the final result types and payload extraction
//! - [`reducer`]: one synchronous step per event, applied in receipt order
//! - [`session`]: explicit session state plus the start/reset controller
//! - [`transport`]: connection lifecycle with unconditional fixed-interval
//!   retry; the socket itself is supplied by the embedding application
//! - [`runtime`]: the single-consumer drain loop publishing immutable
//!   snapshots to subscribers
//!
//! ## Quick start
//!
//! Drive a session directly (no transport needed) by feeding classified
//! events through the reducer:
//!
//! ```
//! use auditboard::board::{StageName, StageStatus};
//! use auditboard::protocol::PipelineEvent;
//! use auditboard::reducer;
//! use auditboard::session::AuditSession;
//!
//! let mut session = AuditSession::new();
//! reducer::apply(&mut session, &PipelineEvent::stage_start("indexer"));
//!
//! assert_eq!(session.board().status(StageName::Indexer), StageStatus::Running);
//! assert!(session.board().highlight_into(StageName::Indexer).active);
//! ```
//!
//! The assembled runtime wires a [`transport::Transport`] to the reducer and
//! hands out snapshot subscriptions:
//!
//! ```no_run
//! use auditboard::config::DashboardConfig;
//! use auditboard::runtime::DashboardRuntime;
//! use auditboard::transport::ChannelTransport;
//!
//! # async fn demo() -> Result<(), auditboard::session::StartError> {
//! let runtime = DashboardRuntime::spawn(ChannelTransport::new(), &DashboardConfig::default());
//! let mut snapshots = runtime.snapshots();
//!
//! runtime.start("https://example.com/clip").await?;
//! snapshots.changed().await.ok();
//! let snapshot = snapshots.borrow().clone();
//! assert!(snapshot.running);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod config;
pub mod log_feed;
pub mod protocol;
pub mod reducer;
pub mod runtime;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod verdict;
