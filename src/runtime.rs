//! Single-consumer drain loop tying transport, reducer, and subscribers
//! together.
//!
//! Exactly one logical actor mutates the session: the drain task takes raw
//! frames in receipt order from the connection manager's queue, runs one
//! synchronous reducer step per frame, and publishes an immutable
//! [`SessionSnapshot`] after every step. The rendering layer watches
//! snapshots; it never touches the stores directly.

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::DashboardConfig;
use crate::reducer;
use crate::session::{AuditSession, SessionSnapshot, StartError};
use crate::transport::{ConnectionManager, ReadyState, Transport};

/// The assembled dashboard core: connection manager, session, drain task.
pub struct DashboardRuntime {
    connection: Arc<ConnectionManager>,
    session: Arc<Mutex<AuditSession>>,
    snapshot_tx: Arc<watch::Sender<SessionSnapshot>>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    lifecycle: StdMutex<Option<Lifecycle>>,
}

struct Lifecycle {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl DashboardRuntime {
    /// Spawn the connection manager over `transport` and the drain loop over
    /// its inbound queue.
    pub fn spawn<T: Transport>(transport: T, config: &DashboardConfig) -> Self {
        let (connection, frames) = ConnectionManager::spawn(transport, config);
        let connection = Arc::new(connection);
        let fresh = AuditSession::new();
        let initial = fresh.snapshot();
        let session = Arc::new(Mutex::new(fresh));

        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let snapshot_tx = Arc::new(snapshot_tx);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(drain_loop(
            frames,
            Arc::clone(&session),
            Arc::clone(&snapshot_tx),
            shutdown_rx,
        ));

        Self {
            connection,
            session,
            snapshot_tx,
            snapshot_rx,
            lifecycle: StdMutex::new(Some(Lifecycle {
                shutdown_tx,
                handle,
            })),
        }
    }

    /// Begin a new audit run; see [`AuditSession::start`] for the rejection
    /// rules. Publishes the freshly reset snapshot on success.
    pub async fn start(&self, resource_locator: impl Into<String>) -> Result<(), StartError> {
        let mut session = self.session.lock().await;
        session.start(&self.connection, resource_locator)?;
        self.snapshot_tx.send_replace(session.snapshot());
        Ok(())
    }

    /// Subscribe to state snapshots, one per reducer step.
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Current readiness of the backend channel.
    pub fn ready_state(&self) -> ReadyState {
        self.connection.ready_state()
    }

    /// Subscribe to readiness changes.
    pub fn ready_changes(&self) -> watch::Receiver<ReadyState> {
        self.connection.ready_changes()
    }

    /// Stop the drain task and the connection manager deterministically.
    pub async fn shutdown(&self) {
        let lifecycle = {
            let mut guard = self.lifecycle.lock().expect("lifecycle poisoned");
            guard.take()
        };
        if let Some(lifecycle) = lifecycle {
            let _ = lifecycle.shutdown_tx.send(());
            let _ = lifecycle.handle.await;
        }
        self.connection.shutdown().await;
    }
}

impl Drop for DashboardRuntime {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.lifecycle.lock() {
            if let Some(lifecycle) = guard.take() {
                let _ = lifecycle.shutdown_tx.send(());
                lifecycle.handle.abort();
            }
        }
    }
}

async fn drain_loop(
    frames: flume::Receiver<Vec<u8>>,
    session: Arc<Mutex<AuditSession>>,
    snapshot_tx: Arc<watch::Sender<SessionSnapshot>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            raw = frames.recv_async() => match raw {
                Ok(raw) => {
                    let mut session = session.lock().await;
                    reducer::apply_raw(&mut session, &raw);
                    snapshot_tx.send_replace(session.snapshot());
                }
                Err(_) => break,
            },
        }
    }
    tracing::debug!("drain loop stopped");
}
